//! CLI error types and their exit codes

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("No keyboards found")]
    NoKeyboards,

    #[error("Keyboard not connected: {0}")]
    KeyboardNotConnected(String),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::NoKeyboards | CliError::KeyboardNotConnected(_) => 2,
        }
    }
}

/// Exit code for a failed command: 2 when there was nothing to work with,
/// 1 otherwise.
pub fn exit_code_for(error: &anyhow::Error) -> u8 {
    error.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_keyboards_when_mapped_then_exit_code_is_two() {
        let error = anyhow::Error::new(CliError::NoKeyboards);
        assert_eq!(exit_code_for(&error), 2);
    }

    #[test]
    fn given_other_error_when_mapped_then_exit_code_is_one() {
        let error = anyhow::anyhow!("enumeration failed");
        assert_eq!(exit_code_for(&error), 1);
    }
}
