//! Input validation error types.
//!
//! Raised for malformed keyboard ids and out-of-range configuration values.

use core::fmt;

use crate::common::ErrorSeverity;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Value out of range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Field name
        field: String,
        /// The invalid value
        value: String,
        /// Minimum allowed value
        min: String,
        /// Maximum allowed value
        max: String,
    },

    /// Value is required but missing
    #[error("Required field '{0}' is missing")]
    Required(String),

    /// Invalid format
    #[error("Invalid format for field '{field}': {reason}")]
    InvalidFormat {
        /// Field name
        field: String,
        /// Reason for the format error
        reason: String,
    },

    /// Invalid characters
    #[error("Field '{field}' contains invalid characters: {reason}")]
    InvalidCharacters {
        /// Field name
        field: String,
        /// Which characters were rejected
        reason: String,
    },
}

impl ValidationError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    /// Create an out of range error for a numeric value.
    pub fn out_of_range<T: fmt::Debug>(field: impl Into<String>, value: T, min: T, max: T) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            value: format!("{value:?}"),
            min: format!("{min:?}"),
            max: format!("{max:?}"),
        }
    }

    /// Create a required field error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required(field.into())
    }

    /// Create an invalid format error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid characters error.
    pub fn invalid_characters(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidCharacters {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_formats_values() {
        let err = ValidationError::out_of_range("interval_ms", 10u64, 50, 600_000);
        assert_eq!(
            err.to_string(),
            "interval_ms value 10 is out of range [50, 600000]"
        );
    }

    #[test]
    fn test_required_field() {
        let err = ValidationError::required("keyboard_id");
        assert!(err.to_string().contains("keyboard_id"));
    }
}
