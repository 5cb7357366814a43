//! Top-level error type and classification shared by all keymux crates.

use core::fmt;

use crate::{DeviceError, StateError, ValidationError};

/// Top-level error type that can wrap all keymux sub-errors.
#[derive(Debug, thiserror::Error)]
pub enum KeyMuxError {
    /// Device and HID boundary errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Invalid lifecycle transitions and unknown ids
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KeyMuxError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            KeyMuxError::Device(_) => ErrorCategory::Device,
            KeyMuxError::State(_) => ErrorCategory::State,
            KeyMuxError::Validation(_) => ErrorCategory::Validation,
            KeyMuxError::Io(_) => ErrorCategory::IO,
            KeyMuxError::Config(_) => ErrorCategory::Config,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            KeyMuxError::Device(e) => e.severity(),
            KeyMuxError::State(e) => e.severity(),
            KeyMuxError::Validation(e) => e.severity(),
            KeyMuxError::Io(_) => ErrorSeverity::Error,
            KeyMuxError::Config(_) => ErrorSeverity::Error,
        }
    }

    /// Check if this error is recoverable.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        KeyMuxError::Config(msg.into())
    }
}

impl From<std::io::Error> for KeyMuxError {
    fn from(e: std::io::Error) -> Self {
        KeyMuxError::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Device and HID boundary errors
    Device = 1,
    /// Lifecycle state errors
    State = 2,
    /// Configuration errors
    Config = 3,
    /// I/O errors
    IO = 4,
    /// Validation errors
    Validation = 5,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Device => write!(f, "Device"),
            ErrorCategory::State => write!(f, "State"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::IO => write!(f, "IO"),
            ErrorCategory::Validation => write!(f, "Validation"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, may require attention
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, the component cannot continue
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
