//! Lifecycle state errors.
//!
//! These are surfaced synchronously to the caller and never swallowed.

use crate::common::ErrorSeverity;

/// Invalid state transitions and lookups of unknown keyboards.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// `start_monitoring` called while the enumeration monitor is running
    #[error("Enumeration monitoring is already active")]
    AlreadyMonitoring,

    /// `start_listening` called while a listening session is running
    #[error("A listening session is already active")]
    AlreadyListening,

    /// No keyboard with this id is registered
    #[error("Keyboard not found: {0}")]
    KeyboardNotFound(String),

    /// A different keyboard is already registered under this id
    #[error("Keyboard id {0} is already registered for another device")]
    DuplicateKeyboardId(String),

    /// `start_listening` called with an empty keyboard set
    #[error("No keyboards were requested for listening")]
    NoKeyboardsRequested,
}

impl StateError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StateError::AlreadyMonitoring | StateError::AlreadyListening => ErrorSeverity::Warning,
            StateError::KeyboardNotFound(_)
            | StateError::DuplicateKeyboardId(_)
            | StateError::NoKeyboardsRequested => ErrorSeverity::Error,
        }
    }

    /// Create a keyboard-not-found error.
    pub fn keyboard_not_found(id: impl Into<String>) -> Self {
        StateError::KeyboardNotFound(id.into())
    }
}
