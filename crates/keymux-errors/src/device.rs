//! Device and HID boundary error types.
//!
//! Covers the platform enumeration call, per-device stream failures and
//! malformed input reports.

use crate::common::ErrorSeverity;

/// Device and HID boundary errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// Device not found
    #[error("Device not found: {0}")]
    NotFound(String),

    /// The platform device-list call failed
    #[error("Device enumeration failed: {0}")]
    EnumerationFailed(String),

    /// A raw stream could not be opened for one device
    #[error("Failed to open device {path}: {reason}")]
    OpenFailed {
        /// Device path that failed to open
        path: String,
        /// Failure reason reported by the platform
        reason: String,
    },

    /// An open stream failed while reading
    #[error("Stream error on device {device}: {message}")]
    StreamFailed {
        /// Device identifier
        device: String,
        /// Error message
        message: String,
    },

    /// Device was removed while a stream was open
    #[error("Device disconnected: {0}")]
    Disconnected(String),

    /// Permission denied
    #[error("Permission denied for device: {0}")]
    PermissionDenied(String),

    /// A descriptor from the platform could not be converted to the typed shape
    #[error("Invalid device descriptor: {0}")]
    InvalidDescriptor(String),

    /// Input report shorter than the expected frame
    #[error("Malformed report: expected at least {expected} bytes, got {actual}")]
    MalformedReport {
        /// Minimum frame size in bytes
        expected: usize,
        /// Received frame size in bytes
        actual: usize,
    },

    /// Every requested device failed to open
    #[error("Failed to open all {attempted} requested devices")]
    AllOpensFailed {
        /// Number of devices that were attempted
        attempted: usize,
        /// The individual open failures
        failures: Vec<DeviceError>,
    },
}

impl DeviceError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DeviceError::NotFound(_) => ErrorSeverity::Error,
            DeviceError::EnumerationFailed(_) => ErrorSeverity::Warning,
            DeviceError::OpenFailed { .. } => ErrorSeverity::Error,
            DeviceError::StreamFailed { .. } => ErrorSeverity::Error,
            DeviceError::Disconnected(_) => ErrorSeverity::Warning,
            DeviceError::PermissionDenied(_) => ErrorSeverity::Error,
            DeviceError::InvalidDescriptor(_) => ErrorSeverity::Warning,
            DeviceError::MalformedReport { .. } => ErrorSeverity::Info,
            DeviceError::AllOpensFailed { .. } => ErrorSeverity::Critical,
        }
    }

    /// Check if this error indicates the device is unavailable.
    pub fn is_device_unavailable(&self) -> bool {
        matches!(
            self,
            DeviceError::NotFound(_)
                | DeviceError::Disconnected(_)
                | DeviceError::PermissionDenied(_)
        )
    }

    /// Create a not found error.
    pub fn not_found(device: impl Into<String>) -> Self {
        DeviceError::NotFound(device.into())
    }

    /// Create a disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        DeviceError::Disconnected(device.into())
    }

    /// Create an open failure for a device path.
    pub fn open_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        DeviceError::OpenFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a stream runtime failure.
    pub fn stream_failed(device: impl Into<String>, message: impl Into<String>) -> Self {
        DeviceError::StreamFailed {
            device: device.into(),
            message: message.into(),
        }
    }
}
