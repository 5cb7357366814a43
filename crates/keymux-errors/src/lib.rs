//! Centralized error types for keymux
//!
//! Every crate in the workspace reports failures through the types defined
//! here, so callers can classify an error without knowing which layer
//! produced it.
//!
//! - [`common`]: the top-level [`KeyMuxError`], categories and severities
//! - [`device`]: enumeration, stream and report errors raised at the HID boundary
//! - [`state`]: invalid lifecycle transitions and unknown keyboard ids
//! - [`validation`]: identifier and configuration validation failures
//!
//! # Example
//!
//! ```
//! use keymux_errors::prelude::*;
//!
//! fn check_interval(interval_ms: u64) -> Result<u64> {
//!     if interval_ms == 0 {
//!         return Err(ValidationError::out_of_range("interval_ms", interval_ms, 1, u64::MAX).into());
//!     }
//!     Ok(interval_ms)
//! }
//!
//! assert!(check_interval(0).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod device;
pub mod prelude;
pub mod state;
pub mod validation;

pub use common::{ErrorCategory, ErrorSeverity, KeyMuxError};
pub use device::DeviceError;
pub use state::StateError;
pub use validation::ValidationError;

/// A specialized `Result` type for keymux operations.
pub type Result<T> = std::result::Result<T, KeyMuxError>;

/// A specialized `Result` type for operations at the HID boundary.
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;
