//! Prelude module for convenient error handling imports.
//!
//! ```
//! use keymux_errors::prelude::*;
//!
//! fn lookup(known: bool) -> Result<()> {
//!     if !known {
//!         return Err(StateError::keyboard_not_found("kbd-0001").into());
//!     }
//!     Ok(())
//! }
//!
//! assert!(lookup(false).is_err());
//! ```

pub use crate::{
    DeviceResult, Result,
    common::{ErrorCategory, ErrorSeverity, KeyMuxError},
    device::DeviceError,
    state::StateError,
    validation::ValidationError,
};
