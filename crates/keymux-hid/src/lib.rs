//! HID platform boundary for keymux
//!
//! This crate is the single seam between the host's HID layer and the rest of
//! the workspace. Platform descriptors are converted into a fixed
//! [`HidDeviceDescriptor`] shape here, the keyboard filter lives here, and raw
//! report streams are exposed through the [`HidPort`] / [`HidReportStream`]
//! traits so the engine never touches a platform API directly.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod device_info;
pub mod hid_traits;
pub mod mock;
pub mod report_parser;

#[cfg(feature = "hidapi")]
pub mod hidapi_backend;

pub use device_info::*;
pub use hid_traits::*;
pub use report_parser::*;

#[cfg(feature = "hidapi")]
pub use hidapi_backend::HidApiPort;

pub use keymux_errors::{DeviceError, DeviceResult};

/// Usage page of generic desktop controls.
pub const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;

/// Generic desktop usage for a pointer.
pub const USAGE_POINTER: u16 = 0x01;

/// Generic desktop usage for a mouse.
pub const USAGE_MOUSE: u16 = 0x02;

/// Generic desktop usage for a keyboard.
pub const USAGE_KEYBOARD: u16 = 0x06;

/// Default buffer size for a single input report read.
pub const DEFAULT_REPORT_BUFFER_SIZE: usize = 64;
