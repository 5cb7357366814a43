//! Convenience re-exports for common test utilities.

pub use crate::must::{must, must_parse, must_some, must_with};

#[cfg(feature = "async")]
pub use crate::must::{must_async, must_some_async};

#[cfg(feature = "fixtures")]
pub use crate::fixtures::{
    consumer_control_descriptor, key_report, keyboard_descriptor, mouse_descriptor,
    release_report, rollover_report,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
