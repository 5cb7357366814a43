//! USB HID boot-protocol keyboard support
//!
//! Decodes the standard 8-byte keyboard input frame and maps its scan codes
//! to logical key names.
//!
//! ```text
//! Byte 0    modifier mask (LCtrl LShift LAlt LGui RCtrl RShift RAlt RGui)
//! Byte 1    reserved
//! Byte 2-7  up to six pressed scan codes, zero padded
//! ```
//!
//! Only the US boot-protocol usage table is covered; layout and locale
//! mapping are left to the consumer.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod report;
pub mod scan_codes;

pub use report::*;
pub use scan_codes::*;

/// Size of a boot-protocol keyboard report in bytes.
pub const BOOT_REPORT_SIZE: usize = 8;

/// Number of scan-code slots in a boot-protocol report.
pub const KEY_SLOTS: usize = 6;

/// Scan code a keyboard puts in every slot when too many keys are held.
pub const ERROR_ROLL_OVER: u8 = 0x01;
