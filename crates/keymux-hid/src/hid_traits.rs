//! HID port and report stream traits

use crate::HidDeviceDescriptor;
use async_trait::async_trait;
use keymux_errors::DeviceResult;

/// An open raw input stream for one device.
///
/// Reads block for at most `timeout_ms`. A return value of `0` means the
/// timeout elapsed without a report; it is not an error and not a report.
pub trait HidReportStream: Send {
    /// Read one input report into `buf`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error when the stream fails or the device goes away. The
    /// stream is unusable afterwards.
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> DeviceResult<usize>;

    /// Path this stream was opened against.
    fn path(&self) -> &str;

    /// Release the underlying handle. Dropping the stream has the same effect.
    ///
    /// # Errors
    ///
    /// Returns an error when the platform refuses to release the handle.
    fn close(&mut self) -> DeviceResult<()>;
}

/// Device enumeration and stream opening, supplied by the host platform.
#[async_trait]
pub trait HidPort: Send + Sync {
    /// Snapshot of every HID collection currently attached (unfiltered).
    async fn list_devices(&self) -> DeviceResult<Vec<HidDeviceDescriptor>>;

    /// Open a raw report stream against a device path.
    async fn open_stream(&self, path: &str) -> DeviceResult<Box<dyn HidReportStream>>;
}
