//! Production [`HidPort`] backed by `hidapi`.
//!
//! Descriptors from `hidapi` are converted through `TryFrom` here and nowhere
//! else; entries that fail conversion are skipped with a warning so one odd
//! device cannot fail a whole enumeration.
//!
//! `hidapi` calls block, so enumeration and opening run on the blocking pool.

use std::ffi::{CStr, CString};
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use hidapi::{DeviceInfo, HidApi, HidDevice, HidError};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{HidDeviceDescriptor, HidPort, HidReportStream};
use keymux_errors::{DeviceError, DeviceResult};

impl TryFrom<&DeviceInfo> for HidDeviceDescriptor {
    type Error = DeviceError;

    fn try_from(info: &DeviceInfo) -> Result<Self, Self::Error> {
        let path = path_string(info.path())?;
        let descriptor = HidDeviceDescriptor {
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
            path,
            usage_page: info.usage_page(),
            usage: info.usage(),
            manufacturer: non_empty(info.manufacturer_string()),
            product_name: non_empty(info.product_string()),
            serial_number: non_empty(info.serial_number()),
            interface_number: Some(info.interface_number()).filter(|n| *n >= 0),
        };
        descriptor.validate()
    }
}

/// Device paths are handed back to `open_path` verbatim, so a path that is
/// not UTF-8 could be listed but never opened.
fn path_string(path: &CStr) -> DeviceResult<String> {
    path.to_str().map(str::to_string).map_err(|e| {
        DeviceError::InvalidDescriptor(format!("{}: {e}", path.to_string_lossy()))
    })
}

fn open_error(path: &str, error: HidError) -> DeviceError {
    match error {
        HidError::IoError { error } if error.kind() == io::ErrorKind::PermissionDenied => {
            DeviceError::PermissionDenied(path.to_string())
        }
        other => DeviceError::open_failed(path, other.to_string()),
    }
}

fn enumerate(api: &Mutex<HidApi>) -> DeviceResult<Vec<HidDeviceDescriptor>> {
    let mut api = api.lock();
    api.refresh_devices()
        .map_err(|e| DeviceError::EnumerationFailed(e.to_string()))?;

    let mut devices = Vec::new();
    for info in api.device_list() {
        match HidDeviceDescriptor::try_from(info) {
            Ok(descriptor) => devices.push(descriptor),
            Err(e) => warn!(error = %e, "Skipping unusable HID descriptor"),
        }
    }
    Ok(devices)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// HID port over the host's `hidapi` backend.
pub struct HidApiPort {
    api: Arc<Mutex<HidApi>>,
}

impl HidApiPort {
    /// Initialise the platform HID library.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::EnumerationFailed`] when the library cannot be
    /// initialised (no HID subsystem, sandbox restrictions).
    pub fn new() -> DeviceResult<Self> {
        let api = HidApi::new().map_err(|e| DeviceError::EnumerationFailed(e.to_string()))?;
        Ok(Self {
            api: Arc::new(Mutex::new(api)),
        })
    }
}

#[async_trait]
impl HidPort for HidApiPort {
    async fn list_devices(&self) -> DeviceResult<Vec<HidDeviceDescriptor>> {
        let api = Arc::clone(&self.api);
        let devices = tokio::task::spawn_blocking(move || enumerate(&api))
            .await
            .map_err(|e| DeviceError::EnumerationFailed(e.to_string()))??;
        debug!(count = devices.len(), "Enumerated HID collections");
        Ok(devices)
    }

    async fn open_stream(&self, path: &str) -> DeviceResult<Box<dyn HidReportStream>> {
        let c_path = CString::new(path)
            .map_err(|e| DeviceError::open_failed(path, e.to_string()))?;
        let api = Arc::clone(&self.api);
        let device = tokio::task::spawn_blocking(move || api.lock().open_path(&c_path))
            .await
            .map_err(|e| DeviceError::open_failed(path, e.to_string()))?
            .map_err(|e| open_error(path, e))?;
        debug!(path, "Opened HID stream");

        Ok(Box::new(HidApiStream {
            path: path.to_string(),
            device: Some(device),
        }))
    }
}

struct HidApiStream {
    path: String,
    device: Option<HidDevice>,
}

impl HidReportStream for HidApiStream {
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> DeviceResult<usize> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| DeviceError::disconnected(self.path.clone()))?;
        device
            .read_timeout(buf, timeout_ms)
            .map_err(|e| DeviceError::stream_failed(self.path.clone(), e.to_string()))
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn close(&mut self) -> DeviceResult<()> {
        if self.device.take().is_some() {
            debug!(path = %self.path, "Closed HID stream");
        }
        Ok(())
    }
}
