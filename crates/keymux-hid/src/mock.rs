//! In-memory HID port
//!
//! [`MockHidPort`] stands in for the platform layer in tests and on hosts
//! without hardware. Reports are pushed through [`MockDevice`] handles and
//! delivered to whichever stream is currently open for that device; reads
//! block on a channel with the caller's timeout, so readers never spin.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::{HidDeviceDescriptor, HidPort, HidReportStream};
use keymux_errors::{DeviceError, DeviceResult};

enum MockRead {
    Report(Vec<u8>),
    Error(String),
}

struct MockDeviceState {
    descriptor: HidDeviceDescriptor,
    feed: Mutex<Option<mpsc::Sender<MockRead>>>,
    open_failure: Mutex<Option<String>>,
    open_streams: AtomicUsize,
}

/// Handle to one simulated device.
#[derive(Clone)]
pub struct MockDevice {
    state: Arc<MockDeviceState>,
}

impl MockDevice {
    fn new(descriptor: HidDeviceDescriptor) -> Self {
        Self {
            state: Arc::new(MockDeviceState {
                descriptor,
                feed: Mutex::new(None),
                open_failure: Mutex::new(None),
                open_streams: AtomicUsize::new(0),
            }),
        }
    }

    pub fn descriptor(&self) -> &HidDeviceDescriptor {
        &self.state.descriptor
    }

    pub fn path(&self) -> &str {
        &self.state.descriptor.path
    }

    /// Deliver a report to the open stream. Returns `false` when no stream
    /// is open to receive it.
    pub fn send_report(&self, report: &[u8]) -> bool {
        self.send(MockRead::Report(report.to_vec()))
    }

    /// Make the open stream fail its next read.
    pub fn inject_error(&self, message: impl Into<String>) -> bool {
        self.send(MockRead::Error(message.into()))
    }

    /// Make subsequent `open_stream` calls for this device fail.
    pub fn set_open_failure(&self, reason: Option<&str>) {
        *self.state.open_failure.lock() = reason.map(str::to_string);
    }

    /// Number of streams currently open against this device.
    pub fn open_stream_count(&self) -> usize {
        self.state.open_streams.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open_stream_count() > 0
    }

    fn send(&self, read: MockRead) -> bool {
        let feed = self.state.feed.lock();
        match feed.as_ref() {
            Some(sender) => sender.send(read).is_ok(),
            None => false,
        }
    }

    fn unplug(&self) {
        // Dropping the sender wakes a blocked reader with a disconnect.
        self.state.feed.lock().take();
    }
}

/// Simulated platform HID layer.
pub struct MockHidPort {
    devices: RwLock<Vec<MockDevice>>,
    enumeration_failure: Mutex<Option<String>>,
    list_calls: AtomicUsize,
}

impl MockHidPort {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(Vec::new()),
            enumeration_failure: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Attach a device. The same path may be added twice to simulate a
    /// platform that reports one device under several collections.
    pub fn add_device(&self, descriptor: HidDeviceDescriptor) -> MockDevice {
        let device = MockDevice::new(descriptor);
        self.devices.write().push(device.clone());
        device
    }

    pub fn add_keyboard(&self, vendor_id: u16, product_id: u16, path: &str) -> MockDevice {
        self.add_device(HidDeviceDescriptor::keyboard(vendor_id, product_id, path))
    }

    /// Detach every entry with this path. Open streams see a disconnect.
    pub fn remove_device(&self, path: &str) -> bool {
        let mut devices = self.devices.write();
        let before = devices.len();
        devices.retain(|device| {
            if device.path() == path {
                device.unplug();
                false
            } else {
                true
            }
        });
        devices.len() != before
    }

    pub fn device(&self, path: &str) -> Option<MockDevice> {
        self.devices
            .read()
            .iter()
            .find(|device| device.path() == path)
            .cloned()
    }

    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }

    /// Make `list_devices` fail until cleared with `None`.
    pub fn set_enumeration_failure(&self, reason: Option<&str>) {
        *self.enumeration_failure.lock() = reason.map(str::to_string);
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockHidPort {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HidPort for MockHidPort {
    async fn list_devices(&self) -> DeviceResult<Vec<HidDeviceDescriptor>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.enumeration_failure.lock().clone() {
            return Err(DeviceError::EnumerationFailed(reason));
        }
        Ok(self
            .devices
            .read()
            .iter()
            .map(|device| device.descriptor().clone())
            .collect())
    }

    async fn open_stream(&self, path: &str) -> DeviceResult<Box<dyn HidReportStream>> {
        let device = self
            .device(path)
            .ok_or_else(|| DeviceError::not_found(path))?;

        if let Some(reason) = device.state.open_failure.lock().clone() {
            return Err(DeviceError::open_failed(path, reason));
        }

        let (sender, receiver) = mpsc::channel();
        *device.state.feed.lock() = Some(sender);
        device.state.open_streams.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockHidStream {
            path: path.to_string(),
            receiver,
            device: Arc::clone(&device.state),
            closed: false,
        }))
    }
}

struct MockHidStream {
    path: String,
    receiver: mpsc::Receiver<MockRead>,
    device: Arc<MockDeviceState>,
    closed: bool,
}

impl MockHidStream {
    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.device.open_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl HidReportStream for MockHidStream {
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> DeviceResult<usize> {
        if self.closed {
            return Err(DeviceError::disconnected(self.path.clone()));
        }

        let received = match u64::try_from(timeout_ms) {
            Ok(ms) => self.receiver.recv_timeout(Duration::from_millis(ms)),
            // Negative timeout blocks until something arrives, like hidapi.
            Err(_) => self
                .receiver
                .recv()
                .map_err(|mpsc::RecvError| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(MockRead::Report(report)) => {
                let len = report.len().min(buf.len());
                if let (Some(dst), Some(src)) = (buf.get_mut(..len), report.get(..len)) {
                    dst.copy_from_slice(src);
                }
                Ok(len)
            }
            Ok(MockRead::Error(message)) => Err(DeviceError::stream_failed(self.path.clone(), message)),
            Err(RecvTimeoutError::Timeout) => Ok(0),
            Err(RecvTimeoutError::Disconnected) => Err(DeviceError::disconnected(self.path.clone())),
        }
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn close(&mut self) -> DeviceResult<()> {
        self.release();
        Ok(())
    }
}

impl Drop for MockHidStream {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_port_lists_all_devices() -> DeviceResult<()> {
        let port = MockHidPort::new();
        port.add_keyboard(0x1234, 0x5678, "/dev/hidraw0");
        port.add_device(HidDeviceDescriptor::new(0xabcd, 0xef01, "/dev/hidraw1"));

        let devices = port.list_devices().await?;
        assert_eq!(devices.len(), 2);
        assert_eq!(port.list_call_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_report_roundtrip_through_stream() -> DeviceResult<()> {
        let port = MockHidPort::new();
        let device = port.add_keyboard(0x1234, 0x5678, "/dev/hidraw0");
        assert!(!device.send_report(&[0; 8]), "no stream open yet");

        let mut stream = port.open_stream("/dev/hidraw0").await?;
        assert!(device.is_open());
        assert!(device.send_report(&[0, 0, 4, 0, 0, 0, 0, 0]));

        let mut buf = [0u8; 64];
        let n = stream.read_report(&mut buf, 100)?;
        assert_eq!(n, 8);
        assert_eq!(buf.get(2), Some(&4));
        Ok(())
    }

    #[tokio::test]
    async fn test_timeout_reads_zero() -> DeviceResult<()> {
        let port = MockHidPort::new();
        port.add_keyboard(1, 1, "/dev/hidraw0");
        let mut stream = port.open_stream("/dev/hidraw0").await?;

        let mut buf = [0u8; 8];
        assert_eq!(stream.read_report(&mut buf, 1)?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_injected_error_fails_read() -> DeviceResult<()> {
        let port = MockHidPort::new();
        let device = port.add_keyboard(1, 1, "/dev/hidraw0");
        let mut stream = port.open_stream("/dev/hidraw0").await?;
        assert!(device.inject_error("EIO"));

        let mut buf = [0u8; 8];
        let result = stream.read_report(&mut buf, 100);
        assert!(matches!(result, Err(DeviceError::StreamFailed { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_device_disconnects_stream() -> DeviceResult<()> {
        let port = MockHidPort::new();
        port.add_keyboard(1, 1, "/dev/hidraw0");
        let mut stream = port.open_stream("/dev/hidraw0").await?;
        assert!(port.remove_device("/dev/hidraw0"));

        let mut buf = [0u8; 8];
        let result = stream.read_report(&mut buf, 100);
        assert!(matches!(result, Err(DeviceError::Disconnected(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_open_failure_and_missing_device() {
        let port = MockHidPort::new();
        let device = port.add_keyboard(1, 1, "/dev/hidraw0");
        device.set_open_failure(Some("busy"));

        let result = port.open_stream("/dev/hidraw0").await;
        assert!(matches!(result, Err(DeviceError::OpenFailed { .. })));

        let result = port.open_stream("/dev/hidraw9").await;
        assert!(matches!(result, Err(DeviceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_close_and_drop_release_handle() -> DeviceResult<()> {
        let port = MockHidPort::new();
        let device = port.add_keyboard(1, 1, "/dev/hidraw0");

        let mut stream = port.open_stream("/dev/hidraw0").await?;
        stream.close()?;
        assert!(!device.is_open());
        drop(stream);
        assert_eq!(device.open_stream_count(), 0);

        let stream = port.open_stream("/dev/hidraw0").await?;
        assert_eq!(device.open_stream_count(), 1);
        drop(stream);
        assert_eq!(device.open_stream_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_enumeration_failure() {
        let port = MockHidPort::new();
        port.set_enumeration_failure(Some("udev unavailable"));
        let result = port.list_devices().await;
        assert!(matches!(result, Err(DeviceError::EnumerationFailed(_))));

        port.set_enumeration_failure(None);
        assert!(port.list_devices().await.is_ok());
    }
}
