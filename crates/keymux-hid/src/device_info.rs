//! Device descriptor types and the keyboard filter

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{USAGE_KEYBOARD, USAGE_PAGE_GENERIC_DESKTOP};
use keymux_errors::{DeviceError, DeviceResult};

/// One top-level collection reported by the platform's HID enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidDeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    pub path: String,
    pub usage_page: u16,
    pub usage: u16,
    pub manufacturer: Option<String>,
    pub product_name: Option<String>,
    pub serial_number: Option<String>,
    /// HID interface number from the OS (multi-interface devices).
    pub interface_number: Option<i32>,
}

impl HidDeviceDescriptor {
    pub fn new(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
        Self {
            vendor_id,
            product_id,
            path: path.into(),
            usage_page: 0,
            usage: 0,
            manufacturer: None,
            product_name: None,
            serial_number: None,
            interface_number: None,
        }
    }

    /// Shorthand for a generic-desktop keyboard collection.
    pub fn keyboard(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
        Self::new(vendor_id, product_id, path).with_usage(USAGE_PAGE_GENERIC_DESKTOP, USAGE_KEYBOARD)
    }

    pub fn with_usage(mut self, usage_page: u16, usage: u16) -> Self {
        self.usage_page = usage_page;
        self.usage = usage;
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    pub fn with_interface_number(mut self, interface_number: i32) -> Self {
        self.interface_number = Some(interface_number);
        self
    }

    /// Reject descriptors the rest of the workspace cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::InvalidDescriptor`] when the path is blank.
    pub fn validate(self) -> DeviceResult<Self> {
        if self.path.trim().is_empty() {
            return Err(DeviceError::InvalidDescriptor(format!(
                "empty device path for {:04x}:{:04x}",
                self.vendor_id, self.product_id
            )));
        }
        Ok(self)
    }

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }

    pub fn display_name(&self) -> String {
        self.product_name
            .clone()
            .or_else(|| self.manufacturer.clone())
            .unwrap_or_else(|| format!("{:04x}:{:04x}", self.vendor_id, self.product_id))
    }
}

/// Whether a descriptor is a generic-desktop keyboard (usage page 1, usage 6).
///
/// Every call site that needs to decide "is this a keyboard" goes through
/// this function.
pub fn is_keyboard(descriptor: &HidDeviceDescriptor) -> bool {
    descriptor.usage_page == USAGE_PAGE_GENERIC_DESKTOP && descriptor.usage == USAGE_KEYBOARD
}

/// Filter a raw snapshot down to keyboards, one entry per device path.
///
/// Platforms may report the same path more than once (one entry per
/// top-level collection); the first occurrence wins and snapshot order is
/// preserved.
pub fn keyboards<I>(devices: I) -> Vec<HidDeviceDescriptor>
where
    I: IntoIterator<Item = HidDeviceDescriptor>,
{
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for device in devices {
        if !is_keyboard(&device) {
            continue;
        }
        if !seen.insert(device.path.clone()) {
            debug!(path = %device.path, "Dropping duplicate keyboard descriptor");
            continue;
        }
        result.push(device);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::USAGE_MOUSE;

    #[test]
    fn test_descriptor_creation() {
        let info = HidDeviceDescriptor::keyboard(0x046d, 0xc31c, "/dev/hidraw0");
        assert_eq!(info.vendor_id, 0x046d);
        assert!(info.matches(0x046d, 0xc31c));
        assert!(!info.matches(0x046d, 0x9999));
        assert!(is_keyboard(&info));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let info = HidDeviceDescriptor::keyboard(0x1234, 0x5678, "/dev/hidraw0")
            .with_product_name("K120");
        assert_eq!(info.display_name(), "K120");

        let info = HidDeviceDescriptor::keyboard(0x1234, 0x5678, "/dev/hidraw0")
            .with_manufacturer("Logitech");
        assert_eq!(info.display_name(), "Logitech");

        let info = HidDeviceDescriptor::keyboard(0x1234, 0x5678, "/dev/hidraw0");
        assert_eq!(info.display_name(), "1234:5678");
    }

    #[test]
    fn test_mouse_is_not_keyboard() {
        let mouse = HidDeviceDescriptor::new(0x046d, 0xc077, "/dev/hidraw1")
            .with_usage(USAGE_PAGE_GENERIC_DESKTOP, USAGE_MOUSE);
        assert!(!is_keyboard(&mouse));
    }

    #[test]
    fn test_keyboard_usage_on_other_page_is_not_keyboard() {
        let consumer = HidDeviceDescriptor::new(0x046d, 0xc31c, "/dev/hidraw2").with_usage(0x0c, 0x06);
        assert!(!is_keyboard(&consumer));
    }

    #[test]
    fn test_keyboards_dedups_by_path() {
        let devices = vec![
            HidDeviceDescriptor::keyboard(1, 1, "/dev/hidraw0").with_interface_number(0),
            HidDeviceDescriptor::keyboard(1, 1, "/dev/hidraw0").with_interface_number(1),
            HidDeviceDescriptor::keyboard(2, 2, "/dev/hidraw1"),
        ];
        let filtered = keyboards(devices);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.first().map(|d| d.interface_number), Some(Some(0)));
    }

    #[test]
    fn test_validate_rejects_blank_path() {
        let result = HidDeviceDescriptor::keyboard(1, 1, "  ").validate();
        assert!(matches!(result, Err(DeviceError::InvalidDescriptor(_))));
    }
}
