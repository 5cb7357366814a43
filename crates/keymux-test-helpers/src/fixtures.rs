//! Descriptor and report fixtures.

use keymux_boot_protocol::{BOOT_REPORT_SIZE, scan_code_for};
use keymux_hid::{HidDeviceDescriptor, USAGE_MOUSE, USAGE_PAGE_GENERIC_DESKTOP};

const VENDOR_ID: u16 = 0x046d;
const PRODUCT_ID: u16 = 0xc31c;

/// Keyboard collection at `/dev/hidraw{slot}`.
pub fn keyboard_descriptor(slot: u8) -> HidDeviceDescriptor {
    HidDeviceDescriptor::keyboard(VENDOR_ID, PRODUCT_ID, format!("/dev/hidraw{slot}"))
        .with_manufacturer("Logitech")
        .with_product_name(format!("USB Keyboard {slot}"))
}

/// Mouse collection at `/dev/hidraw{slot}`.
pub fn mouse_descriptor(slot: u8) -> HidDeviceDescriptor {
    HidDeviceDescriptor::new(VENDOR_ID, 0xc077, format!("/dev/hidraw{slot}"))
        .with_usage(USAGE_PAGE_GENERIC_DESKTOP, USAGE_MOUSE)
}

/// Consumer-control collection (media keys) sharing a keyboard's vendor.
pub fn consumer_control_descriptor(slot: u8) -> HidDeviceDescriptor {
    HidDeviceDescriptor::new(VENDOR_ID, PRODUCT_ID, format!("/dev/hidraw{slot}"))
        .with_usage(0x0c, 0x01)
}

/// Boot report holding `codes` in the key slots, up to six.
pub fn key_report(modifiers: u8, codes: &[u8]) -> [u8; BOOT_REPORT_SIZE] {
    let mut report = [0u8; BOOT_REPORT_SIZE];
    report[0] = modifiers;
    for (slot, code) in report.iter_mut().skip(2).zip(codes) {
        *slot = *code;
    }
    report
}

/// Boot report pressing the named keys.
///
/// # Panics
///
/// Panics if a name is not in the scan-code table.
pub fn rollover_report(keys: &[&str]) -> [u8; BOOT_REPORT_SIZE] {
    let codes: Vec<u8> = keys
        .iter()
        .map(|key| scan_code_for(key).unwrap_or_else(|| panic!("no scan code for {key:?}")))
        .collect();
    key_report(0, &codes)
}

/// All keys released.
pub fn release_report() -> [u8; BOOT_REPORT_SIZE] {
    [0; BOOT_REPORT_SIZE]
}
