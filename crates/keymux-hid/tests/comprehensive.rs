//! Integration tests for the keymux-hid crate.
//!
//! Covers the keyboard filter, snapshot deduplication, descriptor
//! serialization and the mock port's stream lifecycle.

use keymux_hid::{
    DeviceError, HidDeviceDescriptor, HidPort, USAGE_KEYBOARD, USAGE_MOUSE,
    USAGE_PAGE_GENERIC_DESKTOP, is_keyboard, keyboards, mock::MockHidPort,
};
use proptest::prelude::*;

fn arb_descriptor() -> impl Strategy<Value = HidDeviceDescriptor> {
    (
        any::<u16>(),
        any::<u16>(),
        0u8..8,
        prop_oneof![Just(USAGE_PAGE_GENERIC_DESKTOP), Just(0x0c), Just(0xff00), any::<u16>()],
        prop_oneof![Just(USAGE_KEYBOARD), Just(USAGE_MOUSE), any::<u16>()],
    )
        .prop_map(|(vid, pid, slot, page, usage)| {
            HidDeviceDescriptor::new(vid, pid, format!("/dev/hidraw{slot}")).with_usage(page, usage)
        })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    /// A mouse collection is never a keyboard, whatever its vendor/product.
    #[test]
    fn prop_mouse_never_keyboard(vid in any::<u16>(), pid in any::<u16>()) {
        let mouse = HidDeviceDescriptor::new(vid, pid, "/dev/hidraw0")
            .with_usage(USAGE_PAGE_GENERIC_DESKTOP, USAGE_MOUSE);
        prop_assert!(!is_keyboard(&mouse));
    }

    /// The filtered snapshot only holds keyboards, each path at most once.
    #[test]
    fn prop_keyboards_are_filtered_and_unique(devices in proptest::collection::vec(arb_descriptor(), 0..24)) {
        let filtered = keyboards(devices.clone());
        let mut paths = std::collections::HashSet::new();
        for device in &filtered {
            prop_assert!(is_keyboard(device));
            prop_assert!(paths.insert(device.path.clone()), "duplicate path {}", device.path);
        }

        let expected: std::collections::HashSet<_> = devices
            .iter()
            .filter(|d| is_keyboard(d))
            .map(|d| d.path.clone())
            .collect();
        prop_assert_eq!(paths, expected);
    }

    /// Filtering an already filtered snapshot changes nothing.
    #[test]
    fn prop_keyboards_idempotent(devices in proptest::collection::vec(arb_descriptor(), 0..24)) {
        let once = keyboards(devices);
        let twice = keyboards(once.clone());
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn descriptor_serializes_with_optional_fields() -> Result<(), serde_json::Error> {
    let descriptor = HidDeviceDescriptor::keyboard(0x046d, 0xc31c, "/dev/hidraw4")
        .with_manufacturer("Logitech")
        .with_product_name("USB Keyboard");
    let json = serde_json::to_value(&descriptor)?;
    assert_eq!(json["vendor_id"], 0x046d);
    assert_eq!(json["usage_page"], 1);
    assert_eq!(json["usage"], 6);
    assert_eq!(json["product_name"], "USB Keyboard");
    assert!(json["serial_number"].is_null());

    let back: HidDeviceDescriptor = serde_json::from_value(json)?;
    assert_eq!(back, descriptor);
    Ok(())
}

#[tokio::test]
async fn mock_port_snapshot_filters_to_keyboards() -> Result<(), DeviceError> {
    let port = MockHidPort::new();
    port.add_keyboard(0x046d, 0xc31c, "/dev/hidraw0");
    port.add_device(
        HidDeviceDescriptor::new(0x046d, 0xc077, "/dev/hidraw1")
            .with_usage(USAGE_PAGE_GENERIC_DESKTOP, USAGE_MOUSE),
    );
    port.add_keyboard(0x046d, 0xc31c, "/dev/hidraw0");

    let snapshot = port.list_devices().await?;
    assert_eq!(snapshot.len(), 3);

    let filtered = keyboards(snapshot);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered.first().map(|d| d.path.as_str()), Some("/dev/hidraw0"));
    Ok(())
}

#[tokio::test]
async fn mock_port_reopen_replaces_previous_stream() -> Result<(), DeviceError> {
    let port = MockHidPort::new();
    let device = port.add_keyboard(1, 1, "/dev/hidraw0");

    let mut first = port.open_stream("/dev/hidraw0").await?;
    let mut second = port.open_stream("/dev/hidraw0").await?;
    assert_eq!(device.open_stream_count(), 2);

    let mut buf = [0u8; 8];
    assert!(matches!(
        first.read_report(&mut buf, 10),
        Err(DeviceError::Disconnected(_))
    ));

    assert!(device.send_report(&[0, 0, 5, 0, 0, 0, 0, 0]));
    assert_eq!(second.read_report(&mut buf, 100)?, 8);
    Ok(())
}
