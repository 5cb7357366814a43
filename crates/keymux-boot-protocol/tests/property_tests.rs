//! Property tests for boot-protocol decoding.

use keymux_boot_protocol::{
    BOOT_REPORT_SIZE, BootKeyboardReport, ERROR_ROLL_OVER, UNKNOWN_KEY, key_name, scan_code_for,
};
use keymux_errors::DeviceError;
use proptest::prelude::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    /// Parsing never panics and succeeds exactly when the frame is long enough.
    #[test]
    fn prop_parse_accepts_only_full_frames(data in proptest::collection::vec(any::<u8>(), 0..32)) {
        let result = BootKeyboardReport::parse(&data);
        if data.len() >= BOOT_REPORT_SIZE {
            prop_assert!(result.is_ok());
        } else {
            let is_malformed = matches!(result, Err(DeviceError::MalformedReport { .. }));
            prop_assert!(is_malformed);
        }
    }

    /// One key press per non-zero slot, in slot order, unless the frame is a phantom.
    #[test]
    fn prop_presses_follow_slot_order(modifiers in any::<u8>(), keys in any::<[u8; 6]>()) {
        let [k0, k1, k2, k3, k4, k5] = keys;
        let frame = [modifiers, 0, k0, k1, k2, k3, k4, k5];
        let report = BootKeyboardReport::parse(&frame).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let presses = report.key_presses();
        if keys.iter().all(|&k| k == ERROR_ROLL_OVER) {
            prop_assert!(presses.is_empty());
        } else {
            let expected: Vec<u8> = keys.iter().copied().filter(|&k| k != 0).collect();
            let actual: Vec<u8> = presses.iter().map(|p| p.scan_code).collect();
            prop_assert_eq!(actual, expected);
        }
        prop_assert_eq!(report.modifiers.bits(), modifiers);
    }

    /// `key_name` is total and `scan_code_for` inverts it for every mapped code.
    #[test]
    fn prop_key_name_round_trips(code in any::<u8>()) {
        let name = key_name(code);
        prop_assert!(!name.is_empty());
        if name != UNKNOWN_KEY {
            prop_assert_eq!(scan_code_for(name), Some(code));
        }
    }
}

#[test]
fn release_frame_has_no_keys() -> Result<(), DeviceError> {
    let report = BootKeyboardReport::parse(&[0; 8])?;
    assert!(report.is_release());
    assert!(report.key_presses().is_empty());
    Ok(())
}

#[test]
fn every_letter_is_mapped() {
    let letters: String = (0x04..=0x1Du8).map(key_name).collect();
    assert_eq!(letters, "abcdefghijklmnopqrstuvwxyz");
}
