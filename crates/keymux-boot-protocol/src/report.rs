//! Boot-protocol report parsing

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{BOOT_REPORT_SIZE, ERROR_ROLL_OVER, KEY_SLOTS, key_name};
use keymux_errors::DeviceResult;
use keymux_hid::ReportParser;

/// Modifier byte of a boot-protocol report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_GUI: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_GUI: u8 = 1 << 7;

    const NAMES: [(u8, &'static str); 8] = [
        (Self::LEFT_CTRL, "left-ctrl"),
        (Self::LEFT_SHIFT, "left-shift"),
        (Self::LEFT_ALT, "left-alt"),
        (Self::LEFT_GUI, "left-gui"),
        (Self::RIGHT_CTRL, "right-ctrl"),
        (Self::RIGHT_SHIFT, "right-shift"),
        (Self::RIGHT_ALT, "right-alt"),
        (Self::RIGHT_GUI, "right-gui"),
    ];

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    pub const fn ctrl(self) -> bool {
        self.contains(Self::LEFT_CTRL) || self.contains(Self::RIGHT_CTRL)
    }

    pub const fn shift(self) -> bool {
        self.contains(Self::LEFT_SHIFT) || self.contains(Self::RIGHT_SHIFT)
    }

    pub const fn alt(self) -> bool {
        self.contains(Self::LEFT_ALT) || self.contains(Self::RIGHT_ALT)
    }

    pub const fn gui(self) -> bool {
        self.contains(Self::LEFT_GUI) || self.contains(Self::RIGHT_GUI)
    }

    /// Names of the held modifiers, left side first.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join("+"))
    }
}

/// A decoded boot-protocol keyboard report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootKeyboardReport {
    pub modifiers: Modifiers,
    pub reserved: u8,
    pub keys: [u8; KEY_SLOTS],
}

/// One pressed key decoded from a report slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub scan_code: u8,
    pub key: &'static str,
}

impl BootKeyboardReport {
    /// Decode the first [`BOOT_REPORT_SIZE`] bytes of a frame.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::MalformedReport` for frames shorter than
    /// [`BOOT_REPORT_SIZE`].
    pub fn parse(data: &[u8]) -> DeviceResult<Self> {
        let mut parser = ReportParser::new(data);
        parser.require(BOOT_REPORT_SIZE)?;

        let modifiers = Modifiers::from_bits(parser.read_u8()?);
        let reserved = parser.read_u8()?;
        let keys = parser.read_array::<KEY_SLOTS>()?;

        Ok(Self {
            modifiers,
            reserved,
            keys,
        })
    }

    /// All six key slots are zero: every key was released.
    pub fn is_release(&self) -> bool {
        self.keys.iter().all(|&k| k == 0)
    }

    /// Every slot holds ErrorRollOver; the key state is unknown.
    pub fn is_phantom(&self) -> bool {
        self.keys.iter().all(|&k| k == ERROR_ROLL_OVER)
    }

    /// Whether this report should produce key events at all.
    pub fn is_actionable(&self) -> bool {
        !self.is_release() && !self.is_phantom()
    }

    /// Non-zero scan codes in slot order.
    pub fn pressed_scan_codes(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys.iter().copied().filter(|&k| k != 0)
    }

    /// One [`KeyPress`] per non-zero slot, empty for non-actionable reports.
    pub fn key_presses(&self) -> Vec<KeyPress> {
        if !self.is_actionable() {
            return Vec::new();
        }
        self.pressed_scan_codes()
            .map(|scan_code| KeyPress {
                scan_code,
                key: key_name(scan_code),
            })
            .collect()
    }

    /// Encode back to the 8-byte wire layout.
    pub fn to_bytes(&self) -> [u8; BOOT_REPORT_SIZE] {
        let [k0, k1, k2, k3, k4, k5] = self.keys;
        [self.modifiers.bits(), self.reserved, k0, k1, k2, k3, k4, k5]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keymux_errors::DeviceError;

    #[test]
    fn test_parse_single_key() -> DeviceResult<()> {
        let report = BootKeyboardReport::parse(&[0, 0, 0x04, 0, 0, 0, 0, 0])?;
        assert!(!report.is_release());
        assert_eq!(
            report.key_presses(),
            vec![KeyPress {
                scan_code: 0x04,
                key: "a"
            }]
        );
        Ok(())
    }

    #[test]
    fn test_release_report_has_no_presses() -> DeviceResult<()> {
        let report = BootKeyboardReport::parse(&[0; 8])?;
        assert!(report.is_release());
        assert!(report.key_presses().is_empty());
        Ok(())
    }

    #[test]
    fn test_modifier_only_report_is_release() -> DeviceResult<()> {
        let report = BootKeyboardReport::parse(&[Modifiers::LEFT_SHIFT, 0, 0, 0, 0, 0, 0, 0])?;
        assert!(report.is_release());
        assert!(report.modifiers.shift());
        Ok(())
    }

    #[test]
    fn test_rollover_report_yields_two_presses() -> DeviceResult<()> {
        let report = BootKeyboardReport::parse(&[0, 0, 0x04, 0x05, 0, 0, 0, 0])?;
        let keys: Vec<_> = report.key_presses().iter().map(|p| p.key).collect();
        assert_eq!(keys, vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn test_zero_slots_between_keys_are_skipped() -> DeviceResult<()> {
        let report = BootKeyboardReport::parse(&[0, 0, 0, 0x06, 0, 0x07, 0, 0])?;
        let codes: Vec<_> = report.pressed_scan_codes().collect();
        assert_eq!(codes, vec![0x06, 0x07]);
        Ok(())
    }

    #[test]
    fn test_phantom_report_is_not_actionable() -> DeviceResult<()> {
        let report = BootKeyboardReport::parse(&[0, 0, 1, 1, 1, 1, 1, 1])?;
        assert!(report.is_phantom());
        assert!(report.key_presses().is_empty());
        Ok(())
    }

    #[test]
    fn test_short_frame_is_malformed() {
        let result = BootKeyboardReport::parse(&[0, 0, 4]);
        assert_eq!(
            result,
            Err(DeviceError::MalformedReport {
                expected: 8,
                actual: 3
            })
        );
    }

    #[test]
    fn test_longer_frame_uses_first_eight_bytes() -> DeviceResult<()> {
        let report = BootKeyboardReport::parse(&[0, 0, 0x04, 0, 0, 0, 0, 0, 0x05, 0x06])?;
        assert_eq!(report.pressed_scan_codes().count(), 1);
        Ok(())
    }

    #[test]
    fn test_modifiers_names() {
        let mods = Modifiers::from_bits(Modifiers::LEFT_CTRL | Modifiers::RIGHT_ALT);
        assert!(mods.ctrl());
        assert!(mods.alt());
        assert!(!mods.gui());
        assert_eq!(mods.to_string(), "left-ctrl+right-alt");
        assert!(Modifiers::default().is_empty());
    }

    #[test]
    fn test_modifiers_serialize_as_bare_byte() -> Result<(), serde_json::Error> {
        let mods = Modifiers::from_bits(Modifiers::LEFT_SHIFT | Modifiers::RIGHT_SHIFT);
        assert_eq!(serde_json::to_string(&mods)?, "34");

        let parsed: Modifiers = serde_json::from_str("5")?;
        assert!(parsed.ctrl());
        assert!(parsed.alt());
        assert!(!parsed.shift());
        assert!(serde_json::from_str::<Modifiers>("256").is_err());
        Ok(())
    }

    #[test]
    fn test_to_bytes_layout() -> DeviceResult<()> {
        let bytes = [0x02, 0, 0x04, 0x05, 0, 0, 0, 0];
        let report = BootKeyboardReport::parse(&bytes)?;
        assert_eq!(report.to_bytes(), bytes);
        Ok(())
    }
}
