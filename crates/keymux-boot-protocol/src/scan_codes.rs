//! Boot-protocol scan code to key name table.
//!
//! Usage IDs follow the HID Usage Tables, Keyboard/Keypad page (0x07).
//! Anything outside the covered ranges maps to [`UNKNOWN_KEY`].

/// Name returned for scan codes with no entry in the table.
pub const UNKNOWN_KEY: &str = "unknown";

const LETTERS: [&str; 26] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "w", "x", "y", "z",
];

const DIGITS: [&str; 10] = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "0"];

const FUNCTION_KEYS: [&str; 12] = [
    "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
];

/// Logical name for a boot-protocol scan code. Total: never fails.
pub fn key_name(scan_code: u8) -> &'static str {
    let code = usize::from(scan_code);
    match scan_code {
        0x04..=0x1D => LETTERS.get(code - 0x04).copied().unwrap_or(UNKNOWN_KEY),
        0x1E..=0x27 => DIGITS.get(code - 0x1E).copied().unwrap_or(UNKNOWN_KEY),
        0x28 => "enter",
        0x29 => "escape",
        0x2A => "backspace",
        0x2B => "tab",
        0x2C => "space",
        0x2D => "minus",
        0x2E => "equal",
        0x2F => "left-bracket",
        0x30 => "right-bracket",
        0x31 => "backslash",
        0x32 => "non-us-hash",
        0x33 => "semicolon",
        0x34 => "quote",
        0x35 => "grave",
        0x36 => "comma",
        0x37 => "period",
        0x38 => "slash",
        0x39 => "capslock",
        0x3A..=0x45 => FUNCTION_KEYS
            .get(code - 0x3A)
            .copied()
            .unwrap_or(UNKNOWN_KEY),
        0x46 => "print-screen",
        0x47 => "scroll-lock",
        0x48 => "pause",
        0x49 => "insert",
        0x4A => "home",
        0x4B => "page-up",
        0x4C => "delete",
        0x4D => "end",
        0x4E => "page-down",
        0x4F => "right",
        0x50 => "left",
        0x51 => "down",
        0x52 => "up",
        _ => UNKNOWN_KEY,
    }
}

/// Reverse lookup of [`key_name`]. `None` for [`UNKNOWN_KEY`] and names not
/// in the table.
pub fn scan_code_for(name: &str) -> Option<u8> {
    if name == UNKNOWN_KEY {
        return None;
    }
    (0x04..=0x52u8).find(|&code| key_name(code) == name)
}
