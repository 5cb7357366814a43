//! Keyboard identity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use keymux_errors::ValidationError;

const ID_PREFIX: &str = "kbd-";

/// Stable identifier for one physical keyboard.
///
/// Ids derived from a device path are deterministic, so a keyboard that is
/// unplugged and plugged back into the same port resolves to the same id.
/// Parsed ids are normalised (trimmed, lowercased) before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyboardId(String);

impl KeyboardId {
    /// Deterministic id for a platform device path.
    pub fn from_device_path(path: &str) -> Self {
        let checksum = crc32fast::hash(path.as_bytes());
        Self(format!("{ID_PREFIX}{checksum:08x}"))
    }

    /// Fresh id for a keyboard registered without a stable path.
    pub fn generate() -> Self {
        Self(format!("{ID_PREFIX}{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for KeyboardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for KeyboardId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ValidationError::required("keyboard_id"));
        }

        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::invalid_characters(
                "keyboard_id",
                format!("{s:?} may only contain letters, digits, '-' and '_'"),
            ));
        }

        Ok(Self(normalized))
    }
}

impl TryFrom<String> for KeyboardId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<&str> for KeyboardId {
    type Error = ValidationError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<KeyboardId> for String {
    fn from(id: KeyboardId) -> String {
        id.0
    }
}
