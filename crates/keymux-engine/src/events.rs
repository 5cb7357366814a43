//! Outbound events
//!
//! Wire shape delivered to event sinks:
//!
//! ```text
//! {"type":"keyboard-connected","id":"kbd-…","devicePath":"…","vendorId":1133,"productId":49948,"manufacturer":"…","product":"…"}
//! {"type":"keyboard-disconnected","id":"kbd-…"}
//! {"type":"key-input","keyboardId":"kbd-…","key":"a","scanCode":4,"modifiers":0,"timestamp":"2026-01-01T00:00:00Z"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Keyboard, KeyboardId};
use keymux_boot_protocol::Modifiers;

/// Lifecycle transition produced by one enumeration pass.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// A keyboard became present, either for the first time or again.
    Connected(Keyboard),
    /// A previously connected keyboard is gone. Only the id survives.
    Disconnected(KeyboardId),
}

impl LifecycleEvent {
    pub fn keyboard_id(&self) -> &KeyboardId {
        match self {
            Self::Connected(keyboard) => keyboard.id(),
            Self::Disconnected(id) => id,
        }
    }
}

/// Descriptor fields carried by a connected event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardInfo {
    pub id: KeyboardId,
    pub device_path: String,
    pub vendor_id: u16,
    pub product_id: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

impl From<&Keyboard> for KeyboardInfo {
    fn from(keyboard: &Keyboard) -> Self {
        Self {
            id: keyboard.id().clone(),
            device_path: keyboard.device_path().to_string(),
            vendor_id: keyboard.vendor_id(),
            product_id: keyboard.product_id(),
            manufacturer: keyboard.manufacturer().map(str::to_string),
            product: keyboard.product().map(str::to_string),
        }
    }
}

/// One decoded key press attributed to the keyboard that sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInput {
    pub keyboard_id: KeyboardId,
    pub key: String,
    pub scan_code: u8,
    pub modifiers: Modifiers,
    pub timestamp: DateTime<Utc>,
}

/// Everything published on the [`EventBus`](crate::EventBus).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum KeyboardEvent {
    KeyboardConnected(KeyboardInfo),
    KeyboardDisconnected { id: KeyboardId },
    KeyInput(KeyInput),
}

impl KeyboardEvent {
    pub fn keyboard_id(&self) -> &KeyboardId {
        match self {
            Self::KeyboardConnected(info) => &info.id,
            Self::KeyboardDisconnected { id } => id,
            Self::KeyInput(input) => &input.keyboard_id,
        }
    }
}

impl From<&LifecycleEvent> for KeyboardEvent {
    fn from(event: &LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::Connected(keyboard) => Self::KeyboardConnected(keyboard.into()),
            LifecycleEvent::Disconnected(id) => Self::KeyboardDisconnected { id: id.clone() },
        }
    }
}

impl From<KeyInput> for KeyboardEvent {
    fn from(input: KeyInput) -> Self {
        Self::KeyInput(input)
    }
}
