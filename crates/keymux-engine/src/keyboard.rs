//! Keyboard entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::KeyboardId;
use keymux_hid::HidDeviceDescriptor;

/// Whether a keyboard was present in the latest enumeration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// A known keyboard and its runtime state.
///
/// Only [`KeyboardRegistry`](crate::KeyboardRegistry) mutates keyboards; the
/// copies handed out by queries are snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyboard {
    id: KeyboardId,
    device_path: String,
    vendor_id: u16,
    product_id: u16,
    manufacturer: Option<String>,
    product: Option<String>,
    connection_state: ConnectionState,
    first_seen_at: DateTime<Utc>,
    last_input_at: Option<DateTime<Utc>>,
    input_count: u64,
}

impl Keyboard {
    /// New connected keyboard with an id derived from the descriptor's path.
    pub fn from_descriptor(descriptor: &HidDeviceDescriptor) -> Self {
        Self::with_id(KeyboardId::from_device_path(&descriptor.path), descriptor)
    }

    /// New connected keyboard with an explicit id.
    pub fn with_id(id: KeyboardId, descriptor: &HidDeviceDescriptor) -> Self {
        Self {
            id,
            device_path: descriptor.path.clone(),
            vendor_id: descriptor.vendor_id,
            product_id: descriptor.product_id,
            manufacturer: descriptor.manufacturer.clone(),
            product: descriptor.product_name.clone(),
            connection_state: ConnectionState::Connected,
            first_seen_at: Utc::now(),
            last_input_at: None,
            input_count: 0,
        }
    }

    pub fn id(&self) -> &KeyboardId {
        &self.id
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.manufacturer.as_deref()
    }

    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state.is_connected()
    }

    pub fn first_seen_at(&self) -> DateTime<Utc> {
        self.first_seen_at
    }

    pub fn last_input_at(&self) -> Option<DateTime<Utc>> {
        self.last_input_at
    }

    pub fn input_count(&self) -> u64 {
        self.input_count
    }

    /// Product string if known, otherwise the vendor/product pair.
    pub fn display_name(&self) -> String {
        match (&self.manufacturer, &self.product) {
            (Some(manufacturer), Some(product)) => format!("{manufacturer} {product}"),
            (None, Some(product)) => product.clone(),
            _ => format!("Keyboard {:04x}:{:04x}", self.vendor_id, self.product_id),
        }
    }

    pub(crate) fn set_connection_state(&mut self, state: ConnectionState) -> bool {
        let changed = self.connection_state != state;
        self.connection_state = state;
        changed
    }

    pub(crate) fn record_input(&mut self, timestamp: DateTime<Utc>) {
        self.input_count = self.input_count.saturating_add(1);
        // Readers on different threads may report slightly out of order.
        if self.last_input_at.is_none_or(|last| timestamp > last) {
            self.last_input_at = Some(timestamp);
        }
    }
}
