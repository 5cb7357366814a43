//! Device registry
//!
//! The registry owns every [`Keyboard`] and is the only writer of their
//! state. Both the enumeration monitor and the input readers touch it, so all
//! access goes through one `RwLock`; no operation awaits or blocks on I/O
//! while holding it.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::diff;
use crate::{ConnectionState, Keyboard, KeyboardId, LifecycleEvent};
use keymux_errors::StateError;
use keymux_hid::{HidDeviceDescriptor, keyboards};

#[derive(Default)]
struct RegistryInner {
    by_id: HashMap<KeyboardId, Keyboard>,
    by_path: HashMap<String, KeyboardId>,
}

impl RegistryInner {
    fn insert(&mut self, keyboard: Keyboard) -> Keyboard {
        self.by_path
            .insert(keyboard.device_path().to_string(), keyboard.id().clone());
        self.by_id.insert(keyboard.id().clone(), keyboard.clone());
        keyboard
    }

    fn connected_paths(&self) -> BTreeSet<String> {
        self.by_id
            .values()
            .filter(|k| k.is_connected())
            .map(|k| k.device_path().to_string())
            .collect()
    }

    fn find_by_path_mut(&mut self, path: &str) -> Option<&mut Keyboard> {
        let id = self.by_path.get(path)?;
        self.by_id.get_mut(id)
    }
}

/// Aggregate input statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_keyboards: usize,
    pub connected_keyboards: usize,
    pub total_inputs: u64,
    pub average_inputs_per_keyboard: f64,
    pub most_active: Option<KeyboardId>,
}

/// Authoritative store of known keyboards.
#[derive(Default)]
pub struct KeyboardRegistry {
    inner: RwLock<RegistryInner>,
}

impl KeyboardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keyboard. Registering a device path that is already known
    /// returns the existing entity unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DuplicateKeyboardId`] when the id is already
    /// taken by a keyboard at a different path.
    pub fn register(&self, keyboard: Keyboard) -> Result<Keyboard, StateError> {
        let mut inner = self.inner.write();

        if let Some(existing) = inner
            .by_path
            .get(keyboard.device_path())
            .and_then(|id| inner.by_id.get(id))
        {
            return Ok(existing.clone());
        }

        if inner.by_id.contains_key(keyboard.id()) {
            return Err(StateError::DuplicateKeyboardId(keyboard.id().to_string()));
        }

        info!(
            keyboard_id = %keyboard.id(),
            path = %keyboard.device_path(),
            "Registered keyboard"
        );
        Ok(inner.insert(keyboard))
    }

    pub fn find_by_id(&self, id: &KeyboardId) -> Option<Keyboard> {
        self.inner.read().by_id.get(id).cloned()
    }

    /// Like [`find_by_id`](Self::find_by_id) but unknown ids are an error.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::KeyboardNotFound`] for unknown ids.
    pub fn get(&self, id: &KeyboardId) -> Result<Keyboard, StateError> {
        self.find_by_id(id)
            .ok_or_else(|| StateError::keyboard_not_found(id.as_str()))
    }

    pub fn find_by_device_path(&self, path: &str) -> Option<Keyboard> {
        let inner = self.inner.read();
        inner
            .by_path
            .get(path)
            .and_then(|id| inner.by_id.get(id))
            .cloned()
    }

    /// Every known keyboard, ordered by id.
    pub fn find_all(&self) -> Vec<Keyboard> {
        self.collect(|_| true)
    }

    pub fn find_connected(&self) -> Vec<Keyboard> {
        self.collect(Keyboard::is_connected)
    }

    /// Keyboards from one vendor, optionally narrowed to one product.
    pub fn find_by_vendor_product(&self, vendor_id: u16, product_id: Option<u16>) -> Vec<Keyboard> {
        self.collect(|k| {
            k.vendor_id() == vendor_id && product_id.is_none_or(|pid| k.product_id() == pid)
        })
    }

    /// Set a keyboard's connection state. Returns whether it changed.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::KeyboardNotFound`] for unknown ids.
    pub fn update_connection_state(
        &self,
        id: &KeyboardId,
        state: ConnectionState,
    ) -> Result<bool, StateError> {
        let mut inner = self.inner.write();
        let keyboard = inner
            .by_id
            .get_mut(id)
            .ok_or_else(|| StateError::keyboard_not_found(id.as_str()))?;
        let changed = keyboard.set_connection_state(state);
        if changed {
            debug!(keyboard_id = %id, ?state, "Connection state changed");
        }
        Ok(changed)
    }

    /// Count one accepted key input and advance the last-input timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::KeyboardNotFound`] for unknown ids.
    pub fn record_input(&self, id: &KeyboardId, timestamp: DateTime<Utc>) -> Result<(), StateError> {
        let mut inner = self.inner.write();
        let keyboard = inner
            .by_id
            .get_mut(id)
            .ok_or_else(|| StateError::keyboard_not_found(id.as_str()))?;
        keyboard.record_input(timestamp);
        Ok(())
    }

    /// Remove a keyboard and forget its history.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::KeyboardNotFound`] for unknown ids.
    pub fn unregister(&self, id: &KeyboardId) -> Result<Keyboard, StateError> {
        let mut inner = self.inner.write();
        let keyboard = inner
            .by_id
            .remove(id)
            .ok_or_else(|| StateError::keyboard_not_found(id.as_str()))?;
        inner.by_path.remove(keyboard.device_path());
        info!(keyboard_id = %id, "Unregistered keyboard");
        Ok(keyboard)
    }

    pub fn exists(&self, id: &KeyboardId) -> bool {
        self.inner.read().by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> RegistryStats {
        let inner = self.inner.read();
        let total_keyboards = inner.by_id.len();
        let connected_keyboards = inner.by_id.values().filter(|k| k.is_connected()).count();
        let total_inputs = inner
            .by_id
            .values()
            .map(Keyboard::input_count)
            .fold(0u64, u64::saturating_add);

        #[allow(
            clippy::cast_precision_loss,
            reason = "counts far below 2^52 are exact in f64"
        )]
        let average_inputs_per_keyboard = if total_keyboards == 0 {
            0.0
        } else {
            total_inputs as f64 / total_keyboards as f64
        };

        let most_active = inner
            .by_id
            .values()
            .filter(|k| k.input_count() > 0)
            .max_by(|a, b| {
                a.input_count()
                    .cmp(&b.input_count())
                    .then_with(|| b.id().cmp(a.id()))
            })
            .map(|k| k.id().clone());

        RegistryStats {
            total_keyboards,
            connected_keyboards,
            total_inputs,
            average_inputs_per_keyboard,
            most_active,
        }
    }

    /// Apply one enumeration pass against a raw snapshot.
    ///
    /// The snapshot goes through the keyboard filter and path deduplication,
    /// is diffed against the connected set and applied, all under a single
    /// write lock. Returns the lifecycle events in the order applied:
    /// connections in snapshot order, then disconnections sorted by path.
    pub fn reconcile(&self, snapshot: Vec<HidDeviceDescriptor>) -> Vec<LifecycleEvent> {
        let current = keyboards(snapshot);
        let mut inner = self.inner.write();
        let plan = diff::plan(&current, &inner.connected_paths());
        if plan.is_empty() {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(plan.appeared.len() + plan.vanished.len());

        for descriptor in plan.appeared {
            let keyboard = if let Some(known) = inner.find_by_path_mut(&descriptor.path) {
                known.set_connection_state(ConnectionState::Connected);
                info!(keyboard_id = %known.id(), path = %descriptor.path, "Keyboard reconnected");
                known.clone()
            } else {
                let mut keyboard = Keyboard::from_descriptor(descriptor);
                if inner.by_id.contains_key(keyboard.id()) {
                    let id = KeyboardId::generate();
                    warn!(
                        path = %descriptor.path,
                        colliding = %keyboard.id(),
                        assigned = %id,
                        "Path-derived keyboard id collides, assigning a generated id"
                    );
                    keyboard = Keyboard::with_id(id, descriptor);
                }
                info!(
                    keyboard_id = %keyboard.id(),
                    path = %descriptor.path,
                    vendor_id = descriptor.vendor_id,
                    product_id = descriptor.product_id,
                    "Keyboard connected"
                );
                inner.insert(keyboard)
            };
            events.push(LifecycleEvent::Connected(keyboard));
        }

        for path in plan.vanished {
            if let Some(keyboard) = inner.find_by_path_mut(&path) {
                keyboard.set_connection_state(ConnectionState::Disconnected);
                info!(keyboard_id = %keyboard.id(), path = %path, "Keyboard disconnected");
                events.push(LifecycleEvent::Disconnected(keyboard.id().clone()));
            }
        }

        events
    }

    fn collect(&self, predicate: impl Fn(&Keyboard) -> bool) -> Vec<Keyboard> {
        let inner = self.inner.read();
        let mut found: Vec<Keyboard> = inner
            .by_id
            .values()
            .filter(|&k| predicate(k))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id().cmp(b.id()));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb(vid: u16, pid: u16, path: &str) -> HidDeviceDescriptor {
        HidDeviceDescriptor::keyboard(vid, pid, path)
    }

    #[test]
    fn test_register_is_idempotent_by_path() -> Result<(), StateError> {
        let registry = KeyboardRegistry::new();
        let first = registry.register(Keyboard::from_descriptor(&kb(1, 1, "/dev/hidraw0")))?;
        let again = registry.register(Keyboard::with_id(
            KeyboardId::generate(),
            &kb(1, 1, "/dev/hidraw0"),
        ))?;
        assert_eq!(again.id(), first.id());
        assert_eq!(registry.len(), 1);
        Ok(())
    }

    #[test]
    fn test_register_rejects_id_clash() -> Result<(), StateError> {
        let registry = KeyboardRegistry::new();
        let keyboard = registry.register(Keyboard::from_descriptor(&kb(1, 1, "/dev/hidraw0")))?;
        let clash = Keyboard::with_id(keyboard.id().clone(), &kb(1, 1, "/dev/hidraw1"));
        assert!(matches!(
            registry.register(clash),
            Err(StateError::DuplicateKeyboardId(_))
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_ids_fail() {
        let registry = KeyboardRegistry::new();
        let id = KeyboardId::from_device_path("/dev/nothing");
        assert!(registry.find_by_id(&id).is_none());
        assert!(matches!(registry.get(&id), Err(StateError::KeyboardNotFound(_))));
        assert!(matches!(
            registry.unregister(&id),
            Err(StateError::KeyboardNotFound(_))
        ));
        assert!(matches!(
            registry.update_connection_state(&id, ConnectionState::Disconnected),
            Err(StateError::KeyboardNotFound(_))
        ));
        assert!(registry.record_input(&id, Utc::now()).is_err());
    }

    #[test]
    fn test_queries() -> Result<(), StateError> {
        let registry = KeyboardRegistry::new();
        let a = registry.register(Keyboard::from_descriptor(&kb(0x046d, 0xc31c, "/dev/hidraw0")))?;
        registry.register(Keyboard::from_descriptor(&kb(0x046d, 0xc534, "/dev/hidraw1")))?;
        registry.register(Keyboard::from_descriptor(&kb(0x04d9, 0x0006, "/dev/hidraw2")))?;
        registry.update_connection_state(a.id(), ConnectionState::Disconnected)?;

        assert_eq!(registry.find_all().len(), 3);
        assert_eq!(registry.find_connected().len(), 2);
        assert_eq!(registry.find_by_vendor_product(0x046d, None).len(), 2);
        assert_eq!(registry.find_by_vendor_product(0x046d, Some(0xc534)).len(), 1);
        assert!(registry.find_by_vendor_product(0xffff, None).is_empty());
        assert_eq!(
            registry.find_by_device_path("/dev/hidraw0").map(|k| k.id().clone()),
            Some(a.id().clone())
        );
        assert!(registry.exists(a.id()));
        Ok(())
    }

    #[test]
    fn test_unregister_frees_path() -> Result<(), StateError> {
        let registry = KeyboardRegistry::new();
        let keyboard = registry.register(Keyboard::from_descriptor(&kb(1, 1, "/dev/hidraw0")))?;
        registry.unregister(keyboard.id())?;
        assert!(!registry.exists(keyboard.id()));
        assert!(registry.find_by_device_path("/dev/hidraw0").is_none());
        assert!(registry.is_empty());
        Ok(())
    }

    #[test]
    fn test_stats_use_real_counters() -> Result<(), StateError> {
        let registry = KeyboardRegistry::new();
        let a = registry.register(Keyboard::from_descriptor(&kb(1, 1, "/dev/hidraw0")))?;
        let b = registry.register(Keyboard::from_descriptor(&kb(1, 1, "/dev/hidraw1")))?;
        for _ in 0..3 {
            registry.record_input(a.id(), Utc::now())?;
        }
        registry.record_input(b.id(), Utc::now())?;

        let stats = registry.stats();
        assert_eq!(stats.total_keyboards, 2);
        assert_eq!(stats.total_inputs, 4);
        assert!((stats.average_inputs_per_keyboard - 2.0).abs() < f64::EPSILON);
        assert_eq!(stats.most_active.as_ref(), Some(a.id()));
        Ok(())
    }

    #[test]
    fn test_stats_empty_registry() {
        let stats = KeyboardRegistry::new().stats();
        assert_eq!(stats.total_keyboards, 0);
        assert!(stats.average_inputs_per_keyboard.abs() < f64::EPSILON);
        assert!(stats.most_active.is_none());
    }

    #[test]
    fn test_reconcile_connects_disconnects_and_reconnects() {
        let registry = KeyboardRegistry::new();

        let events = registry.reconcile(vec![kb(1, 1, "/dev/hidraw0"), kb(1, 1, "/dev/hidraw1")]);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(e, LifecycleEvent::Connected(_))));

        let events = registry.reconcile(vec![kb(1, 1, "/dev/hidraw1")]);
        let gone = KeyboardId::from_device_path("/dev/hidraw0");
        assert_eq!(events, vec![LifecycleEvent::Disconnected(gone.clone())]);
        assert_eq!(registry.len(), 2, "disconnect keeps the entity");

        let events = registry.reconcile(vec![kb(1, 1, "/dev/hidraw0"), kb(1, 1, "/dev/hidraw1")]);
        assert_eq!(events.len(), 1);
        assert_eq!(events.first().map(LifecycleEvent::keyboard_id), Some(&gone));
    }

    #[test]
    fn test_reconcile_filters_and_dedups() {
        let registry = KeyboardRegistry::new();
        let mouse = HidDeviceDescriptor::new(1, 2, "/dev/hidraw5").with_usage(1, 2);
        let events = registry.reconcile(vec![
            kb(1, 1, "/dev/hidraw0"),
            mouse,
            kb(1, 1, "/dev/hidraw0"),
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reconcile_steady_state_is_silent() {
        let registry = KeyboardRegistry::new();
        let snapshot = vec![kb(1, 1, "/dev/hidraw0")];
        assert_eq!(registry.reconcile(snapshot.clone()).len(), 1);
        assert!(registry.reconcile(snapshot).is_empty());
    }
}
