//! Property tests for enumeration passes against the registry.

use std::collections::HashSet;

use keymux_engine::{KeyboardId, KeyboardRegistry, LifecycleEvent};
use keymux_hid::{HidDeviceDescriptor, USAGE_KEYBOARD, USAGE_MOUSE, USAGE_PAGE_GENERIC_DESKTOP};
use proptest::prelude::*;

fn arb_descriptor() -> impl Strategy<Value = HidDeviceDescriptor> {
    (
        0u8..6,
        prop_oneof![3 => Just(USAGE_KEYBOARD), 1 => Just(USAGE_MOUSE)],
        any::<u16>(),
    )
        .prop_map(|(slot, usage, pid)| {
            HidDeviceDescriptor::new(0x046d, pid, format!("/dev/hidraw{slot}"))
                .with_usage(USAGE_PAGE_GENERIC_DESKTOP, usage)
        })
}

fn arb_snapshot() -> impl Strategy<Value = Vec<HidDeviceDescriptor>> {
    proptest::collection::vec(arb_descriptor(), 0..12)
}

fn keyboard_paths(snapshot: &[HidDeviceDescriptor]) -> HashSet<String> {
    snapshot
        .iter()
        .filter(|d| d.usage == USAGE_KEYBOARD)
        .map(|d| d.path.clone())
        .collect()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    /// A second pass over an unchanged snapshot emits nothing.
    #[test]
    fn prop_repeated_pass_is_silent(snapshots in proptest::collection::vec(arb_snapshot(), 1..6)) {
        let registry = KeyboardRegistry::new();
        for snapshot in snapshots {
            registry.reconcile(snapshot.clone());
            let again = registry.reconcile(snapshot);
            prop_assert!(again.is_empty(), "unexpected events: {again:?}");
        }
    }

    /// After any pass the connected set equals the keyboard paths of the snapshot.
    #[test]
    fn prop_connected_set_tracks_snapshot(snapshots in proptest::collection::vec(arb_snapshot(), 1..6)) {
        let registry = KeyboardRegistry::new();
        for snapshot in snapshots {
            let expected = keyboard_paths(&snapshot);
            registry.reconcile(snapshot);
            let connected: HashSet<String> = registry
                .find_connected()
                .iter()
                .map(|k| k.device_path().to_string())
                .collect();
            prop_assert_eq!(connected, expected);
        }
    }

    /// Each transition is reported exactly once per pass.
    #[test]
    fn prop_events_match_transitions(before in arb_snapshot(), after in arb_snapshot()) {
        let registry = KeyboardRegistry::new();
        registry.reconcile(before.clone());

        let old = keyboard_paths(&before);
        let new = keyboard_paths(&after);
        let events = registry.reconcile(after);

        let connected = events.iter().filter(|e| matches!(e, LifecycleEvent::Connected(_))).count();
        let disconnected = events.len() - connected;
        prop_assert_eq!(connected, new.difference(&old).count());
        prop_assert_eq!(disconnected, old.difference(&new).count());

        let ids: HashSet<&KeyboardId> = events.iter().map(LifecycleEvent::keyboard_id).collect();
        prop_assert_eq!(ids.len(), events.len());
    }

    /// A path keeps its id across any number of disconnect/reconnect cycles.
    #[test]
    fn prop_identity_is_stable(slot in 0u8..16, cycles in 1usize..5) {
        let registry = KeyboardRegistry::new();
        let snapshot = vec![HidDeviceDescriptor::keyboard(1, 2, format!("/dev/hidraw{slot}"))];

        let first = registry.reconcile(snapshot.clone());
        let id = first.first().map(|e| e.keyboard_id().clone());
        prop_assert!(id.is_some());

        for _ in 0..cycles {
            let gone = registry.reconcile(Vec::new());
            prop_assert_eq!(gone.first().map(|e| e.keyboard_id().clone()), id.clone());
            let back = registry.reconcile(snapshot.clone());
            prop_assert_eq!(back.first().map(|e| e.keyboard_id().clone()), id.clone());
        }
        prop_assert_eq!(registry.len(), 1);
    }
}
