//! Snapshot diffing
//!
//! One enumeration pass compares the paths present in a filtered snapshot
//! against the paths the registry marks connected:
//!
//! | present now | connected before | outcome |
//! |---|---|---|
//! | yes | no  | appeared: register or reconnect, emit connected |
//! | no  | yes | vanished: mark disconnected, emit disconnected |
//! | yes | yes | steady: nothing |
//!
//! Applying a plan and diffing the same snapshot again yields an empty plan.

use std::collections::{BTreeSet, HashSet};

use keymux_hid::HidDeviceDescriptor;

/// Changes one pass has to apply.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DiffPlan<'a> {
    /// Descriptors whose path is not currently connected, in snapshot order.
    pub appeared: Vec<&'a HidDeviceDescriptor>,
    /// Connected paths missing from the snapshot, sorted.
    pub vanished: Vec<String>,
}

impl DiffPlan<'_> {
    pub fn is_empty(&self) -> bool {
        self.appeared.is_empty() && self.vanished.is_empty()
    }
}

/// Diff a deduplicated keyboard snapshot against the connected path set.
pub fn plan<'a>(snapshot: &'a [HidDeviceDescriptor], connected: &BTreeSet<String>) -> DiffPlan<'a> {
    let present: HashSet<&str> = snapshot.iter().map(|d| d.path.as_str()).collect();

    let appeared = snapshot
        .iter()
        .filter(|d| !connected.contains(&d.path))
        .collect();

    let vanished = connected
        .iter()
        .filter(|path| !present.contains(path.as_str()))
        .cloned()
        .collect();

    DiffPlan { appeared, vanished }
}
