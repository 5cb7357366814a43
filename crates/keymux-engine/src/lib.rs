//! Multi-keyboard detection and input demultiplexing
//!
//! - [`KeyboardRegistry`] holds every known keyboard and its connection state
//! - [`EnumerationMonitor`] diffs periodic HID snapshots into lifecycle events
//! - [`InputDemultiplexer`] reads several keyboards at once and tags every
//!   key press with the keyboard that produced it
//! - [`EventBus`] fans lifecycle and key-input events out to observers
//! - [`KeyboardService`] wires all of the above over one [`HidPort`]
//!
//! [`HidPort`]: keymux_hid::HidPort

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod bus;
pub mod config;
pub mod demux;
pub mod diff;
pub mod events;
pub mod id;
pub mod keyboard;
pub mod monitor;
pub mod registry;
pub mod service;

pub use bus::{EventBus, Subscription};
pub use config::{EnumerationConfig, EnumerationFailurePolicy, KeyMuxConfig, ListenerConfig};
pub use demux::{InputDemultiplexer, ListenerCallbacks, ListenerFault, ListeningSession};
pub use events::{KeyInput, KeyboardEvent, KeyboardInfo, LifecycleEvent};
pub use id::KeyboardId;
pub use keyboard::{ConnectionState, Keyboard};
pub use monitor::EnumerationMonitor;
pub use registry::{KeyboardRegistry, RegistryStats};
pub use service::KeyboardService;
