//! Keyboard service
//!
//! Owned facade over registry, monitor, demultiplexer and event bus. There is
//! no global instance; callers construct one per HID port and dispose of it
//! when done.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::KeyMuxConfig;
use crate::demux::{InputDemultiplexer, ListenerCallbacks, ListenerFault, ListeningSession};
use crate::{
    EnumerationMonitor, EventBus, Keyboard, KeyboardEvent, KeyboardId, KeyboardRegistry,
    LifecycleEvent, RegistryStats, Subscription,
};
use keymux_errors::{DeviceResult, Result, StateError};
use keymux_hid::{HidDeviceDescriptor, HidPort, keyboards};

pub struct KeyboardService {
    port: Arc<dyn HidPort>,
    registry: Arc<KeyboardRegistry>,
    bus: EventBus,
    monitor: EnumerationMonitor,
    demux: InputDemultiplexer,
}

impl KeyboardService {
    /// Build a service over `port`.
    ///
    /// # Errors
    ///
    /// Fails when `config` does not validate.
    pub fn new(port: Arc<dyn HidPort>, config: KeyMuxConfig) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(KeyboardRegistry::new());
        let bus = EventBus::new();
        let monitor = EnumerationMonitor::new(
            Arc::clone(&port),
            Arc::clone(&registry),
            bus.clone(),
            config.enumeration.clone(),
        );
        let demux = InputDemultiplexer::new(Arc::clone(&port), config.listener.clone());

        Ok(Self {
            port,
            registry,
            bus,
            monitor,
            demux,
        })
    }

    pub fn registry(&self) -> &Arc<KeyboardRegistry> {
        &self.registry
    }

    /// # Errors
    ///
    /// Returns [`StateError::AlreadyMonitoring`] if already monitoring.
    pub async fn start_monitoring(&self) -> Result<Vec<LifecycleEvent>> {
        Ok(self.monitor.start_monitoring().await?)
    }

    pub async fn stop_monitoring(&self) -> bool {
        self.monitor.stop_monitoring().await
    }

    pub async fn is_monitoring(&self) -> bool {
        self.monitor.is_monitoring().await
    }

    /// Run one enumeration pass now.
    ///
    /// # Errors
    ///
    /// Returns the enumeration error when the list call fails and the
    /// failure policy is `skip-pass`.
    pub async fn scan_now(&self) -> DeviceResult<Vec<LifecycleEvent>> {
        self.monitor.scan_once().await
    }

    /// Ad-hoc enumeration through the same keyboard filter the monitor uses.
    /// The registry is not touched.
    ///
    /// # Errors
    ///
    /// Returns the platform's enumeration error.
    pub async fn list_keyboards(&self) -> DeviceResult<Vec<HidDeviceDescriptor>> {
        let snapshot = self.port.list_devices().await?;
        let found = keyboards(snapshot);
        debug!(count = found.len(), "Listed keyboards");
        Ok(found)
    }

    /// Every HID collection the platform reports, unfiltered.
    ///
    /// # Errors
    ///
    /// Returns the platform's enumeration error.
    pub async fn list_all_devices(&self) -> DeviceResult<Vec<HidDeviceDescriptor>> {
        self.port.list_devices().await
    }

    /// Start listening on registered keyboards.
    ///
    /// Accepted inputs are counted in the registry and published as
    /// `key-input` events; per-device faults go to `on_error`.
    ///
    /// # Errors
    ///
    /// Fails for unknown ids and for the demultiplexer's own start errors.
    pub async fn start_listening(
        &self,
        ids: &[KeyboardId],
        on_error: impl Fn(ListenerFault) + Send + Sync + 'static,
    ) -> Result<ListeningSession> {
        let selected = ids
            .iter()
            .map(|id| self.registry.get(id))
            .collect::<std::result::Result<Vec<Keyboard>, StateError>>()?;

        let registry = Arc::clone(&self.registry);
        let bus = self.bus.clone();
        let callbacks = ListenerCallbacks::new(
            move |input| {
                if let Err(e) = registry.record_input(&input.keyboard_id, input.timestamp) {
                    debug!(error = %e, "Input from keyboard no longer registered");
                }
                bus.publish(KeyboardEvent::KeyInput(input));
            },
            on_error,
        );

        self.demux.start_listening(selected, callbacks).await
    }

    pub async fn stop_listening(&self) -> Option<ListeningSession> {
        self.demux.stop_listening().await
    }

    pub fn is_listening(&self) -> bool {
        self.demux.is_listening()
    }

    pub fn listening_keyboards(&self) -> Vec<Keyboard> {
        self.demux.listening_keyboards()
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Stop listening and monitoring. The service stays usable.
    pub async fn dispose(&self) {
        self.demux.stop_listening().await;
        self.monitor.stop_monitoring().await;
        info!("Keyboard service disposed");
    }
}
