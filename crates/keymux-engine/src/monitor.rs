//! Enumeration monitor
//!
//! Two states, `Idle` and `Monitoring`. Starting runs one pass inline and
//! then spawns a periodic task; stopping aborts that task and waits for it.
//! A pass only awaits while waiting for its turn and while listing devices;
//! the registry update and event publication that follow are synchronous,
//! so an aborted pass either did not touch the registry at all or finished
//! doing so.
//!
//! Passes are serialized: an on-demand scan and a periodic pass never
//! interleave, so events reach the bus in the order the snapshots were taken.
//!
//! Disconnects are detected by absence from a snapshot, so the detection
//! latency is bounded by one interval.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::config::{EnumerationConfig, EnumerationFailurePolicy};
use crate::{EventBus, KeyboardEvent, KeyboardRegistry, LifecycleEvent};
use keymux_errors::{DeviceResult, StateError};
use keymux_hid::HidPort;

enum MonitorState {
    Idle,
    Monitoring(JoinHandle<()>),
}

struct PassContext {
    port: Arc<dyn HidPort>,
    registry: Arc<KeyboardRegistry>,
    bus: EventBus,
    on_failure: EnumerationFailurePolicy,
    pass_lock: Mutex<()>,
}

impl PassContext {
    async fn run_pass(&self) -> DeviceResult<Vec<LifecycleEvent>> {
        // Held across list, reconcile and publish.
        let _pass = self.pass_lock.lock().await;

        let snapshot = match self.port.list_devices().await {
            Ok(snapshot) => snapshot,
            Err(e) => match self.on_failure {
                EnumerationFailurePolicy::SkipPass => {
                    warn!(error = %e, "Enumeration failed, skipping pass");
                    return Err(e);
                }
                EnumerationFailurePolicy::TreatAsEmpty => {
                    warn!(error = %e, "Enumeration failed, treating pass as empty");
                    Vec::new()
                }
            },
        };

        let events = self.registry.reconcile(snapshot);
        for event in &events {
            let delivered = self.bus.publish(KeyboardEvent::from(event));
            debug!(keyboard_id = %event.keyboard_id(), delivered, "Published lifecycle event");
        }
        Ok(events)
    }
}

/// Periodic diff of the platform snapshot against the registry.
pub struct EnumerationMonitor {
    context: Arc<PassContext>,
    config: EnumerationConfig,
    state: Mutex<MonitorState>,
}

impl EnumerationMonitor {
    pub fn new(
        port: Arc<dyn HidPort>,
        registry: Arc<KeyboardRegistry>,
        bus: EventBus,
        config: EnumerationConfig,
    ) -> Self {
        Self {
            context: Arc::new(PassContext {
                port,
                registry,
                bus,
                on_failure: config.on_failure,
                pass_lock: Mutex::new(()),
            }),
            config,
            state: Mutex::new(MonitorState::Idle),
        }
    }

    /// Run one pass immediately, in either state.
    ///
    /// # Errors
    ///
    /// Returns the enumeration error when the platform list call fails and
    /// the failure policy is to skip the pass.
    pub async fn scan_once(&self) -> DeviceResult<Vec<LifecycleEvent>> {
        self.context.run_pass().await
    }

    /// Switch to `Monitoring`: one pass now, then one per interval.
    ///
    /// Returns the events of the first pass. A failed first pass does not
    /// prevent monitoring from starting.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::AlreadyMonitoring`] if already monitoring.
    pub async fn start_monitoring(&self) -> Result<Vec<LifecycleEvent>, StateError> {
        let mut state = self.state.lock().await;
        if matches!(*state, MonitorState::Monitoring(_)) {
            return Err(StateError::AlreadyMonitoring);
        }

        let period = self.config.interval();
        info!(interval_ms = self.config.interval_ms, "Starting keyboard monitoring");

        let first = self.context.run_pass().await.unwrap_or_default();

        let context = Arc::clone(&self.context);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = context.run_pass().await {
                    debug!(error = %e, "Pass skipped, retrying next interval");
                }
            }
        });

        *state = MonitorState::Monitoring(handle);
        Ok(first)
    }

    /// Switch back to `Idle`. Returns whether monitoring was active.
    ///
    /// Once this returns no pass is running and none will start.
    pub async fn stop_monitoring(&self) -> bool {
        let mut state = self.state.lock().await;
        let MonitorState::Monitoring(handle) = std::mem::replace(&mut *state, MonitorState::Idle)
        else {
            return false;
        };

        handle.abort();
        if let Err(e) = handle.await {
            if !e.is_cancelled() {
                warn!(error = %e, "Monitor task ended abnormally");
            }
        }
        info!("Stopped keyboard monitoring");
        true
    }

    pub async fn is_monitoring(&self) -> bool {
        matches!(*self.state.lock().await, MonitorState::Monitoring(_))
    }

    pub fn registry(&self) -> &Arc<KeyboardRegistry> {
        &self.context.registry
    }
}
