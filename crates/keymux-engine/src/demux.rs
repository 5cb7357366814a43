//! Raw input demultiplexer
//!
//! One blocking reader per keyboard, each on its own `spawn_blocking` thread
//! so a stalled device cannot hold up the others. Readers share nothing but
//! the session gate and the live set; a fault in one stream only ends that
//! stream.
//!
//! The gate is read-locked for the whole dispatch of a report and
//! write-locked by `stop_listening`, so once stopping has flipped it no
//! reader starts another dispatch. Callbacks therefore must not call back
//! into `stop_listening`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::ListenerConfig;
use crate::{KeyInput, Keyboard, KeyboardId};
use keymux_boot_protocol::{BOOT_REPORT_SIZE, BootKeyboardReport};
use keymux_errors::{DeviceError, Result, StateError};
use keymux_hid::{HidPort, HidReportStream};

pub type KeyInputHandler = Arc<dyn Fn(KeyInput) + Send + Sync>;
pub type FaultHandler = Arc<dyn Fn(ListenerFault) + Send + Sync>;

/// A device-scoped failure: an open that failed or a stream that died.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFault {
    pub keyboard_id: KeyboardId,
    pub error: DeviceError,
}

/// Handlers invoked from reader threads.
#[derive(Clone)]
pub struct ListenerCallbacks {
    pub on_key_input: KeyInputHandler,
    pub on_error: FaultHandler,
}

impl ListenerCallbacks {
    pub fn new(
        on_key_input: impl Fn(KeyInput) + Send + Sync + 'static,
        on_error: impl Fn(ListenerFault) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_key_input: Arc::new(on_key_input),
            on_error: Arc::new(on_error),
        }
    }
}

/// Description of a started session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListeningSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Keyboards whose stream opened, in request order.
    pub keyboards: Vec<KeyboardId>,
    /// Keyboards left out because their stream did not open.
    pub open_failures: Vec<ListenerFault>,
}

struct ActiveSession {
    session: ListeningSession,
    gate: Arc<RwLock<bool>>,
    readers: Vec<JoinHandle<()>>,
}

type LiveSet = Arc<RwLock<HashMap<KeyboardId, Keyboard>>>;

/// Fans raw report streams from several keyboards into tagged key inputs.
pub struct InputDemultiplexer {
    port: Arc<dyn HidPort>,
    config: ListenerConfig,
    active: Mutex<Option<ActiveSession>>,
    listening: AtomicBool,
    live: LiveSet,
}

impl InputDemultiplexer {
    pub fn new(port: Arc<dyn HidPort>, config: ListenerConfig) -> Self {
        Self {
            port,
            config,
            active: Mutex::new(None),
            listening: AtomicBool::new(false),
            live: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Open a stream per keyboard and start reading.
    ///
    /// Keyboards whose stream fails to open are reported through `on_error`
    /// and left out; the rest proceed. Duplicate keyboards are read once.
    ///
    /// # Errors
    ///
    /// - [`StateError::AlreadyListening`] while a session is active
    /// - [`StateError::NoKeyboardsRequested`] for an empty set
    /// - [`DeviceError::AllOpensFailed`] when no stream could be opened
    pub async fn start_listening(
        &self,
        keyboards: Vec<Keyboard>,
        callbacks: ListenerCallbacks,
    ) -> Result<ListeningSession> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(StateError::AlreadyListening.into());
        }

        let mut seen = HashSet::new();
        let keyboards: Vec<Keyboard> = keyboards
            .into_iter()
            .filter(|k| seen.insert(k.id().clone()))
            .collect();
        if keyboards.is_empty() {
            return Err(StateError::NoKeyboardsRequested.into());
        }

        let attempted = keyboards.len();
        let mut opened: Vec<(Keyboard, Box<dyn HidReportStream>)> = Vec::with_capacity(attempted);
        let mut open_failures = Vec::new();

        for keyboard in keyboards {
            match self.port.open_stream(keyboard.device_path()).await {
                Ok(stream) => {
                    debug!(keyboard_id = %keyboard.id(), path = %keyboard.device_path(), "Opened keyboard stream");
                    opened.push((keyboard, stream));
                }
                Err(error) => {
                    warn!(
                        keyboard_id = %keyboard.id(),
                        path = %keyboard.device_path(),
                        error = %error,
                        "Failed to open keyboard stream"
                    );
                    let fault = ListenerFault {
                        keyboard_id: keyboard.id().clone(),
                        error,
                    };
                    (callbacks.on_error)(fault.clone());
                    open_failures.push(fault);
                }
            }
        }

        if opened.is_empty() {
            return Err(DeviceError::AllOpensFailed {
                attempted,
                failures: open_failures.into_iter().map(|f| f.error).collect(),
            }
            .into());
        }

        {
            let mut live = self.live.write();
            live.clear();
            for (keyboard, _) in &opened {
                live.insert(keyboard.id().clone(), keyboard.clone());
            }
        }

        let gate = Arc::new(RwLock::new(true));
        let timeout_ms = self.config.read_timeout_ms();
        let buffer_size = self.config.report_buffer_size.max(BOOT_REPORT_SIZE);

        let mut ids = Vec::with_capacity(opened.len());
        let mut readers = Vec::with_capacity(opened.len());
        for (keyboard, stream) in opened {
            ids.push(keyboard.id().clone());
            let reader = Reader {
                keyboard_id: keyboard.id().clone(),
                stream,
                gate: Arc::clone(&gate),
                live: Arc::clone(&self.live),
                callbacks: callbacks.clone(),
                timeout_ms,
                buffer_size,
            };
            readers.push(tokio::task::spawn_blocking(move || reader.run()));
        }

        let session = ListeningSession {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            keyboards: ids,
            open_failures,
        };
        info!(
            session_id = %session.id,
            listening = session.keyboards.len(),
            failed = session.open_failures.len(),
            "Listening session started"
        );

        *active = Some(ActiveSession {
            session: session.clone(),
            gate,
            readers,
        });
        self.listening.store(true, Ordering::SeqCst);
        Ok(session)
    }

    /// Stop every reader and release every stream. A no-op when idle.
    ///
    /// Returns the stopped session, if there was one. When this returns,
    /// all readers have exited and no further callbacks will run.
    pub async fn stop_listening(&self) -> Option<ListeningSession> {
        let mut active = self.active.lock().await;
        let session = active.take()?;
        self.listening.store(false, Ordering::SeqCst);

        // Waits for any dispatch in flight.
        *session.gate.write() = false;

        for reader in session.readers {
            if let Err(e) = reader.await {
                warn!(error = %e, "Keyboard reader ended abnormally");
            }
        }
        self.live.write().clear();

        info!(session_id = %session.session.id, "Listening session stopped");
        Some(session.session)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Keyboards with a live reader, ordered by id. Keyboards whose stream
    /// failed drop out of this list.
    pub fn listening_keyboards(&self) -> Vec<Keyboard> {
        let mut keyboards: Vec<Keyboard> = self.live.read().values().cloned().collect();
        keyboards.sort_by(|a, b| a.id().cmp(b.id()));
        keyboards
    }

    pub async fn current_session(&self) -> Option<ListeningSession> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.session.clone())
    }
}

impl Drop for InputDemultiplexer {
    fn drop(&mut self) {
        // Readers notice within one poll interval and release their streams.
        if let Some(active) = self.active.get_mut() {
            *active.gate.write() = false;
        }
    }
}

struct Reader {
    keyboard_id: KeyboardId,
    stream: Box<dyn HidReportStream>,
    gate: Arc<RwLock<bool>>,
    live: LiveSet,
    callbacks: ListenerCallbacks,
    timeout_ms: i32,
    buffer_size: usize,
}

impl Reader {
    fn run(mut self) {
        let mut buf = vec![0u8; self.buffer_size];
        debug!(keyboard_id = %self.keyboard_id, path = %self.stream.path(), "Reader started");

        loop {
            if !*self.gate.read() {
                break;
            }

            match self.stream.read_report(&mut buf, self.timeout_ms) {
                Ok(0) => {}
                Ok(len) => {
                    let frame = buf.get(..len).unwrap_or_default();
                    if !self.dispatch(frame) {
                        break;
                    }
                }
                Err(error) => {
                    let open = self.gate.read();
                    if *open {
                        if error.is_device_unavailable() {
                            info!(keyboard_id = %self.keyboard_id, error = %error, "Keyboard went away, closing its stream");
                        } else {
                            warn!(keyboard_id = %self.keyboard_id, error = %error, "Keyboard stream failed, closing it");
                        }
                        (self.callbacks.on_error)(ListenerFault {
                            keyboard_id: self.keyboard_id.clone(),
                            error,
                        });
                    }
                    break;
                }
            }
        }

        self.live.write().remove(&self.keyboard_id);
        if let Err(e) = self.stream.close() {
            debug!(keyboard_id = %self.keyboard_id, error = %e, "Stream close failed");
        }
        debug!(keyboard_id = %self.keyboard_id, "Reader stopped");
    }

    /// Decode one frame and hand its key presses to the callback. Returns
    /// `false` once the session is closed.
    fn dispatch(&self, frame: &[u8]) -> bool {
        let report = match BootKeyboardReport::parse(frame) {
            Ok(report) => report,
            Err(e) => {
                debug!(keyboard_id = %self.keyboard_id, error = %e, "Dropping malformed report");
                return true;
            }
        };

        let presses = report.key_presses();
        if presses.is_empty() {
            trace!(keyboard_id = %self.keyboard_id, "Release or rollover report");
            return true;
        }

        let timestamp = Utc::now();
        let open = self.gate.read();
        if !*open {
            return false;
        }
        for press in presses {
            trace!(
                keyboard_id = %self.keyboard_id,
                key = press.key,
                scan_code = press.scan_code,
                "Key input"
            );
            (self.callbacks.on_key_input)(KeyInput {
                keyboard_id: self.keyboard_id.clone(),
                key: press.key.to_string(),
                scan_code: press.scan_code,
                modifiers: report.modifiers,
                timestamp,
            });
        }
        true
    }
}
