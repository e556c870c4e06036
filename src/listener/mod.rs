//! Keyboard listener lifecycle and control surface
//!
//! Ties the native hook to the dispatch engine and exposes the narrow
//! surface other components are allowed to touch: start/stop lifecycle and
//! pause/resume control signals. Internal key state and the mapping table
//! are never exposed for external mutation.

mod dispatcher;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::actions::ActionRegistry;
use crate::audio::SoundPlayer;
use crate::events::DispatchEvent;
use crate::hook::{HookError, KeyboardHook};
use crate::mappings::MappingTable;

pub use dispatcher::Dispatcher;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Coarse lifecycle state reported to the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    Running,
    Paused,
}

impl std::fmt::Display for ListenerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerState::Stopped => write!(f, "Stopped"),
            ListenerState::Running => write!(f, "Running"),
            ListenerState::Paused => write!(f, "Paused"),
        }
    }
}

/// The keyboard listener: global hook plus dispatch task.
///
/// `start` waits only for hook installation to be confirmed; the event pump
/// and dispatch task run concurrently afterward. `stop` uninstalls the hook
/// and drains the dispatch task without interrupting an action already in
/// progress. Both are safe to call repeatedly.
pub struct Listener {
    hook: KeyboardHook,
    paused: Arc<AtomicBool>,
    mappings: Arc<RwLock<MappingTable>>,
    registry: Arc<RwLock<ActionRegistry>>,
    event_tx: broadcast::Sender<DispatchEvent>,
    sounds: Arc<SoundPlayer>,
    dispatch_task: Mutex<Option<JoinHandle<()>>>,
}

impl Listener {
    pub fn new(
        mappings: Arc<RwLock<MappingTable>>,
        registry: Arc<RwLock<ActionRegistry>>,
        event_tx: broadcast::Sender<DispatchEvent>,
        sounds: Arc<SoundPlayer>,
    ) -> Self {
        Self {
            hook: KeyboardHook::new(),
            paused: Arc::new(AtomicBool::new(false)),
            mappings,
            registry,
            event_tx,
            sounds,
            dispatch_task: Mutex::new(None),
        }
    }

    /// Installs the hook and spawns the dispatch task.
    ///
    /// Returns once installation is confirmed; surfaces hook failures to the
    /// caller instead of degrading into a non-functional listener.
    pub fn start(&self) -> Result<(), HookError> {
        let (key_tx, key_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        self.hook.install(key_tx)?;

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.mappings),
            Arc::clone(&self.registry),
            Arc::clone(&self.paused),
            self.event_tx.clone(),
            Arc::clone(&self.sounds),
        );

        let handle = tokio::spawn(dispatcher.run(key_rx));
        *self
            .dispatch_task
            .lock()
            .expect("dispatch task slot poisoned") = Some(handle);

        self.paused.store(false, Ordering::SeqCst);
        info!("keyboard listener started");

        Ok(())
    }

    /// Uninstalls the hook and waits for the dispatch task to drain.
    ///
    /// Idempotent; every exit path releases the hook thread, including after
    /// a partially failed start.
    pub async fn stop(&self) {
        // Joining the hook thread drops the event sender, which lets the
        // dispatch task drain its queue and exit on its own.
        self.hook.uninstall();

        let handle = self
            .dispatch_task
            .lock()
            .expect("dispatch task slot poisoned")
            .take();

        if let Some(handle) = handle {
            let _ = handle.await;
            info!("keyboard listener stopped");
        }
    }

    /// Suspends dispatch without tearing down the hook.
    ///
    /// Thread-safe and idempotent; the flag is consulted at the top of every
    /// event-processing step, last write wins.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        debug!("listener paused");
        let _ = self.event_tx.send(DispatchEvent::ListenerPaused);
    }

    /// Resumes dispatch after a pause.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        debug!("listener resumed");
        let _ = self.event_tx.send(DispatchEvent::ListenerResumed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ListenerState {
        if !self.hook.is_installed() {
            ListenerState::Stopped
        } else if self.is_paused() {
            ListenerState::Paused
        } else {
            ListenerState::Running
        }
    }

    /// Subscribes to dispatch events (failures, successes, pause state).
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.event_tx.subscribe()
    }

    /// Number of mappings in the active table snapshot.
    pub async fn mapping_count(&self) -> usize {
        self.mappings.read().await.len()
    }

    /// Number of registered actions.
    pub async fn action_count(&self) -> usize {
        self.registry.read().await.len()
    }
}
