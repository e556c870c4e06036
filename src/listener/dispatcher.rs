//! Dispatch engine
//!
//! Consumes the hook's key-event stream one event at a time: updates the
//! held-key sets, resolves qualifying key-downs against the mapping table,
//! executes the bound action, and routes the result to collaborators. No
//! failure may cross this boundary and kill the event loop; doing so would
//! silently disable all future hotkey handling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::actions::ActionRegistry;
use crate::audio::{self, SoundPlayer};
use crate::events::DispatchEvent;
use crate::keys::{KeyDirection, KeyEvent, KeyState};
use crate::mappings::MappingTable;

/// Processes key events against the mapping table.
///
/// Owned by a single task; the key-state sets are touched from nowhere
/// else. The pause flag is shared with the control surface and read before
/// any state mutation, so a pause request racing an in-flight event can
/// never corrupt the held sets.
pub struct Dispatcher {
    key_state: KeyState,
    mappings: Arc<RwLock<MappingTable>>,
    registry: Arc<RwLock<ActionRegistry>>,
    paused: Arc<AtomicBool>,
    pause_observed: bool,
    event_tx: broadcast::Sender<DispatchEvent>,
    sounds: Arc<SoundPlayer>,
}

impl Dispatcher {
    pub fn new(
        mappings: Arc<RwLock<MappingTable>>,
        registry: Arc<RwLock<ActionRegistry>>,
        paused: Arc<AtomicBool>,
        event_tx: broadcast::Sender<DispatchEvent>,
        sounds: Arc<SoundPlayer>,
    ) -> Self {
        Self {
            key_state: KeyState::new(),
            mappings,
            registry,
            paused,
            pause_observed: false,
            event_tx,
            sounds,
        }
    }

    /// Runs the dispatch loop until the hook's channel closes.
    ///
    /// Events are processed strictly in delivery order; an action execution
    /// in progress is never interrupted by shutdown, the loop simply drains
    /// and exits once the sender is gone.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<KeyEvent>) {
        info!("dispatcher started");

        while let Some(event) = event_rx.recv().await {
            self.process_event(event).await;
        }

        info!("dispatcher stopped");
    }

    /// Processes a single key transition.
    pub async fn process_event(&mut self, event: KeyEvent) {
        // The pause flag short-circuits everything: no state update, no
        // resolution. Events missed while paused include key-ups, so the
        // held sets are dropped on the first short-circuited event rather
        // than left stale for after resume.
        if self.paused.load(Ordering::SeqCst) {
            if !self.pause_observed {
                self.pause_observed = true;
                self.key_state.clear();
                debug!("dispatch paused, held keys cleared");
            }
            return;
        }
        self.pause_observed = false;

        let key = self.key_state.update(event);

        // Resolution is gated on a non-modifier key-down; modifier-only
        // combinations never trigger. Auto-repeat downs re-resolve on each
        // repeat, which re-fires the mapped action while the combination is
        // held. Intentional, and covered by tests.
        if event.direction != KeyDirection::Down || key.is_modifier() {
            return;
        }

        let mapping = {
            let table = self.mappings.read().await;
            table
                .resolve(self.key_state.modifier_keys(), self.key_state.keys())
                .cloned()
        };

        let Some(mapping) = mapping else {
            return;
        };

        let action = match self.registry.read().await.get(mapping.action_id) {
            Ok(action) => action,
            Err(e) => {
                // A mapping pointing at a nonexistent action means the
                // configuration is corrupt; abort this dispatch cycle loudly.
                error!(mapping = %mapping.id, %e, "aborting dispatch cycle");
                return;
            }
        };

        debug!(action = action.name(), "executing mapped action");

        // Blocks until the action completes; a slow script serializes all
        // subsequent key processing.
        let result = action.execute();

        if result.success() {
            if let Some(path) = &mapping.completion_sound_path {
                audio::play_completion_sound(&self.sounds, path);
            }

            let _ = self.event_tx.send(DispatchEvent::ActionSucceeded {
                action_name: result.action_name().to_string(),
            });
        } else {
            warn!(
                action = result.action_name(),
                error = result.error(),
                "action failed"
            );
            let _ = self.event_tx.send(DispatchEvent::ActionFailed { result });
        }
    }
}
