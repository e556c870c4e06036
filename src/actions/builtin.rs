//! Built-in code actions
//!
//! Stands in for the plugin host: supplies the ready-made code actions the
//! daemon registers at startup, each with a globally unique stable id.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::{Action, CodeAction};

/// Stable id for the microphone-mute toggle, fixed for the life of the
/// product so existing mappings keep resolving across upgrades.
pub const TOGGLE_MICROPHONE_MUTE_ID: Uuid = Uuid::from_u128(0xe120fdb5_8385_4c8d_8bc5_93fd64466e56);

/// Tracks the mute state toggled by the built-in microphone action.
#[derive(Debug, Default)]
pub struct MicrophoneMute {
    muted: AtomicBool,
}

impl MicrophoneMute {
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn toggle(&self) -> bool {
        let muted = !self.muted.load(Ordering::SeqCst);
        self.muted.store(muted, Ordering::SeqCst);
        muted
    }
}

/// Creates the microphone-mute toggle action over the given shared state.
///
/// The actual input-device mutation lives behind the plugin boundary; this
/// wires the toggle state and logs the transition.
pub fn toggle_microphone_mute(state: Arc<MicrophoneMute>) -> CodeAction {
    CodeAction::new(
        TOGGLE_MICROPHONE_MUTE_ID,
        "Toggle Microphone Mute",
        "Toggles the mute state of the default audio input device.",
        move || {
            let muted = state.toggle();
            info!(muted, "microphone mute toggled");
            Ok(())
        },
    )
}

/// Loads the built-in code actions.
pub fn load_code_actions() -> Vec<Arc<dyn Action>> {
    vec![Arc::new(toggle_microphone_mute(Arc::new(
        MicrophoneMute::default(),
    )))]
}
