//! Stub hook for platforms without a keyboard tap backend
//!
//! Keeps the daemon buildable and its dispatch core testable everywhere;
//! installing always fails with [`HookError::Unsupported`].

use tokio::sync::mpsc;

use crate::keys::KeyEvent;

use super::HookError;

pub struct KeyboardHook;

impl KeyboardHook {
    pub fn new() -> Self {
        Self
    }

    pub fn install(&self, _event_tx: mpsc::Sender<KeyEvent>) -> Result<(), HookError> {
        Err(HookError::Unsupported)
    }

    pub fn uninstall(&self) {}

    pub fn is_installed(&self) -> bool {
        false
    }
}

impl Default for KeyboardHook {
    fn default() -> Self {
        Self::new()
    }
}
