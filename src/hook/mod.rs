//! Global keyboard hook
//!
//! Owns the native event tap and the dedicated thread that pumps it,
//! forwarding key transitions into the dispatcher's channel. The dispatcher
//! never touches platform APIs; it only consumes [`KeyEvent`]s.

#[cfg(target_os = "macos")]
mod keycodes;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
pub use macos::KeyboardHook;

#[cfg(not(target_os = "macos"))]
mod unsupported;
#[cfg(not(target_os = "macos"))]
pub use unsupported::KeyboardHook;

/// Errors raised while installing or tearing down the keyboard hook.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("keyboard hook is already installed")]
    AlreadyInstalled,

    #[error("failed to create event tap - check Accessibility permissions")]
    TapCreation,

    #[error("failed to spawn hook thread: {0}")]
    ThreadSpawn(String),

    #[error("global keyboard capture is not supported on this platform")]
    Unsupported,
}
