//! macOS keyboard tap backend
//!
//! Installs a session-level CGEventTap and pumps it on a dedicated thread
//! running its own CFRunLoop in short slices, so teardown can observe the
//! run flag without stopping the main run loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventType, EventField,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::keys::{KeyEvent, VirtualKey};

use super::{keycodes, HookError};

/// Global keyboard hook backed by a CGEventTap.
///
/// Install and uninstall are strictly paired: `install` does not return
/// until the tap is confirmed created (or failed), and `uninstall` joins
/// the pump thread before reporting done. Uninstall is idempotent.
pub struct KeyboardHook {
    running: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl KeyboardHook {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        }
    }

    /// Installs the tap and starts the pump thread.
    ///
    /// Returns once tap creation is confirmed by the pump thread; the pump
    /// keeps running concurrently afterward. A tap creation failure is
    /// surfaced here rather than degrading into a silent non-functional hook.
    pub fn install(&self, event_tx: mpsc::Sender<KeyEvent>) -> Result<(), HookError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HookError::AlreadyInstalled);
        }

        let running = Arc::clone(&self.running);
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), HookError>>();

        let handle = thread::Builder::new()
            .name("keyboard-hook".to_string())
            .spawn(move || {
                info!("keyboard hook thread started");

                if let Err(e) = run_event_loop(event_tx, Arc::clone(&running), ready_tx) {
                    error!(?e, "keyboard hook error");
                }

                running.store(false, Ordering::SeqCst);
                info!("keyboard hook thread stopped");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                HookError::ThreadSpawn(e.to_string())
            })?;

        *self.thread.lock().expect("hook thread slot poisoned") = Some(handle);

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.uninstall();
                Err(e)
            }
            Err(_) => {
                // Thread exited before confirming installation.
                self.uninstall();
                Err(HookError::TapCreation)
            }
        }
    }

    /// Tears down the tap and waits for the pump thread to exit.
    ///
    /// Safe to call multiple times; every exit path releases the thread
    /// handle, including when `install` partially failed.
    pub fn uninstall(&self) {
        self.running.store(false, Ordering::SeqCst);

        let handle = self.thread.lock().expect("hook thread slot poisoned").take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("keyboard hook thread panicked during teardown");
            }
        }
    }

    /// Whether the pump thread is currently running.
    pub fn is_installed(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for KeyboardHook {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for KeyboardHook {
    fn drop(&mut self) {
        self.uninstall();
    }
}

/// A raw observation captured inside the tap callback.
struct TapObservation {
    event_type: CGEventType,
    keycode: u64,
    flags: CGEventFlags,
}

/// Run the CFRunLoop with the event tap.
fn run_event_loop(
    event_tx: mpsc::Sender<KeyEvent>,
    running: Arc<AtomicBool>,
    ready_tx: std_mpsc::Sender<Result<(), HookError>>,
) -> Result<(), HookError> {
    // The tap callback must be fast and non-blocking, so it only records
    // the observation; translation happens on the pump thread below.
    let (callback_tx, callback_rx) = std_mpsc::channel::<TapObservation>();

    let callback = move |_proxy: core_graphics::event::CGEventTapProxy,
                         event_type: CGEventType,
                         event: &CGEvent|
          -> Option<CGEvent> {
        match event_type {
            CGEventType::KeyDown | CGEventType::KeyUp | CGEventType::FlagsChanged => {
                let _ = callback_tx.send(TapObservation {
                    event_type,
                    keycode: event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE)
                        as u64,
                    flags: event.get_flags(),
                });
            }
            CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                warn!("event tap disabled, will re-enable");
            }
            _ => {}
        }
        // Listen-only tap: every event is acknowledged and passed through,
        // so input is never blocked even while dispatch is paused.
        Some(event.clone())
    };

    let tap = match CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![
            CGEventType::KeyDown,
            CGEventType::KeyUp,
            CGEventType::FlagsChanged,
        ],
        callback,
    ) {
        Ok(tap) => tap,
        Err(_) => {
            error!("failed to create event tap - is Accessibility permission granted?");
            let _ = ready_tx.send(Err(HookError::TapCreation));
            return Err(HookError::TapCreation);
        }
    };

    tap.enable();

    let run_loop_source = match tap.mach_port.create_runloop_source(0) {
        Ok(source) => source,
        Err(_) => {
            let _ = ready_tx.send(Err(HookError::TapCreation));
            return Err(HookError::TapCreation);
        }
    };

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&run_loop_source, kCFRunLoopCommonModes);
    }

    info!("event tap created and enabled");
    let _ = ready_tx.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        // Run the loop for a short interval, then drain observations.
        unsafe {
            CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, Duration::from_millis(100), true);
        }

        while let Ok(observation) = callback_rx.try_recv() {
            let Some(event) = translate(&observation) else {
                continue;
            };

            debug!(?event, "key transition");

            if event_tx.blocking_send(event).is_err() {
                warn!("dispatcher channel closed, stopping hook");
                running.store(false, Ordering::SeqCst);
                break;
            }
        }
    }

    // The tap is torn down when it goes out of scope.
    Ok(())
}

/// Translates a tap observation into a key transition.
fn translate(observation: &TapObservation) -> Option<KeyEvent> {
    let key = keycodes::virtual_key(observation.keycode)?;

    match observation.event_type {
        CGEventType::KeyDown => Some(KeyEvent::down(key)),
        CGEventType::KeyUp => Some(KeyEvent::up(key)),
        CGEventType::FlagsChanged => {
            // Modifiers only report an aggregate flag per family. With both
            // directional variants held, releasing one synthesizes a Down
            // for the canonical key; the tracker's sets absorb it and the
            // final release still produces the Up.
            let flag = modifier_flag(key)?;
            if observation.flags.contains(flag) {
                Some(KeyEvent::down(key))
            } else {
                Some(KeyEvent::up(key))
            }
        }
        _ => None,
    }
}

/// The aggregate event flag governing a modifier key family.
fn modifier_flag(key: VirtualKey) -> Option<CGEventFlags> {
    match key {
        VirtualKey::LeftShift | VirtualKey::RightShift | VirtualKey::Shift => {
            Some(CGEventFlags::CGEventFlagShift)
        }
        VirtualKey::LeftControl | VirtualKey::RightControl | VirtualKey::Control => {
            Some(CGEventFlags::CGEventFlagControl)
        }
        VirtualKey::LeftAlt | VirtualKey::RightAlt | VirtualKey::Alt => {
            Some(CGEventFlags::CGEventFlagAlternate)
        }
        VirtualKey::LeftSuper | VirtualKey::RightSuper => {
            Some(CGEventFlags::CGEventFlagCommand)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_starts_uninstalled() {
        let hook = KeyboardHook::new();
        assert!(!hook.is_installed());
    }

    #[test]
    fn uninstall_before_install_is_a_noop() {
        let hook = KeyboardHook::new();
        hook.uninstall();
        hook.uninstall();
        assert!(!hook.is_installed());
    }

    #[test]
    fn keydown_translates_to_down_event() {
        let observation = TapObservation {
            event_type: CGEventType::KeyDown,
            keycode: 0x28,
            flags: CGEventFlags::empty(),
        };
        assert_eq!(translate(&observation), Some(KeyEvent::down(VirtualKey::K)));
    }

    #[test]
    fn flags_changed_direction_follows_flag_bit() {
        let pressed = TapObservation {
            event_type: CGEventType::FlagsChanged,
            keycode: 0x3A,
            flags: CGEventFlags::CGEventFlagAlternate,
        };
        assert_eq!(
            translate(&pressed),
            Some(KeyEvent::down(VirtualKey::LeftAlt))
        );

        let released = TapObservation {
            event_type: CGEventType::FlagsChanged,
            keycode: 0x3A,
            flags: CGEventFlags::empty(),
        };
        assert_eq!(translate(&released), Some(KeyEvent::up(VirtualKey::LeftAlt)));
    }
}
