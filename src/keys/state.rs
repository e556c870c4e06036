//! Tracking of currently held keys
//!
//! Maintains the held modifier and non-modifier key sets from a stream of
//! key-down/key-up events. Pure set mutation; mapping resolution happens
//! elsewhere, which keeps this independently testable.

use std::collections::HashSet;

use super::VirtualKey;

/// Direction of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

/// A single key transition delivered by the keyboard tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub direction: KeyDirection,
    pub key: VirtualKey,
}

impl KeyEvent {
    pub fn down(key: VirtualKey) -> Self {
        Self {
            direction: KeyDirection::Down,
            key,
        }
    }

    pub fn up(key: VirtualKey) -> Self {
        Self {
            direction: KeyDirection::Up,
            key,
        }
    }
}

/// The sets of keys currently held, split by modifier category.
///
/// Keys are normalized before insertion, so the sets only ever contain
/// canonical modifier forms. Sets absorb repeated downs (auto-repeat) and
/// ignore ups for keys that were never recorded as held.
#[derive(Debug, Default)]
pub struct KeyState {
    modifier_keys: HashSet<VirtualKey>,
    keys: HashSet<VirtualKey>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a key transition, returning the normalized key.
    pub fn update(&mut self, event: KeyEvent) -> VirtualKey {
        let key = event.key.normalize();

        let set = if key.is_modifier() {
            &mut self.modifier_keys
        } else {
            &mut self.keys
        };

        match event.direction {
            KeyDirection::Down => {
                set.insert(key);
            }
            KeyDirection::Up => {
                set.remove(&key);
            }
        }

        key
    }

    /// The modifier keys currently held.
    pub fn modifier_keys(&self) -> &HashSet<VirtualKey> {
        &self.modifier_keys
    }

    /// The non-modifier keys currently held.
    pub fn keys(&self) -> &HashSet<VirtualKey> {
        &self.keys
    }

    /// Drops all held keys.
    ///
    /// Used when dispatch is paused, since up-events arriving while paused
    /// are never observed and would otherwise leave keys held forever.
    pub fn clear(&mut self) {
        self.modifier_keys.clear();
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn down_then_up_leaves_empty_state() {
        let mut state = KeyState::new();
        state.update(KeyEvent::down(VirtualKey::K));
        assert!(state.keys().contains(&VirtualKey::K));

        state.update(KeyEvent::up(VirtualKey::K));
        assert!(state.keys().is_empty());
    }

    #[test]
    fn repeated_downs_are_idempotent() {
        let mut state = KeyState::new();
        state.update(KeyEvent::down(VirtualKey::K));
        state.update(KeyEvent::down(VirtualKey::K));
        state.update(KeyEvent::down(VirtualKey::K));

        assert_eq!(state.keys().len(), 1);

        // A single up releases the key even after repeats.
        state.update(KeyEvent::up(VirtualKey::K));
        assert!(state.keys().is_empty());
    }

    #[test]
    fn redundant_up_is_a_noop() {
        let mut state = KeyState::new();
        state.update(KeyEvent::up(VirtualKey::K));
        assert!(state.keys().is_empty());
        assert!(state.modifier_keys().is_empty());
    }

    #[test]
    fn modifiers_and_keys_land_in_separate_sets() {
        let mut state = KeyState::new();
        state.update(KeyEvent::down(VirtualKey::Control));
        state.update(KeyEvent::down(VirtualKey::K));

        assert!(state.modifier_keys().contains(&VirtualKey::Control));
        assert!(state.keys().contains(&VirtualKey::K));
        assert!(!state.keys().contains(&VirtualKey::Control));
    }

    #[test]
    fn directional_modifiers_are_stored_normalized() {
        let mut state = KeyState::new();
        state.update(KeyEvent::down(VirtualKey::LeftAlt));

        assert!(state.modifier_keys().contains(&VirtualKey::Alt));
        assert!(!state.modifier_keys().contains(&VirtualKey::LeftAlt));

        // A right-Alt up releases the same canonical key.
        state.update(KeyEvent::up(VirtualKey::RightAlt));
        assert!(state.modifier_keys().is_empty());
    }

    #[test]
    fn replay_reflects_most_recent_transition_per_key() {
        let events = [
            KeyEvent::down(VirtualKey::Control),
            KeyEvent::down(VirtualKey::Shift),
            KeyEvent::down(VirtualKey::K),
            KeyEvent::up(VirtualKey::Shift),
            KeyEvent::down(VirtualKey::J),
            KeyEvent::up(VirtualKey::J),
        ];

        let mut state = KeyState::new();
        for event in events {
            state.update(event);
        }

        assert_eq!(
            state.modifier_keys(),
            &HashSet::from([VirtualKey::Control])
        );
        assert_eq!(state.keys(), &HashSet::from([VirtualKey::K]));
    }

    #[test]
    fn clear_drops_everything() {
        let mut state = KeyState::new();
        state.update(KeyEvent::down(VirtualKey::Control));
        state.update(KeyEvent::down(VirtualKey::K));

        state.clear();

        assert!(state.modifier_keys().is_empty());
        assert!(state.keys().is_empty());
    }
}
