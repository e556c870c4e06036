//! Events emitted by the dispatcher
//!
//! Broadcast to collaborators: the notification surface subscribes for
//! failed action results, the IPC server relays them to connected clients.

use serde::{Deserialize, Serialize};

use crate::actions::ActionResult;

/// Events emitted as key combinations are dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// A mapped action executed successfully.
    ActionSucceeded {
        /// Display name of the action that ran.
        action_name: String,
    },

    /// A mapped action failed; carries the result for user-visible display.
    ActionFailed { result: ActionResult },

    /// Dispatch was paused via the control channel.
    ListenerPaused,

    /// Dispatch was resumed via the control channel.
    ListenerResumed,
}

impl std::fmt::Display for DispatchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchEvent::ActionSucceeded { action_name } => {
                write!(f, "ACTION_SUCCEEDED ({action_name})")
            }
            DispatchEvent::ActionFailed { result } => {
                write!(
                    f,
                    "ACTION_FAILED ({}: {})",
                    result.action_name(),
                    result.error()
                )
            }
            DispatchEvent::ListenerPaused => write!(f, "LISTENER_PAUSED"),
            DispatchEvent::ListenerResumed => write!(f, "LISTENER_RESUMED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_event_serializes_with_result() {
        let event = DispatchEvent::ActionFailed {
            result: ActionResult::fail("Run Backup", "script not found"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("action_failed"));
        assert!(json.contains("script not found"));
    }

    #[test]
    fn success_event_round_trips() {
        let json = r#"{"type":"action_succeeded","action_name":"Toggle Microphone Mute"}"#;
        let event: DispatchEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            event,
            DispatchEvent::ActionSucceeded { action_name } if action_name == "Toggle Microphone Mute"
        ));
    }
}
