//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian
//! length. After a `Subscribe` request is acknowledged the connection
//! becomes push-only: the server streams dispatch notifications and stops
//! reading requests.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actions::ScriptAction;
use crate::events::DispatchEvent;
use crate::mappings::Mapping;

/// Requests a client can send to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Liveness check.
    Ping,

    /// Query daemon status.
    GetStatus,

    /// Suspend hotkey dispatch without tearing down the hook. Used while
    /// the user records a new key combination in an editor surface, so the
    /// editor's own keystrokes do not trigger live actions.
    PauseListener,

    /// Resume hotkey dispatch after a pause.
    ResumeListener,

    /// List all registered actions (code and script).
    ListActions,

    /// List the user's configured script actions, with their definitions.
    ListScriptActions,

    /// List the user's configured mappings.
    ListMappings,

    /// Add a mapping and persist; rejected if its combined key set
    /// duplicates an existing mapping.
    AddMapping { mapping: Mapping },

    /// Delete a mapping by id and persist.
    DeleteMapping { id: Uuid },

    /// Add a script action and persist.
    AddScriptAction { action: ScriptAction },

    /// Delete a script action by id and persist.
    DeleteScriptAction { id: Uuid },

    /// Switch this connection to receiving dispatch notifications.
    Subscribe,
}

/// Responses to client requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,
    Status(DaemonStatus),
    Actions { actions: Vec<ActionInfo> },
    ScriptActions { actions: Vec<ScriptAction> },
    Mappings { mappings: Vec<Mapping> },
    /// The request took effect.
    Ack,
    Subscribed,
    Error { message: String },
}

/// Pushed to subscribed clients as actions dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Dispatch { event: DispatchEvent },
}

/// Identity of a registered action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub id: Uuid,
    pub name: String,
}

/// A point-in-time snapshot of the daemon's state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Listener lifecycle state ("Stopped", "Running", or "Paused").
    pub listener_state: String,
    pub paused: bool,
    pub uptime_secs: u64,
    pub mapping_count: usize,
    pub action_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_serialize_with_snake_case_tags() {
        let json = serde_json::to_string(&Request::PauseListener).unwrap();
        assert_eq!(json, r#"{"type":"pause_listener"}"#);

        let request: Request = serde_json::from_str(r#"{"type":"resume_listener"}"#).unwrap();
        assert_eq!(request, Request::ResumeListener);
    }

    #[test]
    fn status_response_round_trips() {
        let response = Response::Status(DaemonStatus {
            listener_state: "Running".to_string(),
            paused: false,
            uptime_secs: 42,
            mapping_count: 3,
            action_count: 5,
        });

        let json = serde_json::to_string(&response).unwrap();
        let parsed: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn add_mapping_request_round_trips() {
        let request = Request::AddMapping {
            mapping: Mapping::default(),
        };
        let json = serde_json::to_string(&request).unwrap();
        let parsed: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn notifications_carry_dispatch_events() {
        let notification = Notification::Dispatch {
            event: DispatchEvent::ListenerPaused,
        };
        let json = serde_json::to_string(&notification).unwrap();
        assert!(json.contains("listener_paused"));
    }
}
