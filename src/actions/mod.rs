//! Executable actions bound to key combinations
//!
//! Two kinds exist: code actions supplied in-process by plugins, and script
//! actions that launch an external interpreter. Both are reached through the
//! same narrow capability: an id, a display name, and a fallible execute.

mod code;
mod registry;
mod script;

pub mod builtin;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use code::CodeAction;
pub use registry::{ActionRegistry, RegistryError};
pub use script::{ScriptAction, ShellType};

/// An executable behavior triggered by a key mapping.
///
/// Implementations must never panic across this boundary; any underlying
/// platform failure is converted into a failed [`ActionResult`].
pub trait Action: Send + Sync {
    /// Stable, unique identifier of the action.
    fn id(&self) -> Uuid;

    /// Display name of the action.
    fn name(&self) -> &str;

    /// Executes the action, always yielding a result value.
    fn execute(&self) -> ActionResult;
}

/// The outcome of executing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    success: bool,
    action_name: String,
    error: String,
}

impl ActionResult {
    /// Creates a result indicating success.
    pub fn ok(action_name: impl Into<String>) -> Self {
        Self {
            success: true,
            action_name: action_name.into(),
            error: String::new(),
        }
    }

    /// Creates a result indicating failure.
    ///
    /// The error text must be non-empty; a failure with no explanation is a
    /// bug at the call site.
    pub fn fail(action_name: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        debug_assert!(!error.is_empty(), "failure results require an error message");

        Self {
            success: false,
            action_name: action_name.into(),
            error,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    pub fn error(&self) -> &str {
        &self.error
    }
}
