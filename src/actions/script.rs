//! Actions that execute a script residing on the file system

use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Action, ActionResult};

/// The type of shell program whose interpreter executes a script action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellType {
    /// The platform command interpreter (`cmd.exe` on Windows, `sh` elsewhere).
    Command,
    /// PowerShell (`powershell.exe` on Windows, `pwsh` elsewhere).
    PowerShell,
}

impl Default for ShellType {
    fn default() -> Self {
        Self::Command
    }
}

/// An action that runs a script through an external interpreter.
///
/// Script actions generate their own id when initially created; the id is
/// stable across edits, and two script actions are equal iff their ids match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptAction {
    pub id: Uuid,
    pub name: String,
    pub shell: ShellType,
    pub path: PathBuf,
    pub arguments: String,
}

impl Default for ScriptAction {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            shell: ShellType::default(),
            path: PathBuf::new(),
            arguments: String::new(),
        }
    }
}

impl PartialEq for ScriptAction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ScriptAction {}

impl ScriptAction {
    /// Builds the interpreter invocation for this action's shell type.
    fn interpreter(&self) -> Result<Command, String> {
        let args = shell_words::split(&self.arguments)
            .map_err(|e| format!("invalid script arguments: {e}"))?;

        let mut command = match self.shell {
            #[cfg(windows)]
            ShellType::Command => {
                let mut command = Command::new("cmd.exe");
                command.arg("/c").arg(format!(
                    "\"\"{}\" {}\"",
                    self.path.display(),
                    self.arguments
                ));
                command
            }
            #[cfg(not(windows))]
            ShellType::Command => {
                let mut command = Command::new("sh");
                command.arg(&self.path).args(&args);
                command
            }
            ShellType::PowerShell => {
                #[cfg(windows)]
                let mut command = Command::new("powershell.exe");
                #[cfg(not(windows))]
                let mut command = Command::new("pwsh");

                command.arg("-NoProfile");
                #[cfg(windows)]
                command.arg("-ExecutionPolicy").arg("Bypass");
                command.arg("-File").arg(&self.path).args(&args);
                command
            }
        };

        command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());

        Ok(command)
    }
}

impl Action for ScriptAction {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// Launches the interpreter and blocks until the process exits.
    ///
    /// Success requires an empty error stream; anything the child writes to
    /// stderr fails the action regardless of its exit code. A process that
    /// cannot be started at all is also a failure. There is no timeout, so a
    /// hung script stalls the caller indefinitely.
    fn execute(&self) -> ActionResult {
        let mut command = match self.interpreter() {
            Ok(command) => command,
            Err(error) => return ActionResult::fail(&self.name, error),
        };

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ActionResult::fail(
                    &self.name,
                    format!("failed to start interpreter: {e}"),
                );
            }
        };

        let output = match child.wait_with_output() {
            Ok(output) => output,
            Err(e) => {
                return ActionResult::fail(&self.name, format!("failed to await script: {e}"));
            }
        };

        let errors = String::from_utf8_lossy(&output.stderr);

        if errors.is_empty() {
            ActionResult::ok(&self.name)
        } else {
            ActionResult::fail(&self.name, errors.into_owned())
        }
    }
}

impl std::fmt::Display for ScriptAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (Script)", self.name)
    }
}
