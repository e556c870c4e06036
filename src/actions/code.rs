//! In-process actions supplied by plugins

use uuid::Uuid;

use super::{Action, ActionResult};

type Handler = Box<dyn Fn() -> Result<(), String> + Send + Sync>;

/// An action defined in code and imported from a plugin.
///
/// The id and name are fixed by the supplying plugin and immutable after
/// load. The handler performs the in-process side effect; its error string
/// becomes the failure message of the result.
pub struct CodeAction {
    id: Uuid,
    name: String,
    description: String,
    handler: Handler,
}

impl CodeAction {
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Fn() -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            handler: Box::new(handler),
        }
    }

    /// Plugin-provided description of what the action does.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Action for CodeAction {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> ActionResult {
        match (self.handler)() {
            Ok(()) => ActionResult::ok(&self.name),
            Err(error) => ActionResult::fail(&self.name, error),
        }
    }
}

impl std::fmt::Debug for CodeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeAction")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
