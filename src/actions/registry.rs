//! Lookup of actions by their unique identifiers

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::Action;

/// Errors raised by the action registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A mapping referenced an action that does not exist. This indicates a
    /// corrupt configuration and is surfaced loudly rather than ignored.
    #[error("no action registered with id {0}")]
    UnknownAction(Uuid),

    #[error("duplicate action id {0}")]
    DuplicateAction(Uuid),
}

/// An index of all known actions, keyed by id.
///
/// Built once from plugin-loaded code actions plus the user's configured
/// script actions; the dispatcher holds a shared handle and only ever reads.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<Uuid, Arc<dyn Action>>,
}

impl ActionRegistry {
    /// Builds a registry from a collection of actions.
    pub fn build(
        actions: impl IntoIterator<Item = Arc<dyn Action>>,
    ) -> Result<Self, RegistryError> {
        let mut map: HashMap<Uuid, Arc<dyn Action>> = HashMap::new();

        for action in actions {
            let id = action.id();
            if map.insert(id, action).is_some() {
                return Err(RegistryError::DuplicateAction(id));
            }
        }

        Ok(Self { actions: map })
    }

    /// Gets an action by its unique identifier.
    pub fn get(&self, id: Uuid) -> Result<Arc<dyn Action>, RegistryError> {
        self.actions
            .get(&id)
            .cloned()
            .ok_or(RegistryError::UnknownAction(id))
    }

    /// All registered actions, in no particular order.
    pub fn actions(&self) -> impl Iterator<Item = &Arc<dyn Action>> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::CodeAction;

    fn nop(id: Uuid, name: &str) -> Arc<dyn Action> {
        Arc::new(CodeAction::new(id, name, "", || Ok(())))
    }

    #[test]
    fn lookup_by_id() {
        let id = Uuid::new_v4();
        let registry = ActionRegistry::build([nop(id, "First"), nop(Uuid::new_v4(), "Second")])
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(id).unwrap().name(), "First");
    }

    #[test]
    fn unknown_id_is_an_error() {
        let registry = ActionRegistry::build([]).unwrap();
        let missing = Uuid::new_v4();

        assert!(matches!(
            registry.get(missing),
            Err(RegistryError::UnknownAction(id)) if id == missing
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let id = Uuid::new_v4();
        let result = ActionRegistry::build([nop(id, "First"), nop(id, "Clone")]);

        assert!(matches!(result, Err(RegistryError::DuplicateAction(d)) if d == id));
    }
}
