//! Key-combination to action mappings
//!
//! A mapping binds an unordered set of modifier and non-modifier keys to an
//! action. The table indexes mappings by the canonical combined key set and
//! answers exact-set lookups only; subsets and supersets never match.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keys::VirtualKey;

/// A user-defined binding between a key combination and an action.
///
/// Key sets are stored in normalized form; equality is by id so a mapping
/// keeps its identity while the user edits its keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Mapping {
    pub id: Uuid,
    pub modifier_keys: HashSet<VirtualKey>,
    pub keys: HashSet<VirtualKey>,
    pub action_id: Uuid,
    /// Path to an audio file played after the action succeeds.
    pub completion_sound_path: Option<PathBuf>,
}

impl Default for Mapping {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            modifier_keys: HashSet::new(),
            keys: HashSet::new(),
            action_id: Uuid::nil(),
            completion_sound_path: None,
        }
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Mapping {}

impl Mapping {
    /// The canonical combined key set identifying this mapping.
    fn combined_keys(&self) -> BTreeSet<VirtualKey> {
        self.modifier_keys
            .iter()
            .chain(self.keys.iter())
            .map(|key| key.normalize())
            .collect()
    }
}

/// Errors raised while building the mapping table.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// Two mappings share the exact same combined key set. Registration is
    /// rejected outright rather than arbitrated silently.
    #[error("mappings {first} and {second} share the same key combination")]
    DuplicateKeySet { first: Uuid, second: Uuid },
}

/// An index from combined key sets to mappings, supporting exact-set lookup.
///
/// Rebuilt from scratch whenever the backing mapping collection is
/// persisted; between rebuilds it reflects the last built snapshot.
#[derive(Debug, Default)]
pub struct MappingTable {
    mappings: HashMap<BTreeSet<VirtualKey>, Mapping>,
}

impl MappingTable {
    /// Builds a table from a collection of mappings.
    pub fn build(mappings: impl IntoIterator<Item = Mapping>) -> Result<Self, MappingError> {
        let mut map: HashMap<BTreeSet<VirtualKey>, Mapping> = HashMap::new();

        for mapping in mappings {
            let combined = mapping.combined_keys();

            if let Some(existing) = map.get(&combined) {
                return Err(MappingError::DuplicateKeySet {
                    first: existing.id,
                    second: mapping.id,
                });
            }

            map.insert(combined, mapping);
        }

        Ok(Self { mappings: map })
    }

    /// Retrieves the mapping associated with exactly the given held keys,
    /// if one exists.
    pub fn resolve(
        &self,
        modifier_keys: &HashSet<VirtualKey>,
        keys: &HashSet<VirtualKey>,
    ) -> Option<&Mapping> {
        let combined: BTreeSet<VirtualKey> =
            modifier_keys.iter().chain(keys.iter()).copied().collect();

        self.mappings.get(&combined)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
