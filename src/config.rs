//! Configuration loading and the user-settings store
//!
//! The dispatcher only ever sees materialized `Mapping` and `Action` values;
//! the raw storage format stays behind this module. Saving mappings rebuilds
//! the lookup table and swaps it under the write lock, so a rebuild never
//! interleaves with an in-flight resolution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::actions::{builtin, Action, ActionRegistry, ScriptAction};
use crate::mappings::{Mapping, MappingTable};

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC.
    pub socket_path: PathBuf,

    /// Path to the user-editable settings file.
    pub settings_path: PathBuf,

    /// Directory for runtime data.
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment and defaults.
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("quick-actions");

        Ok(Self {
            socket_path: data_dir.join("daemon.sock"),
            settings_path: data_dir.join("settings.json"),
            data_dir,
        })
    }

    /// Ensure data directory exists.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

/// The persisted shape of the user's settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub script_actions: Vec<ScriptAction>,
    pub mappings: Vec<Mapping>,
}

impl UserSettings {
    /// Loads settings from disk; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings in {}", path.display()))?;

        Ok(settings)
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;

        Ok(())
    }
}

/// Owns the user's settings and the materialized lookup structures the
/// dispatcher reads: the mapping table and the action registry.
pub struct SettingsStore {
    path: PathBuf,
    settings: RwLock<UserSettings>,
    mappings: Arc<RwLock<MappingTable>>,
    registry: Arc<RwLock<ActionRegistry>>,
}

impl SettingsStore {
    /// Opens the store, materializing the registry (plugin code actions plus
    /// configured script actions) and the mapping table.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = UserSettings::load(&path)?;

        let registry = build_registry(&settings)?;
        let table = MappingTable::build(settings.mappings.iter().cloned())
            .context("invalid mapping configuration")?;

        info!(
            mappings = settings.mappings.len(),
            scripts = settings.script_actions.len(),
            actions = registry.len(),
            "user settings loaded"
        );

        Ok(Self {
            path,
            settings: RwLock::new(settings),
            mappings: Arc::new(RwLock::new(table)),
            registry: Arc::new(RwLock::new(registry)),
        })
    }

    /// Shared handle to the mapping table read by the dispatcher.
    pub fn mapping_table(&self) -> Arc<RwLock<MappingTable>> {
        Arc::clone(&self.mappings)
    }

    /// Shared handle to the action registry read by the dispatcher.
    pub fn action_registry(&self) -> Arc<RwLock<ActionRegistry>> {
        Arc::clone(&self.registry)
    }

    pub async fn mappings(&self) -> Vec<Mapping> {
        self.settings.read().await.mappings.clone()
    }

    pub async fn script_actions(&self) -> Vec<ScriptAction> {
        self.settings.read().await.script_actions.clone()
    }

    /// Adds a mapping and persists it.
    ///
    /// Rejects an id already in use and a combined key set that collides
    /// with an existing mapping; a rejected add leaves the collection, the
    /// lookup table, and the file on disk untouched.
    pub async fn add_mapping(&self, mapping: Mapping) -> Result<()> {
        let mut settings = self.settings.write().await;

        if settings.mappings.iter().any(|m| m.id == mapping.id) {
            bail!("mapping id {} is already in use", mapping.id);
        }

        settings.mappings.push(mapping);

        let rebuilt = match MappingTable::build(settings.mappings.iter().cloned()) {
            Ok(table) => table,
            Err(e) => {
                settings.mappings.pop();
                return Err(e).context("invalid mapping configuration");
            }
        };

        if let Err(e) = settings.save(&self.path) {
            settings.mappings.pop();
            return Err(e);
        }

        *self.mappings.write().await = rebuilt;
        info!(mappings = settings.mappings.len(), "mapping added");
        Ok(())
    }

    /// Deletes a mapping by id, persisting if one was removed.
    pub async fn delete_mapping(&self, id: Uuid) -> Result<()> {
        let removed = {
            let mut settings = self.settings.write().await;
            let before = settings.mappings.len();
            settings.mappings.retain(|m| m.id != id);
            settings.mappings.len() != before
        };

        if removed {
            self.save_mappings().await?;
        }

        Ok(())
    }

    /// Adds a script action and persists it.
    ///
    /// Rejects an id already in use, including collisions with the built-in
    /// code actions; a rejected add changes nothing.
    pub async fn add_script(&self, action: ScriptAction) -> Result<()> {
        let mut settings = self.settings.write().await;

        if settings.script_actions.iter().any(|s| s.id == action.id) {
            bail!("script action id {} is already in use", action.id);
        }

        settings.script_actions.push(action);

        let rebuilt = match build_registry(&settings) {
            Ok(registry) => registry,
            Err(e) => {
                settings.script_actions.pop();
                return Err(e);
            }
        };

        if let Err(e) = settings.save(&self.path) {
            settings.script_actions.pop();
            return Err(e);
        }

        *self.registry.write().await = rebuilt;
        info!(scripts = settings.script_actions.len(), "script action added");
        Ok(())
    }

    /// Deletes a script action by id, persisting if one was removed.
    pub async fn delete_script(&self, id: Uuid) -> Result<()> {
        let removed = {
            let mut settings = self.settings.write().await;
            let before = settings.script_actions.len();
            settings.script_actions.retain(|s| s.id != id);
            settings.script_actions.len() != before
        };

        if removed {
            self.save_scripts().await?;
        }

        Ok(())
    }

    /// Rebuilds the lookup table and persists the mapping collection. The
    /// rebuild runs first so an invalid collection never reaches disk.
    pub async fn save_mappings(&self) -> Result<()> {
        let settings = self.settings.read().await;
        let rebuilt = MappingTable::build(settings.mappings.iter().cloned())
            .context("invalid mapping configuration")?;

        settings.save(&self.path)?;
        *self.mappings.write().await = rebuilt;

        info!(mappings = settings.mappings.len(), "mapping table rebuilt");
        Ok(())
    }

    /// Rebuilds the registry and persists the script-action collection.
    pub async fn save_scripts(&self) -> Result<()> {
        let settings = self.settings.read().await;
        let rebuilt = build_registry(&settings)?;

        settings.save(&self.path)?;
        *self.registry.write().await = rebuilt;

        info!(scripts = settings.script_actions.len(), "action registry rebuilt");
        Ok(())
    }
}

fn build_registry(settings: &UserSettings) -> Result<ActionRegistry> {
    let scripts = settings
        .script_actions
        .iter()
        .cloned()
        .map(|script| Arc::new(script) as Arc<dyn Action>);

    ActionRegistry::build(builtin::load_code_actions().into_iter().chain(scripts))
        .context("invalid action configuration")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::actions::builtin::TOGGLE_MICROPHONE_MUTE_ID;
    use crate::keys::VirtualKey;

    fn sample_settings() -> UserSettings {
        let script = ScriptAction {
            name: "Backup".to_string(),
            path: PathBuf::from("/tmp/backup.sh"),
            ..Default::default()
        };
        let mapping = Mapping {
            modifier_keys: HashSet::from([VirtualKey::Control]),
            keys: HashSet::from([VirtualKey::B]),
            action_id: script.id,
            ..Default::default()
        };

        UserSettings {
            script_actions: vec![script],
            mappings: vec![mapping],
        }
    }

    #[test]
    fn missing_settings_file_yields_defaults() {
        let settings = UserSettings::load(Path::new("/nonexistent/settings.json")).unwrap();
        assert!(settings.script_actions.is_empty());
        assert!(settings.mappings.is_empty());
    }

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = sample_settings();
        settings.save(&path).unwrap();

        let loaded = UserSettings::load(&path).unwrap();
        assert_eq!(loaded.script_actions, settings.script_actions);
        assert_eq!(loaded.mappings[0].id, settings.mappings[0].id);
        assert_eq!(loaded.mappings[0].keys, settings.mappings[0].keys);
    }

    #[tokio::test]
    async fn open_materializes_registry_and_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = sample_settings();
        let script_id = settings.script_actions[0].id;
        settings.save(&path).unwrap();

        let store = SettingsStore::open(&path).unwrap();

        let registry = store.action_registry();
        let registry = registry.read().await;
        assert!(registry.get(script_id).is_ok());
        assert!(registry.get(TOGGLE_MICROPHONE_MUTE_ID).is_ok());

        let table = store.mapping_table();
        let table = table.read().await;
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn adding_a_mapping_rebuilds_the_shared_table_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();
        let table = store.mapping_table();

        assert!(table.read().await.is_empty());

        store
            .add_mapping(Mapping {
                modifier_keys: HashSet::from([VirtualKey::Control]),
                keys: HashSet::from([VirtualKey::K]),
                action_id: TOGGLE_MICROPHONE_MUTE_ID,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(table.read().await.len(), 1);

        // And the snapshot survives on disk.
        let reloaded = UserSettings::load(&path).unwrap();
        assert_eq!(reloaded.mappings.len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_script_drops_it_from_the_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = sample_settings();
        let script_id = settings.script_actions[0].id;
        settings.save(&path).unwrap();

        let store = SettingsStore::open(&path).unwrap();
        store.delete_script(script_id).await.unwrap();

        let registry = store.action_registry();
        assert!(registry.read().await.get(script_id).is_err());
    }

    fn ctrl_mapping(key: VirtualKey) -> Mapping {
        Mapping {
            modifier_keys: HashSet::from([VirtualKey::Control]),
            keys: HashSet::from([key]),
            action_id: TOGGLE_MICROPHONE_MUTE_ID,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn adding_a_duplicate_key_set_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();

        store.add_mapping(ctrl_mapping(VirtualKey::K)).await.unwrap();
        assert!(store.add_mapping(ctrl_mapping(VirtualKey::K)).await.is_err());

        assert_eq!(store.mappings().await.len(), 1);
        assert_eq!(store.mapping_table().read().await.len(), 1);
        assert_eq!(UserSettings::load(&path).unwrap().mappings.len(), 1);
    }

    #[tokio::test]
    async fn readding_an_existing_mapping_record_keeps_the_original() {
        // An editor implementing "edit" as re-add sends the same record
        // again; the reject must not take the original down with it.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();

        let mapping = ctrl_mapping(VirtualKey::K);
        let id = mapping.id;
        store.add_mapping(mapping.clone()).await.unwrap();

        assert!(store.add_mapping(mapping).await.is_err());

        let remaining = store.mappings().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, id);
        assert_eq!(store.mapping_table().read().await.len(), 1);
        assert_eq!(UserSettings::load(&path).unwrap().mappings.len(), 1);
    }

    #[tokio::test]
    async fn reusing_a_mapping_id_with_different_keys_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();

        let first = ctrl_mapping(VirtualKey::K);
        let id = first.id;
        store.add_mapping(first).await.unwrap();

        let mut second = ctrl_mapping(VirtualKey::J);
        second.id = id;
        assert!(store.add_mapping(second).await.is_err());

        // One record under that id, still bound to its original keys.
        let remaining = store.mappings().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].keys, HashSet::from([VirtualKey::K]));
    }

    #[tokio::test]
    async fn delete_mapping_removes_only_the_named_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();

        let keep = ctrl_mapping(VirtualKey::K);
        let kept_id = keep.id;
        let doomed = ctrl_mapping(VirtualKey::J);
        store.add_mapping(keep).await.unwrap();
        store.add_mapping(doomed.clone()).await.unwrap();

        store.delete_mapping(doomed.id).await.unwrap();

        let remaining = store.mappings().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept_id);
        assert_eq!(store.mapping_table().read().await.len(), 1);
        assert_eq!(UserSettings::load(&path).unwrap().mappings.len(), 1);
    }

    #[tokio::test]
    async fn reusing_a_script_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();

        let script = ScriptAction {
            name: "Backup".to_string(),
            path: PathBuf::from("/tmp/backup.sh"),
            ..Default::default()
        };
        store.add_script(script.clone()).await.unwrap();

        let mut imposter = script.clone();
        imposter.name = "Imposter".to_string();
        assert!(store.add_script(imposter).await.is_err());

        let remaining = store.script_actions().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Backup");
    }

    #[tokio::test]
    async fn script_colliding_with_a_builtin_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();

        let script = ScriptAction {
            id: TOGGLE_MICROPHONE_MUTE_ID,
            name: "Shadowing Script".to_string(),
            path: PathBuf::from("/tmp/shadow.sh"),
            ..Default::default()
        };
        assert!(store.add_script(script).await.is_err());

        assert!(store.script_actions().await.is_empty());
        // The built-in still resolves.
        let registry = store.action_registry();
        assert!(registry.read().await.get(TOGGLE_MICROPHONE_MUTE_ID).is_ok());
    }
}
