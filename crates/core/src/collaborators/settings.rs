//! Saved jetting setups, owned by users
//!
//! A setting pairs the conditions and engine a calculation was made for with
//! the recommendations it produced, so a driver can recall "what we ran at
//! the club track in March".

use crate::core_types::conditions::EnvironmentalReading;
use crate::jetting::result::{JettingResult, Recommendations};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

/// Identifier of a user
pub type UserId = u64;

/// Identifier of a saved setting
pub type SettingId = u64;

/// A setting to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSetting {
    pub user_id: UserId,
    pub name: String,
    pub notes: Option<String>,
    pub reading: EnvironmentalReading,
    pub engine_type: String,
    pub reference_jet: Option<u32>,
    pub recommendations: Recommendations,
}

impl NewSetting {
    /// Build a setting from a finished calculation
    pub fn from_result(
        user_id: UserId,
        name: impl Into<String>,
        notes: Option<String>,
        result: &JettingResult,
        reference_jet: Option<u32>,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            notes,
            reading: result.input.reading(),
            engine_type: result.input.engine_type.clone(),
            reference_jet,
            recommendations: result.recommendations.clone(),
        }
    }
}

/// A stored setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSetting {
    pub id: SettingId,
    pub user_id: UserId,
    pub name: String,
    pub notes: Option<String>,
    pub reading: EnvironmentalReading,
    pub engine_type: String,
    pub reference_jet: Option<u32>,
    pub recommendations: Recommendations,
    pub created_at: DateTime<Utc>,
}

/// Persistence for saved settings.
///
/// Deleting requires the owner: a setting that exists but belongs to someone
/// else is reported exactly like one that does not exist.
pub trait SettingsStore: Send + Sync {
    /// Store a setting and return its new id
    fn save(&self, setting: NewSetting) -> Result<SettingId, SettingsError>;

    /// All settings of `user_id`, oldest first
    fn list_for_user(&self, user_id: UserId) -> Result<Vec<SavedSetting>, SettingsError>;

    /// Delete setting `id` if owned by `owner`
    fn delete(&self, id: SettingId, owner: UserId) -> Result<(), SettingsError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreSnapshot {
    next_id: SettingId,
    settings: Vec<SavedSetting>,
}

#[derive(Debug, Default)]
struct StoreState {
    next_id: SettingId,
    settings: FxHashMap<SettingId, SavedSetting>,
}

/// Thread-safe in-memory store with optional JSON snapshots on disk
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    state: RwLock<StoreState>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON snapshot written by [`InMemorySettingsStore::save_snapshot`]
    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|e| SettingsError::LoadFailed(e.to_string()))?;
        let snapshot: StoreSnapshot =
            serde_json::from_str(&contents).map_err(|e| SettingsError::ParseFailed(e.to_string()))?;

        let max_id = snapshot.settings.iter().map(|s| s.id).max().unwrap_or(0);
        let state = StoreState {
            next_id: snapshot.next_id.max(max_id),
            settings: snapshot.settings.into_iter().map(|s| (s.id, s)).collect(),
        };
        info!(settings = state.settings.len(), "Loaded settings snapshot");

        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Write every stored setting to a JSON snapshot
    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let state = self.state.read().map_err(|_| SettingsError::LockPoisoned)?;
        let mut settings: Vec<SavedSetting> = state.settings.values().cloned().collect();
        settings.sort_by_key(|s| s.id);
        let snapshot = StoreSnapshot {
            next_id: state.next_id,
            settings,
        };

        let contents =
            serde_json::to_string_pretty(&snapshot).map_err(|e| SettingsError::SerializeFailed(e.to_string()))?;
        fs::write(path, contents).map_err(|e| SettingsError::SaveFailed(e.to_string()))?;
        Ok(())
    }

    /// Number of stored settings across all users
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.settings.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn save(&self, setting: NewSetting) -> Result<SettingId, SettingsError> {
        if setting.name.trim().is_empty() {
            return Err(SettingsError::EmptyName);
        }

        let mut state = self.state.write().map_err(|_| SettingsError::LockPoisoned)?;
        state.next_id += 1;
        let id = state.next_id;

        let saved = SavedSetting {
            id,
            user_id: setting.user_id,
            name: setting.name,
            notes: setting.notes,
            reading: setting.reading,
            engine_type: setting.engine_type,
            reference_jet: setting.reference_jet,
            recommendations: setting.recommendations,
            created_at: Utc::now(),
        };
        debug!(id, user_id = saved.user_id, name = %saved.name, "Saved setting");
        state.settings.insert(id, saved);
        Ok(id)
    }

    fn list_for_user(&self, user_id: UserId) -> Result<Vec<SavedSetting>, SettingsError> {
        let state = self.state.read().map_err(|_| SettingsError::LockPoisoned)?;
        let mut settings: Vec<SavedSetting> = state
            .settings
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        settings.sort_by_key(|s| s.id);
        Ok(settings)
    }

    fn delete(&self, id: SettingId, owner: UserId) -> Result<(), SettingsError> {
        let mut state = self.state.write().map_err(|_| SettingsError::LockPoisoned)?;
        let owned = state.settings.get(&id).is_some_and(|s| s.user_id == owner);
        if !owned {
            return Err(SettingsError::NotFound(id));
        }
        state.settings.remove(&id);
        debug!(id, owner, "Deleted setting");
        Ok(())
    }
}

/// Errors from a settings store
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// Setting name is empty
    EmptyName,
    /// No setting with this id for this owner
    NotFound(SettingId),
    /// Store lock was poisoned by a panicking writer
    LockPoisoned,
    /// Failed to read snapshot file
    LoadFailed(String),
    /// Failed to parse snapshot contents
    ParseFailed(String),
    /// Failed to serialize snapshot
    SerializeFailed(String),
    /// Failed to write snapshot file
    SaveFailed(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::EmptyName => write!(f, "Setting name cannot be empty"),
            SettingsError::NotFound(id) => write!(f, "Setting {id} not found"),
            SettingsError::LockPoisoned => write!(f, "Settings store lock poisoned"),
            SettingsError::LoadFailed(msg) => write!(f, "Failed to load: {msg}"),
            SettingsError::ParseFailed(msg) => write!(f, "Failed to parse: {msg}"),
            SettingsError::SerializeFailed(msg) => write!(f, "Failed to serialize: {msg}"),
            SettingsError::SaveFailed(msg) => write!(f, "Failed to save: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jetting::engine::JettingEngine;

    fn setting(user_id: UserId, name: &str) -> NewSetting {
        let result = JettingEngine::default()
            .recommend(&EnvironmentalReading::standard(), "Senior MAX EVO", None, None)
            .unwrap();
        NewSetting::from_result(user_id, name, None, &result, None)
    }

    #[test]
    fn test_save_and_list_per_user() {
        let store = InMemorySettingsStore::new();
        let a = store.save(setting(1, "Club track")).unwrap();
        let b = store.save(setting(2, "Other user")).unwrap();
        let c = store.save(setting(1, "Wet day")).unwrap();
        assert!(a < b && b < c);

        let mine = store.list_for_user(1).unwrap();
        assert_eq!(mine.iter().map(|s| s.id).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(mine[0].recommendations.main_jet, 130);
        assert!(store.list_for_user(3).unwrap().is_empty());
    }

    #[test]
    fn test_delete_requires_owner() {
        let store = InMemorySettingsStore::new();
        let id = store.save(setting(1, "Club track")).unwrap();

        assert_eq!(store.delete(id, 2), Err(SettingsError::NotFound(id)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.delete(id, 1), Ok(()));
        assert!(store.is_empty());
        assert_eq!(store.delete(id, 1), Err(SettingsError::NotFound(id)));
    }

    #[test]
    fn test_empty_name_rejected() {
        let store = InMemorySettingsStore::new();
        assert_eq!(store.save(setting(1, "  ")), Err(SettingsError::EmptyName));
    }
}
