//! Whole-state persistence on top of a [`Storage`] backend
//!
//! The state tree is written as one JSON blob under the primary key. Every
//! save also writes a backup envelope holding the same serialized text, so a
//! damaged primary can be recovered. Dates are (de)serialized by the typed
//! schema; free text never turns into a date by accident.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskdefender_api::{AppState, EXPORT_FORMAT_VERSION};
use taskdefender_util::Timestamp;
use tracing::{debug, info, warn};

use crate::{Storage, StoreError, StoreResult};

/// Keys under which the state and its backup live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub primary: String,
    pub backup: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            primary: "taskdefender_app_state".into(),
            backup: "taskdefender_backup".into(),
        }
    }
}

/// Backup copy of the last saved state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEnvelope {
    pub timestamp: Timestamp,
    /// The serialized state, exactly as written under the primary key
    pub data: String,
}

/// Portable export document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub version: String,
    pub exported_at: Timestamp,
    pub data: AppState,
}

/// Saves, loads, exports and imports the state tree
#[derive(Clone)]
pub struct StatePersistence {
    storage: Arc<dyn Storage>,
    keys: StorageKeys,
}

impl StatePersistence {
    pub fn new(storage: Arc<dyn Storage>, keys: StorageKeys) -> Self {
        Self { storage, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn is_healthy(&self) -> bool {
        self.storage.is_healthy()
    }

    /// Write the state under the primary key, then refresh the backup.
    pub fn save(&self, state: &AppState, now: Timestamp) -> StoreResult<()> {
        let serialized =
            serde_json::to_string(state).map_err(|e| StoreError::Write(e.to_string()))?;

        self.storage
            .set_item(&self.keys.primary, &serialized)
            .map_err(|e| StoreError::Write(e.to_string()))?;

        let backup = BackupEnvelope {
            timestamp: now,
            data: serialized,
        };
        let backup_json =
            serde_json::to_string(&backup).map_err(|e| StoreError::Write(e.to_string()))?;
        self.storage
            .set_item(&self.keys.backup, &backup_json)
            .map_err(|e| StoreError::Write(e.to_string()))?;

        debug!(
            tasks = state.tasks.len(),
            bytes = backup.data.len(),
            "State saved"
        );
        Ok(())
    }

    /// Read the state under the primary key. `Ok(None)` when nothing has
    /// been saved yet.
    pub fn load(&self) -> StoreResult<Option<AppState>> {
        let Some(serialized) = self
            .storage
            .get_item(&self.keys.primary)
            .map_err(|e| StoreError::Read(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut state: AppState = serde_json::from_str(&serialized).map_err(|e| {
            warn!(error = %e, "Stored state is malformed");
            StoreError::Read(e.to_string())
        })?;

        if state.normalize() {
            debug!("Moved open session out of focus history");
        }
        Ok(Some(state))
    }

    /// Pretty-printed export document of the persisted state
    pub fn export(&self, now: Timestamp) -> StoreResult<String> {
        let state = self.load()?.ok_or(StoreError::NothingToExport)?;

        let envelope = ExportEnvelope {
            version: EXPORT_FORMAT_VERSION.to_string(),
            exported_at: now,
            data: state,
        };
        let text = serde_json::to_string_pretty(&envelope)?;

        info!(bytes = text.len(), "State exported");
        Ok(text)
    }

    /// Parse an export document and persist its state. Returns the imported
    /// state so the caller can load it.
    pub fn import(&self, text: &str, now: Timestamp) -> StoreResult<AppState> {
        let mut state = parse_export(text)?;
        state.normalize();
        self.save(&state, now)?;

        info!(tasks = state.tasks.len(), "State imported");
        Ok(state)
    }

    /// Remove the state and its backup
    pub fn clear_all(&self) -> StoreResult<()> {
        self.storage.remove_item(&self.keys.primary)?;
        self.storage.remove_item(&self.keys.backup)?;
        info!("Persisted state cleared");
        Ok(())
    }

    /// State held in the backup envelope, if one exists
    pub fn restore_from_backup(&self) -> StoreResult<Option<AppState>> {
        let Some(backup_json) = self
            .storage
            .get_item(&self.keys.backup)
            .map_err(|e| StoreError::Read(e.to_string()))?
        else {
            return Ok(None);
        };

        let backup: BackupEnvelope =
            serde_json::from_str(&backup_json).map_err(|e| StoreError::Read(e.to_string()))?;
        let mut state: AppState =
            serde_json::from_str(&backup.data).map_err(|e| StoreError::Read(e.to_string()))?;
        state.normalize();

        info!(backup_time = %backup.timestamp, "State restored from backup");
        Ok(Some(state))
    }
}

/// Extract the state from an export document. The version tag is informational
/// only; any document with a well-formed `data` tree is accepted.
pub fn parse_export(text: &str) -> StoreResult<AppState> {
    let doc: serde_json::Value =
        serde_json::from_str(text).map_err(|e| StoreError::ImportFormat(e.to_string()))?;

    let data = match doc.get("data") {
        Some(data) if !data.is_null() => data.clone(),
        _ => return Err(StoreError::ImportFormat("missing data field".into())),
    };

    if let Some(version) = doc.get("version").and_then(|v| v.as_str()) {
        if version != EXPORT_FORMAT_VERSION {
            warn!(version, expected = EXPORT_FORMAT_VERSION, "Importing unknown export version");
        }
    }

    serde_json::from_value(data).map_err(|e| StoreError::ImportFormat(e.to_string()))
}
