use std::sync::Arc;

use lesson_core::model::{Catalog, ProgressSnapshot};
use thiserror::Error;

use crate::repository::{ProgressRepository, StorageError};

/// Slot holding the serialized progress snapshot.
pub const PROGRESS_KEY: &str = "hardwareGameProgress";

/// The stored blob exists but is not a progress snapshot.
#[derive(Debug, Error)]
#[error("stored progress is corrupt: {0}")]
pub struct CorruptProgressError(#[from] serde_json::Error);

/// Parse a stored blob. Blobs without `exercisePerformance` are accepted and
/// get an empty map.
///
/// # Errors
///
/// Returns `CorruptProgressError` if the blob is not valid snapshot JSON.
pub fn decode_snapshot(blob: &str) -> Result<ProgressSnapshot, CorruptProgressError> {
    Ok(serde_json::from_str(blob)?)
}

/// Serialize a snapshot for storage.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_snapshot(snapshot: &ProgressSnapshot) -> Result<String, StorageError> {
    serde_json::to_string(snapshot).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Loads and saves the player's progress snapshot in a single slot.
#[derive(Clone)]
pub struct ProgressStore {
    repo: Arc<dyn ProgressRepository>,
    key: String,
}

impl ProgressStore {
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>) -> Self {
        Self {
            repo,
            key: PROGRESS_KEY.to_string(),
        }
    }

    /// Use a different slot key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the snapshot for `catalog`.
    ///
    /// A missing slot yields fresh progress. A corrupt slot is logged and also
    /// yields fresh progress; the stored blob is left untouched until the next
    /// save overwrites it. The result is normalized against the catalog.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    pub async fn load(&self, catalog: &Catalog) -> Result<ProgressSnapshot, StorageError> {
        let mut snapshot = match self.repo.load_slot(&self.key).await? {
            None => {
                tracing::debug!(key = %self.key, "no stored progress, starting fresh");
                ProgressSnapshot::for_catalog(catalog)
            }
            Some(blob) => match decode_snapshot(&blob) {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    tracing::warn!(key = %self.key, %error, "resetting corrupt progress");
                    ProgressSnapshot::for_catalog(catalog)
                }
            },
        };

        let report = snapshot.normalize(catalog);
        if !report.is_clean() {
            tracing::warn!(
                restored_first_skill = report.restored_first_skill,
                pruned = report.pruned_lessons.len(),
                "stored progress did not match the catalog"
            );
        }

        Ok(snapshot)
    }

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails. The
    /// previously stored snapshot stays in place in that case.
    pub async fn save(&self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        let blob = encode_snapshot(snapshot)?;
        self.repo.save_slot(&self.key, &blob).await?;
        tracing::debug!(key = %self.key, bytes = blob.len(), "saved progress");
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
