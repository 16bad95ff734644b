use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{ProgressRepository, StorageError};

use super::SqliteRepository;

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_slot(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT blob
            FROM progress_slots
            WHERE key = ?1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let blob: String = row
            .try_get("blob")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Ok(Some(blob))
    }

    async fn save_slot(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        // Single statement: the slot is either fully replaced or untouched.
        sqlx::query(
            r"
            INSERT INTO progress_slots (key, blob, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                blob = excluded.blob,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(blob)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
