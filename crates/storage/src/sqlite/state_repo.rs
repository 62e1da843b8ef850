use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{StateRepository, StorageError};
use crate::snapshot::{STATE_KEY, StateSnapshot};

use super::SqliteRepository;

#[async_trait]
impl StateRepository for SqliteRepository {
    async fn load_snapshot(&self) -> Result<Option<StateSnapshot>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT value
            FROM kv_store
            WHERE key = ?1
            ",
        )
        .bind(STATE_KEY)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row
            .try_get("value")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        Ok(Some(StateSnapshot::decode(&raw)?))
    }

    async fn save_snapshot(&self, snapshot: &StateSnapshot) -> Result<(), StorageError> {
        let encoded = snapshot.encode()?;

        sqlx::query(
            r"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(STATE_KEY)
        .bind(&encoded)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        tracing::debug!(bytes = encoded.len(), "saved state snapshot");
        Ok(())
    }
}
