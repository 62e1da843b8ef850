use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::snapshot::{STATE_KEY, SnapshotError, StateSnapshot};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<SnapshotError> for StorageError {
    fn from(err: SnapshotError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Persistence contract for the single application-state document.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Fetch the stored snapshot, upgraded to the current schema.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the document cannot be decoded.
    async fn load_snapshot(&self) -> Result<Option<StateSnapshot>, StorageError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be encoded or stored.
    async fn save_snapshot(&self, snapshot: &StateSnapshot) -> Result<(), StorageError>;
}

/// Simple in-memory key-value repository for testing and prototyping.
///
/// Documents are kept in their encoded form so loads exercise the same
/// upgrade path as the `SQLite` backend.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Seed the repository with a raw document, e.g. one written by an older build.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw(&self, raw: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(STATE_KEY.to_string(), raw.into());
        Ok(())
    }

    /// The raw stored document, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn raw(&self) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(STATE_KEY).cloned())
    }
}

#[async_trait]
impl StateRepository for InMemoryRepository {
    async fn load_snapshot(&self) -> Result<Option<StateSnapshot>, StorageError> {
        match self.raw()? {
            Some(raw) => Ok(Some(StateSnapshot::decode(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save_snapshot(&self, snapshot: &StateSnapshot) -> Result<(), StorageError> {
        let encoded = snapshot.encode()?;
        self.put_raw(encoded)
    }
}

/// Wraps the state repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub state: Arc<dyn StateRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(InMemoryRepository::new()),
        }
    }
}
