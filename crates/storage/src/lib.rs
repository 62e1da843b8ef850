#![forbid(unsafe_code)]

pub mod repository;
pub mod snapshot;
pub mod sqlite;

pub use repository::{InMemoryRepository, StateRepository, Storage, StorageError};
pub use snapshot::{SCHEMA_VERSION, STATE_KEY, SnapshotError, StateSnapshot};
