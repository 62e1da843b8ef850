//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::model::{RecordError, ShopError};

/// Errors emitted by `StudyTracker`.
///
/// Every variant is raised before the in-memory state changes, or after a
/// failed write has been rolled back.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerError {
    #[error("goal text cannot be empty")]
    EmptyGoal,
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Shop(#[from] ShopError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}
