use std::sync::Arc;
use std::time::Duration;

use storage::repository::Storage;
use study_core::pomodoro::PomodoroSettings;
use tokio::sync::mpsc;

use crate::Clock;
use crate::error::AppServicesError;
use crate::pomodoro_timer::{PomodoroTimer, TimerEvent};
use crate::tracker::StudyTracker;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    clock: Clock,
    pomodoro: PomodoroSettings,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        pomodoro: PomodoroSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self {
            storage,
            clock,
            pomodoro,
        })
    }

    /// Build services over a volatile in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock, pomodoro: PomodoroSettings) -> Self {
        Self {
            storage: Storage::in_memory(),
            clock,
            pomodoro,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn pomodoro_settings(&self) -> PomodoroSettings {
        self.pomodoro
    }

    /// Load the tracker from storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Tracker` if the saved state cannot be read.
    pub async fn tracker(&self) -> Result<StudyTracker, AppServicesError> {
        Ok(StudyTracker::load(self.clock, Arc::clone(&self.storage.state)).await?)
    }

    #[must_use]
    pub fn pomodoro_timer(
        &self,
        tick: Duration,
    ) -> (PomodoroTimer, mpsc::UnboundedReceiver<TimerEvent>) {
        PomodoroTimer::new(self.pomodoro, tick)
    }
}
