#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod notification;
pub mod pomodoro_timer;
pub mod tracker;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, TrackerError};
pub use notification::{Notification, RewardReason};
pub use pomodoro_timer::{DEFAULT_TICK, PomodoroTimer, TimerEvent};
pub use tracker::{AchievementView, Outcome, StudyTracker};
