use std::fmt;
use std::time::Duration;

use study_core::pomodoro::{BREAK_SECS, FOCUS_SECS, PomodoroSettings};

pub const DEFAULT_DB_URL: &str = "sqlite://study-tracker.sqlite3";
pub const DEFAULT_LOG_FILTER: &str = "warn";
const DEFAULT_TICK_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { var: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { var, raw } => {
                write!(f, "{var} must be a positive integer, got {raw:?}")
            }
            ConfigError::InvalidDbUrl { raw } => write!(f, "not a sqlite database url: {raw:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime settings resolved from the environment; flags override them later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_url: String,
    pub log_filter: String,
    pub pomodoro: PomodoroSettings,
    pub tick: Duration,
}

impl AppConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_url = lookup("STUDY_DB_URL")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.to_string(), normalize_sqlite_url);
        let log_filter = lookup("STUDY_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let focus_secs = positive(&lookup, "STUDY_FOCUS_SECS")?.unwrap_or(u64::from(FOCUS_SECS));
        let break_secs = positive(&lookup, "STUDY_BREAK_SECS")?.unwrap_or(u64::from(BREAK_SECS));
        let pomodoro = pomodoro_settings(focus_secs, break_secs);
        let tick_ms = positive(&lookup, "STUDY_TICK_MS")?.unwrap_or(DEFAULT_TICK_MS);

        Ok(Self {
            db_url,
            log_filter,
            pomodoro,
            tick: Duration::from_millis(tick_ms),
        })
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(ConfigError::InvalidNumber { var, raw }),
    }
}

// Inputs are already checked to be positive.
fn pomodoro_settings(focus_secs: u64, break_secs: u64) -> PomodoroSettings {
    let focus = u32::try_from(focus_secs).unwrap_or(u32::MAX);
    let pause = u32::try_from(break_secs).unwrap_or(u32::MAX);
    PomodoroSettings::new(focus, pause).unwrap_or_default()
}

/// Turn a bare path or `sqlite:` url into an absolute `sqlite://` url.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}
