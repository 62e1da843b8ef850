//! Focus/break interval state machine.
//!
//! The session is driven by an external ticker calling [`PomodoroSession::tick`]
//! once per second while it is running. It never touches the clock itself, so
//! the same machine works under a real interval timer and in tests.

/// Default focus interval: 25 minutes.
pub const FOCUS_SECS: u32 = 25 * 60;
/// Default break interval: 5 minutes.
pub const BREAK_SECS: u32 = 5 * 60;

/// Experience granted for a completed focus interval.
pub const FOCUS_REWARD_EXPERIENCE: u64 = 25;
/// Points granted for a completed focus interval.
pub const FOCUS_REWARD_POINTS: u64 = 15;

/// Interval lengths in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PomodoroSettings {
    pub focus_secs: u32,
    pub break_secs: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            focus_secs: FOCUS_SECS,
            break_secs: BREAK_SECS,
        }
    }
}

impl PomodoroSettings {
    /// Returns `None` if either interval is zero.
    #[must_use]
    pub fn new(focus_secs: u32, break_secs: u32) -> Option<Self> {
        (focus_secs > 0 && break_secs > 0).then_some(Self {
            focus_secs,
            break_secs,
        })
    }

    #[must_use]
    pub fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Focus => self.focus_secs,
            Phase::Break => self.break_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Focus,
    Break,
}

/// Coarse state for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PomodoroStatus {
    Idle,
    Focus { running: bool },
    Break { running: bool },
}

/// Fired when an interval runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PomodoroEvent {
    /// A focus interval finished; the caller grants the reward. Now on break.
    FocusCompleted,
    /// A break finished. Back to focus, no reward.
    BreakCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomodoroSession {
    settings: PomodoroSettings,
    phase: Phase,
    running: bool,
    time_left: u32,
}

impl Default for PomodoroSession {
    fn default() -> Self {
        Self::new(PomodoroSettings::default())
    }
}

impl PomodoroSession {
    #[must_use]
    pub fn new(settings: PomodoroSettings) -> Self {
        Self {
            settings,
            phase: Phase::Focus,
            running: false,
            time_left: settings.focus_secs,
        }
    }

    #[must_use]
    pub fn settings(&self) -> PomodoroSettings {
        self.settings
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn is_break(&self) -> bool {
        self.phase == Phase::Break
    }

    #[must_use]
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    #[must_use]
    pub fn status(&self) -> PomodoroStatus {
        match self.phase {
            Phase::Focus if !self.running && self.time_left == self.settings.focus_secs => {
                PomodoroStatus::Idle
            }
            Phase::Focus => PomodoroStatus::Focus {
                running: self.running,
            },
            Phase::Break => PomodoroStatus::Break {
                running: self.running,
            },
        }
    }

    /// Start or resume ticking. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Stop ticking, keeping the remaining time.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Stop ticking and rewind the current phase to its full length.
    pub fn reset(&mut self) {
        self.running = false;
        self.time_left = self.settings.duration_of(self.phase);
    }

    /// Advance by one second. Ticks while paused are ignored.
    pub fn tick(&mut self) -> Option<PomodoroEvent> {
        if !self.running {
            return None;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            return None;
        }

        self.running = false;
        let event = match self.phase {
            Phase::Focus => {
                self.phase = Phase::Break;
                PomodoroEvent::FocusCompleted
            }
            Phase::Break => {
                self.phase = Phase::Focus;
                PomodoroEvent::BreakCompleted
            }
        };
        self.time_left = self.settings.duration_of(self.phase);
        Some(event)
    }

    /// Remaining time as `mm:ss`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.time_left / 60, self.time_left % 60)
    }
}
