use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use study_core::pomodoro::{PomodoroEvent, PomodoroSession, PomodoroSettings};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Real-time tick interval.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Emitted by the background ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { time_left: u32 },
    Completed(PomodoroEvent),
}

/// Session plus the id of the ticker allowed to drive it.
#[derive(Debug)]
struct Shared {
    session: PomodoroSession,
    generation: u64,
}

/// Drives a `PomodoroSession` from a tokio interval.
///
/// At most one ticker task runs at a time. Pause, reset and close bump the
/// generation under the session lock before aborting the task, and a ticker
/// only sends while holding that lock with a matching generation. Once those
/// calls return nothing new is sent; events queued earlier stay in the channel.
pub struct PomodoroTimer {
    shared: Arc<Mutex<Shared>>,
    tick: Duration,
    events: mpsc::UnboundedSender<TimerEvent>,
    task: Option<JoinHandle<()>>,
}

impl PomodoroTimer {
    /// Create an idle timer and the receiver for its events.
    #[must_use]
    pub fn new(
        settings: PomodoroSettings,
        tick: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let timer = Self {
            shared: Arc::new(Mutex::new(Shared {
                session: PomodoroSession::new(settings),
                generation: 0,
            })),
            tick,
            events,
            task: None,
        };
        (timer, rx)
    }

    /// Start or resume the countdown. Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        let generation = {
            let mut guard = lock(&self.shared);
            if !guard.session.start() {
                return false;
            }
            guard.generation += 1;
            guard.generation
        };
        self.stop_task();

        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        let period = self.tick;
        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut guard = lock(&shared);
                if guard.generation != generation || !guard.session.is_running() {
                    break;
                }
                let (event, done) = match guard.session.tick() {
                    Some(event) => (TimerEvent::Completed(event), true),
                    None => (
                        TimerEvent::Tick {
                            time_left: guard.session.time_left(),
                        },
                        false,
                    ),
                };
                if events.send(event).is_err() {
                    tracing::debug!("timer receiver dropped, stopping ticker");
                    break;
                }
                if done {
                    break;
                }
            }
        }));
        tracing::debug!(tick_ms = period.as_millis(), generation, "pomodoro ticker started");
        true
    }

    /// Stop ticking and keep the remaining time.
    pub fn pause(&mut self) {
        {
            let mut guard = lock(&self.shared);
            guard.generation += 1;
            guard.session.pause();
        }
        self.stop_task();
    }

    /// Stop ticking and rewind the current phase to its full length.
    pub fn reset(&mut self) {
        {
            let mut guard = lock(&self.shared);
            guard.generation += 1;
            guard.session.reset();
        }
        self.stop_task();
    }

    /// Abort the ticker; used when the timer view is dismissed.
    pub fn close(&mut self) {
        self.pause();
    }

    #[must_use]
    pub fn snapshot(&self) -> PomodoroSession {
        lock(&self.shared).session.clone()
    }

    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn stop_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("pomodoro ticker stopped");
        }
    }
}

impl Drop for PomodoroTimer {
    fn drop(&mut self) {
        self.stop_task();
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
