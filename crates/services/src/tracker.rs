use std::sync::Arc;

use storage::repository::StateRepository;
use storage::snapshot::StateSnapshot;
use study_core::model::achievement::{self, ProgressGoal};
use study_core::model::shop::{self, ShopListing};
use study_core::model::{
    ACHIEVEMENT_REWARD_POINTS, ACHIEVEMENTS, AchievementDefinition, AppState, GradeDraft, GradeId,
    GradeRecord, PaperDraft, PaperId, PaperRecord, ShopItemId, StreakChange,
};
use study_core::pomodoro::PomodoroEvent;

use crate::Clock;
use crate::error::TrackerError;
use crate::notification::{Notification, RewardReason};

/// Result of a successful tracker operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub notifications: Vec<Notification>,
}

/// Badge with its current unlock status.
#[derive(Debug, Clone, Copy)]
pub struct AchievementView {
    pub definition: &'static AchievementDefinition,
    pub unlocked: bool,
}

/// Owns the application state for one session and applies user actions to it.
///
/// Every mutating call validates first, mutates, re-evaluates achievements and
/// writes the whole state through the repository before returning. A failed
/// write restores the previous in-memory state.
pub struct StudyTracker {
    clock: Clock,
    state: AppState,
    repo: Arc<dyn StateRepository>,
}

impl StudyTracker {
    /// Load persisted state, or start from defaults when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if the stored document cannot be read.
    pub async fn load(clock: Clock, repo: Arc<dyn StateRepository>) -> Result<Self, TrackerError> {
        let state = match repo.load_snapshot().await? {
            Some(snapshot) => snapshot.into_state(),
            None => {
                tracing::info!("no saved state found, starting fresh");
                AppState::new()
            }
        };
        Ok(Self::with_state(clock, state, repo))
    }

    #[must_use]
    pub fn with_state(clock: Clock, state: AppState, repo: Arc<dyn StateRepository>) -> Self {
        Self { clock, state, repo }
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Daily check-in; call once when the app opens.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if persisting fails.
    pub async fn open_session(&mut self) -> Result<Outcome<StreakChange>, TrackerError> {
        let today = self.clock.today();
        self.apply(|state, out| {
            let change = state.user.record_activity_for_streak(today);
            if change != StreakChange::Unchanged {
                tracing::debug!(?change, streak_days = state.user.streak_days(), "daily streak");
                out.push(Notification::StreakUpdated {
                    streak_days: state.user.streak_days(),
                });
            }
            Ok(change)
        })
        .await
    }

    /// Validate and store a grade.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Record` for invalid input, `TrackerError::Storage`
    /// if persisting fails.
    pub async fn add_grade(&mut self, draft: GradeDraft) -> Result<Outcome<GradeRecord>, TrackerError> {
        let grade = draft.validate()?;
        let now = self.clock.now();
        self.apply(|state, out| {
            let record = state.records.add_grade(grade, now).clone();
            reward(state, RewardReason::GradeRecorded, out);
            Ok(record)
        })
        .await
    }

    /// Validate and store a practice paper.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Record` for invalid input, `TrackerError::Storage`
    /// if persisting fails.
    pub async fn add_paper(&mut self, draft: PaperDraft) -> Result<Outcome<PaperRecord>, TrackerError> {
        let paper = draft.validate()?;
        let now = self.clock.now();
        self.apply(|state, out| {
            let record = state.records.add_paper(paper, now).clone();
            reward(state, RewardReason::PaperRecorded, out);
            Ok(record)
        })
        .await
    }

    /// Delete a grade. Achievements already unlocked stay unlocked.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Record` if the id is unknown.
    pub async fn remove_grade(&mut self, id: GradeId) -> Result<Outcome<GradeRecord>, TrackerError> {
        self.apply(|state, _| Ok(state.records.remove_grade(id)?)).await
    }

    /// Delete a paper. Achievements already unlocked stay unlocked.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Record` if the id is unknown.
    pub async fn remove_paper(&mut self, id: PaperId) -> Result<Outcome<PaperRecord>, TrackerError> {
        self.apply(|state, _| Ok(state.records.remove_paper(id)?)).await
    }

    /// Manual study session: counts a study day and bumps the streak directly.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if persisting fails.
    pub async fn start_study_session(&mut self) -> Result<Outcome<()>, TrackerError> {
        self.apply(|state, out| {
            state.study_methods.study_days = state.study_methods.study_days.saturating_add(1);
            state.user.bump_streak();
            reward(state, RewardReason::StudySession, out);
            Ok(())
        })
        .await
    }

    /// Reward setting a SMART goal. The goal text itself is not kept.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::EmptyGoal` for blank text.
    pub async fn set_goal(&mut self, goal: &str) -> Result<Outcome<()>, TrackerError> {
        if goal.trim().is_empty() {
            return Err(TrackerError::EmptyGoal);
        }
        tracing::info!(goal = goal.trim(), "goal set");
        self.apply(|state, out| {
            reward(state, RewardReason::GoalSet, out);
            Ok(())
        })
        .await
    }

    /// Credit a finished focus interval.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if persisting fails.
    pub async fn complete_pomodoro(&mut self) -> Result<Outcome<u32>, TrackerError> {
        self.apply(|state, out| {
            state.study_methods.pomodoro_sessions =
                state.study_methods.pomodoro_sessions.saturating_add(1);
            reward(state, RewardReason::PomodoroCompleted, out);
            Ok(state.study_methods.pomodoro_sessions)
        })
        .await
    }

    /// Route a timer event: focus completions are credited, breaks are not.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if persisting a credited interval fails.
    pub async fn handle_pomodoro_event(
        &mut self,
        event: PomodoroEvent,
    ) -> Result<Vec<Notification>, TrackerError> {
        match event {
            PomodoroEvent::FocusCompleted => Ok(self.complete_pomodoro().await?.notifications),
            PomodoroEvent::BreakCompleted => Ok(Vec::new()),
        }
    }

    /// Buy a shop item with points.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Shop` if the balance is too low or the item is
    /// already owned; nothing changes in that case.
    pub async fn buy_item(&mut self, item: ShopItemId) -> Result<Outcome<()>, TrackerError> {
        self.apply(|state, out| {
            let bought = state.shop.purchase(item, &mut state.user).inspect_err(|err| {
                tracing::warn!(%item, %err, "purchase rejected");
            })?;
            tracing::info!(%item, price = bought.price, "item purchased");
            out.push(Notification::Purchased {
                item,
                name: bought.name,
                price: bought.price,
            });
            Ok(())
        })
        .await
    }

    /// Re-evaluate achievements without any other change.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if persisting fails.
    pub async fn check_achievements(&mut self) -> Result<Outcome<()>, TrackerError> {
        self.apply(|_, _| Ok(())).await
    }

    #[must_use]
    pub fn achievements(&self) -> Vec<AchievementView> {
        ACHIEVEMENTS
            .iter()
            .map(|definition| AchievementView {
                definition,
                unlocked: self.state.achievements.contains(definition.id),
            })
            .collect()
    }

    #[must_use]
    pub fn progress_goals(&self) -> Vec<ProgressGoal> {
        achievement::progress_goals(&self.state.achievement_stats())
    }

    #[must_use]
    pub fn shop_listings(&self) -> Vec<ShopListing> {
        shop::listings(&self.state.shop, self.state.user.points())
    }

    async fn apply<T>(
        &mut self,
        op: impl FnOnce(&mut AppState, &mut Vec<Notification>) -> Result<T, TrackerError>,
    ) -> Result<Outcome<T>, TrackerError> {
        let before = self.state.clone();
        let mut notifications = Vec::new();
        let value = op(&mut self.state, &mut notifications)?;
        unlock_achievements(&mut self.state, &mut notifications);

        if let Err(err) = self.persist().await {
            tracing::warn!(%err, "state write failed, rolling back");
            self.state = before;
            return Err(err);
        }
        Ok(Outcome {
            value,
            notifications,
        })
    }

    async fn persist(&self) -> Result<(), TrackerError> {
        self.repo
            .save_snapshot(&StateSnapshot::from_state(&self.state))
            .await?;
        Ok(())
    }
}

fn reward(state: &mut AppState, reason: RewardReason, out: &mut Vec<Notification>) {
    let (experience, points) = reason.amounts();
    out.push(Notification::Reward {
        reason,
        experience,
        points,
    });
    if let Some(up) = state.user.add_experience(experience) {
        tracing::info!(level = up.level, title = up.title, "level up");
        out.push(Notification::LevelUp {
            level: up.level,
            title: up.title,
        });
    }
    state.user.add_points(points);
}

fn unlock_achievements(state: &mut AppState, out: &mut Vec<Notification>) {
    let evaluated = achievement::evaluate(&state.achievement_stats());
    for id in achievement::reconcile(&state.achievements, &evaluated) {
        state.achievements.insert(id);
        state.user.add_points(ACHIEVEMENT_REWARD_POINTS);
        let definition = id.definition();
        tracing::info!(achievement = id.as_str(), "achievement unlocked");
        out.push(Notification::AchievementUnlocked {
            id,
            name: definition.name,
            icon: definition.icon,
            points: ACHIEVEMENT_REWARD_POINTS,
        });
    }
}
