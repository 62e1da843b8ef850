use study_core::model::{AchievementId, ShopItemId};

/// Why experience and points were granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardReason {
    GradeRecorded,
    PaperRecorded,
    StudySession,
    GoalSet,
    PomodoroCompleted,
}

impl RewardReason {
    /// Experience and points granted for this reason.
    #[must_use]
    pub fn amounts(self) -> (u64, u64) {
        match self {
            RewardReason::GradeRecorded => (20, 10),
            RewardReason::PaperRecorded => (15, 8),
            RewardReason::StudySession => (10, 5),
            RewardReason::GoalSet => (15, 10),
            RewardReason::PomodoroCompleted => (
                study_core::pomodoro::FOCUS_REWARD_EXPERIENCE,
                study_core::pomodoro::FOCUS_REWARD_POINTS,
            ),
        }
    }
}

/// User-facing messages produced by tracker operations.
///
/// The presentation layer decides how to surface them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Reward {
        reason: RewardReason,
        experience: u64,
        points: u64,
    },
    LevelUp {
        level: u8,
        title: &'static str,
    },
    AchievementUnlocked {
        id: AchievementId,
        name: &'static str,
        icon: &'static str,
        points: u64,
    },
    Purchased {
        item: ShopItemId,
        name: &'static str,
        price: u64,
    },
    StreakUpdated {
        streak_days: u32,
    },
}
