use crate::model::achievement::{AchievementStats, UnlockedAchievements};
use crate::model::progress::UserProgress;
use crate::model::shop::ShopState;
use crate::model::store::RecordStore;
use crate::model::study_methods::StudyMethods;

/// The whole application state, owned by whoever drives the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub user: UserProgress,
    pub records: RecordStore,
    pub achievements: UnlockedAchievements,
    pub study_methods: StudyMethods,
    pub shop: ShopState,
}

/// Numbers shown on the dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub subject_count: usize,
    pub average_score_percent: u32,
    pub study_days: u32,
    pub paper_count: usize,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn achievement_stats(&self) -> AchievementStats {
        AchievementStats {
            grade_count: self.records.grades().len(),
            paper_count: self.records.papers().len(),
            pomodoro_sessions: self.study_methods.pomodoro_sessions,
            average_score_percent: self.records.overall_average_percent(),
            streak_days: self.user.streak_days(),
            level: self.user.level(),
        }
    }

    #[must_use]
    pub fn dashboard_stats(&self) -> DashboardStats {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let average = self.records.overall_average_percent().round().max(0.0) as u32;
        DashboardStats {
            subject_count: self.records.subjects().len(),
            average_score_percent: average,
            study_days: self.study_methods.study_days,
            paper_count: self.records.papers().len(),
        }
    }
}
