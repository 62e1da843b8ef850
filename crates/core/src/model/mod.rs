pub mod achievement;
mod ids;
mod progress;
mod record;
pub mod shop;
mod state;
mod store;
pub mod study_methods;

pub use ids::{GradeId, IdAllocator, PaperId, ParseIdError};

pub use achievement::{
    ACHIEVEMENT_REWARD_POINTS, ACHIEVEMENTS, AchievementDefinition, AchievementId,
    AchievementStats, ProgressGoal, UnlockedAchievements,
};
pub use progress::{
    LEVELS, LevelDefinition, LevelUp, MAX_LEVEL, MIN_LEVEL, ProgressError, StreakChange,
    UserProgress, level_info,
};
pub use record::{
    DATE_FORMAT, GradeDraft, GradeRecord, NewGrade, NewPaper, PaperDraft, PaperRecord,
    RecordError, check_scores,
};
pub use shop::{SHOP_ITEMS, ShopError, ShopItem, ShopItemId, ShopListing, ShopState};
pub use state::{AppState, DashboardStats};
pub use store::{Activity, PaperFilter, RecordStore, SubjectSummary, Trend};
pub use study_methods::{Guide, ReviewStep, StudyMethods};
