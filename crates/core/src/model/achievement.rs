use serde::{Deserialize, Serialize};

/// Points granted once when an achievement unlocks.
pub const ACHIEVEMENT_REWARD_POINTS: u64 = 50;

/// Stable identifiers of the built-in achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstGrade,
    GradeMaster,
    HighAchiever,
    PaperCollector,
    PomodoroStarter,
    PomodoroMaster,
    ConsistentLearner,
    LevelUp,
}

impl AchievementId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AchievementId::FirstGrade => "first_grade",
            AchievementId::GradeMaster => "grade_master",
            AchievementId::HighAchiever => "high_achiever",
            AchievementId::PaperCollector => "paper_collector",
            AchievementId::PomodoroStarter => "pomodoro_starter",
            AchievementId::PomodoroMaster => "pomodoro_master",
            AchievementId::ConsistentLearner => "consistent_learner",
            AchievementId::LevelUp => "level_up",
        }
    }

    #[must_use]
    pub fn definition(self) -> &'static AchievementDefinition {
        ACHIEVEMENTS
            .iter()
            .find(|def| def.id == self)
            .unwrap_or(&ACHIEVEMENTS[0])
    }
}

/// Aggregates the unlock predicates look at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AchievementStats {
    pub grade_count: usize,
    pub paper_count: usize,
    pub pomodoro_sessions: u32,
    pub average_score_percent: f64,
    pub streak_days: u32,
    pub level: u8,
}

/// Display data plus the unlock predicate for one achievement.
pub struct AchievementDefinition {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    predicate: fn(&AchievementStats) -> bool,
}

impl AchievementDefinition {
    #[must_use]
    pub fn is_met(&self, stats: &AchievementStats) -> bool {
        (self.predicate)(stats)
    }
}

impl std::fmt::Debug for AchievementDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AchievementDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub static ACHIEVEMENTS: [AchievementDefinition; 8] = [
    AchievementDefinition {
        id: AchievementId::FirstGrade,
        name: "初次记录",
        description: "录入第一个成绩",
        icon: "🎯",
        predicate: |s| s.grade_count >= 1,
    },
    AchievementDefinition {
        id: AchievementId::GradeMaster,
        name: "成绩达人",
        description: "录入10个成绩",
        icon: "📊",
        predicate: |s| s.grade_count >= 10,
    },
    AchievementDefinition {
        id: AchievementId::HighAchiever,
        name: "学霸",
        description: "平均分达到90分",
        icon: "🏆",
        predicate: |s| s.average_score_percent >= 90.0,
    },
    AchievementDefinition {
        id: AchievementId::PaperCollector,
        name: "试卷收集家",
        description: "整理5份试卷",
        icon: "📝",
        predicate: |s| s.paper_count >= 5,
    },
    AchievementDefinition {
        id: AchievementId::PomodoroStarter,
        name: "番茄新手",
        description: "完成第一个番茄钟",
        icon: "🍅",
        predicate: |s| s.pomodoro_sessions >= 1,
    },
    AchievementDefinition {
        id: AchievementId::PomodoroMaster,
        name: "番茄大师",
        description: "完成50个番茄钟",
        icon: "🔥",
        predicate: |s| s.pomodoro_sessions >= 50,
    },
    AchievementDefinition {
        id: AchievementId::ConsistentLearner,
        name: "坚持学习",
        description: "连续学习7天",
        icon: "💪",
        predicate: |s| s.streak_days >= 7,
    },
    AchievementDefinition {
        id: AchievementId::LevelUp,
        name: "等级提升",
        description: "达到3级",
        icon: "⭐",
        predicate: |s| s.level >= 3,
    },
];

/// Every achievement whose predicate currently holds, in catalog order.
#[must_use]
pub fn evaluate(stats: &AchievementStats) -> Vec<AchievementId> {
    ACHIEVEMENTS
        .iter()
        .filter(|def| def.is_met(stats))
        .map(|def| def.id)
        .collect()
}

/// Ids in `evaluated` that are not yet recorded as unlocked.
#[must_use]
pub fn reconcile(
    previously_unlocked: &UnlockedAchievements,
    evaluated: &[AchievementId],
) -> Vec<AchievementId> {
    evaluated
        .iter()
        .copied()
        .filter(|id| !previously_unlocked.contains(*id))
        .collect()
}

/// Unlocked achievement ids in unlock order. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnlockedAchievements(Vec<AchievementId>);

impl UnlockedAchievements {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from storage, dropping duplicate ids while keeping first-unlock order.
    #[must_use]
    pub fn from_persisted(ids: Vec<AchievementId>) -> Self {
        let mut unlocked = Self::new();
        for id in ids {
            unlocked.insert(id);
        }
        unlocked
    }

    #[must_use]
    pub fn contains(&self, id: AchievementId) -> bool {
        self.0.contains(&id)
    }

    /// Returns false if the id was already unlocked.
    pub fn insert(&mut self, id: AchievementId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id);
        true
    }

    #[must_use]
    pub fn ids(&self) -> &[AchievementId] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//
// ─── PROGRESS GOALS ────────────────────────────────────────────────────────────
//

/// Long-running goal shown next to the badges.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressGoal {
    pub name: &'static str,
    pub current: u64,
    pub target: u64,
    pub unit: &'static str,
}

impl ProgressGoal {
    /// Completion in percent, capped at 100.
    #[must_use]
    pub fn percent(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.current as f64 / self.target as f64;
        (ratio * 100.0).min(100.0)
    }
}

#[must_use]
pub fn progress_goals(stats: &AchievementStats) -> Vec<ProgressGoal> {
    vec![
        ProgressGoal {
            name: "成绩记录进度",
            current: stats.grade_count as u64,
            target: 20,
            unit: "个",
        },
        ProgressGoal {
            name: "试卷整理进度",
            current: stats.paper_count as u64,
            target: 10,
            unit: "份",
        },
        ProgressGoal {
            name: "番茄钟进度",
            current: u64::from(stats.pomodoro_sessions),
            target: 100,
            unit: "个",
        },
        ProgressGoal {
            name: "连续学习进度",
            current: u64::from(stats.streak_days),
            target: 30,
            unit: "天",
        },
    ]
}
