use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Session counters persisted alongside the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudyMethods {
    pub pomodoro_sessions: u32,
    pub study_days: u32,
}

/// Day numbers (day 1 = first study) on which spaced-repetition reviews happen.
pub const REVIEW_DAYS: [i64; 6] = [1, 2, 4, 7, 15, 30];

/// One step of a spaced-repetition plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewStep {
    pub day: i64,
    pub date: NaiveDate,
    /// 0 for the initial study session, then 1.. for each review.
    pub review: usize,
}

/// Concrete review dates for material first studied on `start`.
#[must_use]
pub fn review_plan(start: NaiveDate) -> Vec<ReviewStep> {
    REVIEW_DAYS
        .iter()
        .enumerate()
        .map(|(review, &day)| ReviewStep {
            day,
            date: start + Duration::days(day - 1),
            review,
        })
        .collect()
}

/// Built-in study technique guides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guide {
    Feynman,
    SpacedRepetition,
    SmartGoal,
    MindMap,
}

impl Guide {
    pub const ALL: [Guide; 4] = [
        Guide::Feynman,
        Guide::SpacedRepetition,
        Guide::SmartGoal,
        Guide::MindMap,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Guide::Feynman => "feynman",
            Guide::SpacedRepetition => "review",
            Guide::SmartGoal => "smart",
            Guide::MindMap => "mindmap",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|guide| guide.key() == key.trim())
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Guide::Feynman => "费曼学习法四步骤",
            Guide::SpacedRepetition => "间隔重复复习计划",
            Guide::SmartGoal => "设定你的SMART学习目标",
            Guide::MindMap => "思维导图创建步骤",
        }
    }

    #[must_use]
    pub fn steps(self) -> &'static [&'static str] {
        match self {
            Guide::Feynman => &[
                "选择一个概念",
                "用简单的话解释给别人听",
                "发现不懂的地方，回去学习",
                "简化和类比，直到能清楚解释",
            ],
            Guide::SpacedRepetition => &[
                "第1天：学习新内容",
                "第2天：第一次复习",
                "第4天：第二次复习",
                "第7天：第三次复习",
                "第15天：第四次复习",
                "第30天：第五次复习",
            ],
            Guide::SmartGoal => &[
                "S - 具体的 (Specific)",
                "M - 可衡量的 (Measurable)",
                "A - 可达成的 (Achievable)",
                "R - 相关的 (Relevant)",
                "T - 有时限的 (Time-bound)",
            ],
            Guide::MindMap => &[
                "在中心写下主题",
                "从中心向外画分支",
                "每个分支写一个关键词",
                "继续细分子分支",
                "使用颜色和图像",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_plan_offsets_from_day_one() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let plan = review_plan(start);
        let dates: Vec<String> = plan.iter().map(|s| s.date.to_string()).collect();
        assert_eq!(
            dates,
            vec![
                "2024-01-01",
                "2024-01-02",
                "2024-01-04",
                "2024-01-07",
                "2024-01-15",
                "2024-01-30"
            ]
        );
        assert_eq!(plan[0].review, 0);
        assert_eq!(plan[5].review, 5);
    }

    #[test]
    fn guide_keys_round_trip() {
        for guide in Guide::ALL {
            assert_eq!(Guide::from_key(guide.key()), Some(guide));
            assert!(!guide.steps().is_empty());
        }
        assert_eq!(Guide::from_key("unknown"), None);
    }
}
