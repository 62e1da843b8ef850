use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("insufficient points: balance {balance}, required {required}")]
    InsufficientPoints { balance: u64, required: u64 },
}

//
// ─── LEVEL TABLE ───────────────────────────────────────────────────────────────
//

/// One rung of the level ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDefinition {
    pub level: u8,
    pub title: &'static str,
    pub experience_required: u64,
}

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 6;

/// Level ladder; thresholds double at every step and level 6 is terminal.
pub static LEVELS: [LevelDefinition; 6] = [
    LevelDefinition {
        level: 1,
        title: "学习者",
        experience_required: 100,
    },
    LevelDefinition {
        level: 2,
        title: "勤奋生",
        experience_required: 200,
    },
    LevelDefinition {
        level: 3,
        title: "优等生",
        experience_required: 400,
    },
    LevelDefinition {
        level: 4,
        title: "学习达人",
        experience_required: 800,
    },
    LevelDefinition {
        level: 5,
        title: "学霸",
        experience_required: 1600,
    },
    LevelDefinition {
        level: 6,
        title: "学神",
        experience_required: 3200,
    },
];

/// Looks up a level definition, falling back to the top rung for unknown levels.
#[must_use]
pub fn level_info(level: u8) -> &'static LevelDefinition {
    LEVELS
        .iter()
        .find(|def| def.level == level)
        .unwrap_or(&LEVELS[LEVELS.len() - 1])
}

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

/// Emitted when `add_experience` crosses the current threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u8,
    pub title: &'static str,
}

/// What the daily streak check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Already checked in today.
    Unchanged,
    /// Last activity was yesterday.
    Extended { streak_days: u32 },
    /// First use, or a gap of more than one day.
    Reset,
}

//
// ─── USER PROGRESS ─────────────────────────────────────────────────────────────
//

/// Level, experience, points and streak of the single local user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProgress {
    level: u8,
    experience: u64,
    points: u64,
    streak_days: u32,
    last_active_date: Option<NaiveDate>,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            level: MIN_LEVEL,
            experience: 0,
            points: 0,
            streak_days: 0,
            last_active_date: None,
        }
    }
}

impl UserProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate progress from persisted storage, clamping the level into range.
    #[must_use]
    pub fn from_persisted(
        level: u8,
        experience: u64,
        points: u64,
        streak_days: u32,
        last_active_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            level: level.clamp(MIN_LEVEL, MAX_LEVEL),
            experience,
            points,
            streak_days,
            last_active_date,
        }
    }

    /// Clamp fields that may have been hand-edited or written by an older schema.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::from_persisted(
            self.level,
            self.experience,
            self.points,
            self.streak_days,
            self.last_active_date,
        )
    }

    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        level_info(self.level).title
    }

    #[must_use]
    pub fn experience(&self) -> u64 {
        self.experience
    }

    /// Threshold that triggers the next level-up from the current level.
    #[must_use]
    pub fn experience_required(&self) -> u64 {
        level_info(self.level).experience_required
    }

    /// Fill ratio of the experience bar, in percent. May exceed 100 at level 6.
    #[must_use]
    pub fn experience_percent(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.experience as f64 / self.experience_required() as f64;
        ratio * 100.0
    }

    #[must_use]
    pub fn points(&self) -> u64 {
        self.points
    }

    #[must_use]
    pub fn streak_days(&self) -> u32 {
        self.streak_days
    }

    #[must_use]
    pub fn last_active_date(&self) -> Option<NaiveDate> {
        self.last_active_date
    }

    /// Add experience, levelling up at most once per call.
    ///
    /// Crossing the threshold below the top level bumps the level and discards
    /// all experience (including any excess). At the top level experience keeps
    /// accumulating.
    pub fn add_experience(&mut self, amount: u64) -> Option<LevelUp> {
        self.experience = self.experience.saturating_add(amount);

        if self.experience >= self.experience_required() && self.level < MAX_LEVEL {
            self.level += 1;
            self.experience = 0;
            return Some(LevelUp {
                level: self.level,
                title: self.title(),
            });
        }
        None
    }

    pub fn add_points(&mut self, amount: u64) {
        self.points = self.points.saturating_add(amount);
    }

    /// Deduct points from the balance.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InsufficientPoints` if the balance is below `amount`;
    /// the balance is left untouched.
    pub fn spend_points(&mut self, amount: u64) -> Result<(), ProgressError> {
        if self.points < amount {
            return Err(ProgressError::InsufficientPoints {
                balance: self.points,
                required: amount,
            });
        }
        self.points -= amount;
        Ok(())
    }

    /// Daily check-in performed once when the app opens.
    pub fn record_activity_for_streak(&mut self, today: NaiveDate) -> StreakChange {
        let change = match self.last_active_date {
            Some(last) if last == today => return StreakChange::Unchanged,
            Some(last) if today.pred_opt() == Some(last) => {
                self.streak_days = self.streak_days.saturating_add(1);
                StreakChange::Extended {
                    streak_days: self.streak_days,
                }
            }
            _ => {
                self.streak_days = 1;
                StreakChange::Reset
            }
        };
        self.last_active_date = Some(today);
        change
    }

    /// Unconditional streak bump used by the manual study-session reward.
    pub fn bump_streak(&mut self) {
        self.streak_days = self.streak_days.saturating_add(1);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn thresholds_are_monotonic() {
        let thresholds: Vec<u64> = LEVELS.iter().map(|l| l.experience_required).collect();
        assert_eq!(thresholds, vec![100, 200, 400, 800, 1600, 3200]);
        assert_eq!(level_info(42).level, 6);
    }

    #[test]
    fn ladder_titles_follow_level_order() {
        let ladder: Vec<(u8, &str)> = LEVELS.iter().map(|l| (l.level, l.title)).collect();
        assert_eq!(
            ladder,
            vec![
                (1, "学习者"),
                (2, "勤奋生"),
                (3, "优等生"),
                (4, "学习达人"),
                (5, "学霸"),
                (6, "学神"),
            ]
        );
    }

    #[test]
    fn exact_threshold_levels_up_once_and_resets() {
        let mut user = UserProgress::new();
        let up = user.add_experience(100).expect("level up");
        assert_eq!(up.level, 2);
        assert_eq!(up.title, "勤奋生");
        assert_eq!(user.level(), 2);
        assert_eq!(user.experience(), 0);
    }

    #[test]
    fn large_gain_crosses_only_one_level_and_drops_excess() {
        let mut user = UserProgress::new();
        assert!(user.add_experience(1_000).is_some());
        assert_eq!(user.level(), 2);
        assert_eq!(user.experience(), 0);
    }

    #[test]
    fn level_never_decreases_and_caps_at_six() {
        let mut user = UserProgress::new();
        let mut previous = user.level();
        for amount in [5, 99, 250, 1, 4_000, 3_200, 10, 7_777, 3_200, 3_200, 3_200, 99_999] {
            user.add_experience(amount);
            assert!(user.level() >= previous);
            assert!(user.level() <= MAX_LEVEL);
            previous = user.level();
        }
        assert_eq!(user.level(), MAX_LEVEL);
    }

    #[test]
    fn top_level_accumulates_experience() {
        let mut user = UserProgress::from_persisted(6, 3_000, 0, 0, None);
        assert!(user.add_experience(500).is_none());
        assert!(user.add_experience(10_000).is_none());
        assert_eq!(user.level(), 6);
        assert_eq!(user.experience(), 13_500);
    }

    #[test]
    fn spend_more_than_balance_fails_without_change() {
        let mut user = UserProgress::new();
        user.add_points(40);
        let err = user.spend_points(50).unwrap_err();
        assert_eq!(
            err,
            ProgressError::InsufficientPoints {
                balance: 40,
                required: 50
            }
        );
        assert_eq!(user.points(), 40);
        user.spend_points(40).unwrap();
        assert_eq!(user.points(), 0);
    }

    #[test]
    fn streak_extends_after_yesterday() {
        let mut user = UserProgress::from_persisted(1, 0, 0, 4, Some(day(2024, 3, 9)));
        let change = user.record_activity_for_streak(day(2024, 3, 10));
        assert_eq!(change, StreakChange::Extended { streak_days: 5 });
        assert_eq!(user.last_active_date(), Some(day(2024, 3, 10)));
    }

    #[test]
    fn streak_resets_after_gap() {
        let mut user = UserProgress::from_persisted(1, 0, 0, 4, Some(day(2024, 3, 7)));
        assert_eq!(user.record_activity_for_streak(day(2024, 3, 10)), StreakChange::Reset);
        assert_eq!(user.streak_days(), 1);
    }

    #[test]
    fn streak_same_day_is_noop_and_first_use_starts_at_one() {
        let mut user = UserProgress::new();
        assert_eq!(user.record_activity_for_streak(day(2024, 1, 1)), StreakChange::Reset);
        assert_eq!(user.streak_days(), 1);
        assert_eq!(user.record_activity_for_streak(day(2024, 1, 1)), StreakChange::Unchanged);
        assert_eq!(user.streak_days(), 1);
    }

    #[test]
    fn persisted_level_is_clamped() {
        assert_eq!(UserProgress::from_persisted(0, 0, 0, 0, None).level(), 1);
        assert_eq!(UserProgress::from_persisted(9, 0, 0, 0, None).level(), 6);
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let user: UserProgress = serde_json::from_str(r#"{"points": 12}"#).unwrap();
        assert_eq!(user.level(), 1);
        assert_eq!(user.points(), 12);
        assert_eq!(user.last_active_date(), None);
    }
}
