use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{GradeId, PaperId};

/// Date format accepted from form fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Full score assumed for a paper when none is given.
pub const DEFAULT_PAPER_FULL_SCORE: f64 = 100.0;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordError {
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("{field} is not a number: {raw:?}")]
    InvalidNumericInput { field: &'static str, raw: String },

    #[error("full score must be > 0")]
    NonPositiveFullScore,

    #[error("score cannot be negative")]
    NegativeScore,

    #[error("invalid date (expected YYYY-MM-DD): {raw:?}")]
    InvalidDate { raw: String },

    #[error("record not found: {id}")]
    NotFound { id: u64 },
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// A graded exam result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    pub id: GradeId,
    pub subject: String,
    pub score: f64,
    pub full_score: f64,
    pub exam_date: NaiveDate,
    pub exam_type: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl GradeRecord {
    /// Score as a percentage of the full score.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.score / self.full_score * 100.0
    }

    /// Re-check the score invariants on a record that did not come from a draft.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`check_scores`].
    pub fn check_scores(&self) -> Result<(), RecordError> {
        check_scores(self.score, self.full_score)
    }
}

/// A practice paper filed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRecord {
    pub id: PaperId,
    pub subject: String,
    pub title: String,
    #[serde(rename = "type")]
    pub paper_type: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub score: f64,
    #[serde(default = "default_paper_full_score")]
    pub full_score: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_paper_full_score() -> f64 {
    DEFAULT_PAPER_FULL_SCORE
}

impl PaperRecord {
    /// Percentage score, or `None` for papers that were never scored.
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        if self.score > 0.0 && self.full_score > 0.0 {
            Some(self.score / self.full_score * 100.0)
        } else {
            None
        }
    }

    /// # Errors
    ///
    /// Returns the same errors as [`check_scores`].
    pub fn check_scores(&self) -> Result<(), RecordError> {
        check_scores(self.score, self.full_score)
    }
}

//
// ─── VALIDATED INPUT ───────────────────────────────────────────────────────────
//

/// Validated grade fields awaiting an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGrade {
    pub subject: String,
    pub score: f64,
    pub full_score: f64,
    pub exam_date: NaiveDate,
    pub exam_type: String,
    pub notes: Option<String>,
}

impl NewGrade {
    pub(crate) fn into_record(self, id: GradeId) -> GradeRecord {
        GradeRecord {
            id,
            subject: self.subject,
            score: self.score,
            full_score: self.full_score,
            exam_date: self.exam_date,
            exam_type: self.exam_type,
            notes: self.notes,
        }
    }
}

/// Validated paper fields awaiting an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaper {
    pub subject: String,
    pub title: String,
    pub paper_type: String,
    pub date: NaiveDate,
    pub score: f64,
    pub full_score: f64,
    pub notes: Option<String>,
}

impl NewPaper {
    pub(crate) fn into_record(self, id: PaperId) -> PaperRecord {
        PaperRecord {
            id,
            subject: self.subject,
            title: self.title,
            paper_type: self.paper_type,
            date: self.date,
            score: self.score,
            full_score: self.full_score,
            notes: self.notes,
        }
    }
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Raw grade form values, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeDraft {
    pub subject: String,
    pub score: String,
    pub full_score: String,
    pub exam_date: String,
    pub exam_type: String,
    pub notes: Option<String>,
}

impl GradeDraft {
    /// Validate the raw form values.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if a required field is empty, a number does not parse,
    /// the full score is not positive, or the date is malformed.
    pub fn validate(self) -> Result<NewGrade, RecordError> {
        let subject = required("subject", self.subject)?;
        let exam_type = required("exam type", self.exam_type)?;
        let score = parse_number("score", &self.score)?;
        let full_score = parse_number("full score", &self.full_score)?;
        check_scores(score, full_score)?;
        let exam_date = parse_date(&self.exam_date)?;

        Ok(NewGrade {
            subject,
            score,
            full_score,
            exam_date,
            exam_type,
            notes: normalize_optional(self.notes),
        })
    }
}

/// Raw practice-paper form values. Score and full score may be left blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperDraft {
    pub subject: String,
    pub title: String,
    pub paper_type: String,
    pub date: String,
    pub score: Option<String>,
    pub full_score: Option<String>,
    pub notes: Option<String>,
}

impl PaperDraft {
    /// Validate the raw form values. A blank score means "not scored yet" (0) and
    /// a blank full score falls back to 100.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` on empty required fields, malformed numbers or dates.
    pub fn validate(self) -> Result<NewPaper, RecordError> {
        let subject = required("subject", self.subject)?;
        let title = required("title", self.title)?;
        let paper_type = required("type", self.paper_type)?;
        let score = match normalize_optional(self.score) {
            Some(raw) => parse_number("score", &raw)?,
            None => 0.0,
        };
        let full_score = match normalize_optional(self.full_score) {
            Some(raw) => parse_number("full score", &raw)?,
            None => DEFAULT_PAPER_FULL_SCORE,
        };
        check_scores(score, full_score)?;
        let date = parse_date(&self.date)?;

        Ok(NewPaper {
            subject,
            title,
            paper_type,
            date,
            score,
            full_score,
            notes: normalize_optional(self.notes),
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, RecordError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RecordError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, RecordError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| RecordError::InvalidNumericInput {
            field,
            raw: raw.to_string(),
        })
}

/// Score invariants shared by form input and stored records.
///
/// # Errors
///
/// Returns `RecordError::NonPositiveFullScore` or `RecordError::NegativeScore`.
pub fn check_scores(score: f64, full_score: f64) -> Result<(), RecordError> {
    if !full_score.is_finite() || full_score <= 0.0 {
        return Err(RecordError::NonPositiveFullScore);
    }
    if !score.is_finite() || score < 0.0 {
        return Err(RecordError::NegativeScore);
    }
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate, RecordError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| RecordError::InvalidDate {
        raw: raw.to_string(),
    })
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_grade_with_zero_full_score_fails_check() {
        let grade = NewGrade {
            subject: "Math".into(),
            score: 5.0,
            full_score: 0.0,
            exam_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            exam_type: "quiz".into(),
            notes: None,
        }
        .into_record(GradeId::new(1));
        assert_eq!(grade.check_scores(), Err(RecordError::NonPositiveFullScore));
        assert_eq!(
            check_scores(-1.0, 100.0),
            Err(RecordError::NegativeScore)
        );
        assert_eq!(
            check_scores(f64::NAN, 100.0),
            Err(RecordError::NegativeScore)
        );
    }

    fn grade_draft(score: &str, full: &str) -> GradeDraft {
        GradeDraft {
            subject: " Math ".into(),
            score: score.into(),
            full_score: full.into(),
            exam_date: "2024-05-01".into(),
            exam_type: "midterm".into(),
            notes: Some("   ".into()),
        }
    }

    #[test]
    fn grade_draft_trims_and_parses() {
        let grade = grade_draft("87.5", "100").validate().unwrap();
        assert_eq!(grade.subject, "Math");
        assert_eq!(grade.score, 87.5);
        assert_eq!(grade.notes, None);
        assert_eq!(grade.exam_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn grade_draft_rejects_non_numeric_score() {
        let err = grade_draft("abc", "100").validate().unwrap_err();
        assert_eq!(
            err,
            RecordError::InvalidNumericInput {
                field: "score",
                raw: "abc".into()
            }
        );
        let err = grade_draft("90", "NaN").validate().unwrap_err();
        assert!(matches!(err, RecordError::InvalidNumericInput { field: "full score", .. }));
    }

    #[test]
    fn grade_draft_rejects_zero_full_score() {
        let err = grade_draft("0", "0").validate().unwrap_err();
        assert_eq!(err, RecordError::NonPositiveFullScore);
    }

    #[test]
    fn grade_draft_rejects_bad_date() {
        let mut draft = grade_draft("1", "2");
        draft.exam_date = "05/01/2024".into();
        assert!(matches!(draft.validate(), Err(RecordError::InvalidDate { .. })));
    }

    #[test]
    fn paper_draft_defaults_scores() {
        let paper = PaperDraft {
            subject: "Science".into(),
            title: "Unit 3".into(),
            paper_type: "quiz".into(),
            date: "2024-02-02".into(),
            score: Some(String::new()),
            full_score: None,
            notes: None,
        }
        .validate()
        .unwrap();
        assert_eq!(paper.score, 0.0);
        assert_eq!(paper.full_score, 100.0);
        assert_eq!(paper.into_record(PaperId::new(1)).percent(), None);
    }

    #[test]
    fn grade_percent_uses_own_full_score() {
        let record = grade_draft("45", "50").validate().unwrap().into_record(GradeId::new(1));
        assert!((record.percent() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn paper_serializes_type_key() {
        let paper = PaperRecord {
            id: PaperId::new(7),
            subject: "Math".into(),
            title: "Mock".into(),
            paper_type: "exam".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            score: 80.0,
            full_score: 100.0,
            notes: None,
        };
        let json = serde_json::to_value(&paper).unwrap();
        assert_eq!(json["type"], "exam");
        assert_eq!(json["fullScore"], 100.0);
        assert_eq!(json["id"], 7);
    }
}
