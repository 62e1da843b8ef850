//! Versioned JSON document holding the whole application state.
//!
//! Documents are upgraded step by step to [`SCHEMA_VERSION`] before they are
//! deserialized. Every nested object deserializes with per-field defaults, so a
//! document missing newer sub-fields keeps the rest of its data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use study_core::model::{
    AppState, GradeRecord, PaperRecord, RecordError, RecordStore, ShopState, StudyMethods,
    UnlockedAchievements, UserProgress,
};

/// Well-known key the serialized state is stored under.
pub const STATE_KEY: &str = "studyTrackerData";

/// Current document layout.
pub const SCHEMA_VERSION: u64 = 1;

/// Day-string layout written by the legacy browser build, e.g. `Sat Oct 18 2026`.
const LEGACY_DAY_FORMAT: &str = "%a %b %d %Y";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("state document must be a JSON object")]
    NotAnObject,

    #[error("schemaVersion must be a non-negative integer")]
    InvalidVersion,

    #[error("unsupported schema version {found} (newest supported: {supported})")]
    UnsupportedVersion { found: u64, supported: u64 },
}

/// Persisted shape of [`AppState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StateSnapshot {
    pub schema_version: u64,
    pub user: UserProgress,
    pub grades: Vec<GradeRecord>,
    pub papers: Vec<PaperRecord>,
    pub achievements: UnlockedAchievements,
    pub study_methods: StudyMethods,
    pub shop: ShopState,
}

impl StateSnapshot {
    #[must_use]
    pub fn from_state(state: &AppState) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            user: state.user.clone(),
            grades: state.records.grades().to_vec(),
            papers: state.records.papers().to_vec(),
            achievements: state.achievements.clone(),
            study_methods: state.study_methods,
            shop: state.shop.clone(),
        }
    }

    /// Convert into the domain state, normalizing anything an older or
    /// hand-edited document may have gotten wrong.
    #[must_use]
    pub fn into_state(self) -> AppState {
        let grades = retain_valid("grade", self.grades, GradeRecord::check_scores);
        let papers = retain_valid("paper", self.papers, PaperRecord::check_scores);
        AppState {
            user: self.user.normalized(),
            records: RecordStore::from_persisted(grades, papers),
            achievements: UnlockedAchievements::from_persisted(self.achievements.ids().to_vec()),
            study_methods: self.study_methods,
            shop: ShopState::from_persisted(self.shop.purchased().to_vec()),
        }
    }

    /// Parse a stored document, upgrading older layouts first.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` for malformed JSON, a non-object document, or a
    /// schema version newer than this build understands.
    pub fn decode(raw: &str) -> Result<Self, SnapshotError> {
        let doc: Value = serde_json::from_str(raw)?;
        let doc = upgrade(doc)?;
        Ok(serde_json::from_value(doc)?)
    }

    /// Serialize at the current schema version.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Json` if serialization fails.
    pub fn encode(&self) -> Result<String, SnapshotError> {
        let mut snapshot = self.clone();
        snapshot.schema_version = SCHEMA_VERSION;
        Ok(serde_json::to_string(&snapshot)?)
    }
}

/// Drop stored records that break the score invariants form input is held to.
fn retain_valid<T>(
    kind: &'static str,
    records: Vec<T>,
    check: impl Fn(&T) -> Result<(), RecordError>,
) -> Vec<T> {
    records
        .into_iter()
        .filter(|record| match check(record) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(kind, %err, "dropping stored record with invalid scores");
                false
            }
        })
        .collect()
}

fn upgrade(mut doc: Value) -> Result<Value, SnapshotError> {
    let Value::Object(map) = &mut doc else {
        return Err(SnapshotError::NotAnObject);
    };

    let version = match map.get("schemaVersion") {
        None | Some(Value::Null) => 0,
        Some(value) => value.as_u64().ok_or(SnapshotError::InvalidVersion)?,
    };
    if version > SCHEMA_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }

    if version < 1 {
        upgrade_v0_to_v1(map);
    }

    map.insert("schemaVersion".into(), Value::from(SCHEMA_VERSION));
    Ok(doc)
}

/// The legacy browser layout: `user.exp`, `toDateString()` dates, and grades whose
/// unparsable scores were serialized as `null`.
fn upgrade_v0_to_v1(map: &mut Map<String, Value>) {
    tracing::info!("upgrading legacy state document to schema v1");

    if let Some(Value::Object(user)) = map.get_mut("user") {
        if let Some(exp) = user.remove("exp") {
            user.entry("experience").or_insert(exp);
        }
        let converted = match user.get("lastActiveDate") {
            Some(Value::String(raw)) => Some(convert_legacy_day(raw)),
            _ => None,
        };
        if let Some(converted) = converted {
            user.insert("lastActiveDate".into(), converted);
        }
    }

    if let Some(Value::Array(grades)) = map.get_mut("grades") {
        let before = grades.len();
        grades.retain(|grade| {
            ["score", "fullScore"]
                .iter()
                .all(|key| grade.get(key).is_some_and(Value::is_number))
        });
        let dropped = before - grades.len();
        if dropped > 0 {
            tracing::warn!(dropped, "dropped legacy grades with non-numeric scores");
        }
        for grade in grades.iter_mut() {
            blank_notes_to_null(grade);
        }
    }

    if let Some(Value::Array(papers)) = map.get_mut("papers") {
        for paper in papers.iter_mut() {
            blank_notes_to_null(paper);
        }
    }
}

fn convert_legacy_day(raw: &str) -> Value {
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        return Value::from(raw);
    }
    match NaiveDate::parse_from_str(raw, LEGACY_DAY_FORMAT) {
        Ok(date) => Value::from(date.format("%Y-%m-%d").to_string()),
        Err(_) => {
            tracing::warn!(raw, "discarding unreadable lastActiveDate");
            Value::Null
        }
    }
}

fn blank_notes_to_null(record: &mut Value) {
    let Value::Object(fields) = record else {
        return;
    };
    if fields
        .get("notes")
        .and_then(Value::as_str)
        .is_some_and(|notes| notes.trim().is_empty())
    {
        fields.insert("notes".into(), Value::Null);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{AchievementId, ShopItemId};

    const LEGACY: &str = r#"{
        "user": {"level": 2, "exp": 35, "points": 120, "streakDays": 3, "lastActiveDate": "Fri Oct 17 2025"},
        "grades": [
            {"subject": "Math", "score": 88, "fullScore": 100, "examDate": "2025-10-01", "examType": "月考", "notes": "", "id": 1759300000000},
            {"subject": "Math", "score": null, "fullScore": 100, "examDate": "2025-10-02", "examType": "月考", "notes": "", "id": 1759300000001}
        ],
        "papers": [
            {"subject": "Math", "title": "Mock 1", "type": "exam", "date": "2025-10-03", "score": 0, "fullScore": 100, "notes": "", "id": 1759300000002}
        ],
        "achievements": ["first_grade"],
        "studyMethods": {"pomodoroSessions": 4, "studyDays": 2},
        "shop": {"purchased": ["theme_dark"]}
    }"#;

    #[test]
    fn legacy_document_is_upgraded() {
        let snapshot = StateSnapshot::decode(LEGACY).unwrap();
        assert_eq!(snapshot.schema_version, SCHEMA_VERSION);
        assert_eq!(snapshot.user.experience(), 35);
        assert_eq!(
            snapshot.user.last_active_date(),
            NaiveDate::from_ymd_opt(2025, 10, 17)
        );
        assert_eq!(snapshot.grades.len(), 1);
        assert_eq!(snapshot.grades[0].notes, None);
        assert_eq!(snapshot.papers[0].paper_type, "exam");
        assert!(snapshot.achievements.contains(AchievementId::FirstGrade));
        assert!(snapshot.shop.is_purchased(ShopItemId::ThemeDark));
        assert_eq!(snapshot.study_methods.pomodoro_sessions, 4);
    }

    #[test]
    fn records_with_invalid_scores_are_dropped_on_load() {
        let legacy = r#"{
            "user": {"level": 1, "exp": 0, "points": 0},
            "grades": [
                {"subject": "Math", "score": 5, "fullScore": 0, "examDate": "2025-10-01", "examType": "quiz", "id": 1},
                {"subject": "Math", "score": -3, "fullScore": 100, "examDate": "2025-10-02", "examType": "quiz", "id": 2},
                {"subject": "Math", "score": 70, "fullScore": 100, "examDate": "2025-10-03", "examType": "quiz", "id": 3}
            ],
            "papers": [
                {"subject": "Math", "title": "Mock", "type": "exam", "date": "2025-10-03", "score": 10, "fullScore": 0, "id": 4}
            ]
        }"#;
        let state = StateSnapshot::decode(legacy).unwrap().into_state();
        assert_eq!(state.records.grades().len(), 1);
        assert_eq!(state.records.grades()[0].score, 70.0);
        assert!(state.records.papers().is_empty());
        assert!(state.records.overall_average_percent().is_finite());

        let current = StateSnapshot::from_state(&state).encode().unwrap();
        let reloaded = StateSnapshot::decode(&current).unwrap().into_state();
        assert_eq!(reloaded.records.grades().len(), 1);
    }

    #[test]
    fn missing_sections_and_sub_fields_get_defaults() {
        let snapshot =
            StateSnapshot::decode(r#"{"schemaVersion": 1, "user": {"points": 7}}"#).unwrap();
        assert_eq!(snapshot.user.points(), 7);
        assert_eq!(snapshot.user.level(), 1);
        assert!(snapshot.grades.is_empty());
        assert_eq!(snapshot.study_methods, StudyMethods::default());
    }

    #[test]
    fn newer_versions_are_rejected() {
        let err = StateSnapshot::decode(r#"{"schemaVersion": 9}"#).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::UnsupportedVersion { found: 9, supported: 1 }
        ));
        assert!(matches!(
            StateSnapshot::decode("[]").unwrap_err(),
            SnapshotError::NotAnObject
        ));
    }

    #[test]
    fn encode_then_decode_restores_state() {
        let state = StateSnapshot::decode(LEGACY).unwrap().into_state();
        let encoded = StateSnapshot::from_state(&state).encode().unwrap();
        assert!(encoded.contains(r#""schemaVersion":1"#));
        assert!(encoded.contains(r#""experience":35"#));
        let restored = StateSnapshot::decode(&encoded).unwrap().into_state();
        assert_eq!(restored, state);
    }

    #[test]
    fn into_state_clamps_level_and_dedups_ids() {
        let raw = r#"{"schemaVersion": 1, "user": {"level": 12}, "achievements": ["level_up", "level_up"]}"#;
        let state = StateSnapshot::decode(raw).unwrap().into_state();
        assert_eq!(state.user.level(), 6);
        assert_eq!(state.achievements.len(), 1);
    }
}
