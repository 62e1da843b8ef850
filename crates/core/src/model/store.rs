use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::ids::{GradeId, IdAllocator, PaperId};
use crate::model::record::{GradeRecord, NewGrade, NewPaper, PaperRecord, RecordError};

/// Direction of the two most recent grades in a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Flat => "flat",
        }
    }
}

/// Per-subject aggregate for the grade overview.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSummary {
    pub subject: String,
    pub count: usize,
    pub average_percent: f64,
    pub trend: Option<Trend>,
}

/// Optional filters for the paper list; unset filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperFilter {
    pub subject: Option<String>,
    pub paper_type: Option<String>,
    pub search: Option<String>,
}

/// Entry of the recent-activity feed.
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    Grade {
        subject: String,
        score: f64,
        full_score: f64,
        date: NaiveDate,
    },
    Paper {
        subject: String,
        title: String,
        date: NaiveDate,
    },
}

impl Activity {
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        match self {
            Activity::Grade { date, .. } | Activity::Paper { date, .. } => *date,
        }
    }
}

/// Owns the grade and paper collections in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    grades: Vec<GradeRecord>,
    papers: Vec<PaperRecord>,
    ids: IdAllocator,
}

impl RecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted collections, resuming id allocation after
    /// the largest stored id.
    #[must_use]
    pub fn from_persisted(grades: Vec<GradeRecord>, papers: Vec<PaperRecord>) -> Self {
        let last = grades
            .iter()
            .map(|g| g.id.value())
            .chain(papers.iter().map(|p| p.id.value()))
            .max()
            .unwrap_or(0);
        Self {
            grades,
            papers,
            ids: IdAllocator::resume_after(last),
        }
    }

    #[must_use]
    pub fn grades(&self) -> &[GradeRecord] {
        &self.grades
    }

    #[must_use]
    pub fn papers(&self) -> &[PaperRecord] {
        &self.papers
    }

    pub fn add_grade(&mut self, grade: NewGrade, now: DateTime<Utc>) -> &GradeRecord {
        let id = GradeId::new(self.ids.next(now.timestamp_millis()));
        let index = self.grades.len();
        self.grades.push(grade.into_record(id));
        &self.grades[index]
    }

    pub fn add_paper(&mut self, paper: NewPaper, now: DateTime<Utc>) -> &PaperRecord {
        let id = PaperId::new(self.ids.next(now.timestamp_millis()));
        let index = self.papers.len();
        self.papers.push(paper.into_record(id));
        &self.papers[index]
    }

    /// Remove a grade by id.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` if no grade has that id.
    pub fn remove_grade(&mut self, id: GradeId) -> Result<GradeRecord, RecordError> {
        let index = self
            .grades
            .iter()
            .position(|g| g.id == id)
            .ok_or(RecordError::NotFound { id: id.value() })?;
        Ok(self.grades.remove(index))
    }

    /// Remove a paper by id.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` if no paper has that id.
    pub fn remove_paper(&mut self, id: PaperId) -> Result<PaperRecord, RecordError> {
        let index = self
            .papers
            .iter()
            .position(|p| p.id == id)
            .ok_or(RecordError::NotFound { id: id.value() })?;
        Ok(self.papers.remove(index))
    }

    /// Distinct grade subjects in order of first appearance.
    #[must_use]
    pub fn subjects(&self) -> Vec<&str> {
        distinct(self.grades.iter().map(|g| g.subject.as_str()))
    }

    /// Distinct paper subjects in order of first appearance.
    #[must_use]
    pub fn paper_subjects(&self) -> Vec<&str> {
        distinct(self.papers.iter().map(|p| p.subject.as_str()))
    }

    /// Mean of per-record percentages across all grades; 0 when there are none.
    #[must_use]
    pub fn overall_average_percent(&self) -> f64 {
        mean_percent(self.grades.iter())
    }

    #[must_use]
    pub fn subject_average_percent(&self, subject: &str) -> Option<f64> {
        let mut grades = self.grades.iter().filter(|g| g.subject == subject).peekable();
        grades.peek()?;
        Some(mean_percent(grades))
    }

    /// Compares the two latest grades of a subject by exam date.
    #[must_use]
    pub fn subject_trend(&self, subject: &str) -> Option<Trend> {
        let chronological = self.chronological(subject);
        let [.., previous, latest] = chronological.as_slice() else {
            return None;
        };
        let (previous, latest) = (previous.percent(), latest.percent());
        Some(if latest > previous {
            Trend::Up
        } else if latest < previous {
            Trend::Down
        } else {
            Trend::Flat
        })
    }

    #[must_use]
    pub fn subject_summaries(&self) -> Vec<SubjectSummary> {
        self.subjects()
            .into_iter()
            .map(|subject| SubjectSummary {
                subject: subject.to_string(),
                count: self.grades.iter().filter(|g| g.subject == subject).count(),
                average_percent: self.subject_average_percent(subject).unwrap_or(0.0),
                trend: self.subject_trend(subject),
            })
            .collect()
    }

    /// Grades of one subject, newest exam first.
    #[must_use]
    pub fn grades_for_subject(&self, subject: &str) -> Vec<&GradeRecord> {
        let mut grades = self.chronological(subject);
        grades.reverse();
        grades
    }

    /// Exact match on subject and type, case-insensitive substring match of the
    /// search text against title or subject. All set filters must hold.
    #[must_use]
    pub fn filter_papers(&self, filter: &PaperFilter) -> Vec<&PaperRecord> {
        let subject = non_empty(filter.subject.as_deref());
        let paper_type = non_empty(filter.paper_type.as_deref());
        let search = non_empty(filter.search.as_deref()).map(str::to_lowercase);

        self.papers
            .iter()
            .filter(|paper| subject.is_none_or(|s| paper.subject == s))
            .filter(|paper| paper_type.is_none_or(|t| paper.paper_type == t))
            .filter(|paper| {
                search.as_deref().is_none_or(|needle| {
                    paper.title.to_lowercase().contains(needle)
                        || paper.subject.to_lowercase().contains(needle)
                })
            })
            .collect()
    }

    /// Last three grades and last two papers, newest first, capped at `limit`.
    #[must_use]
    pub fn recent_activities(&self, limit: usize) -> Vec<Activity> {
        let grades = self.grades.iter().rev().take(3).rev().map(|g| Activity::Grade {
            subject: g.subject.clone(),
            score: g.score,
            full_score: g.full_score,
            date: g.exam_date,
        });
        let papers = self.papers.iter().rev().take(2).rev().map(|p| Activity::Paper {
            subject: p.subject.clone(),
            title: p.title.clone(),
            date: p.date,
        });
        let mut activities: Vec<Activity> = grades.chain(papers).collect();
        activities.sort_by(|a, b| b.date().cmp(&a.date()));
        activities.truncate(limit);
        activities
    }

    fn chronological(&self, subject: &str) -> Vec<&GradeRecord> {
        let mut grades: Vec<&GradeRecord> =
            self.grades.iter().filter(|g| g.subject == subject).collect();
        grades.sort_by(|a, b| a.exam_date.cmp(&b.exam_date).then(a.id.cmp(&b.id)));
        grades
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|value| seen.insert(*value)).collect()
}

fn mean_percent<'a>(grades: impl Iterator<Item = &'a GradeRecord>) -> f64 {
    let (sum, count) = grades.fold((0.0, 0_u32), |(sum, count), g| (sum + g.percent(), count + 1));
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
