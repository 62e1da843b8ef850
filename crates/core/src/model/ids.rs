use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a grade record
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeId(u64);

impl GradeId {
    /// Creates a new `GradeId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a practice paper record
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(u64);

impl PaperId {
    /// Creates a new `PaperId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for GradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GradeId({})", self.0)
    }
}

impl fmt::Debug for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaperId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for GradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for GradeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(GradeId::new)
            .map_err(|_| ParseIdError { kind: "GradeId" })
    }
}

impl FromStr for PaperId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(PaperId::new)
            .map_err(|_| ParseIdError { kind: "PaperId" })
    }
}

// ─── Allocation ────────────────────────────────────────────────────────────────

/// Hands out creation-time based ids that never repeat.
///
/// Ids are the creation timestamp in milliseconds, bumped past the last issued
/// value when two records land in the same millisecond (or the clock steps back).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    /// Resume allocation after the largest id already in use.
    #[must_use]
    pub fn resume_after(last: u64) -> Self {
        Self { last }
    }

    pub fn next(&mut self, now_millis: i64) -> u64 {
        let candidate = u64::try_from(now_millis).unwrap_or(0);
        let id = candidate.max(self.last.saturating_add(1));
        self.last = id;
        id
    }

    #[must_use]
    pub fn last(&self) -> u64 {
        self.last
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_id_display() {
        let id = GradeId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_paper_id_from_str() {
        let id: PaperId = " 456 ".parse().unwrap();
        assert_eq!(id, PaperId::new(456));
    }

    #[test]
    fn test_grade_id_from_str_invalid() {
        let result = "not-a-number".parse::<GradeId>();
        assert!(result.is_err());
    }

    #[test]
    fn allocator_uses_timestamp_when_ahead() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.next(1_700_000_000_000), 1_700_000_000_000);
        assert_eq!(ids.next(1_700_000_000_500), 1_700_000_000_500);
    }

    #[test]
    fn allocator_never_repeats_within_same_millisecond() {
        let mut ids = IdAllocator::resume_after(10);
        assert_eq!(ids.next(5), 11);
        assert_eq!(ids.next(5), 12);
        assert_eq!(ids.next(-1), 13);
        assert_eq!(ids.last(), 13);
    }
}
