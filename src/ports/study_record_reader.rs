//! Study record reader port (read side).
//!
//! The study record store belongs to an external collaborator; this
//! core consumes it strictly through sum/group-by aggregates so progress
//! and dashboard scale independently of the number of raw records.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::dashboard::StudyFilters;
use crate::domain::foundation::{DomainError, SubjectId, Timestamp, UserId};

/// Half-open evaluation window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudyWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Aggregated study effort for one subject inside a window.
///
/// `seconds` only counts records flagged as counting toward cycle
/// accounting; `questions` is ungated, matching the store contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubjectSums {
    pub seconds: i64,
    pub questions: i64,
}

/// Raw resumé sums over the filtered records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResumeSums {
    pub seconds: i64,
    pub questions_attempted: i64,
    pub questions_correct: i64,
}

/// One day's total from the store's group-by. Sparse: days without
/// records are absent and gap-filled later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySum {
    pub day: NaiveDate,
    pub seconds: i64,
}

/// Read-only aggregate queries over the study record store.
#[async_trait]
pub trait StudyRecordReader: Send + Sync {
    /// Sums one subject's effort for a user inside a window.
    async fn sums_for_subject(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
        window: StudyWindow,
    ) -> Result<SubjectSums, DomainError>;

    /// Resumé sums over the user's records, optionally bounded and
    /// filtered.
    async fn resume(
        &self,
        user_id: &UserId,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        filters: &StudyFilters,
    ) -> Result<ResumeSums, DomainError>;

    /// Per-day second totals, grouped by calendar day, ascending.
    async fn daily_totals(
        &self,
        user_id: &UserId,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        filters: &StudyFilters,
    ) -> Result<Vec<DailySum>, DomainError>;

    /// The user's first recorded study day, if any. Drives the default
    /// dashboard range.
    async fn earliest_record_date(
        &self,
        user_id: &UserId,
    ) -> Result<Option<NaiveDate>, DomainError>;
}
