//! Dashboard aggregation - resumé totals and the daily evolution series.
//!
//! The store hands back sparse per-day sums; this module resolves the
//! requested range and gap-fills it so every calendar day appears
//! exactly once.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::cycle::round1;
use super::foundation::{ContestId, StudyTypeId, SubjectId, TopicId};

/// Multi-select filters applied to resumé and daily-series queries.
/// An empty list means "no filter on this dimension".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyFilters {
    pub subjects: Vec<SubjectId>,
    pub topics: Vec<TopicId>,
    pub contests: Vec<ContestId>,
    pub study_types: Vec<StudyTypeId>,
}

/// Headline totals over the filtered records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeTotals {
    pub total_seconds: i64,
    pub questions_attempted: i64,
    pub questions_correct: i64,
    /// `correct / attempted × 100`, one decimal; zero when nothing was
    /// attempted.
    pub accuracy: f64,
}

impl ResumeTotals {
    /// Builds the resumé from raw store sums.
    pub fn from_sums(total_seconds: i64, questions_attempted: i64, questions_correct: i64) -> Self {
        let accuracy = if questions_attempted > 0 {
            round1(questions_correct as f64 / questions_attempted as f64 * 100.0)
        } else {
            0.0
        };
        Self {
            total_seconds,
            questions_attempted,
            questions_correct,
            accuracy,
        }
    }
}

/// One day of the evolution series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub day: NaiveDate,
    pub seconds: i64,
}

/// Resolves the series range from the request and the store.
///
/// Explicit bounds win. A missing start falls back to the earliest
/// record date, bounded to `max_lookback_days` before `today` so the
/// series cannot grow without limit; with no records at all the series
/// collapses to `today`. A missing end defaults to `today`. The start is
/// never allowed past the end.
pub fn resolve_range(
    requested_start: Option<NaiveDate>,
    requested_end: Option<NaiveDate>,
    earliest_record: Option<NaiveDate>,
    today: NaiveDate,
    max_lookback_days: i64,
) -> (NaiveDate, NaiveDate) {
    let end = requested_end.unwrap_or(today);
    let start = match requested_start {
        Some(start) => start,
        None => {
            let floor = today - chrono::Duration::days(max_lookback_days);
            match earliest_record {
                Some(earliest) => earliest.max(floor),
                None => end,
            }
        }
    };
    (start.min(end), end)
}

/// Expands sparse per-day sums into a contiguous series over
/// `[start, end]` inclusive, with zeros on days the store had nothing.
/// Days outside the range are dropped; duplicate days are summed.
pub fn gap_fill(start: NaiveDate, end: NaiveDate, raw: &[DailyPoint]) -> Vec<DailyPoint> {
    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for point in raw {
        if point.day >= start && point.day <= end {
            *by_day.entry(point.day).or_insert(0) += point.seconds;
        }
    }

    let mut series = Vec::new();
    let mut day = start;
    while day <= end {
        series.push(DailyPoint {
            day,
            seconds: by_day.get(&day).copied().unwrap_or(0),
        });
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    series
}
