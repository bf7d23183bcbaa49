//! GetDashboardHandler - Query handler for the study dashboard.
//!
//! Composes three blocks from the study record store's aggregates:
//! the resumé totals, the gap-filled daily evolution series, and the
//! caller's active-cycle progress (absent when no cycle is active).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::cycle::ItemProgress;
use crate::domain::dashboard::{gap_fill, resolve_range, DailyPoint, ResumeTotals, StudyFilters};
use crate::domain::foundation::{ContestId, CycleId, DomainError, Timestamp, UserId};
use crate::ports::{ContestStore, CycleRepository, StudyRecordReader};

use crate::application::handlers::cycle::load_cycle_progress;

/// Query for the dashboard.
#[derive(Debug, Clone)]
pub struct GetDashboardQuery {
    /// Optional explicit range start.
    pub start: Option<Timestamp>,
    /// Optional explicit range end.
    pub end: Option<Timestamp>,
    /// Multi-select filters; empty lists mean no filtering.
    pub filters: StudyFilters,
    /// The requesting user; all blocks are scoped to their records.
    pub user_id: UserId,
}

/// The active-cycle block of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCycleView {
    pub cycle_id: CycleId,
    pub contest_id: ContestId,
    /// Contest name for display; `None` if the contest row vanished.
    pub contest_name: Option<String>,
    pub overall_percentage: f64,
    /// Item progress, most-behind first.
    pub items: Vec<ItemProgress>,
}

/// Complete dashboard payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub resume: ResumeTotals,
    /// One point per calendar day of the resolved range, zeros included.
    pub daily: Vec<DailyPoint>,
    /// Absent when the caller has no active cycle.
    pub active_cycle: Option<ActiveCycleView>,
}

/// Error type for the dashboard query.
#[derive(Debug, Clone)]
pub enum GetDashboardError {
    /// Domain error (infrastructure).
    Domain(DomainError),
}

impl std::fmt::Display for GetDashboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetDashboardError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for GetDashboardError {}

impl From<DomainError> for GetDashboardError {
    fn from(err: DomainError) -> Self {
        GetDashboardError::Domain(err)
    }
}

/// Handler for the dashboard query.
pub struct GetDashboardHandler {
    study_record_reader: Arc<dyn StudyRecordReader>,
    cycle_repository: Arc<dyn CycleRepository>,
    contest_store: Arc<dyn ContestStore>,
    /// Caps the default series range when no explicit start is given.
    max_lookback_days: i64,
}

impl GetDashboardHandler {
    pub fn new(
        study_record_reader: Arc<dyn StudyRecordReader>,
        cycle_repository: Arc<dyn CycleRepository>,
        contest_store: Arc<dyn ContestStore>,
        max_lookback_days: i64,
    ) -> Self {
        Self {
            study_record_reader,
            cycle_repository,
            contest_store,
            max_lookback_days,
        }
    }

    pub async fn handle(
        &self,
        query: GetDashboardQuery,
    ) -> Result<DashboardView, GetDashboardError> {
        let reader = self.study_record_reader.as_ref();
        let user_id = &query.user_id;

        // 1. Resumé over the filtered records
        let sums = reader
            .resume(user_id, query.start, query.end, &query.filters)
            .await?;
        let resume =
            ResumeTotals::from_sums(sums.seconds, sums.questions_attempted, sums.questions_correct);

        // 2. Daily evolution, gap-filled over the resolved range
        let raw_daily = reader
            .daily_totals(user_id, query.start, query.end, &query.filters)
            .await?;

        let earliest = if query.start.is_none() {
            reader.earliest_record_date(user_id).await?
        } else {
            None
        };

        let now = Timestamp::now();
        let (range_start, range_end) = resolve_range(
            query.start.map(|t| t.date()),
            query.end.map(|t| t.date()),
            earliest,
            now.date(),
            self.max_lookback_days,
        );

        let points: Vec<DailyPoint> = raw_daily
            .iter()
            .map(|d| DailyPoint { day: d.day, seconds: d.seconds })
            .collect();
        let daily = gap_fill(range_start, range_end, &points);

        // 3. Active-cycle block
        let active_cycle = match self.cycle_repository.find_active_for_user(user_id).await? {
            Some(cycle) => {
                let progress = load_cycle_progress(&cycle, reader, now).await?;
                let contest_name = self
                    .contest_store
                    .find_by_id(&cycle.contest_id())
                    .await?
                    .map(|c| c.name);
                Some(ActiveCycleView {
                    cycle_id: cycle.id(),
                    contest_id: cycle.contest_id(),
                    contest_name,
                    overall_percentage: progress.overall_percentage,
                    items: progress.items,
                })
            }
            None => None,
        };

        Ok(DashboardView {
            resume,
            daily,
            active_cycle,
        })
    }
}
