//! ListCycleHistoryHandler - Query handler for a contest's cycle history.
//!
//! Lists a contest's cycles newest-first with their overall percentage:
//! frozen from history rows for closed cycles, computed live for the
//! one still active.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::cycle::{Cycle, CycleProgress, ItemProgress};
use crate::domain::foundation::{
    ContestId, CycleId, DomainError, OwnedByUser, Timestamp, UserId,
};
use crate::ports::{ContestStore, CycleRepository, StudyRecordReader};

use super::load_cycle_progress;

/// Query for a contest's cycle history.
#[derive(Debug, Clone)]
pub struct ListCycleHistoryQuery {
    pub contest_id: ContestId,
    /// User ID for authorization.
    pub user_id: UserId,
}

/// One row of the history listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleHistoryView {
    pub cycle_id: CycleId,
    pub label: Option<String>,
    pub active: bool,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    /// Overall completion, one decimal. Frozen for closed cycles.
    pub frozen_percentage: f64,
}

/// Error type for the history listing.
#[derive(Debug, Clone)]
pub enum ListCycleHistoryError {
    /// Contest not found.
    ContestNotFound(ContestId),
    /// Domain error (authorization, infrastructure).
    Domain(DomainError),
}

impl std::fmt::Display for ListCycleHistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListCycleHistoryError::ContestNotFound(id) => {
                write!(f, "Contest not found: {}", id)
            }
            ListCycleHistoryError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ListCycleHistoryError {}

impl From<DomainError> for ListCycleHistoryError {
    fn from(err: DomainError) -> Self {
        ListCycleHistoryError::Domain(err)
    }
}

/// Handler for listing cycle history.
pub struct ListCycleHistoryHandler {
    cycle_repository: Arc<dyn CycleRepository>,
    contest_store: Arc<dyn ContestStore>,
    study_record_reader: Arc<dyn StudyRecordReader>,
}

impl ListCycleHistoryHandler {
    pub fn new(
        cycle_repository: Arc<dyn CycleRepository>,
        contest_store: Arc<dyn ContestStore>,
        study_record_reader: Arc<dyn StudyRecordReader>,
    ) -> Self {
        Self {
            cycle_repository,
            contest_store,
            study_record_reader,
        }
    }

    pub async fn handle(
        &self,
        query: ListCycleHistoryQuery,
    ) -> Result<Vec<CycleHistoryView>, ListCycleHistoryError> {
        let contest = self
            .contest_store
            .find_by_id(&query.contest_id)
            .await?
            .ok_or(ListCycleHistoryError::ContestNotFound(query.contest_id))?;

        contest.check_ownership(&query.user_id)?;

        let cycles = self
            .cycle_repository
            .list_for_contest(&query.contest_id)
            .await?;

        let now = Timestamp::now();
        let mut views = Vec::with_capacity(cycles.len());
        for cycle in &cycles {
            let frozen_percentage = self.overall_percentage(cycle, now).await?;
            views.push(CycleHistoryView {
                cycle_id: cycle.id(),
                label: cycle.label().map(str::to_string),
                active: cycle.is_active(),
                started_at: cycle.started_at(),
                ended_at: cycle.ended_at(),
                frozen_percentage,
            });
        }

        Ok(views)
    }

    /// Closed cycles report the percentage frozen in their history rows;
    /// cycles without history (still active, or closed before history
    /// existed) are computed from windowed record sums.
    async fn overall_percentage(
        &self,
        cycle: &Cycle,
        now: Timestamp,
    ) -> Result<f64, DomainError> {
        if !cycle.is_active() {
            let history = self.cycle_repository.history_for_cycle(&cycle.id()).await?;
            if !history.is_empty() {
                let items: Vec<ItemProgress> = cycle
                    .items()
                    .iter()
                    .map(|item| {
                        let entry = history.iter().find(|h| h.subject_id == item.subject_id);
                        ItemProgress::compute(
                            item,
                            entry.map_or(0, |h| h.discounted_seconds),
                            entry.map_or(0, |h| h.discounted_questions),
                        )
                    })
                    .collect();
                return Ok(CycleProgress::from_items(items).overall_percentage);
            }
        }

        let progress = load_cycle_progress(cycle, self.study_record_reader.as_ref(), now).await?;
        Ok(progress.overall_percentage)
    }
}
