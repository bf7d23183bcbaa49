//! CloseCycleHandler - Command handler for closing an active cycle.
//!
//! Freezes the cycle's progress: realized credit (capped at each goal)
//! is snapshotted into history rows in the same transaction that stamps
//! the end timestamp, so a new cycle starts clean without losing what
//! was already earned.

use std::sync::Arc;

use tracing::info;

use crate::domain::cycle::{CycleHistoryEntry, CycleProgress};
use crate::domain::foundation::{
    CommandMetadata, CycleId, DomainError, OwnedByUser, Timestamp,
};
use crate::ports::{CycleRepository, StudyRecordReader};

use super::load_cycle_progress;

/// Command to close a cycle.
#[derive(Debug, Clone)]
pub struct CloseCycleCommand {
    pub cycle_id: CycleId,
}

/// Result of a successful close.
#[derive(Debug, Clone)]
pub struct CloseCycleResult {
    pub cycle_id: CycleId,
    pub ended_at: Timestamp,
    /// The progress frozen at the moment of closing.
    pub progress: CycleProgress,
}

/// Error type for cycle closing.
#[derive(Debug, Clone)]
pub enum CloseCycleError {
    /// Cycle not found.
    CycleNotFound(CycleId),
    /// Domain error (already closed, authorization, infrastructure).
    Domain(DomainError),
}

impl std::fmt::Display for CloseCycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseCycleError::CycleNotFound(id) => write!(f, "Cycle not found: {}", id),
            CloseCycleError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CloseCycleError {}

impl From<DomainError> for CloseCycleError {
    fn from(err: DomainError) -> Self {
        CloseCycleError::Domain(err)
    }
}

/// Handler for closing cycles.
pub struct CloseCycleHandler {
    cycle_repository: Arc<dyn CycleRepository>,
    study_record_reader: Arc<dyn StudyRecordReader>,
}

impl CloseCycleHandler {
    pub fn new(
        cycle_repository: Arc<dyn CycleRepository>,
        study_record_reader: Arc<dyn StudyRecordReader>,
    ) -> Self {
        Self {
            cycle_repository,
            study_record_reader,
        }
    }

    pub async fn handle(
        &self,
        cmd: CloseCycleCommand,
        metadata: CommandMetadata,
    ) -> Result<CloseCycleResult, CloseCycleError> {
        let mut cycle = self
            .cycle_repository
            .find_by_id(&cmd.cycle_id)
            .await?
            .ok_or(CloseCycleError::CycleNotFound(cmd.cycle_id))?;

        cycle.check_ownership(&metadata.user_id)?;

        // Fails with CycleAlreadyClosed before anything is queried or
        // written; the stored row stays untouched.
        let now = Timestamp::now();
        cycle.close(now)?;

        // The aggregate now reports `now` as its window end, so this is
        // exactly the progress being frozen.
        let progress = load_cycle_progress(&cycle, self.study_record_reader.as_ref(), now).await?;

        let history: Vec<CycleHistoryEntry> = progress
            .items
            .iter()
            .map(|item| CycleHistoryEntry {
                subject_id: item.subject_id,
                discounted_seconds: item.realized_seconds.min(item.goal_seconds),
                discounted_questions: item
                    .realized_questions
                    .min(i64::from(item.goal_questions)),
            })
            .collect();

        self.cycle_repository.close(&cycle, &history).await?;

        info!(cycle_id = %cmd.cycle_id, overall = progress.overall_percentage, "cycle closed");

        Ok(CloseCycleResult {
            cycle_id: cmd.cycle_id,
            ended_at: now,
            progress,
        })
    }
}
