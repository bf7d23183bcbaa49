//! CreateCycleHandler - Command handler for creating study cycles.
//!
//! Persists the user-approved item list as the new active cycle for a
//! contest. A previously active cycle for the same contest is
//! deactivated in the same transaction, so two active cycles can never
//! be observed.

use std::sync::Arc;

use tracing::info;

use crate::domain::cycle::{Cycle, CycleItem};
use crate::domain::foundation::{
    CommandMetadata, ContestId, CycleId, DomainError, OwnedByUser, SubjectId,
};
use crate::ports::{ContestStore, CycleRepository, SubjectStore};

/// One approved item of the new cycle.
#[derive(Debug, Clone)]
pub struct CycleItemSpec {
    pub subject_id: SubjectId,
    pub goal_seconds: i64,
    pub goal_questions: i32,
    pub position: i32,
}

/// Command to create a new cycle.
#[derive(Debug, Clone)]
pub struct CreateCycleCommand {
    /// Contest the cycle belongs to.
    pub contest_id: ContestId,
    /// Optional free-text note shown in listings.
    pub label: Option<String>,
    /// Approved per-subject goals, in display order.
    pub items: Vec<CycleItemSpec>,
}

/// Result of successful cycle creation.
#[derive(Debug, Clone)]
pub struct CreateCycleResult {
    pub cycle_id: CycleId,
}

/// Error type for cycle creation.
#[derive(Debug, Clone)]
pub enum CreateCycleError {
    /// Contest not found.
    ContestNotFound(ContestId),
    /// An item references a subject that doesn't exist.
    SubjectNotFound(SubjectId),
    /// Domain error (validation, authorization, conflict, infrastructure).
    Domain(DomainError),
}

impl std::fmt::Display for CreateCycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateCycleError::ContestNotFound(id) => write!(f, "Contest not found: {}", id),
            CreateCycleError::SubjectNotFound(id) => write!(f, "Subject not found: {}", id),
            CreateCycleError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CreateCycleError {}

impl From<DomainError> for CreateCycleError {
    fn from(err: DomainError) -> Self {
        CreateCycleError::Domain(err)
    }
}

/// Handler for creating cycles.
pub struct CreateCycleHandler {
    cycle_repository: Arc<dyn CycleRepository>,
    contest_store: Arc<dyn ContestStore>,
    subject_store: Arc<dyn SubjectStore>,
}

impl CreateCycleHandler {
    pub fn new(
        cycle_repository: Arc<dyn CycleRepository>,
        contest_store: Arc<dyn ContestStore>,
        subject_store: Arc<dyn SubjectStore>,
    ) -> Self {
        Self {
            cycle_repository,
            contest_store,
            subject_store,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCycleCommand,
        metadata: CommandMetadata,
    ) -> Result<CreateCycleResult, CreateCycleError> {
        // 1. Verify the contest exists and belongs to the caller
        let contest = self
            .contest_store
            .find_by_id(&cmd.contest_id)
            .await?
            .ok_or(CreateCycleError::ContestNotFound(cmd.contest_id))?;

        contest.check_ownership(&metadata.user_id)?;

        // 2. Resolve every item's subject; a dangling reference aborts
        //    before anything is written
        let mut items = Vec::with_capacity(cmd.items.len());
        for spec in &cmd.items {
            let subject = self
                .subject_store
                .find_by_id(&spec.subject_id)
                .await?
                .ok_or(CreateCycleError::SubjectNotFound(spec.subject_id))?;

            items.push(CycleItem {
                subject_id: subject.id,
                subject_name: subject.name,
                goal_seconds: spec.goal_seconds,
                goal_questions: spec.goal_questions,
                position: spec.position,
            });
        }

        // 3. Build the aggregate (validates goals) and persist; the
        //    repository deactivates any prior active cycle atomically
        let cycle = Cycle::new(cmd.contest_id, metadata.user_id, cmd.label, items)?;
        self.cycle_repository.create_active(&cycle).await?;

        info!(cycle_id = %cycle.id(), contest_id = %cmd.contest_id, "cycle created");

        Ok(CreateCycleResult { cycle_id: cycle.id() })
    }
}
