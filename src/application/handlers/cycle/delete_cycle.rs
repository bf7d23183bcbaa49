//! DeleteCycleHandler - Command handler for removing a cycle.
//!
//! Owner-only. The repository removes the cycle, its items and its
//! history rows in one transaction.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{CommandMetadata, CycleId, DomainError, OwnedByUser};
use crate::ports::CycleRepository;

/// Command to delete a cycle.
#[derive(Debug, Clone)]
pub struct DeleteCycleCommand {
    pub cycle_id: CycleId,
}

/// Error type for cycle deletion.
#[derive(Debug, Clone)]
pub enum DeleteCycleError {
    /// Cycle not found.
    CycleNotFound(CycleId),
    /// Domain error (authorization, infrastructure).
    Domain(DomainError),
}

impl std::fmt::Display for DeleteCycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteCycleError::CycleNotFound(id) => write!(f, "Cycle not found: {}", id),
            DeleteCycleError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DeleteCycleError {}

impl From<DomainError> for DeleteCycleError {
    fn from(err: DomainError) -> Self {
        DeleteCycleError::Domain(err)
    }
}

/// Handler for deleting cycles.
pub struct DeleteCycleHandler {
    cycle_repository: Arc<dyn CycleRepository>,
}

impl DeleteCycleHandler {
    pub fn new(cycle_repository: Arc<dyn CycleRepository>) -> Self {
        Self { cycle_repository }
    }

    pub async fn handle(
        &self,
        cmd: DeleteCycleCommand,
        metadata: CommandMetadata,
    ) -> Result<(), DeleteCycleError> {
        let cycle = self
            .cycle_repository
            .find_by_id(&cmd.cycle_id)
            .await?
            .ok_or(DeleteCycleError::CycleNotFound(cmd.cycle_id))?;

        cycle.check_ownership(&metadata.user_id)?;

        self.cycle_repository.delete(&cmd.cycle_id).await?;

        info!(cycle_id = %cmd.cycle_id, "cycle deleted");
        Ok(())
    }
}
