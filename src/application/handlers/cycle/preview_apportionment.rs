//! PreviewApportionmentHandler - Query handler for budget suggestions.
//!
//! Runs the apportionment engine over a contest's subject weights and
//! returns the proposed per-subject allocation for the user to approve.
//! Read-only; nothing is persisted until `CreateCycleHandler`.

use std::sync::Arc;

use crate::domain::apportionment::{apportion, SuggestedAllocation};
use crate::domain::foundation::{ContestId, DomainError, OwnedByUser, UserId};
use crate::ports::ContestStore;

/// Query for an apportionment preview.
#[derive(Debug, Clone)]
pub struct PreviewApportionmentQuery {
    /// Contest whose subject weights drive the split.
    pub contest_id: ContestId,
    /// Total time budget for general subjects, in seconds.
    pub time_budget_seconds: i64,
    /// Optional total question budget.
    pub question_budget: Option<i32>,
    /// Optional flat time budget split equally across essay subjects.
    pub essay_time_budget_seconds: Option<i64>,
    /// User ID for authorization.
    pub user_id: UserId,
}

/// Error type for apportionment preview.
#[derive(Debug, Clone)]
pub enum PreviewApportionmentError {
    /// Contest not found.
    ContestNotFound(ContestId),
    /// Domain error (validation, authorization, infrastructure).
    Domain(DomainError),
}

impl std::fmt::Display for PreviewApportionmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreviewApportionmentError::ContestNotFound(id) => {
                write!(f, "Contest not found: {}", id)
            }
            PreviewApportionmentError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PreviewApportionmentError {}

impl From<DomainError> for PreviewApportionmentError {
    fn from(err: DomainError) -> Self {
        PreviewApportionmentError::Domain(err)
    }
}

/// Handler for apportionment previews.
pub struct PreviewApportionmentHandler {
    contest_store: Arc<dyn ContestStore>,
}

impl PreviewApportionmentHandler {
    pub fn new(contest_store: Arc<dyn ContestStore>) -> Self {
        Self { contest_store }
    }

    pub async fn handle(
        &self,
        query: PreviewApportionmentQuery,
    ) -> Result<Vec<SuggestedAllocation>, PreviewApportionmentError> {
        let contest = self
            .contest_store
            .find_by_id(&query.contest_id)
            .await?
            .ok_or(PreviewApportionmentError::ContestNotFound(query.contest_id))?;

        contest.check_ownership(&query.user_id)?;

        let weights = self
            .contest_store
            .weights_for_contest(&query.contest_id)
            .await?;

        let suggestions = apportion(
            &weights,
            query.time_budget_seconds,
            query.question_budget,
            query.essay_time_budget_seconds,
        )?;

        Ok(suggestions)
    }
}
