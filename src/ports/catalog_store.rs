//! Catalog store ports (read side).
//!
//! Subjects, contests and their weighted links are plain CRUD owned by
//! an external collaborator; this core only needs existence, ownership
//! and the weight rows that feed apportionment.

use async_trait::async_trait;

use crate::domain::catalog::{Contest, Subject, SubjectWeight};
use crate::domain::foundation::{ContestId, DomainError, SubjectId};

/// Read-only port for contest lookups.
#[async_trait]
pub trait ContestStore: Send + Sync {
    /// Finds a contest by ID. Returns `None` if not found.
    async fn find_by_id(&self, id: &ContestId) -> Result<Option<Contest>, DomainError>;

    /// Returns the subject weight rows linked to a contest, with subject
    /// name and kind denormalized.
    async fn weights_for_contest(
        &self,
        id: &ContestId,
    ) -> Result<Vec<SubjectWeight>, DomainError>;
}

/// Read-only port for subject lookups.
#[async_trait]
pub trait SubjectStore: Send + Sync {
    /// Finds a subject by ID. Returns `None` if not found.
    async fn find_by_id(&self, id: &SubjectId) -> Result<Option<Subject>, DomainError>;
}
