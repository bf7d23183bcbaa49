//! Cycle repository port (write side).
//!
//! Defines the contract for persisting and retrieving Cycle aggregates.
//!
//! # Design
//!
//! - **Atomic mutations**: `create_active`, `close` and `delete` each
//!   execute as one transaction; "deactivate old + activate new" can
//!   never be observed half-applied.
//! - **Contest-scoped**: at most one active cycle exists per contest.
//!   Implementations must serialize concurrent creates for a contest and
//!   fail the race loser with `DuplicateActiveCycle`.

use async_trait::async_trait;

use crate::domain::cycle::{Cycle, CycleHistoryEntry};
use crate::domain::foundation::{ContestId, CycleId, DomainError, UserId};

/// Repository port for Cycle aggregate persistence.
#[async_trait]
pub trait CycleRepository: Send + Sync {
    /// Persists a new active cycle, deactivating any currently active
    /// cycle for the same contest in the same transaction (stamping its
    /// end timestamp if unset).
    ///
    /// # Errors
    ///
    /// - `DuplicateActiveCycle` when a concurrent create won the race
    /// - `DatabaseError` on persistence failure
    async fn create_active(&self, cycle: &Cycle) -> Result<(), DomainError>;

    /// Finds a cycle by its ID, items included in display order.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &CycleId) -> Result<Option<Cycle>, DomainError>;

    /// Finds the active cycle for a contest, if any.
    async fn find_active_for_contest(
        &self,
        contest_id: &ContestId,
    ) -> Result<Option<Cycle>, DomainError>;

    /// Finds the user's active cycle, newest start first when several
    /// contests have one.
    async fn find_active_for_user(&self, user_id: &UserId) -> Result<Option<Cycle>, DomainError>;

    /// Lists all cycles of a contest, newest start first.
    async fn list_for_contest(&self, contest_id: &ContestId) -> Result<Vec<Cycle>, DomainError>;

    /// Persists a close: flags + end timestamp from the aggregate and
    /// the frozen history rows, in one transaction.
    ///
    /// # Errors
    ///
    /// - `CycleAlreadyClosed` when the stored row is no longer active
    /// - `DatabaseError` on persistence failure
    async fn close(
        &self,
        cycle: &Cycle,
        history: &[CycleHistoryEntry],
    ) -> Result<(), DomainError>;

    /// Removes the cycle, its items and its history in one transaction.
    ///
    /// # Errors
    ///
    /// - `CycleNotFound` if the cycle doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn delete(&self, id: &CycleId) -> Result<(), DomainError>;

    /// Returns the frozen history rows written when the cycle closed.
    /// Empty for cycles that are still active or predate history.
    async fn history_for_cycle(
        &self,
        id: &CycleId,
    ) -> Result<Vec<CycleHistoryEntry>, DomainError>;
}
