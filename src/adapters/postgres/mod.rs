//! PostgreSQL adapters.
//!
//! Each mutation runs as a single transaction so lifecycle invariants
//! ("deactivate old + activate new") are never observed half-applied.
//! The partial unique index on `cycles (contest_id) WHERE active`
//! serializes concurrent creates; the race loser surfaces as
//! `DuplicateActiveCycle`.

mod catalog_store;
mod cycle_repository;
mod study_record_reader;

pub use catalog_store::PostgresCatalogStore;
pub use cycle_repository::PostgresCycleRepository;
pub use study_record_reader::PostgresStudyRecordReader;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Maps an unclassified sqlx failure to a generic database error.
/// Never interpreted as a business-rule violation.
pub(crate) fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, "{}", context);
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}
