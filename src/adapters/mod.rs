//! Adapters - Implementations of the ports.

pub mod postgres;

pub use postgres::{PostgresCatalogStore, PostgresCycleRepository, PostgresStudyRecordReader};
