//! Studyplan - Study-cycle planning core.
//!
//! Splits a time/question budget across weighted exam subjects, manages
//! the lifecycle of the resulting study cycles, and aggregates raw study
//! records into progress dashboards.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
