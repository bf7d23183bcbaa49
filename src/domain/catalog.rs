//! Catalog records - subjects, contests and their weighted link.
//!
//! These are owned and persisted by external collaborators; this core
//! only needs their identity, ownership and the weight data that drives
//! apportionment.

use serde::{Deserialize, Serialize};

use super::foundation::{ContestId, OwnedByUser, SubjectId, UserId};

/// How a subject is scored in the exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Objective, question-based scoring. Participates in apportionment.
    #[default]
    General,
    /// Subjectively scored (essays). Gets a flat time split, no questions.
    Essay,
}

impl SubjectKind {
    /// Returns true for essay subjects.
    pub fn is_essay(&self) -> bool {
        matches!(self, SubjectKind::Essay)
    }
}

/// An exam subject as seen by this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub owner_id: UserId,
    pub archived: bool,
    pub kind: SubjectKind,
}

impl OwnedByUser for Subject {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}

/// A contest (the exam being prepared for).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contest {
    pub id: ContestId,
    pub name: String,
    pub owner_id: UserId,
    pub archived: bool,
}

impl OwnedByUser for Contest {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}

/// The contest↔subject link carrying the apportionment inputs.
///
/// `weight` is the exam board's relative weight for the subject and
/// `expected_questions` how many questions the exam is expected to have
/// on it. Subject name and kind are denormalized so the apportionment
/// engine needs no further lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectWeight {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub kind: SubjectKind,
    pub weight: f64,
    pub expected_questions: i32,
}

impl SubjectWeight {
    /// The relative importance driving this subject's share of the budget.
    pub fn score(&self) -> f64 {
        self.weight * f64::from(self.expected_questions)
    }
}
