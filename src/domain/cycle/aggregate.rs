//! Cycle aggregate - a time-boxed study plan for one contest.
//!
//! A Cycle binds a contest to an ordered set of per-subject time and
//! question goals. At most one cycle is active per contest; closing or
//! replacing a cycle stamps its end and freezes its progress.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ContestId, CycleId, DomainError, ErrorCode, OwnedByUser, SubjectId, Timestamp, UserId,
    ValidationError,
};

/// One subject's goals inside a cycle. Immutable once persisted; a plan
/// change means closing the cycle and creating a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleItem {
    pub subject_id: SubjectId,
    pub subject_name: String,
    /// Time goal, canonically in seconds.
    pub goal_seconds: i64,
    /// Question goal; zero means time-only tracking for this subject.
    pub goal_questions: i32,
    /// Display order within the cycle.
    pub position: i32,
}

/// Credit consumed by one subject when its cycle was closed.
///
/// Snapshotting the realized amounts (capped at the goal) freezes the
/// closed cycle's progress so the next cycle starts clean without losing
/// historical totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleHistoryEntry {
    pub subject_id: SubjectId,
    pub discounted_seconds: i64,
    pub discounted_questions: i64,
}

/// The Cycle aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    id: CycleId,
    contest_id: ContestId,
    owner_id: UserId,
    label: Option<String>,
    active: bool,
    started_at: Timestamp,
    ended_at: Option<Timestamp>,
    items: Vec<CycleItem>,
}

impl Cycle {
    /// Creates a new active cycle starting now.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` when the item list is empty or any goal is
    /// negative. Subject existence is the caller's concern.
    pub fn new(
        contest_id: ContestId,
        owner_id: UserId,
        label: Option<String>,
        items: Vec<CycleItem>,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(ValidationError::empty_field("items").into());
        }
        for item in &items {
            if item.goal_seconds < 0 {
                return Err(
                    ValidationError::below_minimum("goal_seconds", 0, item.goal_seconds).into(),
                );
            }
            if item.goal_questions < 0 {
                return Err(ValidationError::below_minimum(
                    "goal_questions",
                    0,
                    i64::from(item.goal_questions),
                )
                .into());
            }
        }

        Ok(Self {
            id: CycleId::new(),
            contest_id,
            owner_id,
            label,
            active: true,
            started_at: Timestamp::now(),
            ended_at: None,
            items,
        })
    }

    /// Reconstitutes a cycle from persisted data.
    ///
    /// Used by repository implementations; bypasses creation validation.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: CycleId,
        contest_id: ContestId,
        owner_id: UserId,
        label: Option<String>,
        active: bool,
        started_at: Timestamp,
        ended_at: Option<Timestamp>,
        items: Vec<CycleItem>,
    ) -> Self {
        Self {
            id,
            contest_id,
            owner_id,
            label,
            active,
            started_at,
            ended_at,
            items,
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> CycleId {
        self.id
    }

    pub fn contest_id(&self) -> ContestId {
        self.contest_id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<Timestamp> {
        self.ended_at
    }

    pub fn items(&self) -> &[CycleItem] {
        &self.items
    }

    /// The end of the progress evaluation window: the cycle's end when
    /// closed, otherwise the supplied current time.
    pub fn window_end(&self, now: Timestamp) -> Timestamp {
        self.ended_at.unwrap_or(now)
    }

    // ───────────────────────────────────────────────────────────────
    // Transitions
    // ───────────────────────────────────────────────────────────────

    /// Closes an active cycle, stamping its end.
    ///
    /// # Errors
    ///
    /// `CycleAlreadyClosed` when the cycle is not active; no field is
    /// touched in that case.
    pub fn close(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::new(
                ErrorCode::CycleAlreadyClosed,
                "This cycle is already closed",
            )
            .with_detail("cycle_id", self.id.to_string()));
        }
        self.active = false;
        self.ended_at = Some(now);
        Ok(())
    }

    /// Deactivates the cycle when a newer one replaces it.
    ///
    /// Unlike `close`, this is idempotent: replacing never fails because
    /// the prior cycle was already inactive. An unset end timestamp is
    /// stamped to `now`.
    pub fn deactivate(&mut self, now: Timestamp) {
        self.active = false;
        if self.ended_at.is_none() {
            self.ended_at = Some(now);
        }
    }
}

impl OwnedByUser for Cycle {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}
