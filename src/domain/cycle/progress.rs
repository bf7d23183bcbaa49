//! Progress math for cycle items.
//!
//! Turns aggregated study-time sums into clamped percentages and signed
//! balances. Pure: the realized sums arrive from the study record store
//! via the caller.

use serde::{Deserialize, Serialize};

use super::CycleItem;
use crate::domain::foundation::SubjectId;

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Progress of a single cycle item against its goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemProgress {
    pub subject_id: SubjectId,
    pub subject_name: String,

    pub goal_seconds: i64,
    pub realized_seconds: i64,
    /// `goal - realized`; negative once the goal is exceeded. Larger
    /// values mean "more behind".
    pub balance_seconds: i64,
    /// Time completion, clamped to 100, one decimal.
    pub time_percentage: f64,

    pub goal_questions: i32,
    pub realized_questions: i64,
    pub balance_questions: i64,
    /// Question completion, clamped to 100, one decimal.
    pub question_percentage: f64,
}

impl ItemProgress {
    /// Computes progress for one item from the realized sums.
    pub fn compute(item: &CycleItem, realized_seconds: i64, realized_questions: i64) -> Self {
        let time_percentage = clamped_percentage(realized_seconds, item.goal_seconds);
        let question_percentage =
            clamped_percentage(realized_questions, i64::from(item.goal_questions));

        Self {
            subject_id: item.subject_id,
            subject_name: item.subject_name.clone(),
            goal_seconds: item.goal_seconds,
            realized_seconds,
            balance_seconds: item.goal_seconds - realized_seconds,
            time_percentage,
            goal_questions: item.goal_questions,
            realized_questions,
            balance_questions: i64::from(item.goal_questions) - realized_questions,
            question_percentage,
        }
    }

    /// This item's contribution to the cycle percentage: the unweighted
    /// average of time and question completion when a question goal is
    /// set, time completion alone otherwise.
    pub fn blended_percentage(&self) -> f64 {
        if self.goal_questions > 0 {
            (self.time_percentage + self.question_percentage) / 2.0
        } else {
            self.time_percentage
        }
    }
}

fn clamped_percentage(realized: i64, goal: i64) -> f64 {
    if goal <= 0 {
        return 0.0;
    }
    let pct = realized as f64 / goal as f64 * 100.0;
    round1(pct.min(100.0))
}

/// Progress of a whole cycle: items sorted most-behind first plus the
/// overall percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleProgress {
    pub items: Vec<ItemProgress>,
    /// Unweighted mean of the item percentages, one decimal. Small- and
    /// large-goal subjects count equally.
    pub overall_percentage: f64,
}

impl CycleProgress {
    /// Aggregates item progress into a cycle view.
    pub fn from_items(mut items: Vec<ItemProgress>) -> Self {
        let overall_percentage = if items.is_empty() {
            0.0
        } else {
            let sum: f64 = items.iter().map(ItemProgress::blended_percentage).sum();
            round1(sum / items.len() as f64)
        };

        items.sort_by(|a, b| b.balance_seconds.cmp(&a.balance_seconds));

        Self {
            items,
            overall_percentage,
        }
    }
}
