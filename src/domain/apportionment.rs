//! Apportionment engine - splits a budget across weighted subjects.
//!
//! Implements the largest-remainder (Hamilton) method with discrete
//! steps: ideal continuous shares are floored to the step grid and the
//! leftover is handed out step by step, rescuing zero-allocation
//! subjects first. The defining contract is zero leakage: allocations
//! always sum to the input budget exactly.
//!
//! Pure and synchronous; the per-subject accumulator lives only for the
//! duration of a call and is never shared.

use serde::{Deserialize, Serialize};

use super::catalog::{SubjectKind, SubjectWeight};
use super::foundation::{DomainError, ErrorCode, SubjectId};

/// Minimum increment for time allocations: 30 minutes.
pub const TIME_STEP_SECONDS: i64 = 1800;

/// Minimum increment for question allocations.
pub const QUESTION_STEP: i64 = 5;

/// One subject's share of the budgets, as proposed to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedAllocation {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub kind: SubjectKind,
    pub weight: f64,
    pub allocated_seconds: i64,
    pub allocated_questions: i32,
    /// Score share of the contest, 0-100. Based on the continuous score
    /// ratio, not on the rounded allocation. Zero for essay subjects.
    pub percentage: f64,
}

/// Splits the time and question budgets across the given subjects.
///
/// General subjects are apportioned by score (`weight × expected
/// questions`) with the Hamilton method; essay subjects bypass scoring
/// and split `essay_time_budget_seconds` equally. Time and questions are
/// apportioned independently with the same scores.
///
/// # Errors
///
/// - `SubjectSetEmpty` when `weights` is empty
/// - `InvalidBudget` when a supplied budget is zero/negative where a
///   positive one is required
pub fn apportion(
    weights: &[SubjectWeight],
    time_budget_seconds: i64,
    question_budget: Option<i32>,
    essay_time_budget_seconds: Option<i64>,
) -> Result<Vec<SuggestedAllocation>, DomainError> {
    if weights.is_empty() {
        return Err(DomainError::new(
            ErrorCode::SubjectSetEmpty,
            "The contest has no linked subjects",
        ));
    }

    let general: Vec<&SubjectWeight> = weights.iter().filter(|w| !w.kind.is_essay()).collect();
    let essay: Vec<&SubjectWeight> = weights.iter().filter(|w| w.kind.is_essay()).collect();

    let mut suggestions = Vec::with_capacity(weights.len());

    if !general.is_empty() {
        if time_budget_seconds <= 0 {
            return Err(DomainError::new(
                ErrorCode::InvalidBudget,
                "Time budget must be positive",
            )
            .with_detail("time_budget_seconds", time_budget_seconds.to_string()));
        }
        let question_budget = match question_budget {
            Some(q) if q < 0 => {
                return Err(DomainError::new(
                    ErrorCode::InvalidBudget,
                    "Question budget cannot be negative",
                )
                .with_detail("question_budget", q.to_string()));
            }
            Some(q) => i64::from(q),
            None => 0,
        };

        let scores: Vec<f64> = general.iter().map(|w| w.score()).collect();
        let total_score: f64 = {
            let sum: f64 = scores.iter().sum();
            // All-zero scores still get proportional-equal shares; the
            // leftover loop rescues every subject afterwards.
            if sum == 0.0 {
                1.0
            } else {
                sum
            }
        };

        let seconds = distribute(time_budget_seconds, TIME_STEP_SECONDS, &scores, total_score);
        let questions = if question_budget > 0 {
            distribute(question_budget, QUESTION_STEP, &scores, total_score)
        } else {
            vec![0; general.len()]
        };

        for (i, subject) in general.iter().enumerate() {
            suggestions.push(SuggestedAllocation {
                subject_id: subject.subject_id,
                subject_name: subject.subject_name.clone(),
                kind: subject.kind,
                weight: subject.weight,
                allocated_seconds: seconds[i],
                allocated_questions: questions[i] as i32,
                percentage: scores[i] / total_score * 100.0,
            });
        }
    }

    if !essay.is_empty() {
        let budget = match essay_time_budget_seconds {
            Some(b) if b < 0 => {
                return Err(DomainError::new(
                    ErrorCode::InvalidBudget,
                    "Essay time budget cannot be negative",
                )
                .with_detail("essay_time_budget_seconds", b.to_string()));
            }
            Some(b) => b,
            None => 0,
        };

        // Equal split; integer division spreads the sub-second remainder
        // across the first subjects so the essay sum stays exact.
        let n = essay.len() as i64;
        let base = budget / n;
        let extra = budget % n;

        for (i, subject) in essay.iter().enumerate() {
            let allocated = base + if (i as i64) < extra { 1 } else { 0 };
            suggestions.push(SuggestedAllocation {
                subject_id: subject.subject_id,
                subject_name: subject.subject_name.clone(),
                kind: subject.kind,
                weight: subject.weight,
                allocated_seconds: allocated,
                allocated_questions: 0,
                percentage: 0.0,
            });
        }
    }

    suggestions.sort_by(|a, b| b.allocated_seconds.cmp(&a.allocated_seconds));
    Ok(suggestions)
}

// ───────────────────────────────────────────────────────────────
// Largest-remainder distribution
// ───────────────────────────────────────────────────────────────

/// Per-subject accumulator, local to one `distribute` call.
struct Share {
    allocated: i64,
    remainder: f64,
    /// Set once this share has received a top-up; it can no longer win
    /// on remainder grounds in this run.
    topped_up: bool,
}

/// Apportions `budget` in multiples of `step` proportionally to `scores`.
///
/// Floors each ideal share to the step grid, then distributes the exact
/// integer leftover one step at a time: subjects still at zero are
/// rescued first (highest score wins), then the highest unconsumed
/// remainder. A final sub-step residue, present when the budget is not
/// on the step grid, goes to the same pick so the total never leaks.
fn distribute(budget: i64, step: i64, scores: &[f64], total_score: f64) -> Vec<i64> {
    let mut shares: Vec<Share> = scores
        .iter()
        .map(|score| {
            let ideal = score / total_score * budget as f64;
            let floored = (ideal / step as f64).floor() as i64 * step;
            Share {
                allocated: floored,
                remainder: ideal - floored as f64,
                topped_up: false,
            }
        })
        .collect();

    // Integer arithmetic keeps the leftover exact; no float drift to round away.
    let mut leftover = budget - shares.iter().map(|s| s.allocated).sum::<i64>();

    while leftover >= step {
        let winner = pick(scores, &shares);
        shares[winner].allocated += step;
        shares[winner].topped_up = true;
        leftover -= step;
    }

    if leftover > 0 {
        // Budget was off the step grid; the residue still belongs to someone.
        let winner = pick(scores, &shares);
        shares[winner].allocated += leftover;
    }

    shares.into_iter().map(|s| s.allocated).collect()
}

/// Chooses the next share to receive a top-up.
fn pick(scores: &[f64], shares: &[Share]) -> usize {
    // Priority (a): rescue subjects still at zero, highest score first.
    let mut rescue: Option<usize> = None;
    for (i, share) in shares.iter().enumerate() {
        if share.allocated == 0 && rescue.map_or(true, |r| scores[i] > scores[r]) {
            rescue = Some(i);
        }
    }
    if let Some(i) = rescue {
        return i;
    }

    // Priority (b): highest remainder not yet consumed.
    let mut best: Option<usize> = None;
    for (i, share) in shares.iter().enumerate() {
        if !share.topped_up && best.map_or(true, |b| share.remainder > shares[b].remainder) {
            best = Some(i);
        }
    }
    if let Some(i) = best {
        return i;
    }

    // Every remainder consumed and leftover still present: hand further
    // steps to the highest score, first-listed on ties.
    let mut top = 0;
    for i in 1..scores.len() {
        if scores[i] > scores[top] {
            top = i;
        }
    }
    top
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HOUR: i64 = 3600;

    fn general(name: &str, weight: f64, questions: i32) -> SubjectWeight {
        SubjectWeight {
            subject_id: SubjectId::new(),
            subject_name: name.to_string(),
            kind: SubjectKind::General,
            weight,
            expected_questions: questions,
        }
    }

    fn essay(name: &str) -> SubjectWeight {
        SubjectWeight {
            subject_id: SubjectId::new(),
            subject_name: name.to_string(),
            kind: SubjectKind::Essay,
            weight: 1.0,
            expected_questions: 0,
        }
    }

    fn by_name<'a>(result: &'a [SuggestedAllocation], name: &str) -> &'a SuggestedAllocation {
        result.iter().find(|s| s.subject_name == name).unwrap()
    }

    #[test]
    fn splits_worked_example_exactly() {
        // A(weight=1, q=10) and B(weight=2, q=20): scores 10 and 40,
        // so 20% / 80% of a 10h budget.
        let weights = vec![general("A", 1.0, 10), general("B", 2.0, 20)];

        let result = apportion(&weights, 10 * HOUR, Some(50), None).unwrap();

        let a = by_name(&result, "A");
        let b = by_name(&result, "B");
        assert_eq!(a.allocated_seconds, 2 * HOUR);
        assert_eq!(b.allocated_seconds, 8 * HOUR);
        assert_eq!(a.allocated_questions, 10);
        assert_eq!(b.allocated_questions, 40);
        assert!((a.percentage - 20.0).abs() < 1e-9);
        assert!((b.percentage - 80.0).abs() < 1e-9);

        let total: i64 = result.iter().map(|s| s.allocated_seconds).sum();
        assert_eq!(total, 10 * HOUR);
    }

    #[test]
    fn fails_on_empty_subject_set() {
        let err = apportion(&[], 10 * HOUR, None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::SubjectSetEmpty);
    }

    #[test]
    fn rejects_zero_time_budget() {
        let weights = vec![general("A", 1.0, 10)];
        let err = apportion(&weights, 0, None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidBudget);
    }

    #[test]
    fn rejects_negative_question_budget() {
        let weights = vec![general("A", 1.0, 10)];
        let err = apportion(&weights, HOUR, Some(-5), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidBudget);
    }

    #[test]
    fn no_question_budget_means_no_question_allocation() {
        let weights = vec![general("A", 1.0, 10), general("B", 2.0, 20)];
        let result = apportion(&weights, 10 * HOUR, None, None).unwrap();
        assert!(result.iter().all(|s| s.allocated_questions == 0));
    }

    #[test]
    fn zero_score_subject_waits_for_scored_subjects() {
        // A has score 0, B and C carry the contest. B's ideal share
        // floors to zero, so the first leftover step must rescue B, not
        // top up A or C.
        let weights = vec![
            general("A", 1.0, 0),  // score 0
            general("B", 1.0, 10), // score 10
            general("C", 1.0, 11), // score 11
        ];

        let result = apportion(&weights, HOUR, None, None).unwrap();

        assert_eq!(by_name(&result, "A").allocated_seconds, 0);
        assert!(by_name(&result, "B").allocated_seconds > 0);
        assert!(by_name(&result, "C").allocated_seconds > 0);

        let total: i64 = result.iter().map(|s| s.allocated_seconds).sum();
        assert_eq!(total, HOUR);
    }

    #[test]
    fn all_zero_scores_still_consume_the_whole_budget() {
        let weights = vec![general("A", 1.0, 0), general("B", 2.0, 0)];

        let result = apportion(&weights, HOUR, None, None).unwrap();

        let total: i64 = result.iter().map(|s| s.allocated_seconds).sum();
        assert_eq!(total, HOUR);
        assert!(result.iter().all(|s| s.percentage == 0.0));
        // Two steps in the budget, each subject rescued exactly once.
        assert!(result.iter().all(|s| s.allocated_seconds == HOUR / 2));
    }

    #[test]
    fn off_grid_budget_still_sums_exactly() {
        // 1h10min is not a multiple of the 30min step; the residue goes
        // to the next pick rather than leaking.
        let weights = vec![general("A", 1.0, 10), general("B", 3.0, 10)];
        let budget = HOUR + 600;

        let result = apportion(&weights, budget, None, None).unwrap();

        let total: i64 = result.iter().map(|s| s.allocated_seconds).sum();
        assert_eq!(total, budget);
    }

    #[test]
    fn essay_subject_gets_fixed_budget_and_no_questions() {
        let weights = vec![essay("Essay")];

        let result = apportion(&weights, HOUR, Some(50), Some(2 * HOUR)).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].allocated_seconds, 2 * HOUR);
        assert_eq!(result[0].allocated_questions, 0);
        assert_eq!(result[0].percentage, 0.0);
    }

    #[test]
    fn essay_budget_splits_equally_without_leaking() {
        let weights = vec![essay("E1"), essay("E2"), essay("E3")];
        let budget = 7000; // not divisible by 3

        let result = apportion(&weights, HOUR, None, Some(budget)).unwrap();

        let total: i64 = result.iter().map(|s| s.allocated_seconds).sum();
        assert_eq!(total, budget);
        let max = result.iter().map(|s| s.allocated_seconds).max().unwrap();
        let min = result.iter().map(|s| s.allocated_seconds).min().unwrap();
        assert!(max - min <= 1);
    }

    #[test]
    fn essays_bypass_the_general_pool() {
        let weights = vec![general("Portuguese", 1.0, 10), essay("Writing")];

        let result = apportion(&weights, 8 * HOUR, Some(0), Some(2 * HOUR)).unwrap();

        // The single general subject takes the whole general budget.
        assert_eq!(by_name(&result, "Portuguese").allocated_seconds, 8 * HOUR);
        assert_eq!(by_name(&result, "Writing").allocated_seconds, 2 * HOUR);
    }

    #[test]
    fn output_is_sorted_by_allocated_time_descending() {
        let weights = vec![
            general("Small", 1.0, 5),
            general("Big", 5.0, 40),
            general("Mid", 2.0, 20),
        ];

        let result = apportion(&weights, 20 * HOUR, None, None).unwrap();

        let seconds: Vec<i64> = result.iter().map(|s| s.allocated_seconds).collect();
        let mut sorted = seconds.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(seconds, sorted);
    }

    #[test]
    fn rerun_with_identical_inputs_is_identical() {
        let weights = vec![
            general("A", 1.5, 12),
            general("B", 2.0, 30),
            general("C", 0.5, 8),
        ];

        let first = apportion(&weights, 13 * HOUR, Some(120), None).unwrap();
        let second = apportion(&weights, 13 * HOUR, Some(120), None).unwrap();
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn allocated_time_always_sums_to_budget(
            inputs in prop::collection::vec((0.1f64..10.0, 0i32..60), 1..8),
            budget in 1i64..400_000,
        ) {
            let weights: Vec<SubjectWeight> = inputs
                .iter()
                .enumerate()
                .map(|(i, (w, q))| general(&format!("S{}", i), *w, *q))
                .collect();

            let result = apportion(&weights, budget, None, None).unwrap();

            let total: i64 = result.iter().map(|s| s.allocated_seconds).sum();
            prop_assert_eq!(total, budget);
        }

        #[test]
        fn allocated_questions_always_sum_to_budget(
            inputs in prop::collection::vec((0.1f64..10.0, 1i32..60), 1..8),
            question_budget in 1i32..2_000,
        ) {
            let weights: Vec<SubjectWeight> = inputs
                .iter()
                .enumerate()
                .map(|(i, (w, q))| general(&format!("S{}", i), *w, *q))
                .collect();

            let result = apportion(&weights, 10 * HOUR, Some(question_budget), None).unwrap();

            let total: i64 = result.iter().map(|s| i64::from(s.allocated_questions)).sum();
            prop_assert_eq!(total, i64::from(question_budget));
        }
    }
}
