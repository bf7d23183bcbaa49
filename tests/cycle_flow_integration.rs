//! Integration tests for the study-cycle planning flow.
//!
//! These tests verify the end-to-end lifecycle:
//! 1. Apportionment preview proposes a zero-leakage split
//! 2. CreateCycle persists the approved plan as the single active cycle
//! 3. Recorded study time shows up as dashboard progress
//! 4. Close freezes progress into history; a second close conflicts
//! 5. Creating a replacement cycle deactivates the prior one
//!
//! Uses in-memory port implementations to exercise the handlers without
//! external dependencies.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use studyplan::application::handlers::cycle::{
    CloseCycleCommand, CloseCycleError, CloseCycleHandler, CreateCycleCommand, CreateCycleHandler,
    CycleItemSpec, ListCycleHistoryHandler, ListCycleHistoryQuery, PreviewApportionmentHandler,
    PreviewApportionmentQuery,
};
use studyplan::application::handlers::dashboard::{GetDashboardHandler, GetDashboardQuery};
use studyplan::domain::catalog::{Contest, Subject, SubjectKind, SubjectWeight};
use studyplan::domain::cycle::{Cycle, CycleHistoryEntry};
use studyplan::domain::dashboard::StudyFilters;
use studyplan::domain::foundation::{
    CommandMetadata, ContestId, CycleId, DomainError, ErrorCode, OwnedByUser, SubjectId,
    Timestamp, UserId,
};
use studyplan::ports::{
    ContestStore, CycleRepository, DailySum, ResumeSums, StudyRecordReader, StudyWindow,
    SubjectStore, SubjectSums,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// In-memory cycle repository honoring the single-active-per-contest
/// contract.
struct InMemoryCycleRepository {
    cycles: Mutex<Vec<Cycle>>,
    history: Mutex<HashMap<CycleId, Vec<CycleHistoryEntry>>>,
}

impl InMemoryCycleRepository {
    fn new() -> Self {
        Self {
            cycles: Mutex::new(Vec::new()),
            history: Mutex::new(HashMap::new()),
        }
    }

    fn active_count(&self) -> usize {
        self.cycles.lock().unwrap().iter().filter(|c| c.is_active()).count()
    }
}

#[async_trait]
impl CycleRepository for InMemoryCycleRepository {
    async fn create_active(&self, cycle: &Cycle) -> Result<(), DomainError> {
        let mut cycles = self.cycles.lock().unwrap();
        for prior in cycles.iter_mut() {
            if prior.contest_id() == cycle.contest_id() && prior.is_active() {
                prior.deactivate(cycle.started_at());
            }
        }
        cycles.push(cycle.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CycleId) -> Result<Option<Cycle>, DomainError> {
        Ok(self.cycles.lock().unwrap().iter().find(|c| c.id() == *id).cloned())
    }

    async fn find_active_for_contest(
        &self,
        contest_id: &ContestId,
    ) -> Result<Option<Cycle>, DomainError> {
        Ok(self
            .cycles
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.contest_id() == *contest_id && c.is_active())
            .cloned())
    }

    async fn find_active_for_user(&self, user_id: &UserId) -> Result<Option<Cycle>, DomainError> {
        let cycles = self.cycles.lock().unwrap();
        let mut active: Vec<&Cycle> = cycles
            .iter()
            .filter(|c| c.is_active() && c.check_ownership(user_id).is_ok())
            .collect();
        active.sort_by_key(|c| std::cmp::Reverse(c.started_at()));
        Ok(active.first().map(|c| (*c).clone()))
    }

    async fn list_for_contest(&self, contest_id: &ContestId) -> Result<Vec<Cycle>, DomainError> {
        let cycles = self.cycles.lock().unwrap();
        let mut result: Vec<Cycle> = cycles
            .iter()
            .filter(|c| c.contest_id() == *contest_id)
            .cloned()
            .collect();
        result.sort_by_key(|c| std::cmp::Reverse(c.started_at()));
        Ok(result)
    }

    async fn close(
        &self,
        cycle: &Cycle,
        history: &[CycleHistoryEntry],
    ) -> Result<(), DomainError> {
        let mut cycles = self.cycles.lock().unwrap();
        let stored = cycles
            .iter_mut()
            .find(|c| c.id() == cycle.id())
            .ok_or_else(|| DomainError::new(ErrorCode::CycleNotFound, "Cycle not found"))?;
        if !stored.is_active() {
            return Err(DomainError::new(
                ErrorCode::CycleAlreadyClosed,
                "This cycle is already closed",
            ));
        }
        *stored = cycle.clone();
        self.history.lock().unwrap().insert(cycle.id(), history.to_vec());
        Ok(())
    }

    async fn delete(&self, id: &CycleId) -> Result<(), DomainError> {
        let mut cycles = self.cycles.lock().unwrap();
        let before = cycles.len();
        cycles.retain(|c| c.id() != *id);
        if cycles.len() == before {
            return Err(DomainError::new(ErrorCode::CycleNotFound, "Cycle not found"));
        }
        self.history.lock().unwrap().remove(id);
        Ok(())
    }

    async fn history_for_cycle(
        &self,
        id: &CycleId,
    ) -> Result<Vec<CycleHistoryEntry>, DomainError> {
        Ok(self.history.lock().unwrap().get(id).cloned().unwrap_or_default())
    }
}

/// In-memory catalog with one contest and its subjects.
struct InMemoryCatalog {
    contest: Contest,
    subjects: Vec<Subject>,
    weights: Vec<SubjectWeight>,
}

#[async_trait]
impl ContestStore for InMemoryCatalog {
    async fn find_by_id(&self, id: &ContestId) -> Result<Option<Contest>, DomainError> {
        Ok((self.contest.id == *id).then(|| self.contest.clone()))
    }

    async fn weights_for_contest(
        &self,
        id: &ContestId,
    ) -> Result<Vec<SubjectWeight>, DomainError> {
        Ok(if self.contest.id == *id {
            self.weights.clone()
        } else {
            vec![]
        })
    }
}

#[async_trait]
impl SubjectStore for InMemoryCatalog {
    async fn find_by_id(&self, id: &SubjectId) -> Result<Option<Subject>, DomainError> {
        Ok(self.subjects.iter().find(|s| s.id == *id).cloned())
    }
}

/// In-memory study record aggregates keyed by subject.
#[derive(Default)]
struct InMemoryStudyRecords {
    sums: Mutex<HashMap<SubjectId, SubjectSums>>,
    daily: Mutex<Vec<DailySum>>,
    resume: Mutex<ResumeSums>,
}

impl InMemoryStudyRecords {
    fn record(&self, subject: SubjectId, seconds: i64, questions: i64) {
        let mut sums = self.sums.lock().unwrap();
        let entry = sums.entry(subject).or_default();
        entry.seconds += seconds;
        entry.questions += questions;
    }
}

#[async_trait]
impl StudyRecordReader for InMemoryStudyRecords {
    async fn sums_for_subject(
        &self,
        _user_id: &UserId,
        subject_id: &SubjectId,
        _window: StudyWindow,
    ) -> Result<SubjectSums, DomainError> {
        Ok(self.sums.lock().unwrap().get(subject_id).copied().unwrap_or_default())
    }

    async fn resume(
        &self,
        _user_id: &UserId,
        _start: Option<Timestamp>,
        _end: Option<Timestamp>,
        _filters: &StudyFilters,
    ) -> Result<ResumeSums, DomainError> {
        Ok(*self.resume.lock().unwrap())
    }

    async fn daily_totals(
        &self,
        _user_id: &UserId,
        _start: Option<Timestamp>,
        _end: Option<Timestamp>,
        _filters: &StudyFilters,
    ) -> Result<Vec<DailySum>, DomainError> {
        Ok(self.daily.lock().unwrap().clone())
    }

    async fn earliest_record_date(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<NaiveDate>, DomainError> {
        Ok(self.daily.lock().unwrap().iter().map(|d| d.day).min())
    }
}

// =============================================================================
// Fixture
// =============================================================================

struct Fixture {
    user: UserId,
    contest_id: ContestId,
    portuguese: SubjectId,
    law: SubjectId,
    catalog: Arc<InMemoryCatalog>,
    repo: Arc<InMemoryCycleRepository>,
    records: Arc<InMemoryStudyRecords>,
}

impl Fixture {
    fn new() -> Self {
        let user = UserId::new("candidate-1").unwrap();
        let contest = Contest {
            id: ContestId::new(),
            name: "Federal Exam".to_string(),
            owner_id: user.clone(),
            archived: false,
        };
        let contest_id = contest.id;

        let portuguese = Subject {
            id: SubjectId::new(),
            name: "Portuguese".to_string(),
            owner_id: user.clone(),
            archived: false,
            kind: SubjectKind::General,
        };
        let law = Subject {
            id: SubjectId::new(),
            name: "Law".to_string(),
            owner_id: user.clone(),
            archived: false,
            kind: SubjectKind::General,
        };

        let weights = vec![
            SubjectWeight {
                subject_id: portuguese.id,
                subject_name: portuguese.name.clone(),
                kind: SubjectKind::General,
                weight: 1.0,
                expected_questions: 10,
            },
            SubjectWeight {
                subject_id: law.id,
                subject_name: law.name.clone(),
                kind: SubjectKind::General,
                weight: 2.0,
                expected_questions: 20,
            },
        ];

        let portuguese_id = portuguese.id;
        let law_id = law.id;
        let catalog = Arc::new(InMemoryCatalog {
            contest,
            subjects: vec![portuguese, law],
            weights,
        });

        Self {
            user,
            contest_id,
            portuguese: portuguese_id,
            law: law_id,
            catalog,
            repo: Arc::new(InMemoryCycleRepository::new()),
            records: Arc::new(InMemoryStudyRecords::default()),
        }
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new(self.user.clone())
    }

    fn dashboard_query(&self) -> GetDashboardQuery {
        GetDashboardQuery {
            start: None,
            end: None,
            filters: StudyFilters::default(),
            user_id: self.user.clone(),
        }
    }

    async fn create_cycle(&self, goals: &[(SubjectId, i64, i32)]) -> CycleId {
        let handler = CreateCycleHandler::new(
            self.repo.clone(),
            self.catalog.clone(),
            self.catalog.clone(),
        );
        let items = goals
            .iter()
            .enumerate()
            .map(|(i, (subject_id, goal_seconds, goal_questions))| CycleItemSpec {
                subject_id: *subject_id,
                goal_seconds: *goal_seconds,
                goal_questions: *goal_questions,
                position: i as i32,
            })
            .collect();

        handler
            .handle(
                CreateCycleCommand {
                    contest_id: self.contest_id,
                    label: None,
                    items,
                },
                self.metadata(),
            )
            .await
            .unwrap()
            .cycle_id
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn preview_splits_the_budget_without_leakage() {
    let fx = Fixture::new();
    let handler = PreviewApportionmentHandler::new(fx.catalog.clone());

    let suggestions = handler
        .handle(PreviewApportionmentQuery {
            contest_id: fx.contest_id,
            time_budget_seconds: 36_000, // 10h
            question_budget: Some(50),
            essay_time_budget_seconds: None,
            user_id: fx.user.clone(),
        })
        .await
        .unwrap();

    // Scores 10 and 40: Portuguese 20% (2h), Law 80% (8h), exact sums.
    assert_eq!(suggestions.len(), 2);
    let law = suggestions.iter().find(|s| s.subject_name == "Law").unwrap();
    let portuguese = suggestions.iter().find(|s| s.subject_name == "Portuguese").unwrap();
    assert_eq!(law.allocated_seconds, 28_800);
    assert_eq!(portuguese.allocated_seconds, 7_200);
    assert_eq!(
        suggestions.iter().map(|s| s.allocated_seconds).sum::<i64>(),
        36_000
    );
    assert_eq!(
        suggestions.iter().map(|s| i64::from(s.allocated_questions)).sum::<i64>(),
        50
    );
    // Sorted by allocated time descending.
    assert_eq!(suggestions[0].subject_name, "Law");
}

#[tokio::test]
async fn full_lifecycle_create_study_close() {
    let fx = Fixture::new();
    let cycle_id = fx
        .create_cycle(&[(fx.portuguese, 7_200, 10), (fx.law, 28_800, 40)])
        .await;

    // Candidate studies 1h of Portuguese and answers 5 questions.
    fx.records.record(fx.portuguese, 3_600, 5);

    // Dashboard shows the live active-cycle block.
    let dashboard = GetDashboardHandler::new(
        fx.records.clone(),
        fx.repo.clone(),
        fx.catalog.clone(),
        730,
    );
    let view = dashboard
        .handle(fx.dashboard_query())
        .await
        .unwrap();
    let block = view.active_cycle.unwrap();
    assert_eq!(block.cycle_id, cycle_id);
    assert_eq!(block.contest_name.as_deref(), Some("Federal Exam"));
    // Portuguese: 50% time, 50% questions -> 50. Law: 0. Mean: 25.
    assert_eq!(block.overall_percentage, 25.0);

    // Close freezes history.
    let close = CloseCycleHandler::new(fx.repo.clone(), fx.records.clone());
    let result = close
        .handle(CloseCycleCommand { cycle_id }, fx.metadata())
        .await
        .unwrap();
    assert_eq!(result.progress.overall_percentage, 25.0);

    let history = fx.repo.history_for_cycle(&cycle_id).await.unwrap();
    assert_eq!(history.len(), 2);
    let portuguese_credit = history.iter().find(|h| h.subject_id == fx.portuguese).unwrap();
    assert_eq!(portuguese_credit.discounted_seconds, 3_600);
    assert_eq!(portuguese_credit.discounted_questions, 5);

    // A second close conflicts and changes nothing.
    let err = close
        .handle(CloseCycleCommand { cycle_id }, fx.metadata())
        .await
        .unwrap_err();
    match err {
        CloseCycleError::Domain(err) => assert_eq!(err.code, ErrorCode::CycleAlreadyClosed),
        other => panic!("Expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn replacement_cycle_never_leaves_two_active() {
    let fx = Fixture::new();
    let first = fx.create_cycle(&[(fx.portuguese, 7_200, 0)]).await;
    let second = fx.create_cycle(&[(fx.law, 28_800, 0)]).await;

    assert_ne!(first, second);
    assert_eq!(fx.repo.active_count(), 1);

    let active = fx
        .repo
        .find_active_for_contest(&fx.contest_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id(), second);

    // The replaced cycle carries an end timestamp.
    let replaced = fx.repo.find_by_id(&first).await.unwrap().unwrap();
    assert!(!replaced.is_active());
    assert!(replaced.ended_at().is_some());
}

#[tokio::test]
async fn history_listing_keeps_closed_cycles_frozen() {
    let fx = Fixture::new();
    let first = fx.create_cycle(&[(fx.portuguese, 7_200, 0)]).await;

    // Half the goal done, then close: frozen at 50%.
    fx.records.record(fx.portuguese, 3_600, 0);
    CloseCycleHandler::new(fx.repo.clone(), fx.records.clone())
        .handle(CloseCycleCommand { cycle_id: first }, fx.metadata())
        .await
        .unwrap();

    // More study after the close must not move the frozen number.
    fx.records.record(fx.portuguese, 36_000, 0);

    let second = fx.create_cycle(&[(fx.portuguese, 7_200, 0)]).await;

    let listing = ListCycleHistoryHandler::new(
        fx.repo.clone(),
        fx.catalog.clone(),
        fx.records.clone(),
    );
    let views = listing
        .handle(ListCycleHistoryQuery {
            contest_id: fx.contest_id,
            user_id: fx.user.clone(),
        })
        .await
        .unwrap();

    assert_eq!(views.len(), 2);
    let closed = views.iter().find(|v| v.cycle_id == first).unwrap();
    let active = views.iter().find(|v| v.cycle_id == second).unwrap();
    assert!(!closed.active);
    assert_eq!(closed.frozen_percentage, 50.0);
    assert!(active.active);
}

#[tokio::test]
async fn dashboard_series_is_gap_filled() {
    let fx = Fixture::new();
    let today = chrono::Utc::now().date_naive();
    let three_days_ago = today - chrono::Duration::days(3);

    {
        let mut daily = fx.records.daily.lock().unwrap();
        daily.push(DailySum { day: three_days_ago, seconds: 3_600 });
        daily.push(DailySum { day: today, seconds: 7_200 });
    }

    let dashboard = GetDashboardHandler::new(
        fx.records.clone(),
        fx.repo.clone(),
        fx.catalog.clone(),
        730,
    );
    let view = dashboard
        .handle(fx.dashboard_query())
        .await
        .unwrap();

    // Four calendar days inclusive, the two silent ones zero-filled.
    assert_eq!(view.daily.len(), 4);
    assert_eq!(view.daily[0].seconds, 3_600);
    assert_eq!(view.daily[1].seconds, 0);
    assert_eq!(view.daily[2].seconds, 0);
    assert_eq!(view.daily[3].seconds, 7_200);
}
