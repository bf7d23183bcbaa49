//! PostgreSQL implementation of CycleRepository.
//!
//! Persists the cycle row plus ordered item rows; history rows are
//! written on close. All mutations are single transactions.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::cycle::{Cycle, CycleHistoryEntry, CycleItem};
use crate::domain::foundation::{
    ContestId, CycleId, DomainError, ErrorCode, OwnedByUser, SubjectId, Timestamp, UserId,
};
use crate::ports::CycleRepository;

use super::db_error;

/// PostgreSQL implementation of CycleRepository.
#[derive(Clone)]
pub struct PostgresCycleRepository {
    pool: PgPool,
}

impl PostgresCycleRepository {
    /// Creates a new PostgresCycleRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, cycle_id: &CycleId) -> Result<Vec<CycleItem>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT subject_id, subject_name, goal_seconds, goal_questions, position
            FROM cycle_items
            WHERE cycle_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(cycle_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch cycle items", e))?;

        Ok(rows
            .into_iter()
            .map(|row| CycleItem {
                subject_id: SubjectId::from_uuid(row.get("subject_id")),
                subject_name: row.get("subject_name"),
                goal_seconds: row.get("goal_seconds"),
                goal_questions: row.get("goal_questions"),
                position: row.get("position"),
            })
            .collect())
    }

    async fn load_cycle(
        &self,
        row: sqlx::postgres::PgRow,
    ) -> Result<Cycle, DomainError> {
        let id = CycleId::from_uuid(row.get("id"));
        let items = self.load_items(&id).await?;
        row_to_cycle(row, items)
    }
}

#[async_trait]
impl CycleRepository for PostgresCycleRepository {
    async fn create_active(&self, cycle: &Cycle) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        // Deactivate the prior active cycle for this contest, stamping
        // its end to the new cycle's start when unset.
        sqlx::query(
            r#"
            UPDATE cycles
            SET active = FALSE, ended_at = COALESCE(ended_at, $2)
            WHERE contest_id = $1 AND active
            "#,
        )
        .bind(cycle.contest_id().as_uuid())
        .bind(cycle.started_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to deactivate prior cycle", e))?;

        let insert = sqlx::query(
            r#"
            INSERT INTO cycles (id, contest_id, owner_id, label, active, started_at, ended_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(cycle.id().as_uuid())
        .bind(cycle.contest_id().as_uuid())
        .bind(cycle.owner_id().as_str())
        .bind(cycle.label())
        .bind(cycle.is_active())
        .bind(cycle.started_at().as_datetime())
        .bind(cycle.ended_at().map(|t| *t.as_datetime()))
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert {
            // The partial unique index on (contest_id) WHERE active is
            // the arbiter of concurrent creates: the loser conflicts.
            if is_unique_violation(&e) {
                return Err(DomainError::new(
                    ErrorCode::DuplicateActiveCycle,
                    "Another cycle was activated for this contest concurrently",
                )
                .with_detail("contest_id", cycle.contest_id().to_string()));
            }
            return Err(db_error("Failed to insert cycle", e));
        }

        for item in cycle.items() {
            insert_item(&mut tx, cycle.id(), item).await?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &CycleId) -> Result<Option<Cycle>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, contest_id, owner_id, label, active, started_at, ended_at
            FROM cycles WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch cycle", e))?;

        match row {
            Some(row) => Ok(Some(self.load_cycle(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_active_for_contest(
        &self,
        contest_id: &ContestId,
    ) -> Result<Option<Cycle>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, contest_id, owner_id, label, active, started_at, ended_at
            FROM cycles WHERE contest_id = $1 AND active
            "#,
        )
        .bind(contest_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch active cycle", e))?;

        match row {
            Some(row) => Ok(Some(self.load_cycle(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_active_for_user(&self, user_id: &UserId) -> Result<Option<Cycle>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, contest_id, owner_id, label, active, started_at, ended_at
            FROM cycles
            WHERE owner_id = $1 AND active
            ORDER BY started_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch user's active cycle", e))?;

        match row {
            Some(row) => Ok(Some(self.load_cycle(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_for_contest(&self, contest_id: &ContestId) -> Result<Vec<Cycle>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, contest_id, owner_id, label, active, started_at, ended_at
            FROM cycles
            WHERE contest_id = $1
            ORDER BY started_at DESC
            "#,
        )
        .bind(contest_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list cycles", e))?;

        let mut cycles = Vec::with_capacity(rows.len());
        for row in rows {
            cycles.push(self.load_cycle(row).await?);
        }
        Ok(cycles)
    }

    async fn close(
        &self,
        cycle: &Cycle,
        history: &[CycleHistoryEntry],
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        // The `AND active` guard turns a lost close race into a clean
        // conflict instead of overwriting the stored end timestamp.
        let result = sqlx::query(
            r#"
            UPDATE cycles
            SET active = FALSE, ended_at = $2
            WHERE id = $1 AND active
            "#,
        )
        .bind(cycle.id().as_uuid())
        .bind(cycle.ended_at().map(|t| *t.as_datetime()))
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to close cycle", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CycleAlreadyClosed,
                "This cycle is already closed",
            )
            .with_detail("cycle_id", cycle.id().to_string()));
        }

        for entry in history {
            sqlx::query(
                r#"
                INSERT INTO cycle_history (id, cycle_id, subject_id, discounted_seconds, discounted_questions)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(cycle.id().as_uuid())
            .bind(entry.subject_id.as_uuid())
            .bind(entry.discounted_seconds)
            .bind(entry.discounted_questions)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to insert cycle history", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        Ok(())
    }

    async fn delete(&self, id: &CycleId) -> Result<(), DomainError> {
        // Items and history cascade from the cycle row.
        let result = sqlx::query("DELETE FROM cycles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete cycle", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CycleNotFound,
                format!("Cycle not found: {}", id),
            ));
        }

        Ok(())
    }

    async fn history_for_cycle(
        &self,
        id: &CycleId,
    ) -> Result<Vec<CycleHistoryEntry>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT subject_id, discounted_seconds, discounted_questions
            FROM cycle_history
            WHERE cycle_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch cycle history", e))?;

        Ok(rows
            .into_iter()
            .map(|row| CycleHistoryEntry {
                subject_id: SubjectId::from_uuid(row.get("subject_id")),
                discounted_seconds: row.get("discounted_seconds"),
                discounted_questions: row.get("discounted_questions"),
            })
            .collect())
    }
}

async fn insert_item(
    tx: &mut Transaction<'_, Postgres>,
    cycle_id: CycleId,
    item: &CycleItem,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO cycle_items (id, cycle_id, subject_id, subject_name, goal_seconds, goal_questions, position)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cycle_id.as_uuid())
    .bind(item.subject_id.as_uuid())
    .bind(&item.subject_name)
    .bind(item.goal_seconds)
    .bind(item.goal_questions)
    .bind(item.position)
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to insert cycle item", e))?;

    Ok(())
}

fn row_to_cycle(row: sqlx::postgres::PgRow, items: Vec<CycleItem>) -> Result<Cycle, DomainError> {
    let owner_id = UserId::new(row.get::<String, _>("owner_id"))
        .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;

    Ok(Cycle::reconstitute(
        CycleId::from_uuid(row.get("id")),
        ContestId::from_uuid(row.get("contest_id")),
        owner_id,
        row.get("label"),
        row.get("active"),
        Timestamp::from_datetime(row.get("started_at")),
        row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("ended_at")
            .map(Timestamp::from_datetime),
        items,
    ))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
