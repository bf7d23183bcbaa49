//! PostgreSQL implementation of the catalog store ports.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::catalog::{Contest, Subject, SubjectKind, SubjectWeight};
use crate::domain::foundation::{ContestId, DomainError, ErrorCode, SubjectId, UserId};
use crate::ports::{ContestStore, SubjectStore};

use super::db_error;

/// PostgreSQL implementation of `ContestStore` and `SubjectStore`.
#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Creates a new PostgresCatalogStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContestStore for PostgresCatalogStore {
    async fn find_by_id(&self, id: &ContestId) -> Result<Option<Contest>, DomainError> {
        let row = sqlx::query(
            "SELECT id, name, owner_id, archived FROM contests WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch contest", e))?;

        row.map(|row| {
            Ok(Contest {
                id: ContestId::from_uuid(row.get("id")),
                name: row.get("name"),
                owner_id: parse_user_id(row.get("owner_id"))?,
                archived: row.get("archived"),
            })
        })
        .transpose()
    }

    async fn weights_for_contest(
        &self,
        id: &ContestId,
    ) -> Result<Vec<SubjectWeight>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT s.id AS subject_id, s.name AS subject_name, s.kind,
                   cs.weight, cs.expected_questions
            FROM contest_subjects cs
            JOIN subjects s ON s.id = cs.subject_id
            WHERE cs.contest_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch contest subject weights", e))?;

        rows.into_iter()
            .map(|row| {
                Ok(SubjectWeight {
                    subject_id: SubjectId::from_uuid(row.get("subject_id")),
                    subject_name: row.get("subject_name"),
                    kind: parse_kind(row.get("kind"))?,
                    weight: row.get("weight"),
                    expected_questions: row.get("expected_questions"),
                })
            })
            .collect()
    }
}

#[async_trait]
impl SubjectStore for PostgresCatalogStore {
    async fn find_by_id(&self, id: &SubjectId) -> Result<Option<Subject>, DomainError> {
        let row = sqlx::query(
            "SELECT id, name, owner_id, archived, kind FROM subjects WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch subject", e))?;

        row.map(|row| {
            Ok(Subject {
                id: SubjectId::from_uuid(row.get("id")),
                name: row.get("name"),
                owner_id: parse_user_id(row.get("owner_id"))?,
                archived: row.get("archived"),
                kind: parse_kind(row.get("kind"))?,
            })
        })
        .transpose()
    }
}

fn parse_user_id(raw: String) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))
}

fn parse_kind(raw: String) -> Result<SubjectKind, DomainError> {
    match raw.as_str() {
        "general" => Ok(SubjectKind::General),
        "essay" => Ok(SubjectKind::Essay),
        other => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("Unknown subject kind: {}", other),
        )),
    }
}
