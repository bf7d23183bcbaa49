//! PostgreSQL implementation of StudyRecordReader.
//!
//! Every query is a sum/group-by pushed down to the database; raw
//! records never cross into this process. Multi-select filters bind as
//! uuid arrays where an empty array means "no filter on this dimension".

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::dashboard::StudyFilters;
use crate::domain::foundation::{DomainError, SubjectId, Timestamp, UserId};
use crate::ports::{DailySum, ResumeSums, StudyRecordReader, StudyWindow, SubjectSums};

use super::db_error;

/// PostgreSQL implementation of StudyRecordReader.
#[derive(Clone)]
pub struct PostgresStudyRecordReader {
    pool: PgPool,
}

impl PostgresStudyRecordReader {
    /// Creates a new PostgresStudyRecordReader.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct FilterArrays {
    subjects: Vec<Uuid>,
    topics: Vec<Uuid>,
    contests: Vec<Uuid>,
    study_types: Vec<Uuid>,
}

impl FilterArrays {
    fn from(filters: &StudyFilters) -> Self {
        Self {
            subjects: filters.subjects.iter().map(|id| *id.as_uuid()).collect(),
            topics: filters.topics.iter().map(|id| *id.as_uuid()).collect(),
            contests: filters.contests.iter().map(|id| *id.as_uuid()).collect(),
            study_types: filters.study_types.iter().map(|id| *id.as_uuid()).collect(),
        }
    }
}

#[async_trait]
impl StudyRecordReader for PostgresStudyRecordReader {
    async fn sums_for_subject(
        &self,
        user_id: &UserId,
        subject_id: &SubjectId,
        window: StudyWindow,
    ) -> Result<SubjectSums, DomainError> {
        // Seconds honor the per-record opt-out flag; questions do not.
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(seconds) FILTER (WHERE counts_toward_cycle), 0)::BIGINT AS seconds,
                   COALESCE(SUM(questions_attempted), 0)::BIGINT AS questions
            FROM study_records
            WHERE user_id = $1
              AND subject_id = $2
              AND started_at >= $3
              AND started_at < $4
            "#,
        )
        .bind(user_id.as_str())
        .bind(subject_id.as_uuid())
        .bind(window.start.as_datetime())
        .bind(window.end.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to sum subject study records", e))?;

        Ok(SubjectSums {
            seconds: row.get("seconds"),
            questions: row.get("questions"),
        })
    }

    async fn resume(
        &self,
        user_id: &UserId,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        filters: &StudyFilters,
    ) -> Result<ResumeSums, DomainError> {
        let arrays = FilterArrays::from(filters);

        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(seconds), 0)::BIGINT AS seconds,
                   COALESCE(SUM(questions_attempted), 0)::BIGINT AS attempted,
                   COALESCE(SUM(questions_correct), 0)::BIGINT AS correct
            FROM study_records
            WHERE user_id = $1
              AND ($2::TIMESTAMPTZ IS NULL OR started_at >= $2)
              AND ($3::TIMESTAMPTZ IS NULL OR started_at <= $3)
              AND (CARDINALITY($4::UUID[]) = 0 OR subject_id = ANY($4))
              AND (CARDINALITY($5::UUID[]) = 0 OR topic_id = ANY($5))
              AND (CARDINALITY($6::UUID[]) = 0 OR contest_id = ANY($6))
              AND (CARDINALITY($7::UUID[]) = 0 OR study_type_id = ANY($7))
            "#,
        )
        .bind(user_id.as_str())
        .bind(start.map(|t| *t.as_datetime()))
        .bind(end.map(|t| *t.as_datetime()))
        .bind(&arrays.subjects)
        .bind(&arrays.topics)
        .bind(&arrays.contests)
        .bind(&arrays.study_types)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to compute study resume", e))?;

        Ok(ResumeSums {
            seconds: row.get("seconds"),
            questions_attempted: row.get("attempted"),
            questions_correct: row.get("correct"),
        })
    }

    async fn daily_totals(
        &self,
        user_id: &UserId,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        filters: &StudyFilters,
    ) -> Result<Vec<DailySum>, DomainError> {
        let arrays = FilterArrays::from(filters);

        let rows = sqlx::query(
            r#"
            SELECT (started_at AT TIME ZONE 'UTC')::DATE AS day,
                   COALESCE(SUM(seconds), 0)::BIGINT AS seconds
            FROM study_records
            WHERE user_id = $1
              AND ($2::TIMESTAMPTZ IS NULL OR started_at >= $2)
              AND ($3::TIMESTAMPTZ IS NULL OR started_at <= $3)
              AND (CARDINALITY($4::UUID[]) = 0 OR subject_id = ANY($4))
              AND (CARDINALITY($5::UUID[]) = 0 OR topic_id = ANY($5))
              AND (CARDINALITY($6::UUID[]) = 0 OR contest_id = ANY($6))
              AND (CARDINALITY($7::UUID[]) = 0 OR study_type_id = ANY($7))
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(user_id.as_str())
        .bind(start.map(|t| *t.as_datetime()))
        .bind(end.map(|t| *t.as_datetime()))
        .bind(&arrays.subjects)
        .bind(&arrays.topics)
        .bind(&arrays.contests)
        .bind(&arrays.study_types)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to compute daily study totals", e))?;

        Ok(rows
            .into_iter()
            .map(|row| DailySum {
                day: row.get("day"),
                seconds: row.get("seconds"),
            })
            .collect())
    }

    async fn earliest_record_date(
        &self,
        user_id: &UserId,
    ) -> Result<Option<NaiveDate>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT MIN((started_at AT TIME ZONE 'UTC')::DATE) AS earliest
            FROM study_records
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find earliest study record", e))?;

        Ok(row.get("earliest"))
    }
}
