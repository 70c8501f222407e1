use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::db::models::{ExamRecord, ExamScoreRow, SubmittedAnswer};

pub(crate) const COLUMNS: &str = "\
    id, account_id, exam_id, status, answers, score, start_time, submit_time, \
    created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<ExamRecord>, sqlx::Error> {
    sqlx::query_as::<_, ExamRecord>(&format!(
        "SELECT {COLUMNS} FROM exam_records WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    account_id: &str,
    exam_id: &str,
) -> Result<Option<ExamRecord>, sqlx::Error> {
    sqlx::query_as::<_, ExamRecord>(&format!(
        "SELECT {COLUMNS} FROM exam_records
         WHERE account_id = $1 AND exam_id = $2
           AND status = 'in_progress' AND deleted_at IS NULL"
    ))
    .bind(account_id)
    .bind(exam_id)
    .fetch_optional(executor)
    .await
}

/// Serializes concurrent starts of the same (account, exam) pair until
/// the surrounding transaction ends.
pub(crate) async fn acquire_attempt_lock(
    tx: &mut Transaction<'_, Postgres>,
    account_id: &str,
    exam_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("exam-attempt:{account_id}:{exam_id}"))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub(crate) struct CreateExamRecord<'a> {
    pub(crate) id: &'a str,
    pub(crate) account_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) start_time: time::PrimitiveDateTime,
}

/// Opens a new attempt. Returns `false` when an open attempt already exists.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateExamRecord<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO exam_records (
            id, account_id, exam_id, status, answers, score, start_time, created_at, updated_at
         ) VALUES ($1, $2, $3, 'in_progress', '[]'::jsonb, NULL, $4, $4, $4)
         ON CONFLICT (account_id, exam_id) WHERE status = 'in_progress' AND deleted_at IS NULL
         DO NOTHING",
    )
    .bind(params.id)
    .bind(params.account_id)
    .bind(params.exam_id)
    .bind(params.start_time)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) struct GradeExamRecord<'a> {
    pub(crate) answers: &'a [SubmittedAnswer],
    pub(crate) score: f64,
    pub(crate) submitted_at: time::PrimitiveDateTime,
}

/// Moves an open attempt to `graded`. `None` when the record is no longer
/// `in_progress`, so a racing second submit cannot overwrite the score.
pub(crate) async fn grade(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: GradeExamRecord<'_>,
) -> Result<Option<ExamRecord>, sqlx::Error> {
    sqlx::query_as::<_, ExamRecord>(&format!(
        "UPDATE exam_records SET
            status = 'graded',
            answers = $1,
            score = $2,
            submit_time = $3,
            updated_at = $3
         WHERE id = $4 AND status = 'in_progress' AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(Json(params.answers))
    .bind(params.score)
    .bind(params.submitted_at)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_for_exam(
    pool: &PgPool,
    exam_id: &str,
    offset: i64,
    limit: i64,
) -> Result<(Vec<ExamRecord>, i64), sqlx::Error> {
    let items = sqlx::query_as::<_, ExamRecord>(&format!(
        "SELECT {COLUMNS} FROM exam_records
         WHERE exam_id = $1 AND deleted_at IS NULL
         ORDER BY start_time DESC, id
         OFFSET $2 LIMIT $3"
    ))
    .bind(exam_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM exam_records WHERE exam_id = $1 AND deleted_at IS NULL",
    )
    .bind(exam_id)
    .fetch_one(pool)
    .await?;

    Ok((items, total))
}

pub(crate) async fn list_for_account(
    pool: &PgPool,
    account_id: &str,
    offset: i64,
    limit: i64,
) -> Result<(Vec<ExamRecord>, i64), sqlx::Error> {
    let items = sqlx::query_as::<_, ExamRecord>(&format!(
        "SELECT {COLUMNS} FROM exam_records
         WHERE account_id = $1 AND deleted_at IS NULL
         ORDER BY start_time DESC, id
         OFFSET $2 LIMIT $3"
    ))
    .bind(account_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM exam_records WHERE account_id = $1 AND deleted_at IS NULL",
    )
    .bind(account_id)
    .fetch_one(pool)
    .await?;

    Ok((items, total))
}

/// Every record of the exam with the owner's username, for export.
pub(crate) async fn score_rows_for_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<ExamScoreRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamScoreRow>(
        "SELECT er.account_id, a.username, er.score, er.status, er.start_time, er.submit_time
         FROM exam_records er
         JOIN accounts a ON a.id = er.account_id
         WHERE er.exam_id = $1 AND er.deleted_at IS NULL
         ORDER BY er.start_time, er.id",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}
