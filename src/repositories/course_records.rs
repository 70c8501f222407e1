use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::db::models::CourseRecord;
use crate::repositories::Conditions;

pub(crate) const COLUMNS: &str = "\
    id, account_id, course_id, progress, duration, is_completed, completed_at, \
    last_study_at, created_at, updated_at";

pub(crate) async fn find_for_account(
    pool: &PgPool,
    account_id: &str,
    course_id: &str,
) -> Result<Option<CourseRecord>, sqlx::Error> {
    sqlx::query_as::<_, CourseRecord>(&format!(
        "SELECT {COLUMNS} FROM course_records
         WHERE account_id = $1 AND course_id = $2 AND deleted_at IS NULL"
    ))
    .bind(account_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_for_account_courses(
    pool: &PgPool,
    account_id: &str,
    course_ids: &[String],
) -> Result<Vec<CourseRecord>, sqlx::Error> {
    sqlx::query_as::<_, CourseRecord>(&format!(
        "SELECT {COLUMNS} FROM course_records
         WHERE account_id = $1 AND course_id = ANY($2) AND deleted_at IS NULL"
    ))
    .bind(account_id)
    .bind(course_ids)
    .fetch_all(pool)
    .await
}

/// Creates the (account, course) row if missing, then returns it locked
/// for the rest of the transaction.
pub(crate) async fn lock_or_create(
    tx: &mut Transaction<'_, Postgres>,
    id: &str,
    account_id: &str,
    course_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<CourseRecord, sqlx::Error> {
    sqlx::query(
        "INSERT INTO course_records (
            id, account_id, course_id, progress, duration, is_completed, last_study_at,
            created_at, updated_at
         ) VALUES ($1, $2, $3, 0, 0, FALSE, $4, $4, $4)
         ON CONFLICT (account_id, course_id) WHERE deleted_at IS NULL DO NOTHING",
    )
    .bind(id)
    .bind(account_id)
    .bind(course_id)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    sqlx::query_as::<_, CourseRecord>(&format!(
        "SELECT {COLUMNS} FROM course_records
         WHERE account_id = $1 AND course_id = $2 AND deleted_at IS NULL
         FOR UPDATE"
    ))
    .bind(account_id)
    .bind(course_id)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn save(
    executor: impl sqlx::PgExecutor<'_>,
    record: &CourseRecord,
) -> Result<CourseRecord, sqlx::Error> {
    sqlx::query_as::<_, CourseRecord>(&format!(
        "UPDATE course_records SET
            progress = $1,
            duration = $2,
            is_completed = $3,
            completed_at = $4,
            last_study_at = $5,
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}"
    ))
    .bind(record.progress)
    .bind(record.duration)
    .bind(record.is_completed)
    .bind(record.completed_at)
    .bind(record.last_study_at)
    .bind(record.updated_at)
    .bind(&record.id)
    .fetch_one(executor)
    .await
}

#[derive(Debug, Default)]
pub(crate) struct CourseRecordFilter {
    pub(crate) account_id: Option<String>,
    pub(crate) course_id: Option<String>,
    pub(crate) is_completed: Option<bool>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CourseRecordFilter) {
    let mut conditions = Conditions::continuing();
    if let Some(account_id) = filter.account_id.as_deref() {
        conditions.next(builder);
        builder.push("account_id = ");
        builder.push_bind(account_id.to_string());
    }
    if let Some(course_id) = filter.course_id.as_deref() {
        conditions.next(builder);
        builder.push("course_id = ");
        builder.push_bind(course_id.to_string());
    }
    if let Some(is_completed) = filter.is_completed {
        conditions.next(builder);
        builder.push("is_completed = ");
        builder.push_bind(is_completed);
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &CourseRecordFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<CourseRecord>, i64), sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM course_records WHERE deleted_at IS NULL"
    ));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY last_study_at DESC, id OFFSET ");
    builder.push_bind(offset);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    let items = builder.build_query_as::<CourseRecord>().fetch_all(pool).await?;

    let mut count = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM course_records WHERE deleted_at IS NULL",
    );
    push_filter(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((items, total))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RecordCounts {
    pub(crate) total: i64,
    pub(crate) completed: i64,
}

pub(crate) async fn counts_for_account(
    pool: &PgPool,
    account_id: &str,
) -> Result<RecordCounts, sqlx::Error> {
    sqlx::query_as::<_, RecordCounts>(
        "SELECT COUNT(*) AS total,
                COUNT(*) FILTER (WHERE is_completed) AS completed
         FROM course_records cr
         JOIN courses c ON c.id = cr.course_id
         WHERE cr.account_id = $1 AND cr.deleted_at IS NULL AND c.deleted_at IS NULL",
    )
    .bind(account_id)
    .fetch_one(pool)
    .await
}
