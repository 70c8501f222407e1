use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Exam;
use crate::db::types::ContentStatus;
use crate::repositories::{contains_pattern, Conditions};

pub(crate) const COLUMNS: &str = "\
    id, title, description, total_score, pass_score, time_limit, status, created_by, \
    created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) total_score: f64,
    pub(crate) pass_score: f64,
    pub(crate) time_limit: i32,
    pub(crate) status: ContentStatus,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, title, description, total_score, pass_score, time_limit, status, created_by,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.total_score)
    .bind(params.pass_score)
    .bind(params.time_limit)
    .bind(params.status)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateExam {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) total_score: Option<f64>,
    pub(crate) pass_score: Option<f64>,
    pub(crate) time_limit: Option<i32>,
    pub(crate) status: Option<ContentStatus>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateExam,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            total_score = COALESCE($3, total_score),
            pass_score = COALESCE($4, pass_score),
            time_limit = COALESCE($5, time_limit),
            status = COALESCE($6, status),
            updated_at = $7
         WHERE id = $8 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.total_score)
    .bind(params.pass_score)
    .bind(params.time_limit)
    .bind(params.status)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn soft_delete(
    pool: &PgPool,
    id: &str,
    deleted_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE exams SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(deleted_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Default)]
pub(crate) struct ExamFilter {
    pub(crate) keyword: Option<String>,
    pub(crate) status: Option<ContentStatus>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ExamFilter) {
    let mut conditions = Conditions::continuing();
    if let Some(keyword) = filter.keyword.as_deref() {
        conditions.next(builder);
        builder.push("title ILIKE ");
        builder.push_bind(contains_pattern(keyword));
    }
    if let Some(status) = filter.status {
        conditions.next(builder);
        builder.push("status = ");
        builder.push_bind(status);
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &ExamFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Exam>, i64), sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM exams WHERE deleted_at IS NULL"
    ));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY created_at DESC, id OFFSET ");
    builder.push_bind(offset);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    let items = builder.build_query_as::<Exam>().fetch_all(pool).await?;

    let mut count =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM exams WHERE deleted_at IS NULL");
    push_filter(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((items, total))
}

pub(crate) async fn count_live(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exams WHERE id = ANY($1) AND deleted_at IS NULL")
        .bind(ids)
        .fetch_one(executor)
        .await
}
