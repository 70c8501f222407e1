use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Question;
use crate::db::types::QuestionType;
use crate::repositories::{contains_pattern, Conditions};

pub(crate) const COLUMNS: &str = "\
    id, exam_id, question_type, content, options, answer, explanation, score, order_num, \
    created_by, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Live questions attached to the exam, in presentation order.
pub(crate) async fn list_for_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions
         WHERE exam_id = $1 AND deleted_at IS NULL
         ORDER BY order_num, created_at, id"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: Option<&'a str>,
    pub(crate) question_type: QuestionType,
    pub(crate) content: &'a str,
    pub(crate) options: serde_json::Value,
    pub(crate) answer: &'a str,
    pub(crate) explanation: &'a str,
    pub(crate) score: f64,
    pub(crate) order_num: i32,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, exam_id, question_type, content, options, answer, explanation, score,
            order_num, created_by, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$11)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.question_type)
    .bind(params.content)
    .bind(Json(params.options))
    .bind(params.answer)
    .bind(params.explanation)
    .bind(params.score)
    .bind(params.order_num)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) struct UpdateQuestion {
    pub(crate) exam_id: Option<Option<String>>,
    pub(crate) question_type: Option<QuestionType>,
    pub(crate) content: Option<String>,
    pub(crate) options: Option<serde_json::Value>,
    pub(crate) answer: Option<String>,
    pub(crate) explanation: Option<String>,
    pub(crate) score: Option<f64>,
    pub(crate) order_num: Option<i32>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuestion,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            exam_id = CASE WHEN $1 THEN $2 ELSE exam_id END,
            question_type = COALESCE($3, question_type),
            content = COALESCE($4, content),
            options = COALESCE($5, options),
            answer = COALESCE($6, answer),
            explanation = COALESCE($7, explanation),
            score = COALESCE($8, score),
            order_num = COALESCE($9, order_num),
            updated_at = $10
         WHERE id = $11 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.exam_id.is_some())
    .bind(params.exam_id.flatten())
    .bind(params.question_type)
    .bind(params.content)
    .bind(params.options.map(Json))
    .bind(params.answer)
    .bind(params.explanation)
    .bind(params.score)
    .bind(params.order_num)
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
        "UPDATE questions SET deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(deleted_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Default)]
pub(crate) struct QuestionFilter {
    pub(crate) exam_id: Option<String>,
    pub(crate) question_type: Option<QuestionType>,
    pub(crate) keyword: Option<String>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &QuestionFilter) {
    let mut conditions = Conditions::continuing();
    if let Some(exam_id) = filter.exam_id.as_deref() {
        conditions.next(builder);
        builder.push("exam_id = ");
        builder.push_bind(exam_id.to_string());
    }
    if let Some(question_type) = filter.question_type {
        conditions.next(builder);
        builder.push("question_type = ");
        builder.push_bind(question_type);
    }
    if let Some(keyword) = filter.keyword.as_deref() {
        conditions.next(builder);
        builder.push("content ILIKE ");
        builder.push_bind(contains_pattern(keyword));
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &QuestionFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Question>, i64), sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM questions WHERE deleted_at IS NULL"
    ));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY order_num ASC, created_at DESC, id OFFSET ");
    builder.push_bind(offset);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    let items = builder.build_query_as::<Question>().fetch_all(pool).await?;

    let mut count =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM questions WHERE deleted_at IS NULL");
    push_filter(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((items, total))
}
