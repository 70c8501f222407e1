use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::db::models::{Exam, Material, Topic};
use crate::db::types::ContentStatus;
use crate::repositories::{contains_pattern, exams, materials, Conditions};

pub(crate) const COLUMNS: &str =
    "id, title, description, order_num, status, created_by, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "SELECT {COLUMNS} FROM topics WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateTopic<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) order_num: i32,
    pub(crate) status: ContentStatus,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateTopic<'_>) -> Result<Topic, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "INSERT INTO topics (id, title, description, order_num, status, created_by, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.order_num)
    .bind(params.status)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateTopic {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) order_num: Option<i32>,
    pub(crate) status: Option<ContentStatus>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateTopic,
) -> Result<Option<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "UPDATE topics SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            order_num = COALESCE($3, order_num),
            status = COALESCE($4, status),
            updated_at = $5
         WHERE id = $6 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.order_num)
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
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "UPDATE topics SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(deleted_at)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM topic_materials WHERE topic_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM topic_exams WHERE topic_id = $1").bind(id).execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(true)
}

#[derive(Debug, Default)]
pub(crate) struct TopicFilter {
    pub(crate) keyword: Option<String>,
    pub(crate) status: Option<ContentStatus>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &TopicFilter) {
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
    filter: &TopicFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Topic>, i64), sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM topics WHERE deleted_at IS NULL"
    ));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY order_num ASC, created_at DESC, id OFFSET ");
    builder.push_bind(offset);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    let items = builder.build_query_as::<Topic>().fetch_all(pool).await?;

    let mut count =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM topics WHERE deleted_at IS NULL");
    push_filter(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((items, total))
}

/// Replaces the topic's materials; list position becomes `order_num`.
pub(crate) async fn replace_materials(
    tx: &mut Transaction<'_, Postgres>,
    topic_id: &str,
    material_ids: &[String],
    created_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM topic_materials WHERE topic_id = $1")
        .bind(topic_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        "INSERT INTO topic_materials (topic_id, material_id, order_num, created_at)
         SELECT $1, item.id, (item.position - 1)::int, $3
         FROM UNNEST($2::varchar[]) WITH ORDINALITY AS item(id, position)
         ON CONFLICT (topic_id, material_id) DO NOTHING",
    )
    .bind(topic_id)
    .bind(material_ids)
    .bind(created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Replaces the topic's exams; list position becomes `order_num`.
pub(crate) async fn replace_exams(
    tx: &mut Transaction<'_, Postgres>,
    topic_id: &str,
    exam_ids: &[String],
    created_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM topic_exams WHERE topic_id = $1")
        .bind(topic_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        "INSERT INTO topic_exams (topic_id, exam_id, order_num, created_at)
         SELECT $1, item.id, (item.position - 1)::int, $3
         FROM UNNEST($2::varchar[]) WITH ORDINALITY AS item(id, position)
         ON CONFLICT (topic_id, exam_id) DO NOTHING",
    )
    .bind(topic_id)
    .bind(exam_ids)
    .bind(created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub(crate) async fn materials_for_topic(
    pool: &PgPool,
    topic_id: &str,
) -> Result<Vec<Material>, sqlx::Error> {
    let columns = prefixed(materials::COLUMNS, "m");
    sqlx::query_as::<_, Material>(&format!(
        "SELECT {columns} FROM materials m
         JOIN topic_materials tm ON tm.material_id = m.id
         WHERE tm.topic_id = $1 AND m.deleted_at IS NULL
         ORDER BY tm.order_num, m.id"
    ))
    .bind(topic_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn exams_for_topic(pool: &PgPool, topic_id: &str) -> Result<Vec<Exam>, sqlx::Error> {
    let columns = prefixed(exams::COLUMNS, "e");
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {columns} FROM exams e
         JOIN topic_exams te ON te.exam_id = e.id
         WHERE te.topic_id = $1 AND e.deleted_at IS NULL
         ORDER BY te.order_num, e.id"
    ))
    .bind(topic_id)
    .fetch_all(pool)
    .await
}

fn prefixed(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|column| format!("{alias}.{}", column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
