use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Course;
use crate::db::types::{ContentStatus, CourseContentType};
use crate::repositories::{contains_pattern, Conditions};

pub(crate) const COLUMNS: &str = "\
    id, title, description, cover_image, content_type, video_url, text_content, duration, \
    status, sort_order, created_by, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) cover_image: Option<&'a str>,
    pub(crate) content_type: CourseContentType,
    pub(crate) video_url: Option<&'a str>,
    pub(crate) text_content: Option<&'a str>,
    pub(crate) duration: i32,
    pub(crate) status: ContentStatus,
    pub(crate) sort_order: i32,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateCourse<'_>) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, title, description, cover_image, content_type, video_url, text_content,
            duration, status, sort_order, created_by, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$12)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.cover_image)
    .bind(params.content_type)
    .bind(params.video_url)
    .bind(params.text_content)
    .bind(params.duration)
    .bind(params.status)
    .bind(params.sort_order)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateCourse {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) cover_image: Option<Option<String>>,
    pub(crate) content_type: Option<CourseContentType>,
    pub(crate) video_url: Option<Option<String>>,
    pub(crate) text_content: Option<Option<String>>,
    pub(crate) duration: Option<i32>,
    pub(crate) status: Option<ContentStatus>,
    pub(crate) sort_order: Option<i32>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateCourse,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            cover_image = CASE WHEN $3 THEN $4 ELSE cover_image END,
            content_type = COALESCE($5, content_type),
            video_url = CASE WHEN $6 THEN $7 ELSE video_url END,
            text_content = CASE WHEN $8 THEN $9 ELSE text_content END,
            duration = COALESCE($10, duration),
            status = COALESCE($11, status),
            sort_order = COALESCE($12, sort_order),
            updated_at = $13
         WHERE id = $14 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.cover_image.is_some())
    .bind(params.cover_image.flatten())
    .bind(params.content_type)
    .bind(params.video_url.is_some())
    .bind(params.video_url.flatten())
    .bind(params.text_content.is_some())
    .bind(params.text_content.flatten())
    .bind(params.duration)
    .bind(params.status)
    .bind(params.sort_order)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn set_status(
    pool: &PgPool,
    id: &str,
    status: ContentStatus,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET status = $1, updated_at = $2
         WHERE id = $3 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(updated_at)
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
        "UPDATE courses SET deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(deleted_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Default)]
pub(crate) struct CourseFilter {
    pub(crate) keyword: Option<String>,
    pub(crate) status: Option<ContentStatus>,
    pub(crate) content_type: Option<CourseContentType>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CourseFilter) {
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
    if let Some(content_type) = filter.content_type {
        conditions.next(builder);
        builder.push("content_type = ");
        builder.push_bind(content_type);
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &CourseFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Course>, i64), sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM courses WHERE deleted_at IS NULL"
    ));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY sort_order ASC, created_at DESC, id OFFSET ");
    builder.push_bind(offset);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    let items = builder.build_query_as::<Course>().fetch_all(pool).await?;

    let mut count =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM courses WHERE deleted_at IS NULL");
    push_filter(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((items, total))
}
