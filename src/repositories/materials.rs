use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Material;
use crate::db::types::{ContentStatus, MaterialType};
use crate::repositories::{contains_pattern, Conditions};

pub(crate) const COLUMNS: &str = "\
    id, title, description, material_type, content, file_url, file_size, cover_url, \
    order_num, status, created_by, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Material>, sqlx::Error> {
    sqlx::query_as::<_, Material>(&format!(
        "SELECT {COLUMNS} FROM materials WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateMaterial<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) material_type: MaterialType,
    pub(crate) content: &'a str,
    pub(crate) file_url: Option<&'a str>,
    pub(crate) file_size: i64,
    pub(crate) cover_url: Option<&'a str>,
    pub(crate) order_num: i32,
    pub(crate) status: ContentStatus,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateMaterial<'_>,
) -> Result<Material, sqlx::Error> {
    sqlx::query_as::<_, Material>(&format!(
        "INSERT INTO materials (
            id, title, description, material_type, content, file_url, file_size, cover_url,
            order_num, status, created_by, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$12)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.material_type)
    .bind(params.content)
    .bind(params.file_url)
    .bind(params.file_size)
    .bind(params.cover_url)
    .bind(params.order_num)
    .bind(params.status)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateMaterial {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) material_type: Option<MaterialType>,
    pub(crate) content: Option<String>,
    pub(crate) file_url: Option<Option<String>>,
    pub(crate) file_size: Option<i64>,
    pub(crate) cover_url: Option<Option<String>>,
    pub(crate) order_num: Option<i32>,
    pub(crate) status: Option<ContentStatus>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateMaterial,
) -> Result<Option<Material>, sqlx::Error> {
    sqlx::query_as::<_, Material>(&format!(
        "UPDATE materials SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            material_type = COALESCE($3, material_type),
            content = COALESCE($4, content),
            file_url = CASE WHEN $5 THEN $6 ELSE file_url END,
            file_size = COALESCE($7, file_size),
            cover_url = CASE WHEN $8 THEN $9 ELSE cover_url END,
            order_num = COALESCE($10, order_num),
            status = COALESCE($11, status),
            updated_at = $12
         WHERE id = $13 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.material_type)
    .bind(params.content)
    .bind(params.file_url.is_some())
    .bind(params.file_url.flatten())
    .bind(params.file_size)
    .bind(params.cover_url.is_some())
    .bind(params.cover_url.flatten())
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
    let result = sqlx::query(
        "UPDATE materials SET deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(deleted_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Default)]
pub(crate) struct MaterialFilter {
    pub(crate) keyword: Option<String>,
    pub(crate) material_type: Option<MaterialType>,
    pub(crate) status: Option<ContentStatus>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &MaterialFilter) {
    let mut conditions = Conditions::continuing();
    if let Some(keyword) = filter.keyword.as_deref() {
        conditions.next(builder);
        builder.push("title ILIKE ");
        builder.push_bind(contains_pattern(keyword));
    }
    if let Some(material_type) = filter.material_type {
        conditions.next(builder);
        builder.push("material_type = ");
        builder.push_bind(material_type);
    }
    if let Some(status) = filter.status {
        conditions.next(builder);
        builder.push("status = ");
        builder.push_bind(status);
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &MaterialFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Material>, i64), sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM materials WHERE deleted_at IS NULL"
    ));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY order_num ASC, created_at DESC, id OFFSET ");
    builder.push_bind(offset);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    let items = builder.build_query_as::<Material>().fetch_all(pool).await?;

    let mut count =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM materials WHERE deleted_at IS NULL");
    push_filter(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((items, total))
}

pub(crate) async fn count_live(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM materials WHERE id = ANY($1) AND deleted_at IS NULL")
        .bind(ids)
        .fetch_one(executor)
        .await
}
