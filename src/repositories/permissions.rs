use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Permission;
use crate::repositories::{contains_pattern, Conditions};

pub(crate) const COLUMNS: &str = "id, name, description, resource, action, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Permission>, sqlx::Error> {
    sqlx::query_as::<_, Permission>(&format!(
        "SELECT {COLUMNS} FROM permissions WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn exists_by_name(pool: &PgPool, name: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT id FROM permissions WHERE name = $1 AND deleted_at IS NULL",
    )
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreatePermission<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) description: &'a str,
    pub(crate) resource: &'a str,
    pub(crate) action: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreatePermission<'_>,
) -> Result<Permission, sqlx::Error> {
    sqlx::query_as::<_, Permission>(&format!(
        "INSERT INTO permissions (id, name, description, resource, action, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.description)
    .bind(params.resource)
    .bind(params.action)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdatePermission {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) resource: Option<String>,
    pub(crate) action: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdatePermission,
) -> Result<Option<Permission>, sqlx::Error> {
    sqlx::query_as::<_, Permission>(&format!(
        "UPDATE permissions SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            resource = COALESCE($3, resource),
            action = COALESCE($4, action),
            updated_at = $5
         WHERE id = $6 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.name)
    .bind(params.description)
    .bind(params.resource)
    .bind(params.action)
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
        "UPDATE permissions SET deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(deleted_at)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM role_permissions WHERE permission_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(true)
}

#[derive(Debug, Default)]
pub(crate) struct PermissionFilter {
    pub(crate) name: Option<String>,
    pub(crate) resource: Option<String>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &PermissionFilter) {
    let mut conditions = Conditions::continuing();
    if let Some(name) = filter.name.as_deref() {
        conditions.next(builder);
        builder.push("name ILIKE ");
        builder.push_bind(contains_pattern(name));
    }
    if let Some(resource) = filter.resource.as_deref() {
        conditions.next(builder);
        builder.push("resource = ");
        builder.push_bind(resource.to_string());
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &PermissionFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Permission>, i64), sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM permissions WHERE deleted_at IS NULL"
    ));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY resource, action, name OFFSET ");
    builder.push_bind(offset);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    let items = builder.build_query_as::<Permission>().fetch_all(pool).await?;

    let mut count =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM permissions WHERE deleted_at IS NULL");
    push_filter(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((items, total))
}

pub(crate) async fn count_live(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM permissions WHERE id = ANY($1) AND deleted_at IS NULL",
    )
    .bind(ids)
    .fetch_one(executor)
    .await
}

/// Distinct permission names reachable through the account's enabled,
/// live roles.
pub(crate) async fn names_for_account(
    executor: impl sqlx::PgExecutor<'_>,
    account_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT p.name FROM permissions p
         JOIN role_permissions rp ON rp.permission_id = p.id
         JOIN roles r ON r.id = rp.role_id
         JOIN account_roles ar ON ar.role_id = r.id
         WHERE ar.account_id = $1
           AND p.deleted_at IS NULL
           AND r.deleted_at IS NULL
           AND r.status = 'enabled'
         ORDER BY p.name",
    )
    .bind(account_id)
    .fetch_all(executor)
    .await
}
