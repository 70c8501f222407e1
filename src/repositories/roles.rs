use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Role;
use crate::db::types::RoleStatus;
use crate::repositories::{contains_pattern, Conditions};

pub(crate) const COLUMNS: &str = "id, code, name, description, status, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>(&format!(
        "SELECT {COLUMNS} FROM roles WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_by_code(
    executor: impl sqlx::PgExecutor<'_>,
    code: &str,
) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>(&format!(
        "SELECT {COLUMNS} FROM roles WHERE code = $1 AND deleted_at IS NULL"
    ))
    .bind(code)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateRole<'a> {
    pub(crate) id: &'a str,
    pub(crate) code: &'a str,
    pub(crate) name: &'a str,
    pub(crate) description: &'a str,
    pub(crate) status: RoleStatus,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateRole<'_>) -> Result<Role, sqlx::Error> {
    sqlx::query_as::<_, Role>(&format!(
        "INSERT INTO roles (id, code, name, description, status, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.code)
    .bind(params.name)
    .bind(params.description)
    .bind(params.status)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

/// The role code is fixed at creation.
pub(crate) struct UpdateRole {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) status: Option<RoleStatus>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateRole,
) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>(&format!(
        "UPDATE roles SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            status = COALESCE($3, status),
            updated_at = $4
         WHERE id = $5 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.name)
    .bind(params.description)
    .bind(params.status)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Marks the role deleted and drops its memberships and grants. The
/// referenced accounts, permissions and menus are left alone.
pub(crate) async fn soft_delete(
    pool: &PgPool,
    id: &str,
    deleted_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE roles SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(deleted_at)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    for table in ["account_roles", "role_permissions", "role_menus"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE role_id = $1"))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(true)
}

#[derive(Debug, Default)]
pub(crate) struct RoleFilter {
    pub(crate) keyword: Option<String>,
    pub(crate) status: Option<RoleStatus>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &RoleFilter) {
    let mut conditions = Conditions::continuing();
    if let Some(keyword) = filter.keyword.as_deref() {
        let pattern = contains_pattern(keyword);
        conditions.next(builder);
        builder.push("(code ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR name ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(status) = filter.status {
        conditions.next(builder);
        builder.push("status = ");
        builder.push_bind(status);
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &RoleFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Role>, i64), sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM roles WHERE deleted_at IS NULL"));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY created_at ASC, id OFFSET ");
    builder.push_bind(offset);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    let items = builder.build_query_as::<Role>().fetch_all(pool).await?;

    let mut count =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM roles WHERE deleted_at IS NULL");
    push_filter(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((items, total))
}

/// Live roles held by the account, enabled or not.
pub(crate) async fn list_for_account(
    executor: impl sqlx::PgExecutor<'_>,
    account_id: &str,
) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>(&format!(
        "SELECT {COLUMNS} FROM roles
         WHERE deleted_at IS NULL
           AND id IN (SELECT role_id FROM account_roles WHERE account_id = $1)
         ORDER BY code"
    ))
    .bind(account_id)
    .fetch_all(executor)
    .await
}

/// Codes of the account's enabled roles, as embedded into session tokens.
pub(crate) async fn enabled_codes_for_account(
    executor: impl sqlx::PgExecutor<'_>,
    account_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT r.code FROM roles r
         JOIN account_roles ar ON ar.role_id = r.id
         WHERE ar.account_id = $1 AND r.deleted_at IS NULL AND r.status = 'enabled'
         ORDER BY r.code",
    )
    .bind(account_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn count_live(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE id = ANY($1) AND deleted_at IS NULL")
        .bind(ids)
        .fetch_one(executor)
        .await
}

pub(crate) async fn assign_to_account(
    executor: impl sqlx::PgExecutor<'_>,
    account_id: &str,
    role_id: &str,
    created_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO account_roles (account_id, role_id, created_at) VALUES ($1, $2, $3)
         ON CONFLICT (account_id, role_id) DO NOTHING",
    )
    .bind(account_id)
    .bind(role_id)
    .bind(created_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Replaces the account's role set; roles not in `role_ids` are removed.
pub(crate) async fn replace_for_account(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    account_id: &str,
    role_ids: &[String],
    created_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM account_roles WHERE account_id = $1")
        .bind(account_id)
        .execute(&mut **tx)
        .await?;

    for role_id in role_ids {
        assign_to_account(&mut **tx, account_id, role_id, created_at).await?;
    }
    Ok(())
}

pub(crate) async fn remove_account_memberships(
    executor: impl sqlx::PgExecutor<'_>,
    account_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM account_roles WHERE account_id = $1")
        .bind(account_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn permission_ids(
    executor: impl sqlx::PgExecutor<'_>,
    role_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT rp.permission_id FROM role_permissions rp
         JOIN permissions p ON p.id = rp.permission_id
         WHERE rp.role_id = $1 AND p.deleted_at IS NULL
         ORDER BY p.name",
    )
    .bind(role_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn menu_ids(
    executor: impl sqlx::PgExecutor<'_>,
    role_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT rm.menu_id FROM role_menus rm
         JOIN menus m ON m.id = rm.menu_id
         WHERE rm.role_id = $1 AND m.deleted_at IS NULL
         ORDER BY m.order_num, m.id",
    )
    .bind(role_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn replace_permissions(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    role_id: &str,
    permission_ids: &[String],
    created_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
        .bind(role_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        "INSERT INTO role_permissions (role_id, permission_id, created_at)
         SELECT $1, UNNEST($2::varchar[]), $3
         ON CONFLICT DO NOTHING",
    )
    .bind(role_id)
    .bind(permission_ids)
    .bind(created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub(crate) async fn replace_menus(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    role_id: &str,
    menu_ids: &[String],
    created_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM role_menus WHERE role_id = $1")
        .bind(role_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        "INSERT INTO role_menus (role_id, menu_id, created_at)
         SELECT $1, UNNEST($2::varchar[]), $3
         ON CONFLICT DO NOTHING",
    )
    .bind(role_id)
    .bind(menu_ids)
    .bind(created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Grants every live permission and menu to the role. Used for the
/// built-in administrator role at startup.
pub(crate) async fn grant_everything(
    executor: &PgPool,
    role_id: &str,
    created_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO role_permissions (role_id, permission_id, created_at)
         SELECT $1, id, $2 FROM permissions WHERE deleted_at IS NULL
         ON CONFLICT DO NOTHING",
    )
    .bind(role_id)
    .bind(created_at)
    .execute(executor)
    .await?;

    sqlx::query(
        "INSERT INTO role_menus (role_id, menu_id, created_at)
         SELECT $1, id, $2 FROM menus WHERE deleted_at IS NULL
         ON CONFLICT DO NOTHING",
    )
    .bind(role_id)
    .bind(created_at)
    .execute(executor)
    .await?;
    Ok(())
}
