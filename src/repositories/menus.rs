use sqlx::PgPool;

use crate::db::models::Menu;
use crate::db::types::MenuKind;

pub(crate) const COLUMNS: &str = "\
    id, parent_id, name, path, icon, component, order_num, visible, kind, permission, \
    created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Menu>, sqlx::Error> {
    sqlx::query_as::<_, Menu>(&format!(
        "SELECT {COLUMNS} FROM menus WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Menu>, sqlx::Error> {
    sqlx::query_as::<_, Menu>(&format!(
        "SELECT {COLUMNS} FROM menus WHERE deleted_at IS NULL ORDER BY order_num, created_at, id"
    ))
    .fetch_all(pool)
    .await
}

/// Visible menus granted to the account through enabled, live roles.
pub(crate) async fn visible_for_account(
    executor: impl sqlx::PgExecutor<'_>,
    account_id: &str,
) -> Result<Vec<Menu>, sqlx::Error> {
    sqlx::query_as::<_, Menu>(&format!(
        "SELECT {COLUMNS} FROM menus
         WHERE deleted_at IS NULL
           AND visible
           AND id IN (
               SELECT rm.menu_id FROM role_menus rm
               JOIN roles r ON r.id = rm.role_id
               JOIN account_roles ar ON ar.role_id = r.id
               WHERE ar.account_id = $1 AND r.deleted_at IS NULL AND r.status = 'enabled'
           )
         ORDER BY order_num, created_at, id"
    ))
    .bind(account_id)
    .fetch_all(executor)
    .await
}

pub(crate) struct CreateMenu<'a> {
    pub(crate) id: &'a str,
    pub(crate) parent_id: Option<&'a str>,
    pub(crate) name: &'a str,
    pub(crate) path: &'a str,
    pub(crate) icon: &'a str,
    pub(crate) component: &'a str,
    pub(crate) order_num: i32,
    pub(crate) visible: bool,
    pub(crate) kind: MenuKind,
    pub(crate) permission: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateMenu<'_>) -> Result<Menu, sqlx::Error> {
    sqlx::query_as::<_, Menu>(&format!(
        "INSERT INTO menus (
            id, parent_id, name, path, icon, component, order_num, visible, kind, permission,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$11)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.parent_id)
    .bind(params.name)
    .bind(params.path)
    .bind(params.icon)
    .bind(params.component)
    .bind(params.order_num)
    .bind(params.visible)
    .bind(params.kind)
    .bind(params.permission)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateMenu {
    pub(crate) parent_id: Option<Option<String>>,
    pub(crate) name: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) icon: Option<String>,
    pub(crate) component: Option<String>,
    pub(crate) order_num: Option<i32>,
    pub(crate) visible: Option<bool>,
    pub(crate) kind: Option<MenuKind>,
    pub(crate) permission: Option<Option<String>>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateMenu,
) -> Result<Option<Menu>, sqlx::Error> {
    sqlx::query_as::<_, Menu>(&format!(
        "UPDATE menus SET
            parent_id = CASE WHEN $1 THEN $2 ELSE parent_id END,
            name = COALESCE($3, name),
            path = COALESCE($4, path),
            icon = COALESCE($5, icon),
            component = COALESCE($6, component),
            order_num = COALESCE($7, order_num),
            visible = COALESCE($8, visible),
            kind = COALESCE($9, kind),
            permission = CASE WHEN $10 THEN $11 ELSE permission END,
            updated_at = $12
         WHERE id = $13 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.parent_id.is_some())
    .bind(params.parent_id.flatten())
    .bind(params.name)
    .bind(params.path)
    .bind(params.icon)
    .bind(params.component)
    .bind(params.order_num)
    .bind(params.visible)
    .bind(params.kind)
    .bind(params.permission.is_some())
    .bind(params.permission.flatten())
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Children are left in place; tree assembly drops them as orphans.
pub(crate) async fn soft_delete(
    pool: &PgPool,
    id: &str,
    deleted_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "UPDATE menus SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(deleted_at)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM role_menus WHERE menu_id = $1").bind(id).execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(true)
}

pub(crate) async fn count_live(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM menus WHERE id = ANY($1) AND deleted_at IS NULL")
        .bind(ids)
        .fetch_one(executor)
        .await
}
