use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Account;
use crate::db::types::AccountStatus;
use crate::repositories::{contains_pattern, Conditions};

pub(crate) const COLUMNS: &str = "\
    id, username, password_hash, nickname, email, phone, status, \
    created_at, updated_at, deleted_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {COLUMNS} FROM accounts WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Same as [`find_by_id`] but also returns soft-deleted rows.
pub(crate) async fn find_by_id_including_deleted(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!("SELECT {COLUMNS} FROM accounts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {COLUMNS} FROM accounts WHERE username = $1 AND deleted_at IS NULL"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn exists_by_username(
    executor: impl sqlx::PgExecutor<'_>,
    username: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT id FROM accounts WHERE username = $1 AND deleted_at IS NULL",
    )
    .bind(username)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateAccount<'a> {
    pub(crate) id: &'a str,
    pub(crate) username: &'a str,
    pub(crate) password_hash: String,
    pub(crate) nickname: &'a str,
    pub(crate) email: Option<&'a str>,
    pub(crate) phone: Option<&'a str>,
    pub(crate) status: AccountStatus,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAccount<'_>,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "INSERT INTO accounts (
            id, username, password_hash, nickname, email, phone, status, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.username)
    .bind(params.password_hash)
    .bind(params.nickname)
    .bind(params.email)
    .bind(params.phone)
    .bind(params.status)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// `None` leaves a column untouched; `Some(None)` on a nullable column clears it.
pub(crate) struct UpdateAccount {
    pub(crate) nickname: Option<String>,
    pub(crate) email: Option<Option<String>>,
    pub(crate) phone: Option<Option<String>>,
    pub(crate) status: Option<AccountStatus>,
    pub(crate) password_hash: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateAccount,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "UPDATE accounts SET
            nickname = COALESCE($1, nickname),
            email = CASE WHEN $2 THEN $3 ELSE email END,
            phone = CASE WHEN $4 THEN $5 ELSE phone END,
            status = COALESCE($6, status),
            password_hash = COALESCE($7, password_hash),
            updated_at = $8
         WHERE id = $9 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(params.nickname)
    .bind(params.email.is_some())
    .bind(params.email.flatten())
    .bind(params.phone.is_some())
    .bind(params.phone.flatten())
    .bind(params.status)
    .bind(params.password_hash)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn soft_delete(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    deleted_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE accounts SET deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(deleted_at)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Default)]
pub(crate) struct AccountFilter {
    pub(crate) username: Option<String>,
    pub(crate) status: Option<AccountStatus>,
}

fn push_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a AccountFilter) {
    let mut conditions = Conditions::continuing();
    if let Some(username) = filter.username.as_deref() {
        conditions.next(builder);
        builder.push("username ILIKE ");
        builder.push_bind(contains_pattern(username));
    }
    if let Some(status) = filter.status {
        conditions.next(builder);
        builder.push("status = ");
        builder.push_bind(status);
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &AccountFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Account>, i64), sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM accounts WHERE deleted_at IS NULL"
    ));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY created_at DESC, id OFFSET ");
    builder.push_bind(offset);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    let items = builder.build_query_as::<Account>().fetch_all(pool).await?;

    let mut count =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts WHERE deleted_at IS NULL");
    push_filter(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    Ok((items, total))
}
