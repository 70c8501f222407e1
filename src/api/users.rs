use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentIdentity};
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::validation::{
    non_blank, unique_ids, validate_password_len, validate_payload, ApiJson, ApiQuery,
};
use crate::api::{ok, ApiResult};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::AccountStatus;
use crate::repositories;
use crate::schemas::account::{
    AccountCreate, AccountDetailResponse, AccountGetQuery, AccountListQuery, AccountResponse,
    AccountUpdate, AssignRolesRequest,
};
use crate::schemas::role::RoleResponse;
use crate::schemas::ApiResponse;

pub(crate) const MANAGE_PERMISSION: &str = "users:manage";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route("/:account_id", get(get_account).patch(update_account).delete(delete_account))
        .route("/:account_id/roles", put(assign_roles))
}

async fn list_accounts(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<AccountListQuery>,
) -> ApiResult<PaginatedResponse<AccountResponse>> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let filter = repositories::accounts::AccountFilter {
        username: non_blank(params.username),
        status: params.status,
    };
    let (accounts, total) =
        repositories::accounts::list(state.db(), &filter, page.offset(), page.limit())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list accounts"))?;

    ok(PaginatedResponse::new(accounts.into_iter().map(AccountResponse::from).collect(), total, page))
}

async fn create_account(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(payload): ApiJson<AccountCreate>,
) -> Result<(StatusCode, Json<ApiResponse<AccountDetailResponse>>), ApiError> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    validate_password_len(&payload.password)?;

    let username = payload.username.trim();
    let role_ids = unique_ids(payload.role_ids);

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;

    let existing = repositories::accounts::exists_by_username(&mut *tx, username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing account"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }
    ensure_roles_exist(&mut tx, &role_ids).await?;

    let password_hash = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let nickname = non_blank(payload.nickname).unwrap_or_else(|| username.to_string());
    let now = primitive_now_utc();

    let account = repositories::accounts::create(
        &mut *tx,
        repositories::accounts::CreateAccount {
            id: &Uuid::new_v4().to_string(),
            username,
            password_hash,
            nickname: &nickname,
            email: payload.email.as_deref(),
            phone: payload.phone.as_deref(),
            status: payload.status.unwrap_or(AccountStatus::Active),
            created_at: now,
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict("Username already exists".to_string())
        } else {
            ApiError::internal(e, "Failed to create account")
        }
    })?;

    repositories::roles::replace_for_account(&mut tx, &account.id, &role_ids, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assign roles"))?;
    let roles = repositories::roles::list_for_account(&mut *tx, &account.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load roles"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit account"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        account_id = %account.id,
        action = "create_account",
        "Account created"
    );

    let response = AccountDetailResponse {
        account: AccountResponse::from(account),
        roles: roles.into_iter().map(RoleResponse::from).collect(),
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response))))
}

async fn get_account(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(account_id): Path<String>,
    ApiQuery(params): ApiQuery<AccountGetQuery>,
) -> ApiResult<AccountDetailResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let account = if params.include_deleted {
        repositories::accounts::find_by_id_including_deleted(state.db(), &account_id).await
    } else {
        repositories::accounts::find_by_id(state.db(), &account_id).await
    }
    .map_err(|e| ApiError::internal(e, "Failed to fetch account"))?
    .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    let roles = repositories::roles::list_for_account(state.db(), &account.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load roles"))?;

    ok(AccountDetailResponse {
        account: AccountResponse::from(account),
        roles: roles.into_iter().map(RoleResponse::from).collect(),
    })
}

async fn update_account(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(account_id): Path<String>,
    ApiJson(payload): ApiJson<AccountUpdate>,
) -> ApiResult<AccountResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;

    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            validate_password_len(password)?;
            Some(
                security::hash_password(password)
                    .map_err(|e| ApiError::internal(e, "Failed to hash password"))?,
            )
        }
        None => None,
    };

    let account = repositories::accounts::update(
        state.db(),
        &account_id,
        repositories::accounts::UpdateAccount {
            nickname: payload.nickname,
            email: payload.email,
            phone: payload.phone,
            status: payload.status,
            password_hash,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update account"))?
    .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    tracing::info!(
        actor_id = %identity.account_id,
        account_id = %account.id,
        action = "update_account",
        "Account updated"
    );
    ok(AccountResponse::from(account))
}

async fn delete_account(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(account_id): Path<String>,
) -> ApiResult<()> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    if account_id == identity.account_id {
        return Err(ApiError::BadRequest("Cannot delete your own account".to_string()));
    }

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;
    let deleted = repositories::accounts::soft_delete(&mut *tx, &account_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete account"))?;
    if !deleted {
        return Err(ApiError::NotFound("Account not found".to_string()));
    }
    repositories::roles::remove_account_memberships(&mut *tx, &account_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to remove role memberships"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit account deletion"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        account_id = %account_id,
        action = "delete_account",
        "Account deleted"
    );
    ok(())
}

async fn assign_roles(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(account_id): Path<String>,
    ApiJson(payload): ApiJson<AssignRolesRequest>,
) -> ApiResult<Vec<RoleResponse>> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    let role_ids = unique_ids(payload.role_ids);

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;

    repositories::accounts::find_by_id(&mut *tx, &account_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch account"))?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;
    ensure_roles_exist(&mut tx, &role_ids).await?;

    repositories::roles::replace_for_account(&mut tx, &account_id, &role_ids, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assign roles"))?;
    let roles = repositories::roles::list_for_account(&mut *tx, &account_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load roles"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit role assignment"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        account_id = %account_id,
        role_count = role_ids.len(),
        action = "assign_roles",
        "Account roles replaced"
    );
    ok(roles.into_iter().map(RoleResponse::from).collect())
}

async fn ensure_roles_exist(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    role_ids: &[String],
) -> Result<(), ApiError> {
    if role_ids.is_empty() {
        return Ok(());
    }
    let live = repositories::roles::count_live(&mut **tx, role_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to validate roles"))?;
    if live != role_ids.len() as i64 {
        return Err(ApiError::BadRequest("One or more roles do not exist".to_string()));
    }
    Ok(())
}
