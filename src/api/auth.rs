use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentIdentity;
use crate::api::validation::{non_blank, validate_password_len, validate_payload, ApiJson};
use crate::api::{ok, ApiResult};
use crate::core::bootstrap::DEFAULT_ROLE_CODE;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::core::{metrics, security};
use crate::db::models::Account;
use crate::db::types::AccountStatus;
use crate::repositories;
use crate::schemas::account::AccountResponse;
use crate::schemas::auth::{
    ChangePasswordRequest, LoginRequest, MeResponse, RegisterRequest, TokenResponse,
};
use crate::schemas::menu::MenuTreeResponse;
use crate::schemas::ApiResponse;
use crate::services::auth::{self, AuthError};
use crate::services::permissions;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/me", get(me))
        .route("/refresh", post(refresh))
        .route("/menus", get(menus))
        .route("/password", put(change_password))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let username = payload.username.trim();
    let security_settings = state.settings().security();
    let rate_key = format!("rl:login:{username}");
    let allowed = state
        .redis()
        .rate_limit(
            &rate_key,
            security_settings.login_rate_limit,
            security_settings.login_rate_window_seconds,
        )
        .await
        .unwrap_or(true);
    if !allowed {
        metrics::record_login("rate_limited");
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let account = match auth::authenticate(state.db(), username, &payload.password).await
    {
        Ok(account) => account,
        Err(AuthError::InvalidCredentials) => {
            metrics::record_login("invalid_credentials");
            return Err(ApiError::Unauthorized("Invalid username or password"));
        }
        Err(AuthError::AccountDisabled) => {
            metrics::record_login("disabled");
            return Err(ApiError::Forbidden("Account is disabled"));
        }
        Err(err) => return Err(ApiError::internal(err, "Failed to authenticate")),
    };

    if let Err(err) = state.redis().reset(&rate_key).await {
        tracing::warn!(error = %err, "Failed to reset login rate limit");
    }

    metrics::record_login("success");
    tracing::info!(account_id = %account.id, "Login succeeded");
    ok(token_response(&state, account).await?)
}

async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>), ApiError> {
    validate_payload(&payload)?;
    validate_password_len(&payload.password)?;

    let username = payload.username.trim();
    let existing = repositories::accounts::exists_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing account"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let password_hash = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let nickname = non_blank(payload.nickname).unwrap_or_else(|| username.to_string());
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;

    let account = repositories::accounts::create(
        &mut *tx,
        repositories::accounts::CreateAccount {
            id: &Uuid::new_v4().to_string(),
            username,
            password_hash,
            nickname: &nickname,
            email: payload.email.as_deref(),
            phone: payload.phone.as_deref(),
            status: AccountStatus::Active,
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

    let default_role = repositories::roles::find_by_code(&mut *tx, DEFAULT_ROLE_CODE)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load default role"))?;
    if let Some(role) = default_role {
        repositories::roles::assign_to_account(&mut *tx, &account.id, &role.id, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to assign default role"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit registration"))?;

    tracing::info!(account_id = %account.id, username = %account.username, "Account registered");
    let response = token_response(&state, account).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response))))
}

async fn me(identity: CurrentIdentity) -> ApiResult<MeResponse> {
    ok(MeResponse {
        account_id: identity.account_id,
        username: identity.username,
        roles: identity.roles,
        permissions: identity.permissions,
    })
}

/// Re-issues a token carrying the account's current grants.
async fn refresh(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> ApiResult<TokenResponse> {
    let account = repositories::accounts::find_by_id(state.db(), &identity.account_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load account"))?
        .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

    if account.status != AccountStatus::Active {
        return Err(ApiError::Forbidden("Account is disabled"));
    }

    ok(token_response(&state, account).await?)
}

async fn menus(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> ApiResult<Vec<MenuTreeResponse>> {
    let granted = identity.permissions.iter().cloned().collect();
    let tree = permissions::menus_for(state.db(), &identity.account_id, &granted)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load menus"))?;

    ok(tree.into_iter().map(MenuTreeResponse::from).collect())
}

async fn change_password(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> ApiResult<()> {
    validate_password_len(&payload.new_password)?;

    let account = repositories::accounts::find_by_id(state.db(), &identity.account_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load account"))?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    let verified = security::verify_password(&payload.current_password, &account.password_hash)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
    }

    let password_hash = security::hash_password(&payload.new_password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    repositories::accounts::update(
        state.db(),
        &account.id,
        repositories::accounts::UpdateAccount {
            nickname: None,
            email: None,
            phone: None,
            status: None,
            password_hash: Some(password_hash),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update password"))?;

    tracing::info!(account_id = %account.id, "Password changed");
    ok(())
}

async fn token_response(state: &AppState, account: Account) -> Result<TokenResponse, ApiError> {
    let issued = auth::issue_token(state.db(), state.settings(), &account)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to issue access token"))?;

    Ok(TokenResponse {
        access_token: issued.access_token,
        token_type: "bearer",
        expires_in: issued.expires_in,
        roles: issued.roles,
        permissions: issued.permissions,
        account: AccountResponse::from(account),
    })
}
