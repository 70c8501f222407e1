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
    non_blank, require_text, require_text_if_present, unique_ids, validate_payload, ApiJson, ApiQuery,
};
use crate::api::{ok, ApiResult};
use crate::core::bootstrap::ADMIN_ROLE_CODE;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Role;
use crate::db::types::RoleStatus;
use crate::repositories;
use crate::schemas::role::{
    AssignMenusRequest, AssignPermissionsRequest, RoleCreate, RoleDetailResponse, RoleListQuery,
    RoleResponse, RoleUpdate,
};
use crate::schemas::ApiResponse;

pub(crate) const MANAGE_PERMISSION: &str = "roles:manage";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:role_id", get(get_role).patch(update_role).delete(delete_role))
        .route("/:role_id/permissions", put(assign_permissions))
        .route("/:role_id/menus", put(assign_menus))
}

async fn list_roles(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<RoleListQuery>,
) -> ApiResult<PaginatedResponse<RoleResponse>> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let filter = repositories::roles::RoleFilter {
        keyword: non_blank(params.keyword),
        status: params.status,
    };
    let (roles, total) = repositories::roles::list(state.db(), &filter, page.offset(), page.limit())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list roles"))?;

    ok(PaginatedResponse::new(roles.into_iter().map(RoleResponse::from).collect(), total, page))
}

async fn create_role(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(payload): ApiJson<RoleCreate>,
) -> Result<(StatusCode, Json<ApiResponse<RoleResponse>>), ApiError> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text("code", &payload.code)?;
    require_text("name", &payload.name)?;

    let code = payload.code.trim();
    let existing = repositories::roles::find_by_code(state.db(), code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing role"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Role code already exists".to_string()));
    }

    let role = repositories::roles::create(
        state.db(),
        repositories::roles::CreateRole {
            id: &Uuid::new_v4().to_string(),
            code,
            name: payload.name.trim(),
            description: &payload.description,
            status: payload.status.unwrap_or(RoleStatus::Enabled),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict("Role code already exists".to_string())
        } else {
            ApiError::internal(e, "Failed to create role")
        }
    })?;

    tracing::info!(
        actor_id = %identity.account_id,
        role_id = %role.id,
        action = "create_role",
        "Role created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(RoleResponse::from(role)))))
}

async fn get_role(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(role_id): Path<String>,
) -> ApiResult<RoleDetailResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let role = fetch_role(&state, &role_id).await?;
    ok(role_detail(&state, role).await?)
}

async fn update_role(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(role_id): Path<String>,
    ApiJson(payload): ApiJson<RoleUpdate>,
) -> ApiResult<RoleResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text_if_present("name", payload.name.as_deref())?;

    let role = repositories::roles::update(
        state.db(),
        &role_id,
        repositories::roles::UpdateRole {
            name: payload.name.map(|name| name.trim().to_string()),
            description: payload.description,
            status: payload.status,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update role"))?
    .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))?;

    tracing::info!(
        actor_id = %identity.account_id,
        role_id = %role.id,
        action = "update_role",
        "Role updated"
    );
    ok(RoleResponse::from(role))
}

async fn delete_role(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(role_id): Path<String>,
) -> ApiResult<()> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let role = fetch_role(&state, &role_id).await?;
    if role.code == ADMIN_ROLE_CODE {
        return Err(ApiError::BadRequest("The administrator role cannot be deleted".to_string()));
    }

    let deleted = repositories::roles::soft_delete(state.db(), &role_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete role"))?;
    if !deleted {
        return Err(ApiError::NotFound("Role not found".to_string()));
    }

    tracing::info!(
        actor_id = %identity.account_id,
        role_id = %role_id,
        action = "delete_role",
        "Role deleted"
    );
    ok(())
}

async fn assign_permissions(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(role_id): Path<String>,
    ApiJson(payload): ApiJson<AssignPermissionsRequest>,
) -> ApiResult<RoleDetailResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    let permission_ids = unique_ids(payload.permission_ids);

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;

    let role = repositories::roles::find_by_id(&mut *tx, &role_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch role"))?
        .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))?;

    let live = repositories::permissions::count_live(&mut *tx, &permission_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to validate permissions"))?;
    if live != permission_ids.len() as i64 {
        return Err(ApiError::BadRequest("One or more permissions do not exist".to_string()));
    }

    repositories::roles::replace_permissions(&mut tx, &role.id, &permission_ids, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assign permissions"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit permissions"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        role_id = %role.id,
        permission_count = permission_ids.len(),
        action = "assign_permissions",
        "Role permissions replaced"
    );
    ok(role_detail(&state, role).await?)
}

async fn assign_menus(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(role_id): Path<String>,
    ApiJson(payload): ApiJson<AssignMenusRequest>,
) -> ApiResult<RoleDetailResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    let menu_ids = unique_ids(payload.menu_ids);

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;

    let role = repositories::roles::find_by_id(&mut *tx, &role_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch role"))?
        .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))?;

    let live = repositories::menus::count_live(&mut *tx, &menu_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to validate menus"))?;
    if live != menu_ids.len() as i64 {
        return Err(ApiError::BadRequest("One or more menus do not exist".to_string()));
    }

    repositories::roles::replace_menus(&mut tx, &role.id, &menu_ids, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assign menus"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit menus"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        role_id = %role.id,
        menu_count = menu_ids.len(),
        action = "assign_menus",
        "Role menus replaced"
    );
    ok(role_detail(&state, role).await?)
}

async fn fetch_role(state: &AppState, role_id: &str) -> Result<Role, ApiError> {
    repositories::roles::find_by_id(state.db(), role_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch role"))?
        .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))
}

async fn role_detail(state: &AppState, role: Role) -> Result<RoleDetailResponse, ApiError> {
    let permission_ids = repositories::roles::permission_ids(state.db(), &role.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load role permissions"))?;
    let menu_ids = repositories::roles::menu_ids(state.db(), &role.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load role menus"))?;

    Ok(RoleDetailResponse { role: RoleResponse::from(role), permission_ids, menu_ids })
}

#[cfg(test)]
mod tests;
