use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, require_role, CurrentIdentity};
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::roles::MANAGE_PERMISSION;
use crate::api::validation::{
    non_blank, require_text, require_text_if_present, validate_payload, ApiJson, ApiQuery,
};
use crate::api::{ok, ApiResult};
use crate::core::bootstrap::ADMIN_ROLE_CODE;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::permission::{
    PermissionCreate, PermissionListQuery, PermissionResponse, PermissionUpdate,
};
use crate::schemas::ApiResponse;

/// Reads need `roles:manage`; catalog edits are reserved for the
/// administrator role.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_permissions).post(create_permission))
        .route("/:permission_id", patch(update_permission).delete(delete_permission))
}

async fn list_permissions(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<PermissionListQuery>,
) -> ApiResult<PaginatedResponse<PermissionResponse>> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let filter = repositories::permissions::PermissionFilter {
        name: non_blank(params.name),
        resource: non_blank(params.resource),
    };
    let (permissions, total) =
        repositories::permissions::list(state.db(), &filter, page.offset(), page.limit())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list permissions"))?;

    ok(PaginatedResponse::new(
        permissions.into_iter().map(PermissionResponse::from).collect(),
        total,
        page,
    ))
}

async fn create_permission(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(payload): ApiJson<PermissionCreate>,
) -> Result<(StatusCode, Json<ApiResponse<PermissionResponse>>), ApiError> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    require_role(&identity, ADMIN_ROLE_CODE)?;
    validate_payload(&payload)?;
    require_text("name", &payload.name)?;

    let name = payload.name.trim();
    let existing = repositories::permissions::exists_by_name(state.db(), name)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing permission"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Permission already exists".to_string()));
    }

    let (resource, action) = payload.resource_and_action();
    let permission = repositories::permissions::create(
        state.db(),
        repositories::permissions::CreatePermission {
            id: &Uuid::new_v4().to_string(),
            name,
            description: &payload.description,
            resource: &resource,
            action: &action,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict("Permission already exists".to_string())
        } else {
            ApiError::internal(e, "Failed to create permission")
        }
    })?;

    tracing::info!(
        actor_id = %identity.account_id,
        permission_id = %permission.id,
        action = "create_permission",
        "Permission created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(PermissionResponse::from(permission)))))
}

async fn update_permission(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(permission_id): Path<String>,
    ApiJson(payload): ApiJson<PermissionUpdate>,
) -> ApiResult<PermissionResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    require_role(&identity, ADMIN_ROLE_CODE)?;
    validate_payload(&payload)?;
    require_text_if_present("name", payload.name.as_deref())?;

    let name = payload.name.map(|name| name.trim().to_string());
    if let Some(name) = name.as_deref() {
        let existing = repositories::permissions::exists_by_name(state.db(), name)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check existing permission"))?;
        if existing.is_some_and(|id| id != permission_id) {
            return Err(ApiError::Conflict("Permission already exists".to_string()));
        }
    }

    let permission = repositories::permissions::update(
        state.db(),
        &permission_id,
        repositories::permissions::UpdatePermission {
            name,
            description: payload.description,
            resource: payload.resource,
            action: payload.action,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::Conflict("Permission already exists".to_string())
        } else {
            ApiError::internal(e, "Failed to update permission")
        }
    })?
    .ok_or_else(|| ApiError::NotFound("Permission not found".to_string()))?;

    tracing::info!(
        actor_id = %identity.account_id,
        permission_id = %permission.id,
        action = "update_permission",
        "Permission updated"
    );
    ok(PermissionResponse::from(permission))
}

async fn delete_permission(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(permission_id): Path<String>,
) -> ApiResult<()> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    require_role(&identity, ADMIN_ROLE_CODE)?;

    let deleted =
        repositories::permissions::soft_delete(state.db(), &permission_id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete permission"))?;
    if !deleted {
        return Err(ApiError::NotFound("Permission not found".to_string()));
    }

    tracing::info!(
        actor_id = %identity.account_id,
        permission_id = %permission_id,
        action = "delete_permission",
        "Permission deleted"
    );
    ok(())
}

#[cfg(test)]
mod tests;
