use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentIdentity};
use crate::api::validation::{
    non_blank, require_text, require_text_if_present, validate_payload, ApiJson,
};
use crate::api::{ok, ApiResult};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::menu::{MenuCreate, MenuResponse, MenuUpdate};
use crate::schemas::ApiResponse;

pub(crate) const MANAGE_PERMISSION: &str = "menus:manage";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_menus).post(create_menu))
        .route("/:menu_id", patch(update_menu).delete(delete_menu))
}

/// Flat list of every live menu, ordered for display.
async fn list_menus(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> ApiResult<Vec<MenuResponse>> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let menus = repositories::menus::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list menus"))?;
    ok(menus.into_iter().map(MenuResponse::from).collect())
}

async fn create_menu(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(payload): ApiJson<MenuCreate>,
) -> Result<(StatusCode, Json<ApiResponse<MenuResponse>>), ApiError> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text("name", &payload.name)?;

    let parent_id = non_blank(payload.parent_id);
    if let Some(parent_id) = parent_id.as_deref() {
        ensure_parent_exists(&state, parent_id).await?;
    }
    let permission = non_blank(payload.permission);

    let menu = repositories::menus::create(
        state.db(),
        repositories::menus::CreateMenu {
            id: &Uuid::new_v4().to_string(),
            parent_id: parent_id.as_deref(),
            name: payload.name.trim(),
            path: &payload.path,
            icon: &payload.icon,
            component: &payload.component,
            order_num: payload.order_num,
            visible: payload.visible,
            kind: payload.kind,
            permission: permission.as_deref(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create menu"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        menu_id = %menu.id,
        action = "create_menu",
        "Menu created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(MenuResponse::from(menu)))))
}

async fn update_menu(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(menu_id): Path<String>,
    ApiJson(payload): ApiJson<MenuUpdate>,
) -> ApiResult<MenuResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text_if_present("name", payload.name.as_deref())?;

    if let Some(Some(parent_id)) = payload.parent_id.as_ref() {
        if parent_id == &menu_id {
            return Err(ApiError::BadRequest("A menu cannot be its own parent".to_string()));
        }
        ensure_parent_exists(&state, parent_id).await?;
    }

    let menu = repositories::menus::update(
        state.db(),
        &menu_id,
        repositories::menus::UpdateMenu {
            parent_id: payload.parent_id,
            name: payload.name.map(|name| name.trim().to_string()),
            path: payload.path,
            icon: payload.icon,
            component: payload.component,
            order_num: payload.order_num,
            visible: payload.visible,
            kind: payload.kind,
            permission: payload.permission,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update menu"))?
    .ok_or_else(|| ApiError::NotFound("Menu not found".to_string()))?;

    tracing::info!(
        actor_id = %identity.account_id,
        menu_id = %menu.id,
        action = "update_menu",
        "Menu updated"
    );
    ok(MenuResponse::from(menu))
}

async fn delete_menu(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(menu_id): Path<String>,
) -> ApiResult<()> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let deleted = repositories::menus::soft_delete(state.db(), &menu_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete menu"))?;
    if !deleted {
        return Err(ApiError::NotFound("Menu not found".to_string()));
    }

    tracing::info!(
        actor_id = %identity.account_id,
        menu_id = %menu_id,
        action = "delete_menu",
        "Menu deleted"
    );
    ok(())
}

async fn ensure_parent_exists(state: &AppState, parent_id: &str) -> Result<(), ApiError> {
    repositories::menus::find_by_id(state.db(), parent_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch parent menu"))?
        .map(|_| ())
        .ok_or_else(|| ApiError::BadRequest("Parent menu does not exist".to_string()))
}

#[cfg(test)]
mod tests;
