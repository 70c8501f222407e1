use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::{CREATE_PERMISSION, DELETE_PERMISSION, UPDATE_PERMISSION};
use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentIdentity};
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::validation::{
    non_blank, require_text, require_text_if_present, validate_payload, ApiJson, ApiQuery,
};
use crate::api::{ok, ApiResult};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::material::{
    MaterialCreate, MaterialListQuery, MaterialResponse, MaterialUpdate,
};
use crate::schemas::ApiResponse;

pub(super) async fn list_materials(
    State(state): State<AppState>,
    _identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<MaterialListQuery>,
) -> ApiResult<PaginatedResponse<MaterialResponse>> {
    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let filter = repositories::materials::MaterialFilter {
        keyword: non_blank(params.keyword),
        material_type: params.material_type,
        status: params.status,
    };
    let (materials, total) =
        repositories::materials::list(state.db(), &filter, page.offset(), page.limit())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list materials"))?;

    ok(PaginatedResponse::new(
        materials.into_iter().map(MaterialResponse::from).collect(),
        total,
        page,
    ))
}

pub(super) async fn get_material(
    State(state): State<AppState>,
    _identity: CurrentIdentity,
    Path(material_id): Path<String>,
) -> ApiResult<MaterialResponse> {
    let material = repositories::materials::find_by_id(state.db(), &material_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch material"))?
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))?;

    ok(MaterialResponse::from(material))
}

pub(super) async fn create_material(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(payload): ApiJson<MaterialCreate>,
) -> Result<(StatusCode, Json<ApiResponse<MaterialResponse>>), ApiError> {
    require_permission(&identity, CREATE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text("title", &payload.title)?;

    let material = repositories::materials::create(
        state.db(),
        repositories::materials::CreateMaterial {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            description: &payload.description,
            material_type: payload.material_type,
            content: &payload.content,
            file_url: payload.file_url.as_deref(),
            file_size: payload.file_size,
            cover_url: payload.cover_url.as_deref(),
            order_num: payload.order_num,
            status: payload.status,
            created_by: &identity.account_id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create material"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        material_id = %material.id,
        action = "create_material",
        "Material created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(MaterialResponse::from(material)))))
}

pub(super) async fn update_material(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(material_id): Path<String>,
    ApiJson(payload): ApiJson<MaterialUpdate>,
) -> ApiResult<MaterialResponse> {
    require_permission(&identity, UPDATE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text_if_present("title", payload.title.as_deref())?;

    let material = repositories::materials::update(
        state.db(),
        &material_id,
        repositories::materials::UpdateMaterial {
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            material_type: payload.material_type,
            content: payload.content,
            file_url: payload.file_url,
            file_size: payload.file_size,
            cover_url: payload.cover_url,
            order_num: payload.order_num,
            status: payload.status,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update material"))?
    .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))?;

    tracing::info!(
        actor_id = %identity.account_id,
        material_id = %material.id,
        action = "update_material",
        "Material updated"
    );
    ok(MaterialResponse::from(material))
}

pub(super) async fn delete_material(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(material_id): Path<String>,
) -> ApiResult<()> {
    require_permission(&identity, DELETE_PERMISSION)?;

    let deleted =
        repositories::materials::soft_delete(state.db(), &material_id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete material"))?;
    if !deleted {
        return Err(ApiError::NotFound("Material not found".to_string()));
    }

    tracing::info!(
        actor_id = %identity.account_id,
        material_id = %material_id,
        action = "delete_material",
        "Material deleted"
    );
    ok(())
}
