pub(crate) mod auth;
pub(crate) mod course_records;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod exam_records;
pub(crate) mod exams;
pub(crate) mod files;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod import_export;
pub(crate) mod materials;
pub(crate) mod menus;
pub(crate) mod pagination;
pub(crate) mod permissions;
pub(crate) mod questions;
pub(crate) mod roles;
pub(crate) mod router;
pub(crate) mod topics;
pub(crate) mod users;
pub(crate) mod validation;

use axum::Json;

use crate::api::errors::ApiError;
use crate::schemas::ApiResponse;

pub(crate) type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}
