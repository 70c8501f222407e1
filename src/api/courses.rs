use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentIdentity};
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::validation::{
    non_blank, require_text, require_text_if_present, validate_payload, ApiJson, ApiQuery,
};
use crate::api::{ok, ApiResult};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Course;
use crate::db::types::ContentStatus;
use crate::repositories;
use crate::schemas::course::{
    content_matches_type, CourseCreate, CourseListQuery, CourseResponse, CourseUpdate,
};
use crate::schemas::ApiResponse;

pub(crate) const MANAGE_PERMISSION: &str = "courses:manage";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/:course_id", get(get_course).patch(update_course).delete(delete_course))
        .route("/:course_id/publish", post(publish_course))
        .route("/:course_id/unpublish", post(unpublish_course))
}

async fn list_courses(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<CourseListQuery>,
) -> ApiResult<PaginatedResponse<CourseResponse>> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let filter = repositories::courses::CourseFilter {
        keyword: non_blank(params.keyword),
        status: params.status,
        content_type: params.content_type,
    };
    let (courses, total) =
        repositories::courses::list(state.db(), &filter, page.offset(), page.limit())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    ok(PaginatedResponse::new(courses.into_iter().map(CourseResponse::from).collect(), total, page))
}

async fn get_course(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(course_id): Path<String>,
) -> ApiResult<CourseResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    ok(CourseResponse::from(fetch_course(&state, &course_id).await?))
}

async fn create_course(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(payload): ApiJson<CourseCreate>,
) -> Result<(StatusCode, Json<ApiResponse<CourseResponse>>), ApiError> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text("title", &payload.title)?;
    content_matches_type(
        payload.content_type,
        payload.video_url.as_deref(),
        payload.text_content.as_deref(),
    )
    .map_err(|message| ApiError::BadRequest(message.to_string()))?;

    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            description: &payload.description,
            cover_image: payload.cover_image.as_deref(),
            content_type: payload.content_type,
            video_url: payload.video_url.as_deref(),
            text_content: payload.text_content.as_deref(),
            duration: payload.duration,
            status: ContentStatus::Draft,
            sort_order: payload.sort_order,
            created_by: &identity.account_id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        course_id = %course.id,
        action = "create_course",
        "Course created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(CourseResponse::from(course)))))
}

async fn update_course(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(course_id): Path<String>,
    ApiJson(payload): ApiJson<CourseUpdate>,
) -> ApiResult<CourseResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text_if_present("title", payload.title.as_deref())?;

    // Content rules apply to the merged row, not just the patch.
    let current = fetch_course(&state, &course_id).await?;
    let merged_video = match &payload.video_url {
        Some(value) => value.as_deref(),
        None => current.video_url.as_deref(),
    };
    let merged_text = match &payload.text_content {
        Some(value) => value.as_deref(),
        None => current.text_content.as_deref(),
    };
    content_matches_type(
        payload.content_type.unwrap_or(current.content_type),
        merged_video,
        merged_text,
    )
    .map_err(|message| ApiError::BadRequest(message.to_string()))?;

    let course = repositories::courses::update(
        state.db(),
        &course_id,
        repositories::courses::UpdateCourse {
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            cover_image: payload.cover_image,
            content_type: payload.content_type,
            video_url: payload.video_url,
            text_content: payload.text_content,
            duration: payload.duration,
            status: None,
            sort_order: payload.sort_order,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update course"))?
    .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    tracing::info!(
        actor_id = %identity.account_id,
        course_id = %course.id,
        action = "update_course",
        "Course updated"
    );
    ok(CourseResponse::from(course))
}

async fn delete_course(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(course_id): Path<String>,
) -> ApiResult<()> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let deleted = repositories::courses::soft_delete(state.db(), &course_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete course"))?;
    if !deleted {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    tracing::info!(
        actor_id = %identity.account_id,
        course_id = %course_id,
        action = "delete_course",
        "Course deleted"
    );
    ok(())
}

async fn publish_course(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(course_id): Path<String>,
) -> ApiResult<CourseResponse> {
    set_status(&state, &identity, &course_id, ContentStatus::Published).await
}

async fn unpublish_course(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(course_id): Path<String>,
) -> ApiResult<CourseResponse> {
    set_status(&state, &identity, &course_id, ContentStatus::Draft).await
}

async fn set_status(
    state: &AppState,
    identity: &CurrentIdentity,
    course_id: &str,
    status: ContentStatus,
) -> ApiResult<CourseResponse> {
    require_permission(identity, MANAGE_PERMISSION)?;

    let course =
        repositories::courses::set_status(state.db(), course_id, status, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to change course status"))?
            .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    tracing::info!(
        actor_id = %identity.account_id,
        course_id = %course.id,
        status = ?course.status,
        action = "set_course_status",
        "Course status changed"
    );
    ok(CourseResponse::from(course))
}

async fn fetch_course(state: &AppState, course_id: &str) -> Result<Course, ApiError> {
    repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

#[cfg(test)]
mod tests;
