use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentIdentity};
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::validation::{non_blank, ApiJson, ApiQuery};
use crate::api::{ok, ApiResult};
use crate::core::state::AppState;
use crate::db::types::ContentStatus;
use crate::repositories;
use crate::schemas::course::{CourseListQuery, CourseResponse, LearnCourseResponse};
use crate::schemas::course_record::{
    CourseRecordListQuery, CourseRecordResponse, MyCourseRecordQuery, ProgressRequest,
};
use crate::services::progress::{self, ProgressError, ProgressSummary};

pub(crate) const VIEW_PERMISSION: &str = "progress:view";

/// Learner-facing course catalogue and progress writes, mounted at `/learn`.
pub(crate) fn learn_router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_published_courses))
        .route("/courses/:course_id", get(get_published_course))
        .route("/courses/:course_id/progress", post(record_progress))
        .route("/courses/:course_id/complete", post(complete_course))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_records))
        .route("/mine", get(list_my_records))
        .route("/summary", get(my_summary))
}

async fn list_published_courses(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<CourseListQuery>,
) -> ApiResult<PaginatedResponse<LearnCourseResponse>> {
    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let filter = repositories::courses::CourseFilter {
        keyword: non_blank(params.keyword),
        status: Some(ContentStatus::Published),
        content_type: params.content_type,
    };
    let (courses, total) =
        repositories::courses::list(state.db(), &filter, page.offset(), page.limit())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    let course_ids: Vec<String> = courses.iter().map(|course| course.id.clone()).collect();
    let mut records: HashMap<String, CourseRecordResponse> =
        repositories::course_records::find_for_account_courses(
            state.db(),
            &identity.account_id,
            &course_ids,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course records"))?
        .into_iter()
        .map(|record| (record.course_id.clone(), CourseRecordResponse::from(record)))
        .collect();

    let items = courses
        .into_iter()
        .map(|course| {
            let record = records.remove(&course.id);
            LearnCourseResponse { course: CourseResponse::from(course), record }
        })
        .collect();

    ok(PaginatedResponse::new(items, total, page))
}

async fn get_published_course(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(course_id): Path<String>,
) -> ApiResult<LearnCourseResponse> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .filter(|course| course.status == ContentStatus::Published)
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let record =
        repositories::course_records::find_for_account(state.db(), &identity.account_id, &course.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load course record"))?;

    ok(LearnCourseResponse {
        course: CourseResponse::from(course),
        record: record.map(CourseRecordResponse::from),
    })
}

async fn record_progress(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(course_id): Path<String>,
    ApiJson(payload): ApiJson<ProgressRequest>,
) -> ApiResult<CourseRecordResponse> {
    let record = progress::record_progress(
        state.db(),
        &identity.account_id,
        &course_id,
        payload.progress,
        payload.duration,
    )
    .await
    .map_err(map_progress_error)?;

    ok(CourseRecordResponse::from(record))
}

async fn complete_course(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(course_id): Path<String>,
) -> ApiResult<CourseRecordResponse> {
    let record = progress::complete_course(state.db(), &identity.account_id, &course_id)
        .await
        .map_err(map_progress_error)?;

    ok(CourseRecordResponse::from(record))
}

async fn list_records(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<CourseRecordListQuery>,
) -> ApiResult<PaginatedResponse<CourseRecordResponse>> {
    require_permission(&identity, VIEW_PERMISSION)?;

    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let filter = repositories::course_records::CourseRecordFilter {
        account_id: non_blank(params.account_id),
        course_id: non_blank(params.course_id),
        is_completed: params.is_completed,
    };
    list_page(&state, &filter, page).await
}

async fn list_my_records(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<MyCourseRecordQuery>,
) -> ApiResult<PaginatedResponse<CourseRecordResponse>> {
    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let filter = repositories::course_records::CourseRecordFilter {
        account_id: Some(identity.account_id),
        course_id: None,
        is_completed: params.is_completed,
    };
    list_page(&state, &filter, page).await
}

async fn my_summary(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> ApiResult<ProgressSummary> {
    let summary = progress::summary(state.db(), &identity.account_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to summarize progress"))?;
    ok(summary)
}

async fn list_page(
    state: &AppState,
    filter: &repositories::course_records::CourseRecordFilter,
    page: pagination::Page,
) -> ApiResult<PaginatedResponse<CourseRecordResponse>> {
    let (records, total) =
        repositories::course_records::list(state.db(), filter, page.offset(), page.limit())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list course records"))?;

    ok(PaginatedResponse::new(
        records.into_iter().map(CourseRecordResponse::from).collect(),
        total,
        page,
    ))
}

fn map_progress_error(err: ProgressError) -> ApiError {
    match err {
        ProgressError::OutOfRange => ApiError::BadRequest(err.to_string()),
        ProgressError::CourseNotFound => ApiError::NotFound(err.to_string()),
        ProgressError::Database(e) => ApiError::internal(e, "Failed to record progress"),
    }
}

#[cfg(test)]
mod tests;
