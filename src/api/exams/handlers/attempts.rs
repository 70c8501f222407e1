use axum::extract::{Path, State};

use crate::api::errors::ApiError;
use crate::api::exam_records::map_workflow_error;
use crate::api::exams::MANAGE_PERMISSION;
use crate::api::guards::{require_permission, CurrentIdentity};
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::validation::ApiQuery;
use crate::api::{ok, ApiResult};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::exam::{ExamRecordListQuery, ExamRecordResponse};
use crate::services::exam_workflow;

/// Opens an attempt, or returns the caller's attempt that is still open.
pub(in crate::api::exams) async fn start_exam(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(exam_id): Path<String>,
) -> ApiResult<ExamRecordResponse> {
    let record = exam_workflow::start_exam(state.db(), &identity.account_id, &exam_id)
        .await
        .map_err(map_workflow_error)?;

    ok(ExamRecordResponse::from(record))
}

pub(in crate::api::exams) async fn list_exam_records(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(exam_id): Path<String>,
    ApiQuery(params): ApiQuery<ExamRecordListQuery>,
) -> ApiResult<PaginatedResponse<ExamRecordResponse>> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let (records, total) =
        repositories::exam_records::list_for_exam(state.db(), &exam_id, page.offset(), page.limit())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list exam records"))?;

    ok(PaginatedResponse::new(
        records.into_iter().map(ExamRecordResponse::from).collect(),
        total,
        page,
    ))
}
