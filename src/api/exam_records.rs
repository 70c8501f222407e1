use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentIdentity;
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::validation::{ApiJson, ApiQuery};
use crate::api::{ok, ApiResult};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::exam::{ExamRecordListQuery, ExamRecordResponse, SubmitExamRequest};
use crate::services::exam_workflow::{self, WorkflowError};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(list_my_records))
        .route("/:record_id/submit", post(submit_record))
}

async fn list_my_records(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<ExamRecordListQuery>,
) -> ApiResult<PaginatedResponse<ExamRecordResponse>> {
    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let (records, total) = repositories::exam_records::list_for_account(
        state.db(),
        &identity.account_id,
        page.offset(),
        page.limit(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list exam records"))?;

    ok(PaginatedResponse::new(
        records.into_iter().map(ExamRecordResponse::from).collect(),
        total,
        page,
    ))
}

async fn submit_record(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(record_id): Path<String>,
    ApiJson(payload): ApiJson<SubmitExamRequest>,
) -> ApiResult<ExamRecordResponse> {
    let record =
        exam_workflow::submit_exam(state.db(), &identity.account_id, &record_id, payload.answers)
            .await
            .map_err(map_workflow_error)?;

    ok(ExamRecordResponse::from(record))
}

pub(crate) fn map_workflow_error(err: WorkflowError) -> ApiError {
    match err {
        WorkflowError::ExamNotFound | WorkflowError::RecordNotFound => {
            ApiError::NotFound(err.to_string())
        }
        WorkflowError::ExamNotPublished | WorkflowError::NotInProgress(_) => {
            ApiError::InvalidState(err.to_string())
        }
        WorkflowError::Database(e) => ApiError::internal(e, "Exam workflow failed"),
    }
}
