use axum::extract::{Path, State};

use crate::api::errors::ApiError;
use crate::api::exams::MANAGE_PERMISSION;
use crate::api::guards::CurrentIdentity;
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::validation::{non_blank, ApiQuery};
use crate::api::{ok, ApiResult};
use crate::core::state::AppState;
use crate::db::types::ContentStatus;
use crate::repositories;
use crate::schemas::exam::{ExamDetailResponse, ExamListQuery, ExamResponse};
use crate::schemas::question::QuestionResponse;

/// Managers see every exam; everyone else only published ones.
pub(in crate::api::exams) async fn list_exams(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<ExamListQuery>,
) -> ApiResult<PaginatedResponse<ExamResponse>> {
    let status = if identity.has_permission(MANAGE_PERMISSION) {
        params.status
    } else {
        Some(ContentStatus::Published)
    };

    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let filter = repositories::exams::ExamFilter { keyword: non_blank(params.keyword), status };
    let (exams, total) = repositories::exams::list(state.db(), &filter, page.offset(), page.limit())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    ok(PaginatedResponse::new(exams.into_iter().map(ExamResponse::from).collect(), total, page))
}

/// Correct answers are only included for managers.
pub(in crate::api::exams) async fn get_exam(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(exam_id): Path<String>,
) -> ApiResult<ExamDetailResponse> {
    let manager = identity.has_permission(MANAGE_PERMISSION);

    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .filter(|exam| manager || exam.status == ContentStatus::Published)
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let questions = repositories::questions::list_for_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;

    ok(ExamDetailResponse {
        exam: ExamResponse::from(exam),
        questions: questions
            .into_iter()
            .map(|question| QuestionResponse::from_model(question, manager))
            .collect(),
    })
}
