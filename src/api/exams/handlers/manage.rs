use axum::extract::{Path, State};

use crate::api::errors::ApiError;
use crate::api::exams::MANAGE_PERMISSION;
use crate::api::guards::{require_permission, CurrentIdentity};
use crate::api::validation::{require_text_if_present, validate_payload, ApiJson};
use crate::api::{ok, ApiResult};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::{ExamResponse, ExamUpdate};

pub(in crate::api::exams) async fn update_exam(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(exam_id): Path<String>,
    ApiJson(payload): ApiJson<ExamUpdate>,
) -> ApiResult<ExamResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text_if_present("title", payload.title.as_deref())?;

    let current = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;
    let total_score = payload.total_score.unwrap_or(current.total_score);
    let pass_score = payload.pass_score.unwrap_or(current.pass_score);
    if pass_score > total_score {
        return Err(ApiError::BadRequest("pass_score cannot exceed total_score".to_string()));
    }

    let exam = repositories::exams::update(
        state.db(),
        &exam_id,
        repositories::exams::UpdateExam {
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            total_score: payload.total_score,
            pass_score: payload.pass_score,
            time_limit: payload.time_limit,
            status: payload.status,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?
    .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    tracing::info!(
        actor_id = %identity.account_id,
        exam_id = %exam.id,
        action = "update_exam",
        "Exam updated"
    );
    ok(ExamResponse::from(exam))
}

pub(in crate::api::exams) async fn delete_exam(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(exam_id): Path<String>,
) -> ApiResult<()> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let deleted = repositories::exams::soft_delete(state.db(), &exam_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;
    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    tracing::info!(
        actor_id = %identity.account_id,
        exam_id = %exam_id,
        action = "delete_exam",
        "Exam deleted"
    );
    ok(())
}
