use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::exams::MANAGE_PERMISSION;
use crate::api::guards::{require_permission, CurrentIdentity};
use crate::api::validation::{require_text, validate_payload, ApiJson};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::ContentStatus;
use crate::repositories;
use crate::schemas::exam::{ExamCreate, ExamResponse};
use crate::schemas::ApiResponse;

pub(in crate::api::exams) async fn create_exam(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(payload): ApiJson<ExamCreate>,
) -> Result<(StatusCode, Json<ApiResponse<ExamResponse>>), ApiError> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text("title", &payload.title)?;
    if payload.pass_score > payload.total_score {
        return Err(ApiError::BadRequest("pass_score cannot exceed total_score".to_string()));
    }

    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            description: &payload.description,
            total_score: payload.total_score,
            pass_score: payload.pass_score,
            time_limit: payload.time_limit,
            status: payload.status.unwrap_or(ContentStatus::Draft),
            created_by: &identity.account_id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        exam_id = %exam.id,
        action = "create_exam",
        "Exam created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(ExamResponse::from(exam)))))
}
