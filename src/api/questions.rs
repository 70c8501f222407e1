use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
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
use crate::repositories;
use crate::schemas::question::{
    QuestionCreate, QuestionListQuery, QuestionResponse, QuestionUpdate,
};
use crate::schemas::ApiResponse;

pub(crate) const MANAGE_PERMISSION: &str = "questions:manage";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route(
            "/:question_id",
            get(get_question).patch(update_question).delete(delete_question),
        )
}

async fn list_questions(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<QuestionListQuery>,
) -> ApiResult<PaginatedResponse<QuestionResponse>> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let page = pagination::normalize(params.page, params.page_size, state.settings().pagination());
    let filter = repositories::questions::QuestionFilter {
        exam_id: non_blank(params.exam_id),
        question_type: params.question_type,
        keyword: non_blank(params.keyword),
    };
    let (questions, total) =
        repositories::questions::list(state.db(), &filter, page.offset(), page.limit())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    ok(PaginatedResponse::new(
        questions.into_iter().map(QuestionResponse::from).collect(),
        total,
        page,
    ))
}

async fn get_question(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(question_id): Path<String>,
) -> ApiResult<QuestionResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    ok(QuestionResponse::from(question))
}

async fn create_question(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(payload): ApiJson<QuestionCreate>,
) -> Result<(StatusCode, Json<ApiResponse<QuestionResponse>>), ApiError> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text("content", &payload.content)?;
    require_text("answer", &payload.answer)?;
    ensure_options_array(&payload.options)?;

    let exam_id = non_blank(payload.exam_id);
    if let Some(exam_id) = exam_id.as_deref() {
        ensure_exam_exists(&state, exam_id).await?;
    }

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            exam_id: exam_id.as_deref(),
            question_type: payload.question_type,
            content: &payload.content,
            options: payload.options,
            answer: &payload.answer,
            explanation: &payload.explanation,
            score: payload.score,
            order_num: payload.order_num,
            created_by: &identity.account_id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        question_id = %question.id,
        action = "create_question",
        "Question created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(QuestionResponse::from(question)))))
}

async fn update_question(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(question_id): Path<String>,
    ApiJson(payload): ApiJson<QuestionUpdate>,
) -> ApiResult<QuestionResponse> {
    require_permission(&identity, MANAGE_PERMISSION)?;
    validate_payload(&payload)?;
    require_text_if_present("content", payload.content.as_deref())?;
    require_text_if_present("answer", payload.answer.as_deref())?;
    if let Some(options) = payload.options.as_ref() {
        ensure_options_array(options)?;
    }
    if let Some(Some(exam_id)) = payload.exam_id.as_ref() {
        ensure_exam_exists(&state, exam_id).await?;
    }

    let question = repositories::questions::update(
        state.db(),
        &question_id,
        repositories::questions::UpdateQuestion {
            exam_id: payload.exam_id,
            question_type: payload.question_type,
            content: payload.content,
            options: payload.options,
            answer: payload.answer,
            explanation: payload.explanation,
            score: payload.score,
            order_num: payload.order_num,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?
    .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    tracing::info!(
        actor_id = %identity.account_id,
        question_id = %question.id,
        action = "update_question",
        "Question updated"
    );
    ok(QuestionResponse::from(question))
}

async fn delete_question(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(question_id): Path<String>,
) -> ApiResult<()> {
    require_permission(&identity, MANAGE_PERMISSION)?;

    let deleted =
        repositories::questions::soft_delete(state.db(), &question_id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    tracing::info!(
        actor_id = %identity.account_id,
        question_id = %question_id,
        action = "delete_question",
        "Question deleted"
    );
    ok(())
}

fn ensure_options_array(options: &serde_json::Value) -> Result<(), ApiError> {
    if options.is_array() {
        Ok(())
    } else {
        Err(ApiError::BadRequest("options must be a JSON array".to_string()))
    }
}

pub(crate) async fn ensure_exam_exists(state: &AppState, exam_id: &str) -> Result<(), ApiError> {
    repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .map(|_| ())
        .ok_or_else(|| ApiError::BadRequest("Exam does not exist".to_string()))
}

#[cfg(test)]
mod tests;
