use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::api::errors::ApiError;
use crate::api::files::{read_form, UploadedFile};
use crate::api::guards::{require_permission, CurrentIdentity};
use crate::api::questions::ensure_exam_exists;
use crate::api::validation::{non_blank, ApiQuery};
use crate::api::{course_records, ok, questions, users, ApiResult};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::import_export::ExamScoresQuery;
use crate::services::import_export::{self, ImportError, ImportReport};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/questions", post(import_questions))
        .route("/users", post(import_users))
        .route("/exam-scores", get(export_exam_scores))
}

fn map_import_error(err: ImportError) -> ApiError {
    match err {
        ImportError::Empty => ApiError::BadRequest("No data rows found".to_string()),
        ImportError::Csv(err) => ApiError::BadRequest(format!("Invalid spreadsheet: {err}")),
        ImportError::Database(err) => ApiError::internal(err, "Import failed"),
    }
}

fn required_file(file: Option<UploadedFile>) -> Result<UploadedFile, ApiError> {
    file.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))
}

async fn import_questions(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ImportReport> {
    require_permission(&identity, questions::MANAGE_PERMISSION)?;

    let (file, mut fields) =
        read_form(multipart, state.settings().storage().max_upload_bytes()).await?;
    let file = required_file(file)?;
    let exam_id = non_blank(fields.remove("exam_id"));
    if let Some(exam_id) = exam_id.as_deref() {
        ensure_exam_exists(&state, exam_id).await?;
    }

    let report = import_export::import_questions(
        state.db(),
        exam_id.as_deref(),
        &identity.account_id,
        &file.bytes,
    )
    .await
    .map_err(map_import_error)?;

    tracing::info!(
        actor_id = %identity.account_id,
        exam_id = exam_id.as_deref().unwrap_or("-"),
        succeeded = report.success_count,
        failed = report.failure_count,
        action = "import_questions",
        "Questions imported"
    );
    ok(report)
}

async fn import_users(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ImportReport> {
    require_permission(&identity, users::MANAGE_PERMISSION)?;

    let (file, mut fields) =
        read_form(multipart, state.settings().storage().max_upload_bytes()).await?;
    let file = required_file(file)?;
    let role_id = non_blank(fields.remove("role_id"));
    if let Some(role_id) = role_id.as_deref() {
        repositories::roles::find_by_id(state.db(), role_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch role"))?
            .ok_or_else(|| ApiError::BadRequest("Role does not exist".to_string()))?;
    }

    let report = import_export::import_accounts(state.db(), role_id.as_deref(), &file.bytes)
        .await
        .map_err(map_import_error)?;

    tracing::info!(
        actor_id = %identity.account_id,
        succeeded = report.success_count,
        failed = report.failure_count,
        action = "import_accounts",
        "Accounts imported"
    );
    ok(report)
}

async fn export_exam_scores(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiQuery(params): ApiQuery<ExamScoresQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_permission(&identity, course_records::VIEW_PERMISSION)?;

    let exam = repositories::exams::find_by_id(state.db(), &params.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let rows = repositories::exam_records::score_rows_for_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam records"))?;
    let body = import_export::render_scores_csv(&rows)
        .map_err(|e| ApiError::internal(e, "Failed to render scores"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        exam_id = %exam.id,
        rows = rows.len(),
        action = "export_exam_scores",
        "Exam scores exported"
    );

    let disposition = format!("attachment; filename=\"exam_{}_scores.csv\"", exam.id);
    Ok((
        [(CONTENT_TYPE, "text/csv; charset=utf-8".to_string()), (CONTENT_DISPOSITION, disposition)],
        body,
    ))
}
