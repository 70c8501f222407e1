use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection}, Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentIdentity};
use crate::api::validation::ApiJson;
use crate::api::{ok, ApiResult};
use crate::core::state::AppState;
use crate::schemas::file::{
    DeleteFileRequest, PresignedUrlRequest, PresignedUrlResponse, UploadResponse,
};
use crate::schemas::ApiResponse;
use crate::services::storage::StorageError;

pub(crate) const DELETE_PERMISSION: &str = "files:delete";

const DEFAULT_FILE_TYPE: &str = "file";
/// Upper bound for caller-requested presigned URL lifetimes (7 days).
const MAX_PRESIGN_SECONDS: u64 = 7 * 24 * 3600;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_file))
        .route("/presigned-url", post(presigned_url))
        .route("/delete", post(delete_file))
}

/// A multipart `file` part read fully into memory.
pub(crate) struct UploadedFile {
    pub(crate) filename: String,
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

/// Reads the `file` part plus every other text part of a multipart form.
/// Files larger than `max_bytes` are rejected while streaming.
pub(crate) async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    max_bytes: usize,
) -> Result<(Option<UploadedFile>, HashMap<String, String>), ApiError> {
    let mut multipart =
        multipart.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let mut file = None;
    let mut fields = HashMap::new();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type =
                field.content_type().unwrap_or("application/octet-stream").to_string();
            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                if bytes.len() + chunk.len() > max_bytes {
                    return Err(ApiError::BadRequest(format!(
                        "File size exceeds {}MB limit",
                        max_bytes / (1024 * 1024)
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }
            file = Some(UploadedFile { filename, content_type, bytes });
        } else if !name.is_empty() {
            let text = field.text().await.map_err(multipart_error)?;
            fields.insert(name, text);
        }
    }

    Ok((file, fields))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Request body is too large".to_string())
    } else {
        ApiError::BadRequest("Invalid multipart data".to_string())
    }
}

pub(crate) fn sanitized_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect();
    let sanitized = sanitized.trim_start_matches('.');

    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized.to_string()
    }
}

/// Lowercase slug used as the first key segment.
fn normalized_file_type(raw: Option<&str>) -> String {
    let slug: String = raw
        .unwrap_or(DEFAULT_FILE_TYPE)
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if slug.is_empty() {
        DEFAULT_FILE_TYPE.to_string()
    } else {
        slug
    }
}

fn object_key(file_type: &str, filename: &str, now: OffsetDateTime) -> String {
    format!(
        "{file_type}/{:04}/{:02}/{}_{}",
        now.year(),
        u8::from(now.month()),
        Uuid::new_v4(),
        sanitized_filename(filename)
    )
}

fn map_storage_error(err: StorageError, context: &str) -> ApiError {
    match err {
        StorageError::InvalidKey(key) => ApiError::BadRequest(format!("Invalid file key: {key}")),
        StorageError::NotFound(key) => ApiError::NotFound(format!("File not found: {key}")),
        other => ApiError::internal(other, context),
    }
}

async fn upload_file(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UploadResponse>>), ApiError> {
    let max_bytes = state.settings().storage().max_upload_bytes();
    let (file, fields) = read_form(multipart, max_bytes).await?;
    let file = file.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    if file.bytes.is_empty() {
        return Err(ApiError::BadRequest("File is empty".to_string()));
    }

    let file_type = normalized_file_type(fields.get("file_type").map(String::as_str));
    let key = object_key(&file_type, &file.filename, OffsetDateTime::now_utc());

    let stored = state
        .storage()
        .upload(&key, file.bytes, &file.content_type)
        .await
        .map_err(|e| map_storage_error(e, "Failed to store file"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        key = %stored.key,
        size = stored.size,
        action = "upload_file",
        "File uploaded"
    );

    let response = UploadResponse {
        key: stored.key,
        url: stored.url,
        size: stored.size,
        sha256: stored.sha256,
        file_type,
        content_type: file.content_type,
        filename: file.filename,
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response))))
}

async fn presigned_url(
    State(state): State<AppState>,
    _identity: CurrentIdentity,
    ApiJson(payload): ApiJson<PresignedUrlRequest>,
) -> ApiResult<PresignedUrlResponse> {
    let expires_in = payload
        .expires_in
        .filter(|seconds| *seconds > 0)
        .unwrap_or(state.settings().storage().presigned_url_expire_seconds)
        .min(MAX_PRESIGN_SECONDS);

    let url = state
        .storage()
        .presigned_url(payload.key.trim(), Duration::from_secs(expires_in))
        .await
        .map_err(|e| map_storage_error(e, "Failed to generate presigned URL"))?;

    ok(PresignedUrlResponse { url, expires_in })
}

async fn delete_file(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    ApiJson(payload): ApiJson<DeleteFileRequest>,
) -> ApiResult<()> {
    require_permission(&identity, DELETE_PERMISSION)?;

    let key = payload.key.trim();
    state.storage().delete(key).await.map_err(|e| map_storage_error(e, "Failed to delete file"))?;

    tracing::info!(
        actor_id = %identity.account_id,
        key,
        action = "delete_file",
        "File deleted"
    );
    ok(())
}
