use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct UploadResponse {
    pub(crate) key: String,
    pub(crate) url: String,
    pub(crate) size: i64,
    pub(crate) sha256: String,
    pub(crate) file_type: String,
    pub(crate) content_type: String,
    pub(crate) filename: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PresignedUrlRequest {
    pub(crate) key: String,
    /// Seconds; defaults to the configured lifetime.
    #[serde(default)]
    pub(crate) expires_in: Option<u64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PresignedUrlResponse {
    pub(crate) url: String,
    pub(crate) expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteFileRequest {
    pub(crate) key: String,
}
