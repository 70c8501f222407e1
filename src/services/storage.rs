use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::core::config::{Settings, StorageProvider};

#[derive(Debug, thiserror::Error)]
pub(crate) enum StorageError {
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("object store request failed: {0}")]
    Remote(String),
}

#[derive(Debug, Clone)]
pub(crate) struct StoredObject {
    pub(crate) key: String,
    pub(crate) url: String,
    pub(crate) size: i64,
    pub(crate) sha256: String,
}

/// Object store used for uploaded files. Local disk and S3-compatible
/// backends are interchangeable behind this trait.
#[async_trait]
pub(crate) trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn presigned_url(&self, key: &str, expires_in: Duration)
        -> Result<String, StorageError>;
}

pub(crate) async fn build_storage(settings: &Settings) -> anyhow::Result<Arc<dyn ObjectStorage>> {
    let storage: Arc<dyn ObjectStorage> = match settings.storage().provider {
        StorageProvider::Local => Arc::new(LocalStorage::new(
            &settings.storage().local_dir,
            &settings.storage().local_base_url,
        )),
        StorageProvider::S3 => Arc::new(S3Storage::from_settings(settings).await?),
    };
    Ok(storage)
}

/// Rejects absolute keys and any `..` segment.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let trimmed = key.trim();
    if trimmed.is_empty() || trimmed.starts_with('/') || trimmed.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    let safe = Path::new(trimmed).components().all(|component| matches!(component, Component::Normal(_)));
    if !safe {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Clone)]
pub(crate) struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub(crate) fn new(root: &str, base_url: &str) -> Self {
        Self { root: PathBuf::from(root), base_url: base_url.trim_end_matches('/').to_string() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key.trim()))
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim())
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let size = bytes.len() as i64;
        let sha256 = digest_hex(&bytes);
        tokio::fs::write(&path, bytes).await?;

        Ok(StoredObject { key: key.trim().to_string(), url: self.url_for(key), size, sha256 })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn presigned_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        validate_key(key)?;
        let expires_at = OffsetDateTime::now_utc().unix_timestamp() + expires_in.as_secs() as i64;
        Ok(format!("{}?expires={expires_at}", self.url_for(key)))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct S3Storage {
    client: Client,
    bucket: String,
    endpoint: String,
}

impl S3Storage {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let s3 = settings.s3();
        if s3.access_key.is_empty() || s3.secret_key.is_empty() {
            anyhow::bail!("STORAGE_PROVIDER=s3 requires S3_ACCESS_KEY and S3_SECRET_KEY");
        }

        let creds = Credentials::new(
            s3.access_key.clone(),
            s3.secret_key.clone(),
            None,
            None,
            "learnhub-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(s3.endpoint.clone())
            .region(aws_config::Region::new(s3.region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        Ok(Self {
            client: Client::new(&config),
            bucket: s3.bucket.clone(),
            endpoint: s3.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        let size = bytes.len() as i64;
        let sha256 = digest_hex(&bytes);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| StorageError::Remote(err.to_string()))?;

        Ok(StoredObject {
            key: key.to_string(),
            url: format!("{}/{}/{key}", self.endpoint, self.bucket),
            size,
            sha256,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StorageError::Remote(err.to_string()))?;
        Ok(())
    }

    async fn presigned_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        validate_key(key)?;
        let config = PresigningConfig::expires_in(expires_in)
            .map_err(|err| StorageError::Remote(err.to_string()))?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|err| StorageError::Remote(err.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_parent_segments_are_rejected() {
        assert!(validate_key("materials/2025/file.pdf").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/../../b").is_err());
        assert!(validate_key("/absolute").is_err());
        assert!(validate_key("  ").is_err());
    }

    #[tokio::test]
    async fn local_storage_writes_and_deletes_files() {
        let root = std::env::temp_dir().join(format!("learnhub-storage-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(root.to_str().expect("utf8 path"), "http://files.local/");

        let stored = storage
            .upload("docs/readme.txt", b"hello".to_vec(), "text/plain")
            .await
            .expect("upload");
        assert_eq!(stored.size, 5);
        assert_eq!(stored.url, "http://files.local/docs/readme.txt");
        assert_eq!(
            stored.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert!(root.join("docs/readme.txt").exists());

        let url = storage
            .presigned_url("docs/readme.txt", Duration::from_secs(60))
            .await
            .expect("presign");
        assert!(url.starts_with("http://files.local/docs/readme.txt?expires="));

        storage.delete("docs/readme.txt").await.expect("delete");
        assert!(!root.join("docs/readme.txt").exists());
        assert!(matches!(
            storage.delete("docs/readme.txt").await,
            Err(StorageError::NotFound(_))
        ));

        let _ = std::fs::remove_dir_all(root);
    }
}
