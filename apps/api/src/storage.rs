//! Document storage: where uploaded files live once accepted.
//!
//! `AppState` carries an `Arc<dyn DocumentStorage>`, picked at startup from
//! `STORAGE_BACKEND`: local disk (default) or an S3-compatible bucket.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),
}

#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError>;
    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
    fn backend_name(&self) -> &'static str;
}

/// Builds the storage key for a document: `<application_id>/<document_id>.<ext>`.
pub fn document_key(application_id: Uuid, document_id: Uuid, filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()));
    match ext {
        Some(ext) => format!("{application_id}/{document_id}.{ext}"),
        None => format!("{application_id}/{document_id}"),
    }
}

/// Rejects keys that could escape the storage root.
fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    let safe = Path::new(key)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if safe {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Local disk
// ────────────────────────────────────────────────────────────────────────────

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub async fn new(root: PathBuf) -> Result<Self, StorageError> {
        tokio::fs::create_dir_all(&root).await?;
        info!("Local document storage at {}", root.display());
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl DocumentStorage for LocalStorage {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// S3 / MinIO
// ────────────────────────────────────────────────────────────────────────────

pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl DocumentStorage for S3Storage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("upload failed: {e}")))?;
        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        validate_key(key)?;
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if not_found {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::S3(format!("download failed: {e}"))
                }
            })?;
        let data = object
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(format!("reading body failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("delete failed: {e}")))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_document_key_keeps_extension() {
        let app = Uuid::new_v4();
        let doc = Uuid::new_v4();
        assert_eq!(
            document_key(app, doc, "Payslip March.PDF"),
            format!("{app}/{doc}.pdf")
        );
    }

    #[test]
    fn test_document_key_drops_weird_extension() {
        let app = Uuid::new_v4();
        let doc = Uuid::new_v4();
        assert_eq!(document_key(app, doc, "scan"), format!("{app}/{doc}"));
        assert_eq!(
            document_key(app, doc, "x.p/../df"),
            format!("{app}/{doc}")
        );
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/path").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("app/doc.pdf").is_ok());
    }

    #[tokio::test]
    async fn test_local_put_get_delete() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path().to_path_buf()).await.unwrap();

        storage
            .put("app-1/doc-1.pdf", Bytes::from_static(b"%PDF-1.4"), "application/pdf")
            .await
            .unwrap();
        let data = storage.get("app-1/doc-1.pdf").await.unwrap();
        assert_eq!(&data[..], b"%PDF-1.4");

        storage.delete("app-1/doc-1.pdf").await.unwrap();
        assert!(matches!(
            storage.get("app-1/doc-1.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_local_delete_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path().to_path_buf()).await.unwrap();
        assert!(matches!(
            storage.delete("nope/nothing.png").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
