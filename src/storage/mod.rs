//! Blob storage port for uploaded document bytes.

pub mod local;
pub mod memory;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

/// Prefix under which every document blob lives.
pub const DOCUMENT_KEY_ROOT: &str = "users/";

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("Blob backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), BlobError>;

    async fn get(&self, key: &str) -> Result<Option<Blob>, BlobError>;

    /// Removing a missing key succeeds, so an interrupted delete can be retried.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;

    /// Every stored key starting with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobError>;
}

/// Key for a document blob, namespaced so one user's or one baby's files
/// share a prefix.
pub fn document_key(user_id: Uuid, baby_id: Uuid, file_id: Uuid) -> String {
    format!("{DOCUMENT_KEY_ROOT}{user_id}/babies/{baby_id}/documents/{file_id}")
}

/// Keys are relative, `/`-separated, and made of plain path segments.
pub fn validate_key(key: &str) -> Result<(), BlobError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        });

    if valid {
        Ok(())
    } else {
        Err(BlobError::InvalidKey(key.to_string()))
    }
}
