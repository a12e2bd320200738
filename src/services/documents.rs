//! Upload coordinator: document metadata in the relational store, bytes in
//! the blob store.
//!
//! Create: ownership check, blob put, metadata insert. A failed insert
//! deletes the blob it just wrote. Delete: ownership-joined lookup, blob
//! delete, row delete. Blob deletes are idempotent, so a delete interrupted
//! between the two steps can simply be retried.

use axum::body::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::database::models::{Document, NewDocument, NO_BLOB_SENTINEL};
use crate::database::{NurseryStore, StoreError};
use crate::storage::{document_key, Blob, BlobError, BlobStore};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("baby is not owned by the caller")]
    BabyNotOwned,

    /// A list filter named a baby the caller cannot see.
    #[error("baby not found")]
    UnknownBaby,

    #[error("document not found")]
    NotFound,

    #[error("document has no stored file")]
    NoFile,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Blob(#[from] BlobError),
}

/// A validated multipart submission.
#[derive(Debug, Clone)]
pub struct Upload {
    pub baby_id: Uuid,
    pub title: String,
    pub kind: String,
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

pub struct DocumentService {
    store: Arc<dyn NurseryStore>,
    blobs: Option<Arc<dyn BlobStore>>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn NurseryStore>, blobs: Option<Arc<dyn BlobStore>>) -> Self {
        Self { store, blobs }
    }

    pub async fn create(&self, owner: Uuid, upload: Upload) -> Result<Document, DocumentError> {
        // Nothing may be written for a baby the caller does not own.
        if !self.store.owns_baby(owner, upload.baby_id).await? {
            warn!("User {} tried to upload for baby {} they do not own", owner, upload.baby_id);
            return Err(DocumentError::BabyNotOwned);
        }

        let file_id = Uuid::new_v4();
        let storage_key = match &self.blobs {
            Some(blobs) => {
                let key = document_key(owner, upload.baby_id, file_id);
                blobs.put(&key, upload.bytes.clone(), &upload.content_type).await?;
                key
            }
            None => {
                debug!("No blob backend configured; keeping metadata only");
                NO_BLOB_SENTINEL.to_string()
            }
        };

        let record = NewDocument {
            id: file_id,
            baby_id: upload.baby_id,
            title: upload.title,
            kind: upload.kind,
            storage_key: storage_key.clone(),
            content_type: upload.content_type,
            file_name: upload.file_name,
            size_bytes: upload.bytes.len() as i64,
        };

        match self.store.insert_document(owner, record).await {
            Ok(Some(document)) => {
                info!("Stored document {} for baby {}", document.id, document.baby_id);
                Ok(document)
            }
            Ok(None) => {
                // Ownership changed between the check and the insert.
                self.discard_blob(&storage_key).await;
                Err(DocumentError::BabyNotOwned)
            }
            Err(e) => {
                self.discard_blob(&storage_key).await;
                Err(e.into())
            }
        }
    }

    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), DocumentError> {
        let document = self
            .store
            .find_document(owner, id)
            .await?
            .ok_or(DocumentError::NotFound)?;

        if document.has_blob() {
            match &self.blobs {
                Some(blobs) => blobs.delete(&document.storage_key).await?,
                None => warn!(
                    "Document {} references blob {} but no blob backend is configured",
                    document.id, document.storage_key
                ),
            }
        }

        if !self.store.delete_document(owner, id).await? {
            return Err(DocumentError::NotFound);
        }
        info!("Deleted document {}", id);
        Ok(())
    }

    pub async fn get(&self, owner: Uuid, id: Uuid) -> Result<Document, DocumentError> {
        self.store
            .find_document(owner, id)
            .await?
            .ok_or(DocumentError::NotFound)
    }

    pub async fn list(&self, owner: Uuid, baby_id: Option<Uuid>) -> Result<Vec<Document>, DocumentError> {
        if let Some(baby_id) = baby_id {
            if !self.store.owns_baby(owner, baby_id).await? {
                return Err(DocumentError::UnknownBaby);
            }
        }
        Ok(self.store.list_documents(owner, baby_id).await?)
    }

    /// Metadata plus bytes of an owned document.
    pub async fn download(&self, owner: Uuid, id: Uuid) -> Result<(Document, Blob), DocumentError> {
        let document = self.get(owner, id).await?;
        let (true, Some(blobs)) = (document.has_blob(), &self.blobs) else {
            return Err(DocumentError::NoFile);
        };

        match blobs.get(&document.storage_key).await? {
            Some(blob) => Ok((document, blob)),
            None => {
                warn!("Document {} points at missing blob {}", document.id, document.storage_key);
                Err(DocumentError::NoFile)
            }
        }
    }

    async fn discard_blob(&self, key: &str) {
        let Some(blobs) = &self.blobs else { return };
        if key == NO_BLOB_SENTINEL {
            return;
        }
        if let Err(e) = blobs.delete(key).await {
            // Left for the reconciliation sweep.
            error!("Failed to remove orphaned blob {}: {}", key, e);
        }
    }
}
