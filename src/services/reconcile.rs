//! Cross-store consistency sweep between document rows and stored blobs.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::NO_BLOB_SENTINEL;
use crate::database::{NurseryStore, StoreError};
use crate::storage::{BlobError, BlobStore, DOCUMENT_KEY_ROOT};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Blob(#[from] BlobError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Blob keys no document row points at.
    pub orphaned_blobs: Vec<String>,
    /// Documents whose blob is gone.
    pub dangling_documents: Vec<Uuid>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_blobs.is_empty() && self.dangling_documents.is_empty()
    }
}

pub struct Reconciler {
    store: Arc<dyn NurseryStore>,
    blobs: Arc<dyn BlobStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn NurseryStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    pub async fn scan(&self) -> Result<ReconcileReport, ReconcileError> {
        let rows = self.store.document_refs().await?;
        let stored: HashSet<String> = self.blobs.list(DOCUMENT_KEY_ROOT).await?.into_iter().collect();
        let referenced: HashSet<&str> = rows.iter().map(|r| r.storage_key.as_str()).collect();

        let mut orphaned_blobs: Vec<String> = stored
            .iter()
            .filter(|key| !referenced.contains(key.as_str()))
            .cloned()
            .collect();
        orphaned_blobs.sort();

        let mut dangling_documents: Vec<Uuid> = rows
            .iter()
            .filter(|r| r.storage_key != NO_BLOB_SENTINEL && !stored.contains(&r.storage_key))
            .map(|r| r.id)
            .collect();
        dangling_documents.sort();

        let report = ReconcileReport {
            orphaned_blobs,
            dangling_documents,
        };
        if !report.is_clean() {
            warn!(
                "Reconciliation found {} orphaned blobs and {} dangling documents",
                report.orphaned_blobs.len(),
                report.dangling_documents.len()
            );
        }
        Ok(report)
    }

    /// Delete the orphaned blobs listed in `report`. Returns how many were removed.
    pub async fn remove_orphans(&self, report: &ReconcileReport) -> Result<usize, ReconcileError> {
        for key in &report.orphaned_blobs {
            self.blobs.delete(key).await?;
        }
        info!("Removed {} orphaned blobs", report.orphaned_blobs.len());
        Ok(report.orphaned_blobs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewDocument, NewUser};
    use crate::database::MemoryStore;
    use crate::storage::{document_key, MemoryBlobStore};
    use axum::body::Bytes;

    async fn document(store: &MemoryStore, owner: Uuid, baby: Uuid, storage_key: String) -> Uuid {
        let id = Uuid::new_v4();
        store
            .insert_document(
                owner,
                NewDocument {
                    id,
                    baby_id: baby,
                    title: "Scan".into(),
                    kind: "medical".into(),
                    storage_key,
                    content_type: "image/png".into(),
                    file_name: None,
                    size_bytes: 4,
                },
            )
            .await
            .unwrap()
            .unwrap();
        id
    }

    #[tokio::test]
    async fn finds_orphans_and_dangling_rows() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let owner = store
            .create_user(NewUser {
                email: "a@test.io".into(),
                password_hash: "s:k".into(),
                name: "A".into(),
            })
            .await
            .unwrap()
            .id;
        let baby = store.baby_for_owner(owner, "Baby").await.unwrap().id;

        let kept = document_key(owner, baby, Uuid::new_v4());
        let orphan = document_key(owner, baby, Uuid::new_v4());
        let missing = document_key(owner, baby, Uuid::new_v4());
        for key in [&kept, &orphan] {
            blobs.put(key, Bytes::from_static(b"data"), "image/png").await.unwrap();
        }
        document(&store, owner, baby, kept.clone()).await;
        let dangling = document(&store, owner, baby, missing).await;
        document(&store, owner, baby, NO_BLOB_SENTINEL.to_string()).await;

        let reconciler = Reconciler::new(store.clone(), blobs.clone());
        let report = reconciler.scan().await.unwrap();
        assert_eq!(report.orphaned_blobs, vec![orphan.clone()]);
        assert_eq!(report.dangling_documents, vec![dangling]);

        assert_eq!(reconciler.remove_orphans(&report).await.unwrap(), 1);
        assert!(!blobs.contains(&orphan).await);
        assert!(blobs.contains(&kept).await);
    }

    #[tokio::test]
    async fn empty_stores_are_clean() {
        let reconciler = Reconciler::new(Arc::new(MemoryStore::new()), Arc::new(MemoryBlobStore::new()));
        assert!(reconciler.scan().await.unwrap().is_clean());
    }
}
