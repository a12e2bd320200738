//! Relational storage port.
//!
//! Every method that touches a baby-owned row takes the authenticated owner
//! id and applies it inside the query itself. A row that exists but belongs
//! to someone else is indistinguishable from a missing row.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{Baby, BabyPatch, Document, Event, EventPatch, NewDocument, NewEvent, NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Document id and blob key, as seen by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub id: Uuid,
    pub storage_key: String,
}

#[async_trait]
pub trait NurseryStore: Send + Sync {
    /// Insert a user. A taken email is `StoreError::Conflict`.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Atomic get-or-create of the owner's single baby.
    async fn baby_for_owner(&self, owner: Uuid, default_name: &str) -> Result<Baby, StoreError>;

    /// Update the owner's baby. `None` when the owner has no baby yet.
    async fn update_baby(&self, owner: Uuid, patch: BabyPatch) -> Result<Option<Baby>, StoreError>;

    async fn owns_baby(&self, owner: Uuid, baby_id: Uuid) -> Result<bool, StoreError>;

    /// Events of the owner's babies, newest scheduled first.
    async fn list_events(&self, owner: Uuid, baby_id: Option<Uuid>) -> Result<Vec<Event>, StoreError>;

    /// `None` when `event.baby_id` is not owned by `owner`.
    async fn create_event(&self, owner: Uuid, event: NewEvent) -> Result<Option<Event>, StoreError>;

    async fn update_event(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: EventPatch,
    ) -> Result<Option<Event>, StoreError>;

    /// `false` when nothing owned by `owner` matched.
    async fn delete_event(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError>;

    async fn list_documents(&self, owner: Uuid, baby_id: Option<Uuid>) -> Result<Vec<Document>, StoreError>;

    async fn find_document(&self, owner: Uuid, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// `None` when `document.baby_id` is not owned by `owner`.
    async fn insert_document(&self, owner: Uuid, document: NewDocument) -> Result<Option<Document>, StoreError>;

    async fn delete_document(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError>;

    /// Every document row with a blob key. Unscoped; operator tooling only.
    async fn document_refs(&self) -> Result<Vec<DocumentRef>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
