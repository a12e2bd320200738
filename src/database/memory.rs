//! In-process `NurseryStore` with the same ownership rules as `PgStore`.
//! Backs the router in tests and local tooling.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Baby, BabyPatch, Document, Event, EventPatch, NewDocument, NewEvent, NewUser, User};
use super::store::{DocumentRef, NurseryStore, StoreError};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    babies: HashMap<Uuid, Baby>,
    events: HashMap<Uuid, Event>,
    documents: HashMap<Uuid, Document>,
}

impl Tables {
    fn owns(&self, owner: Uuid, baby_id: Uuid) -> bool {
        self.babies.get(&baby_id).is_some_and(|b| b.user_id == owner)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_document_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `insert_document` fail, to exercise partial
    /// failures in the upload path.
    pub fn fail_document_inserts(&self, fail: bool) {
        self.fail_document_inserts.store(fail, Ordering::SeqCst);
    }

    pub async fn baby_count(&self) -> usize {
        self.tables.read().await.babies.len()
    }
}

#[async_trait]
impl NurseryStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email '{}' is already registered", user.email)));
        }

        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: Utc::now(),
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn baby_for_owner(&self, owner: Uuid, default_name: &str) -> Result<Baby, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(baby) = tables.babies.values().find(|b| b.user_id == owner) {
            return Ok(baby.clone());
        }

        let baby = Baby {
            id: Uuid::new_v4(),
            user_id: owner,
            name: default_name.to_string(),
            birth_date: None,
            gender: None,
            created_at: Utc::now(),
        };
        tables.babies.insert(baby.id, baby.clone());
        Ok(baby)
    }

    async fn update_baby(&self, owner: Uuid, patch: BabyPatch) -> Result<Option<Baby>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(baby) = tables.babies.values_mut().find(|b| b.user_id == owner) else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            baby.name = name;
        }
        if let Some(birth_date) = patch.birth_date {
            baby.birth_date = Some(birth_date);
        }
        if let Some(gender) = patch.gender {
            baby.gender = Some(gender);
        }
        Ok(Some(baby.clone()))
    }

    async fn owns_baby(&self, owner: Uuid, baby_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.owns(owner, baby_id))
    }

    async fn list_events(&self, owner: Uuid, baby_id: Option<Uuid>) -> Result<Vec<Event>, StoreError> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|e| tables.owns(owner, e.baby_id))
            .filter(|e| baby_id.map_or(true, |id| e.baby_id == id))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        Ok(events)
    }

    async fn create_event(&self, owner: Uuid, event: NewEvent) -> Result<Option<Event>, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.owns(owner, event.baby_id) {
            return Ok(None);
        }

        let row = Event {
            id: Uuid::new_v4(),
            baby_id: event.baby_id,
            kind: event.kind,
            title: event.title,
            details: event.details,
            scheduled_at: event.scheduled_at,
            duration_minutes: event.duration_minutes,
            frequency: event.frequency,
            completed: event.completed,
            created_at: Utc::now(),
        };
        tables.events.insert(row.id, row.clone());
        Ok(Some(row))
    }

    async fn update_event(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: EventPatch,
    ) -> Result<Option<Event>, StoreError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .events
            .get(&id)
            .is_some_and(|e| tables.owns(owner, e.baby_id));
        if !owned {
            return Ok(None);
        }
        let Some(event) = tables.events.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(kind) = patch.kind {
            event.kind = kind;
        }
        if let Some(title) = patch.title {
            event.title = title;
        }
        if let Some(details) = patch.details {
            event.details = Some(details);
        }
        if let Some(scheduled_at) = patch.scheduled_at {
            event.scheduled_at = scheduled_at;
        }
        if let Some(duration) = patch.duration_minutes {
            event.duration_minutes = Some(duration);
        }
        if let Some(frequency) = patch.frequency {
            event.frequency = Some(frequency);
        }
        if let Some(completed) = patch.completed {
            event.completed = completed;
        }
        Ok(Some(event.clone()))
    }

    async fn delete_event(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .events
            .get(&id)
            .is_some_and(|e| tables.owns(owner, e.baby_id));
        if owned {
            tables.events.remove(&id);
        }
        Ok(owned)
    }

    async fn list_documents(&self, owner: Uuid, baby_id: Option<Uuid>) -> Result<Vec<Document>, StoreError> {
        let tables = self.tables.read().await;
        let mut documents: Vec<Document> = tables
            .documents
            .values()
            .filter(|d| tables.owns(owner, d.baby_id))
            .filter(|d| baby_id.map_or(true, |id| d.baby_id == id))
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    async fn find_document(&self, owner: Uuid, id: Uuid) -> Result<Option<Document>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .documents
            .get(&id)
            .filter(|d| tables.owns(owner, d.baby_id))
            .cloned())
    }

    async fn insert_document(&self, owner: Uuid, document: NewDocument) -> Result<Option<Document>, StoreError> {
        if self.fail_document_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::QueryError("document insert rejected".to_string()));
        }

        let mut tables = self.tables.write().await;
        if !tables.owns(owner, document.baby_id) {
            return Ok(None);
        }

        let row = Document {
            id: document.id,
            baby_id: document.baby_id,
            title: document.title,
            kind: document.kind,
            storage_key: document.storage_key,
            content_type: document.content_type,
            file_name: document.file_name,
            size_bytes: document.size_bytes,
            created_at: Utc::now(),
        };
        tables.documents.insert(row.id, row.clone());
        Ok(Some(row))
    }

    async fn delete_document(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .documents
            .get(&id)
            .is_some_and(|d| tables.owns(owner, d.baby_id));
        if owned {
            tables.documents.remove(&id);
        }
        Ok(owned)
    }

    async fn document_refs(&self) -> Result<Vec<DocumentRef>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .documents
            .values()
            .map(|d| DocumentRef {
                id: d.id,
                storage_key: d.storage_key.clone(),
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
