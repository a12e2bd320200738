//! `NurseryStore` over Postgres.
//!
//! Ownership is part of every predicate: event and document rows are only
//! reachable through `babies.user_id = $owner`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::DatabaseManager;
use super::models::{Baby, BabyPatch, Document, Event, EventPatch, NewDocument, NewEvent, NewUser, User};
use super::store::{DocumentRef, NurseryStore, StoreError};

const UNIQUE_VIOLATION: &str = "23505";

const BABY_COLUMNS: &str = "id, user_id, name, birth_date, gender, created_at";

const EVENT_COLUMNS: &str = "e.id, e.baby_id, e.kind, e.title, e.details, e.scheduled_at, \
     e.duration_minutes, e.frequency, e.completed, e.created_at";

const DOCUMENT_COLUMNS: &str = "d.id, d.baby_id, d.title, d.kind, d.storage_key, d.content_type, \
     d.file_name, d.size_bytes, d.created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[async_trait]
impl NurseryStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = r#"
            INSERT INTO users (id, email, password_hash, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, name, created_at
        "#;

        sqlx::query_as::<_, User>(sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(format!("email '{}' is already registered", user.email))
                } else {
                    e.into()
                }
            })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = "SELECT id, email, password_hash, name, created_at FROM users WHERE email = $1";

        Ok(sqlx::query_as::<_, User>(sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn baby_for_owner(&self, owner: Uuid, default_name: &str) -> Result<Baby, StoreError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let sql = format!(
            "INSERT INTO babies (id, user_id, name) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {BABY_COLUMNS}"
        );

        Ok(sqlx::query_as::<_, Baby>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner)
            .bind(default_name)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_baby(&self, owner: Uuid, patch: BabyPatch) -> Result<Option<Baby>, StoreError> {
        let sql = format!(
            "UPDATE babies SET \
                name = COALESCE($2, name), \
                birth_date = COALESCE($3, birth_date), \
                gender = COALESCE($4, gender) \
             WHERE user_id = $1 \
             RETURNING {BABY_COLUMNS}"
        );

        Ok(sqlx::query_as::<_, Baby>(&sql)
            .bind(owner)
            .bind(patch.name)
            .bind(patch.birth_date)
            .bind(patch.gender)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn owns_baby(&self, owner: Uuid, baby_id: Uuid) -> Result<bool, StoreError> {
        let (owned,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM babies WHERE id = $1 AND user_id = $2)")
                .bind(baby_id)
                .bind(owner)
                .fetch_one(&self.pool)
                .await?;
        Ok(owned)
    }

    async fn list_events(&self, owner: Uuid, baby_id: Option<Uuid>) -> Result<Vec<Event>, StoreError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events e \
             JOIN babies b ON b.id = e.baby_id \
             WHERE b.user_id = $1 AND ($2::uuid IS NULL OR e.baby_id = $2) \
             ORDER BY e.scheduled_at DESC"
        );

        Ok(sqlx::query_as::<_, Event>(&sql)
            .bind(owner)
            .bind(baby_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_event(&self, owner: Uuid, event: NewEvent) -> Result<Option<Event>, StoreError> {
        // Inserts nothing unless the target baby belongs to the owner.
        let sql = "INSERT INTO events (id, baby_id, kind, title, details, scheduled_at, \
                                 duration_minutes, frequency, completed) \
             SELECT $1, b.id, $4, $5, $6, $7, $8, $9, $10 \
             FROM babies b WHERE b.id = $2 AND b.user_id = $3 \
             RETURNING id, baby_id, kind, title, details, scheduled_at, \
                       duration_minutes, frequency, completed, created_at";

        Ok(sqlx::query_as::<_, Event>(sql)
            .bind(Uuid::new_v4())
            .bind(event.baby_id)
            .bind(owner)
            .bind(event.kind.as_str())
            .bind(&event.title)
            .bind(&event.details)
            .bind(event.scheduled_at)
            .bind(event.duration_minutes)
            .bind(&event.frequency)
            .bind(event.completed)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_event(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: EventPatch,
    ) -> Result<Option<Event>, StoreError> {
        let sql = format!(
            "UPDATE events AS e SET \
                kind = COALESCE($3, e.kind), \
                title = COALESCE($4, e.title), \
                details = COALESCE($5, e.details), \
                scheduled_at = COALESCE($6, e.scheduled_at), \
                duration_minutes = COALESCE($7, e.duration_minutes), \
                frequency = COALESCE($8, e.frequency), \
                completed = COALESCE($9, e.completed) \
             FROM babies AS b \
             WHERE e.id = $1 AND e.baby_id = b.id AND b.user_id = $2 \
             RETURNING {EVENT_COLUMNS}"
        );

        Ok(sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(owner)
            .bind(patch.kind.map(|k| k.as_str()))
            .bind(patch.title)
            .bind(patch.details)
            .bind(patch.scheduled_at)
            .bind(patch.duration_minutes)
            .bind(patch.frequency)
            .bind(patch.completed)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_event(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM events AS e USING babies AS b \
             WHERE e.id = $1 AND e.baby_id = b.id AND b.user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_documents(&self, owner: Uuid, baby_id: Option<Uuid>) -> Result<Vec<Document>, StoreError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents d \
             JOIN babies b ON b.id = d.baby_id \
             WHERE b.user_id = $1 AND ($2::uuid IS NULL OR d.baby_id = $2) \
             ORDER BY d.created_at DESC"
        );

        Ok(sqlx::query_as::<_, Document>(&sql)
            .bind(owner)
            .bind(baby_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_document(&self, owner: Uuid, id: Uuid) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents d \
             JOIN babies b ON b.id = d.baby_id \
             WHERE d.id = $1 AND b.user_id = $2"
        );

        Ok(sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_document(&self, owner: Uuid, document: NewDocument) -> Result<Option<Document>, StoreError> {
        let sql = "INSERT INTO documents (id, baby_id, title, kind, storage_key, content_type, \
                                    file_name, size_bytes) \
             SELECT $1, b.id, $4, $5, $6, $7, $8, $9 \
             FROM babies b WHERE b.id = $2 AND b.user_id = $3 \
             RETURNING id, baby_id, title, kind, storage_key, content_type, \
                       file_name, size_bytes, created_at";

        Ok(sqlx::query_as::<_, Document>(sql)
            .bind(document.id)
            .bind(document.baby_id)
            .bind(owner)
            .bind(&document.title)
            .bind(&document.kind)
            .bind(&document.storage_key)
            .bind(&document.content_type)
            .bind(&document.file_name)
            .bind(document.size_bytes)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_document(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM documents AS d USING babies AS b \
             WHERE d.id = $1 AND d.baby_id = b.id AND b.user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn document_refs(&self) -> Result<Vec<DocumentRef>, StoreError> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, storage_key FROM documents")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, storage_key)| DocumentRef { id, storage_key })
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
