use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Storage key recorded when no blob backend is configured.
pub const NO_BLOB_SENTINEL: &str = "none";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub baby_id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub content_type: String,
    pub file_name: Option<String>,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn has_blob(&self) -> bool {
        self.storage_key != NO_BLOB_SENTINEL
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: Uuid,
    pub baby_id: Uuid,
    pub title: String,
    pub kind: String,
    pub storage_key: String,
    pub content_type: String,
    pub file_name: Option<String>,
    pub size_bytes: i64,
}
