// handlers/protected/documents/upload.rs - POST /api/documents handler

use axum::{
    body::Bytes,
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, State,
    },
    Extension,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::database::models::Document;
use crate::error::ApiError;
use crate::handlers::protected::require_text;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{DocumentService, Upload};

const DEFAULT_DOCUMENT_TYPE: &str = "other";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Default)]
struct UploadForm {
    file: Option<(Option<String>, Option<String>, Bytes)>,
    baby_id: Option<String>,
    title: Option<String>,
    kind: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match name.as_str() {
                "file" => form.file = Some(read_file(field).await?),
                "babyId" => form.baby_id = Some(field.text().await?),
                "title" => form.title = Some(field.text().await?),
                "type" => form.kind = Some(field.text().await?),
                other => debug!("Ignoring multipart field {}", other),
            }
        }

        Ok(form)
    }

    fn into_upload(self) -> Result<Upload, ApiError> {
        let (file_name, content_type, bytes) = self
            .file
            .ok_or_else(|| ApiError::field_error("file", "is required"))?;

        let baby_id = self
            .baby_id
            .as_deref()
            .map(str::trim)
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| ApiError::field_error("babyId", "must be a valid UUID"))?;

        let title = self.title.unwrap_or_default();
        require_text("title", &title)?;

        let kind = self
            .kind
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string());

        Ok(Upload {
            baby_id,
            title: title.trim().to_string(),
            kind,
            file_name,
            content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            bytes,
        })
    }
}

async fn read_file(field: Field<'_>) -> Result<(Option<String>, Option<String>, Bytes), ApiError> {
    let file_name = field.file_name().map(str::to_owned);
    let content_type = field.content_type().map(str::to_owned);
    let bytes = field.bytes().await?;
    Ok((file_name, content_type, bytes))
}

/// POST /api/documents - Upload a document for an owned baby
///
/// Multipart fields: `file` (required), `babyId` (required), `title`
/// (required), `type` (defaults to "other"). A baby the caller does not own
/// is 403 and nothing is stored.
pub async fn document_post(
    State(documents): State<Arc<DocumentService>>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Document> {
    let upload = UploadForm::read(multipart?).await?.into_upload()?;
    let document = documents.create(auth_user.user_id, upload).await?;

    Ok(ApiResponse::created(document))
}
