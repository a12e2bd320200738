use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::Document;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::DocumentService;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuery {
    pub baby_id: Option<Uuid>,
}

/// GET /api/documents?babyId= - Documents of the caller's babies, newest first
pub async fn documents_get(
    State(documents): State<Arc<DocumentService>>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<DocumentQuery>, QueryRejection>,
) -> ApiResult<Vec<Document>> {
    let Query(query) = query?;
    let list = documents.list(auth_user.user_id, query.baby_id).await?;
    Ok(ApiResponse::success(list))
}

/// GET /api/documents/:id - Document metadata
pub async fn document_get(
    State(documents): State<Arc<DocumentService>>,
    Extension(auth_user): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Document> {
    let Path(id) = id?;
    let document = documents.get(auth_user.user_id, id).await?;
    Ok(ApiResponse::success(document))
}

/// GET /api/documents/:id/file - Stored bytes with their content type
pub async fn document_file_get(
    State(documents): State<Arc<DocumentService>>,
    Extension(auth_user): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let (document, blob) = documents.download(auth_user.user_id, id).await?;

    let file_name = document
        .file_name
        .as_deref()
        .map(attachment_name)
        .unwrap_or_else(|| document.id.to_string());

    Ok((
        [
            (header::CONTENT_TYPE, blob.content_type),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        blob.bytes,
    )
        .into_response())
}

/// DELETE /api/documents/:id - Remove the blob, then the row
pub async fn document_delete(
    State(documents): State<Arc<DocumentService>>,
    Extension(auth_user): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    documents.delete(auth_user.user_id, id).await?;
    Ok(ApiResponse::no_content())
}

/// Printable ASCII only, without quotes or backslashes.
fn attachment_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}
