// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AccountService, Session};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// POST /api/auth/register - Create an account and sign it in
///
/// Expected Input:
/// ```json
/// { "email": "demo@test.io", "password": "pw123456", "name": "Demo" }
/// ```
///
/// Responds 201 with the same body as login. A taken email is 409.
pub async fn register_post(
    State(accounts): State<Arc<AccountService>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Session> {
    let Json(request) = body?;
    let session = accounts
        .register(&request.email, &request.password, request.name.as_deref())
        .await?;

    Ok(ApiResponse::created(session))
}
