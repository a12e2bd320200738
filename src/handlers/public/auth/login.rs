// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AccountService, Session};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login - Authenticate and receive a bearer token
///
/// Expected Input:
/// ```json
/// { "email": "demo@test.io", "password": "pw123456" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
///     "user": { "id": "user_uuid", "email": "demo@test.io", "name": "Demo" },
///     "expires_in": 86400
///   }
/// }
/// ```
///
/// Unknown email and wrong password both answer 401 with the same message.
pub async fn login_post(
    State(accounts): State<Arc<AccountService>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Session> {
    let Json(request) = body?;
    let session = accounts.login(&request.email, &request.password).await?;

    Ok(ApiResponse::success(session))
}
