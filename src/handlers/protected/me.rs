use axum::Extension;

use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/me - Identity carried by the caller's token
pub async fn me_get(Extension(auth_user): Extension<AuthUser>) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(UserProfile {
        id: auth_user.user_id,
        email: auth_user.email,
        name: auth_user.name,
    }))
}
