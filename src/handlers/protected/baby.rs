use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;

use crate::database::models::{Baby, BabyPatch, DEFAULT_BABY_NAME};
use crate::database::NurseryStore;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::require_text;

/// GET /api/baby - The caller's baby, provisioned on first request
pub async fn baby_get(
    State(store): State<Arc<dyn NurseryStore>>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Baby> {
    let baby = store.baby_for_owner(auth_user.user_id, DEFAULT_BABY_NAME).await?;
    Ok(ApiResponse::success(baby))
}

/// PUT /api/baby - Update name, birth date or gender
///
/// Expected Input (all fields optional):
/// ```json
/// { "name": "Ada", "birthDate": "2026-03-14", "gender": "female" }
/// ```
pub async fn baby_put(
    State(store): State<Arc<dyn NurseryStore>>,
    Extension(auth_user): Extension<AuthUser>,
    body: Result<Json<BabyPatch>, JsonRejection>,
) -> ApiResult<Baby> {
    let Json(patch) = body?;
    if let Some(name) = &patch.name {
        require_text("name", name)?;
    }

    let owner = auth_user.user_id;
    store.baby_for_owner(owner, DEFAULT_BABY_NAME).await?;
    let baby = store
        .update_baby(owner, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Baby not found"))?;

    info!("User {} updated baby {}", owner, baby.id);
    Ok(ApiResponse::success(baby))
}
