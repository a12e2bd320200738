use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::database::models::{Event, EventPatch, NewEvent};
use crate::database::NurseryStore;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::require_text;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    pub baby_id: Option<Uuid>,
}

/// GET /api/events?babyId= - Events of the caller's babies, newest scheduled first
pub async fn events_get(
    State(store): State<Arc<dyn NurseryStore>>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<EventQuery>, QueryRejection>,
) -> ApiResult<Vec<Event>> {
    let Query(query) = query?;
    let owner = auth_user.user_id;

    if let Some(baby_id) = query.baby_id {
        if !store.owns_baby(owner, baby_id).await? {
            warn!("User {} listed events of baby {} they do not own", owner, baby_id);
            return Err(ApiError::not_found("Baby not found"));
        }
    }

    let events = store.list_events(owner, query.baby_id).await?;
    Ok(ApiResponse::success(events))
}

/// POST /api/events - Create an event for an owned baby
///
/// Expected Input:
/// ```json
/// {
///   "babyId": "baby_uuid",
///   "type": "appointment",
///   "title": "Two month checkup",
///   "details": "Bring vaccination card",
///   "scheduledAt": "2026-05-02T09:30:00Z",
///   "durationMinutes": 30
/// }
/// ```
pub async fn events_post(
    State(store): State<Arc<dyn NurseryStore>>,
    Extension(auth_user): Extension<AuthUser>,
    body: Result<Json<NewEvent>, JsonRejection>,
) -> ApiResult<Event> {
    let Json(event) = body?;
    require_text("title", &event.title)?;

    let baby_id = event.baby_id;
    let event = store
        .create_event(auth_user.user_id, event)
        .await?
        .ok_or_else(|| {
            warn!("User {} tried to add an event to baby {}", auth_user.user_id, baby_id);
            ApiError::not_found("Baby not found")
        })?;

    Ok(ApiResponse::created(event))
}

/// PUT /api/events/:id - Partial update of an owned event
pub async fn event_put(
    State(store): State<Arc<dyn NurseryStore>>,
    Extension(auth_user): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<EventPatch>, JsonRejection>,
) -> ApiResult<Event> {
    let Path(id) = id?;
    let Json(patch) = body?;
    if let Some(title) = &patch.title {
        require_text("title", title)?;
    }

    let event = store
        .update_event(auth_user.user_id, id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    Ok(ApiResponse::success(event))
}

/// DELETE /api/events/:id
pub async fn event_delete(
    State(store): State<Arc<dyn NurseryStore>>,
    Extension(auth_user): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    if !store.delete_event(auth_user.user_id, id).await? {
        return Err(ApiError::not_found("Event not found"));
    }
    Ok(ApiResponse::no_content())
}
