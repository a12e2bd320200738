use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::database::NurseryStore;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
}

/// GET /health - Liveness plus a relational store ping
pub async fn health_get(State(store): State<Arc<dyn NurseryStore>>) -> ApiResult<Health> {
    store.health_check().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable("database unavailable")
    })?;

    Ok(ApiResponse::success(Health {
        status: "ok",
        timestamp: Utc::now(),
        database: "ok",
    }))
}
