//! Shared application state handed to every handler.

use axum::extract::FromRef;
use chrono::Duration;
use std::sync::Arc;
use tracing::warn;

use crate::auth::{PasswordHasher, TokenService};
use crate::config::{AppConfig, DEFAULT_TOKEN_EXPIRY_HOURS};
use crate::database::NurseryStore;
use crate::services::{AccountService, DocumentService};
use crate::storage::BlobStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn NurseryStore>,
    pub tokens: Arc<TokenService>,
    pub accounts: Arc<AccountService>,
    pub documents: Arc<DocumentService>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn NurseryStore>,
        blobs: Option<Arc<dyn BlobStore>>,
        hasher: PasswordHasher,
    ) -> Self {
        // `AppConfig::validate` rejects these at startup; in-process callers may skip it.
        let ttl = config.security.token_ttl().unwrap_or_else(|| {
            warn!(
                "Token expiry of {} hours is out of range; using {}",
                config.security.token_expiry_hours, DEFAULT_TOKEN_EXPIRY_HOURS
            );
            Duration::hours(DEFAULT_TOKEN_EXPIRY_HOURS as i64)
        });
        let tokens = Arc::new(TokenService::new(config.security.token_secret.as_bytes(), ttl));
        let accounts = Arc::new(AccountService::new(store.clone(), hasher, tokens.clone()));
        let documents = Arc::new(DocumentService::new(store.clone(), blobs));

        Self {
            config: Arc::new(config),
            store,
            tokens,
            accounts,
            documents,
        }
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl FromRef<AppState> for Arc<AccountService> {
    fn from_ref(state: &AppState) -> Self {
        state.accounts.clone()
    }
}

impl FromRef<AppState> for Arc<DocumentService> {
    fn from_ref(state: &AppState) -> Self {
        state.documents.clone()
    }
}

impl FromRef<AppState> for Arc<dyn NurseryStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
