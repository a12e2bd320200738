//! Registration, login and seeded accounts.

use std::sync::Arc;
use thiserror::Error;
use tokio::task;
use tracing::{info, warn};

use crate::auth::{Identity, PasswordHasher, TokenService};
use crate::database::models::{NewUser, User, UserProfile};
use crate::database::{NurseryStore, StoreError};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AccountError {
    /// Unknown email and wrong password are deliberately the same error.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid {field}: {problem}")]
    Invalid { field: &'static str, problem: String },

    #[error("password hashing task failed: {0}")]
    HashingTask(#[from] task::JoinError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => AccountError::EmailTaken,
            other => AccountError::Store(other),
        }
    }
}

/// A signed-in user and the bearer token issued for them.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
    pub expires_in: i64,
}

pub struct AccountService {
    store: Arc<dyn NurseryStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(store: Arc<dyn NurseryStore>, hasher: PasswordHasher, tokens: Arc<TokenService>) -> Self {
        Self { store, hasher, tokens }
    }

    pub async fn register(&self, email: &str, password: &str, name: Option<&str>) -> Result<Session, AccountError> {
        let user = self.create_user(email, password, name).await?;
        info!("Registered user {}", user.id);
        Ok(self.session_for(&user))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        let email = normalize_email(email);

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            // Spend the same derivation cost as a real check before failing.
            let _ = self.hash(password.to_string()).await?;
            warn!("Login rejected: unknown account");
            return Err(AccountError::InvalidCredentials);
        };

        if !self.verify(password.to_string(), user.password_hash.clone()).await? {
            warn!("Login rejected for user {}", user.id);
            return Err(AccountError::InvalidCredentials);
        }

        info!("User {} logged in", user.id);
        Ok(self.session_for(&user))
    }

    /// Create the account unless the email is already registered. Used to
    /// seed the demo account through the ordinary registration path.
    pub async fn ensure_account(&self, email: &str, password: &str, name: &str) -> Result<User, AccountError> {
        let normalized = normalize_email(email);
        if let Some(existing) = self.store.find_user_by_email(&normalized).await? {
            return Ok(existing);
        }

        match self.create_user(email, password, Some(name)).await {
            Err(AccountError::EmailTaken) => self
                .store
                .find_user_by_email(&normalized)
                .await?
                .ok_or(AccountError::EmailTaken),
            other => other,
        }
    }

    async fn create_user(&self, email: &str, password: &str, name: Option<&str>) -> Result<User, AccountError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::Invalid {
                field: "password",
                problem: format!("must be at least {MIN_PASSWORD_LEN} characters"),
            });
        }

        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => email.split('@').next().unwrap_or_default().to_string(),
        };
        let password_hash = self.hash(password.to_string()).await?;

        Ok(self
            .store
            .create_user(NewUser {
                email,
                password_hash,
                name,
            })
            .await?)
    }

    fn session_for(&self, user: &User) -> Session {
        let token = self.tokens.issue(&Identity {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        });

        Session {
            token,
            user: UserProfile::from(user),
            expires_in: self.tokens.ttl().num_seconds(),
        }
    }

    // Key derivation is deliberately slow; keep it off the async workers.
    async fn hash(&self, password: String) -> Result<String, AccountError> {
        let hasher = self.hasher.clone();
        Ok(task::spawn_blocking(move || hasher.hash(&password)).await?)
    }

    async fn verify(&self, password: String, stored: String) -> Result<bool, AccountError> {
        let hasher = self.hasher.clone();
        Ok(task::spawn_blocking(move || hasher.verify(&password, &stored)).await?)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), AccountError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AccountError::Invalid {
            field: "email",
            problem: "must be a valid email address".to_string(),
        })
    }
}
