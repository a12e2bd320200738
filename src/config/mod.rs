use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Shortest signing secret the server accepts.
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

/// Longest token lifetime the server accepts, one year.
pub const MAX_TOKEN_EXPIRY_HOURS: u64 = 24 * 365;

pub const DEFAULT_TOKEN_EXPIRY_HOURS: u64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("NURSERY_TOKEN_SECRET must be at least {MIN_TOKEN_SECRET_LEN} bytes")]
    WeakTokenSecret,

    #[error("SECURITY_TOKEN_EXPIRY_HOURS must be between 1 and {MAX_TOKEN_EXPIRY_HOURS}, got {0}")]
    InvalidTokenExpiry(u64),

    #[error("Demo account requires both DEMO_ACCOUNT_EMAIL and DEMO_ACCOUNT_PASSWORD")]
    IncompleteDemoAccount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub blob: BlobConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub demo: Option<DemoAccount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Root directory of the blob store. `None` keeps document metadata only.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_upload_bytes: usize,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub token_secret: String,
    pub token_expiry_hours: u64,
}

// Keep the secret out of logs and panics.
impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("token_secret", &"<redacted>")
            .field("token_expiry_hours", &self.token_expiry_hours)
            .finish()
    }
}

impl SecurityConfig {
    /// Token lifetime, or `None` when the configured hours are out of range.
    pub fn token_ttl(&self) -> Option<Duration> {
        if !(1..=MAX_TOKEN_EXPIRY_HOURS).contains(&self.token_expiry_hours) {
            return None;
        }
        Duration::try_hours(i64::try_from(self.token_expiry_hours).ok()?)
    }
}

/// Account seeded at startup like any registered user.
#[derive(Clone, Serialize, Deserialize)]
pub struct DemoAccount {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
}

impl std::fmt::Debug for DemoAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoAccount")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl DatabaseConfig {
    /// Database settings alone, for tooling that never serves requests.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = non_empty_var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let mut config = Self {
            url,
            max_connections: 2,
            connection_timeout: 30,
        };
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = v.parse().unwrap_or(config.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            config.connection_timeout = v.parse().unwrap_or(config.connection_timeout);
        }
        Ok(config)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let database_url = non_empty_var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let token_secret =
            non_empty_var("NURSERY_TOKEN_SECRET").ok_or(ConfigError::Missing("NURSERY_TOKEN_SECRET"))?;

        let config = match environment {
            Environment::Production => Self::production(database_url, token_secret),
            Environment::Staging => Self::staging(database_url, token_secret),
            Environment::Development => Self::development(database_url, token_secret),
        }
        .with_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.token_secret.len() < MIN_TOKEN_SECRET_LEN {
            return Err(ConfigError::WeakTokenSecret);
        }
        if self.security.token_ttl().is_none() {
            return Err(ConfigError::InvalidTokenExpiry(self.security.token_expiry_hours));
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Blob store
        if let Some(dir) = non_empty_var("BLOB_STORAGE_DIR") {
            self.blob.root = Some(PathBuf::from(dir));
        }

        // API overrides
        if let Some(port) = env::var("NURSERY_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_UPLOAD_BYTES") {
            self.api.max_upload_bytes = v.parse().unwrap_or(self.api.max_upload_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_TOKEN_EXPIRY_HOURS") {
            self.security.token_expiry_hours = v.parse().unwrap_or(self.security.token_expiry_hours);
        }

        // Seeded demo account
        match (non_empty_var("DEMO_ACCOUNT_EMAIL"), non_empty_var("DEMO_ACCOUNT_PASSWORD")) {
            (Some(email), Some(password)) => {
                let name = non_empty_var("DEMO_ACCOUNT_NAME").unwrap_or_else(|| "Demo".to_string());
                self.demo = Some(DemoAccount { email, password, name });
            }
            (None, None) => {}
            _ => return Err(ConfigError::IncompleteDemoAccount),
        }

        Ok(self)
    }

    fn development(database_url: String, token_secret: String) -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: database_url,
                max_connections: 10,
                connection_timeout: 30,
            },
            blob: BlobConfig::default(),
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_upload_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                token_secret,
                token_expiry_hours: DEFAULT_TOKEN_EXPIRY_HOURS,
            },
            demo: None,
        }
    }

    fn staging(database_url: String, token_secret: String) -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: database_url,
                max_connections: 20,
                connection_timeout: 10,
            },
            blob: BlobConfig::default(),
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_upload_bytes: 10 * 1024 * 1024,
            },
            security: SecurityConfig {
                token_secret,
                token_expiry_hours: DEFAULT_TOKEN_EXPIRY_HOURS,
            },
            demo: None,
        }
    }

    fn production(database_url: String, token_secret: String) -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: database_url,
                max_connections: 50,
                connection_timeout: 5,
            },
            blob: BlobConfig::default(),
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_upload_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                token_secret,
                token_expiry_hours: DEFAULT_TOKEN_EXPIRY_HOURS,
            },
            demo: None,
        }
    }

    /// Development preset for in-process use (tests, tooling). Not read from the environment.
    pub fn local(token_secret: impl Into<String>) -> Self {
        Self::development("postgres://localhost/nursery".to_string(), token_secret.into())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development("postgres://x/y".into(), SECRET.into());
        assert_eq!(config.security.token_expiry_hours, 24);
        assert!(config.blob.root.is_none());
        assert!(config.api.enable_request_logging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production("postgres://x/y".into(), SECRET.into());
        assert!(config.is_production());
        assert_eq!(config.database.max_connections, 50);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn short_secret_is_rejected() {
        let config = AppConfig::local("too-short");
        assert!(matches!(config.validate(), Err(ConfigError::WeakTokenSecret)));
    }

    #[test]
    fn secrets_do_not_leak_through_debug() {
        let mut config = AppConfig::local(SECRET);
        config.demo = Some(DemoAccount {
            email: "demo@test.io".into(),
            password: "pw123456".into(),
            name: "Demo".into(),
        });
        let rendered = format!("{config:?}");
        assert!(!rendered.contains(SECRET));
        assert!(!rendered.contains("pw123456"));
        assert!(rendered.contains("demo@test.io"));

        let serialized = serde_json::to_string(&config).unwrap();
        assert!(!serialized.contains(SECRET));
        assert!(!serialized.contains("pw123456"));
        assert!(serialized.contains("demo@test.io"));
    }

    #[test]
    fn token_expiry_must_be_in_range() {
        let mut config = AppConfig::local(SECRET);
        for hours in [0, MAX_TOKEN_EXPIRY_HOURS + 1, 1_000_000_000_000_000, u64::MAX] {
            config.security.token_expiry_hours = hours;
            assert!(config.security.token_ttl().is_none(), "{hours} hours accepted");
            assert!(matches!(config.validate(), Err(ConfigError::InvalidTokenExpiry(h)) if h == hours));
        }

        config.security.token_expiry_hours = MAX_TOKEN_EXPIRY_HOURS;
        assert!(config.validate().is_ok());
        config.security.token_expiry_hours = 1;
        assert_eq!(config.security.token_ttl(), Some(Duration::hours(1)));
    }
}
