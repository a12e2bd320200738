use anyhow::Context;
use clap::Args;
use serde_json::json;
use std::sync::Arc;

use crate::auth::PasswordHasher;
use crate::cli::{utils, OutputFormat};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgStore};
use crate::AppState;

#[derive(Debug, Args)]
pub struct SeedDemoArgs {
    #[arg(long, help = "Account email (defaults to DEMO_ACCOUNT_EMAIL)")]
    pub email: Option<String>,

    #[arg(long, help = "Account password (defaults to DEMO_ACCOUNT_PASSWORD)")]
    pub password: Option<String>,

    #[arg(long, help = "Display name (defaults to DEMO_ACCOUNT_NAME or \"Demo\")")]
    pub name: Option<String>,
}

pub async fn handle(args: SeedDemoArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    let configured = config.demo.clone();

    let email = args
        .email
        .or_else(|| configured.as_ref().map(|d| d.email.clone()))
        .context("no demo email given; pass --email or set DEMO_ACCOUNT_EMAIL")?;
    let password = args
        .password
        .or_else(|| configured.as_ref().map(|d| d.password.clone()))
        .context("no demo password given; pass --password or set DEMO_ACCOUNT_PASSWORD")?;
    let name = args
        .name
        .or_else(|| configured.as_ref().map(|d| d.name.clone()))
        .unwrap_or_else(|| "Demo".to_string());

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    let state = AppState::new(config, Arc::new(PgStore::new(pool.clone())), None, PasswordHasher::new());

    let user = state
        .accounts
        .ensure_account(&email, &password, &name)
        .await
        .context("failed to provision demo account")?;
    DatabaseManager::close(pool).await;

    utils::output_success(
        &output_format,
        &format!("Demo account {} is ready", user.email),
        Some(json!({ "user_id": user.id, "email": user.email })),
    )
}
