use anyhow::Context;

use crate::cli::{utils, OutputFormat};
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = utils::connect_database().await?;
    DatabaseManager::migrate(&pool)
        .await
        .context("failed to apply migrations")?;
    DatabaseManager::close(pool).await;

    utils::output_success(&output_format, "Database schema is up to date", None)
}
