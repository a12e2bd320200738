use anyhow::Context;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::cli::OutputFormat;
use crate::config::DatabaseConfig;
use crate::database::DatabaseManager;

/// Output a success message in the appropriate format. Fields of `data`
/// are merged into the JSON object; text output prints them as `key: value`.
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(fields))) = (response.as_object_mut(), data) {
                target.extend(fields);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
            if let Some(Value::Object(fields)) = data {
                for (key, value) in fields {
                    match value {
                        Value::Array(items) => {
                            println!("{}: {}", key, items.len());
                            for item in items {
                                println!("  {}", item.as_str().map(str::to_owned).unwrap_or_else(|| item.to_string()));
                            }
                        }
                        Value::String(s) => println!("{}: {}", key, s),
                        other => println!("{}: {}", key, other),
                    }
                }
            }
        }
    }
    Ok(())
}

/// Connect using `DATABASE_*` settings only.
pub async fn connect_database() -> anyhow::Result<PgPool> {
    let config = DatabaseConfig::from_env().context("invalid database configuration")?;
    DatabaseManager::connect(&config)
        .await
        .context("failed to connect to the database")
}
