pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "nursery")]
#[command(about = "Nursery CLI - operator tooling for the Nursery API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Provision the demo account as an ordinary user (idempotent)")]
    SeedDemo(commands::demo::SeedDemoArgs),

    #[command(about = "Compare document rows with stored blobs")]
    Reconcile(commands::reconcile::ReconcileArgs),

    #[command(about = "Apply pending database migrations")]
    Migrate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::SeedDemo(args) => commands::demo::handle(args, output_format).await,
        Commands::Reconcile(args) => commands::reconcile::handle(args, output_format).await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
    }
}
