use anyhow::Context;
use clap::Args;
use serde_json::json;
use std::sync::Arc;

use crate::cli::{utils, OutputFormat};
use crate::database::{DatabaseManager, PgStore};
use crate::services::Reconciler;
use crate::storage::LocalBlobStore;

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    #[arg(long, help = "Delete orphaned blobs instead of only reporting them")]
    pub apply: bool,

    #[arg(long, env = "BLOB_STORAGE_DIR", help = "Blob store root directory")]
    pub blob_dir: std::path::PathBuf,
}

pub async fn handle(args: ReconcileArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = utils::connect_database().await?;
    let blobs = LocalBlobStore::open(&args.blob_dir)
        .await
        .with_context(|| format!("failed to open blob store at {}", args.blob_dir.display()))?;

    let reconciler = Reconciler::new(Arc::new(PgStore::new(pool.clone())), Arc::new(blobs));
    let report = reconciler.scan().await.context("reconciliation scan failed")?;

    let removed = if args.apply {
        reconciler
            .remove_orphans(&report)
            .await
            .context("failed to remove orphaned blobs")?
    } else {
        0
    };
    DatabaseManager::close(pool).await;

    let message = if report.is_clean() {
        "Document rows and blobs agree".to_string()
    } else if args.apply {
        format!("Removed {} orphaned blobs", removed)
    } else {
        "Inconsistencies found; rerun with --apply to delete orphaned blobs".to_string()
    };

    utils::output_success(
        &output_format,
        &message,
        Some(json!({
            "orphaned_blobs": report.orphaned_blobs,
            "dangling_documents": report.dangling_documents,
            "removed": removed,
        })),
    )
}
