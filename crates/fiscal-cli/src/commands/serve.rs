//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use fiscal_core::{Assistant, BudgetStore};
use fiscal_server::{AppState, ServerConfig};

pub async fn cmd_serve(
    data_dir: &Path,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Fiscal web server...");
    println!("   Data directory: {}", data_dir.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    let (store, report) = BudgetStore::load(data_dir)
        .with_context(|| format!("Failed to load budget data from {}", data_dir.display()))?;

    println!("   Years: {:?}", store.years());
    for kind in report.missing_required() {
        println!("   ⚠️  Missing required file: {}", kind.file_name());
    }
    if report.total_skipped() > 0 {
        println!("   ⚠️  Skipped {} malformed rows", report.total_skipped());
    }

    let config = ServerConfig::from_env();
    if !config.allowed_origins.is_empty() {
        println!(
            "   🌐 Allowed origins: {} (FISCAL_ALLOWED_ORIGINS)",
            config.allowed_origins.join(", ")
        );
    }

    let assistant = Assistant::from_env();
    if assistant.is_none() {
        println!("   ⚠️  Assistant disabled (set GEMINI_API_KEY or AI_BACKEND)");
    }

    println!();
    println!("   Press Ctrl+C to stop");

    let state = AppState::new(store, report, assistant);
    fiscal_server::serve(state, host, port, static_dir, config).await?;

    Ok(())
}
