//! Shared utilities for commands
//!
//! - `load_store` - Load the budget data directory
//! - `open_assistant` - Build the assistant from config and environment
//! - `print_json` - Pretty-print a serializable result

use std::path::Path;

use anyhow::{Context, Result};
use fiscal_core::{Assistant, AssistantConfig, BudgetStore};
use serde::Serialize;
use tracing::warn;

/// Load the budget tables, warning about missing files and skipped rows
pub fn load_store(data_dir: &Path) -> Result<BudgetStore> {
    let (store, report) = BudgetStore::load(data_dir)
        .with_context(|| format!("Failed to load budget data from {}", data_dir.display()))?;

    for kind in report.missing_required() {
        warn!("Missing required file {}; related figures will be absent", kind.file_name());
    }
    if report.total_skipped() > 0 {
        warn!(
            "Skipped {} malformed rows (run 'fiscal status' for details)",
            report.total_skipped()
        );
    }

    Ok(store)
}

/// Build the assistant from config files and environment variables
pub fn open_assistant() -> Result<Assistant> {
    let config = AssistantConfig::load().context("Failed to load assistant config")?;
    Assistant::from_config(&config).context(
        "Assistant not configured (set GEMINI_API_KEY, or AI_BACKEND=ollama / openai_compatible)",
    )
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
