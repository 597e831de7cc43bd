//! Status command implementation

use std::path::Path;

use anyhow::Result;
use fiscal_core::{AIBackend, Assistant, AssistantConfig, BudgetStore, FileKind, LoadReport};
use serde::Serialize;

use super::print_json;

#[derive(Serialize)]
struct StatusReport<'a> {
    report: &'a LoadReport,
    years: Vec<i32>,
    assistant: AssistantStatus,
}

#[derive(Serialize)]
struct AssistantStatus {
    backend: String,
    model: String,
    host: String,
    configured: bool,
    available: bool,
    error: Option<String>,
}

async fn assistant_status() -> AssistantStatus {
    let config = match AssistantConfig::load() {
        Ok(config) => config,
        Err(e) => {
            return AssistantStatus {
                backend: "unknown".into(),
                model: String::new(),
                host: String::new(),
                configured: false,
                available: false,
                error: Some(e.to_string()),
            }
        }
    };

    let settings = config.settings();
    match Assistant::from_config(&config) {
        Ok(assistant) => AssistantStatus {
            backend: assistant.client().backend_name().into(),
            model: assistant.client().model().into(),
            host: assistant.client().host().into(),
            configured: true,
            available: assistant.is_available().await,
            error: None,
        },
        Err(e) => AssistantStatus {
            backend: config.backend.as_str().into(),
            model: settings.model.clone(),
            host: settings.host.clone(),
            configured: false,
            available: false,
            error: Some(e.to_string()),
        },
    }
}

pub async fn cmd_status(data_dir: &Path, json: bool) -> Result<()> {
    let loaded = BudgetStore::load(data_dir);
    let assistant = assistant_status().await;

    if json {
        return match loaded {
            Ok((store, report)) => print_json(&StatusReport {
                report: &report,
                years: store.years(),
                assistant,
            }),
            Err(e) => Err(e.into()),
        };
    }

    println!();
    println!("📊 Fiscal Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Data directory: {}", data_dir.display());

    match loaded {
        Ok((store, report)) => {
            println!();
            for report in &report.files {
                let skipped = if report.skipped > 0 {
                    format!(", {} skipped", report.skipped)
                } else {
                    String::new()
                };
                println!(
                    "   ✅ {:<28} {} rows{}",
                    report.kind.file_name(),
                    report.loaded,
                    skipped
                );
                for reason in &report.skip_reasons {
                    println!("      - {}", reason);
                }
            }
            for kind in &report.missing {
                let marker = if kind.is_required() { "❌" } else { "➖" };
                let note = if kind.is_required() {
                    "missing (required)"
                } else {
                    "not present"
                };
                println!("   {} {:<28} {}", marker, kind.file_name(), note);
            }

            let years = store.years();
            println!();
            match (years.first(), years.last()) {
                (Some(first), Some(last)) => {
                    println!("   Years: {}-{} ({} loaded)", first, last, years.len())
                }
                _ => println!("   Years: (none)"),
            }
            if report.file(FileKind::Records).is_some() {
                println!("   Records: {}", store.records().len());
            }
        }
        Err(e) => {
            println!();
            println!("   ❌ Error loading data: {}", e);
            println!("      Set --data-dir or FISCAL_DATA_DIR to the budget CSV directory");
        }
    }

    println!();
    println!("   Assistant backend: {}", assistant.backend);
    if !assistant.model.is_empty() {
        println!("   Model: {} at {}", assistant.model, assistant.host);
    }
    if let Some(ref err) = assistant.error {
        println!("   ⚠️  Not configured: {}", err);
    } else if assistant.available {
        println!("   🤖 Assistant: available");
    } else {
        println!("   ❌ Assistant: not reachable");
    }

    println!();
    Ok(())
}
