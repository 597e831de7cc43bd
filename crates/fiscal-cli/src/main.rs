//! Fiscal CLI - Government budget dashboard
//!
//! Usage:
//!   fiscal status                     Show loaded data files and assistant config
//!   fiscal summary 2024               Totals and deficit for a year
//!   fiscal compare 2022 2024          Compare years
//!   fiscal ask "Who spends most?"     Ask the assistant
//!   fiscal serve --port 3000          Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let data_dir = cli.data_dir.as_path();
    let json = cli.json;

    match cli.command {
        Commands::Status => commands::cmd_status(data_dir, json).await,
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(data_dir, &host, port, static_dir.as_deref()).await,
        Commands::Suggest { year } => commands::cmd_suggest(year, json),
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(json),
            Some(PromptsAction::Show { id }) => commands::cmd_prompts_show(&id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
        Commands::Summary { year } => {
            commands::cmd_summary(&commands::load_store(data_dir)?, year, json)
        }
        Commands::Overview { year } => {
            commands::cmd_overview(&commands::load_store(data_dir)?, year, json)
        }
        Commands::Ministries { year, limit } => {
            commands::cmd_ministries(&commands::load_store(data_dir)?, year, limit, json)
        }
        Commands::Ministry { year, name } => {
            commands::cmd_ministry(&commands::load_store(data_dir)?, year, &name, json)
        }
        Commands::Compare { years } => {
            commands::cmd_compare(&commands::load_store(data_dir)?, &years, json)
        }
        Commands::Split { year } => {
            commands::cmd_split(&commands::load_store(data_dir)?, year, json)
        }
        Commands::Insights => commands::cmd_insights(&commands::load_store(data_dir)?, json),
        Commands::Search { query } => {
            commands::cmd_search(&commands::load_store(data_dir)?, &query, json)
        }
        Commands::Ask { question, year } => {
            let store = commands::load_store(data_dir)?;
            let assistant = commands::open_assistant()?;
            commands::cmd_ask(&assistant, &store, &question, year, json).await
        }
        Commands::Chat { year } => {
            let store = commands::load_store(data_dir)?;
            let assistant = commands::open_assistant()?;
            commands::cmd_chat(&assistant, &store, year).await
        }
        Commands::Speech { year } => {
            let store = commands::load_store(data_dir)?;
            let assistant = commands::open_assistant()?;
            commands::cmd_speech(&assistant, &store, year, json).await
        }
    }
}
