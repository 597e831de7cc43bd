//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Fiscal - Explore government budget data
#[derive(Parser)]
#[command(name = "fiscal")]
#[command(about = "Government budget dashboard and assistant", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory containing the budget CSV files
    #[arg(long, env = "FISCAL_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show loaded data files, years and assistant configuration
    Status,

    /// Totals, deficit and GDP ratios for a year
    Summary {
        /// Budget year (e.g. 2024)
        year: i32,
    },

    /// Full overview of a year: top ministries, revenue, schemes, speech
    Overview {
        /// Budget year
        year: i32,
    },

    /// Ministries ranked by expenditure for a year
    Ministries {
        /// Budget year
        year: i32,

        /// Number of ministries to show (0 for all)
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Detail for a single ministry in a year
    Ministry {
        /// Budget year
        year: i32,

        /// Ministry name (case-insensitive, partial names allowed)
        name: String,
    },

    /// Compare two or more years
    Compare {
        /// Years to compare (e.g. 2022 2024 or 2022,2024)
        #[arg(required = true, value_delimiter = ',', num_args = 1..)]
        years: Vec<i32>,
    },

    /// Revenue sources and expenditure by ministry for a year
    Split {
        /// Budget year
        year: i32,
    },

    /// Growth, fiscal ratios, ministry consistency and key findings
    Insights,

    /// Search ministries, schemes and revenue sources
    Search {
        /// Search text
        query: String,
    },

    /// Ask the assistant a single question
    Ask {
        /// Question about the budget
        question: String,

        /// Budget year to focus on
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Interactive conversation with the assistant
    Chat {
        /// Budget year to focus on
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Relate a year's budget speech to its allocations
    Speech {
        /// Budget year
        year: i32,
    },

    /// Suggested questions for the assistant
    Suggest {
        /// Budget year to tailor questions to
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Manage assistant prompts
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,

    /// Show the content of a prompt
    Show {
        /// Prompt ID (e.g. answer_question)
        id: String,
    },

    /// Print the override directory
    Path,
}
