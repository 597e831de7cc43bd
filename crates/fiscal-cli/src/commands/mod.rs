//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (load_store, open_assistant, print_json)
//! - `status` - Data directory and assistant status
//! - `queries` - Budget queries (summary, overview, ministries, compare, split, insights, search)
//! - `assistant` - Assistant commands (ask, chat, speech, suggest)
//! - `prompts` - Prompt library management commands
//! - `serve` - Web server command

pub mod assistant;
pub mod core;
pub mod prompts;
pub mod queries;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use assistant::*;
pub use core::*;
pub use prompts::*;
pub use queries::*;
pub use serve::*;
pub use status::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
