//! Fiscal Core Library
//!
//! Shared functionality for the Fiscal government budget dashboard:
//! - CSV loading with per-file reports of skipped rows and missing files
//! - In-memory budget store with yearly, ministry and comparison queries
//! - Derived insights (growth, fiscal ratios, ministry consistency)
//! - Deterministic context formatting for model prompts
//! - Pluggable model backends (Gemini, OpenAI-compatible, Ollama, mock)
//! - Assistant façade with timeouts, retries and bounded conversations
//! - Prompt library for customizable prompts

pub mod ai;
pub mod assistant;
pub mod config;
pub mod context;
pub mod error;
pub mod insights;
pub mod load;
pub mod models;
pub mod prompts;
pub mod store;

/// Test utilities including a mock model server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, CompletionRequest, GeminiBackend, Message, MockBackend, OllamaBackend,
    OpenAICompatibleBackend, Role,
};
pub use assistant::{suggested_questions, Assistant, Conversation};
pub use config::{AssistantConfig, BackendKind, BackendSettings, RetryPolicy};
pub use context::{format_crores, format_pct, ContextAssembler, InsightFormatter, QueryResult};
pub use error::{Error, Result};
pub use insights::{FiscalTrend, Insights};
pub use load::{FileKind, FileReport, LoadOptions, LoadReport, Tables};
pub use models::*;
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary, PromptSource};
pub use store::BudgetStore;
