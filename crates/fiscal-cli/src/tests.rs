//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;

use fiscal_core::{
    test_utils::MockModelServer, AIClient, Assistant, AssistantConfig, BudgetStore, MockBackend,
    OpenAICompatibleBackend, PromptLibrary, Role,
};
use tempfile::TempDir;

use crate::commands::{self, parse_chat_input, truncate, ChatInput};

const RECORDS: &str = "year,ministry,category,expenditure,revenue
2022,Ministry of Defence,Capital Outlay,500,0
2022,Ministry of Health and Family Welfare,Revenue,200,0
2022,Ministry of Finance,Tax Revenue,0,600
2023,Ministry of Defence,Capital Outlay,450,0
2023,Ministry of Health and Family Welfare,Revenue,260,0
2023,Ministry of Finance,Tax Revenue,0,700
";

const SUMMARY: &str = "year,gdp_nominal_in_crores,fiscal_deficit_as_gdp_pct
2022,10000,6.4
2023,11000,5.9
";

fn setup_data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("budget_records.csv"), RECORDS).unwrap();
    fs::write(dir.path().join("budget_summary.csv"), SUMMARY).unwrap();
    dir
}

fn setup_store() -> BudgetStore {
    let dir = setup_data_dir();
    commands::load_store(dir.path()).unwrap()
}

fn mock_assistant(backend: MockBackend) -> Assistant {
    Assistant::new(AIClient::Mock(backend), &AssistantConfig::default())
        .with_prompts(PromptLibrary::embedded_only())
}

// ========== Utilities ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("Ministry of Defence", 10), "Ministr...");
    assert_eq!(truncate("₹₹₹₹₹₹", 5), "₹₹...");
}

#[test]
fn test_load_store_missing_dir() {
    let dir = TempDir::new().unwrap();
    let err = commands::load_store(&dir.path().join("missing")).unwrap_err();
    assert!(err.to_string().contains("Failed to load budget data"));
}

// ========== Query Commands ==========

#[test]
fn test_cmd_summary() {
    let store = setup_store();
    assert!(commands::cmd_summary(&store, 2022, false).is_ok());
    assert!(commands::cmd_summary(&store, 2022, true).is_ok());
    assert!(commands::cmd_summary(&store, 2019, false).is_err());
}

#[test]
fn test_cmd_overview() {
    let store = setup_store();
    assert!(commands::cmd_overview(&store, 2023, false).is_ok());
    assert!(commands::cmd_overview(&store, 2030, false).is_err());
}

#[test]
fn test_cmd_ministries() {
    let store = setup_store();
    assert!(commands::cmd_ministries(&store, 2023, 2, false).is_ok());
    assert!(commands::cmd_ministries(&store, 2023, 0, true).is_ok());
}

#[test]
fn test_cmd_ministry() {
    let store = setup_store();
    assert!(commands::cmd_ministry(&store, 2023, "health", false).is_ok());
    assert!(commands::cmd_ministry(&store, 2023, "Railways", false).is_err());
}

#[test]
fn test_cmd_compare() {
    let store = setup_store();
    assert!(commands::cmd_compare(&store, &[2023, 2022], false).is_ok());
    assert!(commands::cmd_compare(&store, &[2022, 2019], false).is_err());
}

#[test]
fn test_cmd_split_insights_search() {
    let store = setup_store();
    assert!(commands::cmd_split(&store, 2022, false).is_ok());
    assert!(commands::cmd_insights(&store, false).is_ok());
    assert!(commands::cmd_insights(&store, true).is_ok());
    assert!(commands::cmd_search(&store, "defence", false).is_ok());
    assert!(commands::cmd_search(&store, "nothing-matches", false).is_ok());
}

#[test]
fn test_cmd_suggest() {
    assert!(commands::cmd_suggest(None, false).is_ok());
    assert!(commands::cmd_suggest(Some(2023), true).is_ok());
}

// ========== Assistant Commands ==========

#[tokio::test]
async fn test_cmd_ask() {
    let store = setup_store();
    let assistant = mock_assistant(MockBackend::with_reply("Defence leads."));
    assert!(
        commands::cmd_ask(&assistant, &store, "Who spends most?", Some(2023), false)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_cmd_ask_unavailable() {
    let store = setup_store();
    let server = MockModelServer::builder().fail_times(1, 503).start().await;
    let client = AIClient::OpenAICompatible(OpenAICompatibleBackend::new(&server.url(), "test"));
    let assistant = Assistant::new(client, &AssistantConfig::default())
        .with_prompts(PromptLibrary::embedded_only());

    let err = commands::cmd_ask(&assistant, &store, "Who spends most?", None, false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Assistant unavailable"));
}

#[tokio::test]
async fn test_cmd_speech_without_speech_data() {
    let store = setup_store();
    let assistant = mock_assistant(MockBackend::new());
    assert!(commands::cmd_speech(&assistant, &store, 2023, false)
        .await
        .is_err());
}

#[test]
fn test_parse_chat_input() {
    assert_eq!(parse_chat_input("  "), ChatInput::Empty);
    assert_eq!(parse_chat_input("/quit"), ChatInput::Quit);
    assert_eq!(parse_chat_input("/exit"), ChatInput::Quit);
    assert_eq!(parse_chat_input("/clear"), ChatInput::Clear);
    assert_eq!(parse_chat_input("/summary"), ChatInput::Summary);
    assert_eq!(
        parse_chat_input(" What is GST? "),
        ChatInput::Question("What is GST?")
    );
}

#[tokio::test]
async fn test_run_chat_keeps_history() {
    let store = setup_store();
    let assistant = mock_assistant(MockBackend::new());
    let input: &[u8] = b"Who spends most?\n\nAnd health?\n/quit\nignored\n";

    let conversation = commands::run_chat(&assistant, &store, None, input)
        .await
        .unwrap();

    assert_eq!(conversation.len(), 4);
    assert_eq!(conversation.messages()[0].role, Role::User);
    assert_eq!(conversation.messages()[2].content, "And health?");
    assert!(conversation.messages()[3]
        .content
        .starts_with("Mock answer (2 prior messages)"));
}

#[tokio::test]
async fn test_run_chat_clear() {
    let store = setup_store();
    let assistant = mock_assistant(MockBackend::new());
    let input: &[u8] = b"Who spends most?\n/clear\n/summary\n";

    let conversation = commands::run_chat(&assistant, &store, None, input)
        .await
        .unwrap();
    assert!(conversation.is_empty());
}
