//! Assistant commands (ask, chat, speech, suggest)

use std::io::Write;

use anyhow::{Context, Result};
use fiscal_core::{suggested_questions, Assistant, BudgetStore, Conversation};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::print_json;

#[derive(Serialize)]
struct AnswerOutput<'a> {
    question: &'a str,
    year: Option<i32>,
    answer: &'a str,
}

pub async fn cmd_ask(
    assistant: &Assistant,
    store: &BudgetStore,
    question: &str,
    year: Option<i32>,
    json: bool,
) -> Result<()> {
    let answer = assistant.answer(store, question, year, &[]).await?;
    if json {
        return print_json(&AnswerOutput {
            question,
            year,
            answer: &answer,
        });
    }

    println!("{}", answer);
    Ok(())
}

/// What the chat loop should do with one input line
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput<'a> {
    Question(&'a str),
    Clear,
    Summary,
    Help,
    Quit,
    Empty,
}

pub fn parse_chat_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    match line {
        "" => ChatInput::Empty,
        "/quit" | "/exit" | "/q" => ChatInput::Quit,
        "/clear" => ChatInput::Clear,
        "/summary" => ChatInput::Summary,
        "/help" | "/?" => ChatInput::Help,
        question => ChatInput::Question(question),
    }
}

fn print_chat_help() {
    println!("  /clear    Forget the conversation so far");
    println!("  /summary  Summarize the conversation");
    println!("  /quit     Leave the chat");
}

/// Run the chat loop over any line source; returns the final conversation
pub async fn run_chat<R: AsyncBufRead + Unpin>(
    assistant: &Assistant,
    store: &BudgetStore,
    year: Option<i32>,
    input: R,
) -> Result<Conversation> {
    let mut conversation = assistant.conversation();
    let mut lines = input.lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            println!();
            break;
        };

        match parse_chat_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Quit => break,
            ChatInput::Help => print_chat_help(),
            ChatInput::Clear => {
                conversation.clear();
                println!("🧹 Conversation cleared");
            }
            ChatInput::Summary => match assistant.summarize(&conversation).await {
                Ok(summary) => println!("\n{}\n", summary),
                Err(e) => println!("⚠️  {}", e),
            },
            ChatInput::Question(question) => {
                match assistant
                    .chat(store, &mut conversation, question, year)
                    .await
                {
                    Ok(answer) => println!("\n{}\n", answer),
                    Err(e) => println!("⚠️  {}", e),
                }
            }
        }
    }

    Ok(conversation)
}

pub async fn cmd_chat(assistant: &Assistant, store: &BudgetStore, year: Option<i32>) -> Result<()> {
    println!("💬 Budget assistant");
    if let Some(year) = year {
        println!("   Focus year: {}", year);
    }
    println!("   Type a question, /help for commands, /quit to leave.");
    println!();
    println!("   Try asking:");
    for question in suggested_questions(year).iter().take(3) {
        println!("   • {}", question);
    }
    println!();

    let stdin = BufReader::new(tokio::io::stdin());
    run_chat(assistant, store, year, stdin).await?;
    Ok(())
}

pub async fn cmd_speech(
    assistant: &Assistant,
    store: &BudgetStore,
    year: i32,
    json: bool,
) -> Result<()> {
    let analysis = assistant.analyze_speech(store, year).await?;
    if json {
        return print_json(&serde_json::json!({ "year": year, "analysis": analysis }));
    }

    println!();
    println!("🎤 Budget speech analysis, {}", year);
    println!("   ─────────────────────────────────────────────");
    println!("{}", analysis);
    println!();
    Ok(())
}

pub fn cmd_suggest(year: Option<i32>, json: bool) -> Result<()> {
    let questions = suggested_questions(year);
    if json {
        return print_json(&questions);
    }

    println!("💡 Suggested questions:");
    for question in questions {
        println!("   • {}", question);
    }
    Ok(())
}
