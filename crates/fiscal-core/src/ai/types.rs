//! AI backend request types
//!
//! These types are backend-agnostic and used across all AI implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Label used when a conversation is flattened into plain text
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

/// One message of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A single completion call: optional system instruction, prior turns and
/// the new prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub history: Vec<Message>,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    /// History and prompt as one text block, for backends that take a
    /// single prompt string
    pub fn transcript(&self) -> String {
        if self.history.is_empty() {
            return self.prompt.clone();
        }

        let mut text = String::from("Previous conversation:\n");
        for message in &self.history {
            text.push_str(message.role.label());
            text.push_str(": ");
            text.push_str(&message.content);
            text.push('\n');
        }
        text.push('\n');
        text.push_str(&self.prompt);
        text
    }
}
