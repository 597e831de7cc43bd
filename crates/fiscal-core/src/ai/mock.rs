//! Mock backend for testing
//!
//! Returns predictable answers without a model server. Useful for unit
//! tests and for running the dashboard without an API key.

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::CompletionRequest;
use super::AIBackend;

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether calls succeed and health_check returns true
    pub healthy: bool,
    /// Fixed answer; when unset the answer echoes the first prompt line
    pub reply: Option<String>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            reply: None,
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            reply: None,
        }
    }

    /// Always answer with `reply`
    pub fn with_reply(reply: &str) -> Self {
        Self {
            healthy: true,
            reply: Some(reply.to_string()),
        }
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if !self.healthy {
            return Err(Error::AssistantUnavailable("Mock backend is unhealthy".into()));
        }

        if let Some(ref reply) = self.reply {
            return Ok(reply.clone());
        }

        let first_line = request
            .prompt
            .lines()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("")
            .trim();
        Ok(format!(
            "Mock answer ({} prior messages): {}",
            request.history.len(),
            first_line
        ))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
