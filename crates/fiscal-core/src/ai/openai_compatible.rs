//! Chat completions backend for OpenAI-style servers
//!
//! Any server exposing `POST /v1/chat/completions` works: llama.cpp,
//! vLLM, LocalAI, or a hosted API when `OPENAI_COMPATIBLE_API_KEY` is set.
//! Host and model come from `OPENAI_COMPATIBLE_HOST` and
//! `OPENAI_COMPATIBLE_MODEL`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::CompletionRequest;
use super::AIBackend;

#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
        }
    }

    /// Backend that sends `Authorization: Bearer <key>`
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            ..Self::new(base_url, model)
        }
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

fn build_request(model: &str, request: &CompletionRequest) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    if let Some(ref system) = request.system {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system.clone(),
        });
    }
    messages.extend(request.history.iter().map(|m| ChatMessage {
        role: m.role.as_str().to_string(),
        content: m.content.clone(),
    }));
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: request.prompt.clone(),
    });

    ChatCompletionRequest {
        model: model.to_string(),
        messages,
        temperature: Some(0.2),
        stream: false,
    }
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&build_request(&self.model, request));

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let chat_response: ChatCompletionResponse = response.json().await?;
        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        debug!(model = %self.model, chars = text.len(), "OpenAI-compatible response");
        Ok(text)
    }

    async fn health_check(&self) -> bool {
        for path in ["/v1/models", "/health"] {
            let mut req = self.http_client.get(format!("{}{}", self.base_url, path));
            if let Some(ref api_key) = self.api_key {
                req = req.header("Authorization", format!("Bearer {}", api_key));
            }
            if let Ok(resp) = req.send().await {
                if resp.status().is_success() {
                    return true;
                }
            }
        }
        false
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
