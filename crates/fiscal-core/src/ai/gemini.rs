//! Google Gemini backend
//!
//! Calls the `generateContent` endpoint of the Generative Language API.
//!
//! # Configuration
//!
//! Environment variables:
//! - `GEMINI_API_KEY`: API key (required)
//! - `GEMINI_MODEL`: Model name (default: gemini-2.5-flash)
//! - `GEMINI_HOST`: API base URL (default: https://generativelanguage.googleapis.com)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::{CompletionRequest, Role};
use super::AIBackend;

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1beta/models/{}{}", self.base_url, self.model, action)
    }
}

/// generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn text_content(role: &str, text: &str) -> Content {
    Content {
        role: Some(role.to_string()),
        parts: vec![Part {
            text: text.to_string(),
        }],
    }
}

fn build_request(request: &CompletionRequest) -> GenerateContentRequest {
    let mut contents: Vec<Content> = request
        .history
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            text_content(role, &m.content)
        })
        .collect();
    contents.push(text_content("user", &request.prompt));

    GenerateContentRequest {
        system_instruction: request.system.as_ref().map(|s| Content {
            role: None,
            parts: vec![Part { text: s.clone() }],
        }),
        contents,
        generation_config: GenerationConfig { temperature: 0.2 },
    }
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .http_client
            .post(self.endpoint(":generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let body: GenerateContentResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        debug!(model = %self.model, chars = text.len(), "Gemini response");
        Ok(text)
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.endpoint(""))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
