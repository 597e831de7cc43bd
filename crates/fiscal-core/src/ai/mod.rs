//! Pluggable model backend abstraction
//!
//! # Architecture
//!
//! - `AIBackend` trait: a single text-completion call plus health and identity
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OpenAICompatibleBackend`,
//!   `OllamaBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = AssistantConfig::load()?;
//! let client = AIClient::from_config(&config)?;
//! let answer = client.complete(&CompletionRequest::new("Hello")).await?;
//! ```
//!
//! Backends return the model text as-is, possibly empty. Timeouts, retries
//! and the mapping to `AssistantUnavailable` live in [`crate::assistant`].

mod gemini;
mod mock;
mod ollama;
mod openai_compatible;
pub mod types;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use async_trait::async_trait;

use crate::config::{AssistantConfig, BackendKind};
use crate::error::{Error, Result};

/// Trait defining the interface for all model backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send one completion request and return the model's text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    Gemini(GeminiBackend),
    /// vLLM, LocalAI, llama-server or any hosted OpenAI-style API
    OpenAICompatible(OpenAICompatibleBackend),
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Build the client selected by `config.backend`
    ///
    /// Fails with `Config` when the Gemini backend is selected without an
    /// API key.
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        let settings = config.settings();
        match config.backend {
            BackendKind::Gemini => {
                let key = settings.api_key.as_deref().ok_or_else(|| {
                    Error::Config("GEMINI_API_KEY is not set".into())
                })?;
                Ok(AIClient::Gemini(GeminiBackend::new(
                    &settings.host,
                    &settings.model,
                    key,
                )))
            }
            BackendKind::OpenAICompatible => {
                let backend = match settings.api_key {
                    Some(ref key) => {
                        OpenAICompatibleBackend::with_api_key(&settings.host, &settings.model, key)
                    }
                    None => OpenAICompatibleBackend::new(&settings.host, &settings.model),
                };
                Ok(AIClient::OpenAICompatible(backend))
            }
            BackendKind::Ollama => Ok(AIClient::Ollama(OllamaBackend::new(
                &settings.host,
                &settings.model,
            ))),
            BackendKind::Mock => Ok(AIClient::mock()),
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Short backend name for status output
    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::Gemini(_) => BackendKind::Gemini.as_str(),
            AIClient::OpenAICompatible(_) => BackendKind::OpenAICompatible.as_str(),
            AIClient::Ollama(_) => BackendKind::Ollama.as_str(),
            AIClient::Mock(_) => BackendKind::Mock.as_str(),
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.complete(request).await,
            AIClient::OpenAICompatible(b) => b.complete(request).await,
            AIClient::Ollama(b) => b.complete(request).await,
            AIClient::Mock(b) => b.complete(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_requires_api_key() {
        let config = AssistantConfig::default();
        assert!(matches!(
            AIClient::from_config(&config),
            Err(Error::Config(_))
        ));

        let mut config = AssistantConfig::default();
        config.gemini.api_key = Some("key".into());
        let client = AIClient::from_config(&config).unwrap();
        assert_eq!(client.backend_name(), "gemini");
        assert_eq!(client.model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_from_config_selects_backend() {
        let mut config = AssistantConfig {
            backend: BackendKind::Ollama,
            ..Default::default()
        };
        let client = AIClient::from_config(&config).unwrap();
        assert_eq!(client.backend_name(), "ollama");
        assert_eq!(client.host(), "http://localhost:11434");

        config.backend = BackendKind::OpenAICompatible;
        let client = AIClient::from_config(&config).unwrap();
        assert_eq!(client.backend_name(), "openai_compatible");

        config.backend = BackendKind::Mock;
        let client = AIClient::from_config(&config).unwrap();
        assert_eq!(client.backend_name(), "mock");
    }

    #[tokio::test]
    async fn test_client_delegates_to_mock() {
        let client = AIClient::mock();
        assert!(client.health_check().await);
        let answer = client.complete(&CompletionRequest::new("Hello")).await.unwrap();
        assert!(answer.contains("Hello"));
    }
}
