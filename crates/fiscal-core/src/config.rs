//! Assistant configuration
//!
//! Config is resolved in three layers:
//! 1. Embedded defaults (compiled into binary)
//! 2. Override file in data dir (~/.local/share/fiscal/config/assistant.toml)
//! 3. Environment variables
//!
//! An override file replaces the embedded defaults wholesale; keys it leaves
//! out fall back to the built-in values, not to the embedded file.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/assistant.toml");

/// Which model service answers questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Gemini,
    /// Any server exposing `/v1/chat/completions`
    OpenAICompatible,
    Ollama,
    /// Deterministic local responses, no network
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAICompatible => "openai_compatible",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai_compatible" | "openai-compatible" | "openai" => Ok(Self::OpenAICompatible),
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            other => Err(Error::Config(format!("Unknown AI backend: {}", other))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connection settings for one backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendSettings {
    pub host: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl BackendSettings {
    fn new(host: &str, model: &str) -> Self {
        Self {
            host: host.to_string(),
            model: model.to_string(),
            api_key: None,
        }
    }
}

/// Exponential backoff for transient model failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// No retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-based): doubles each time,
    /// capped at `max_delay`
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

/// Everything needed to build an [`crate::assistant::Assistant`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantConfig {
    pub backend: BackendKind,
    /// Bound on a single model call
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Messages a conversation keeps
    pub history_limit: usize,
    /// Most recent messages sent with each question
    pub history_sent: usize,
    pub gemini: BackendSettings,
    pub openai_compatible: BackendSettings,
    pub ollama: BackendSettings,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Gemini,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            history_limit: 20,
            history_sent: 6,
            gemini: BackendSettings::new(
                "https://generativelanguage.googleapis.com",
                "gemini-2.5-flash",
            ),
            openai_compatible: BackendSettings::new("http://localhost:8080", "default"),
            ollama: BackendSettings::new("http://localhost:11434", "llama3.2"),
        }
    }
}

impl AssistantConfig {
    /// Load from the default override location (or embedded defaults), then
    /// apply environment variables
    pub fn load() -> Result<Self> {
        let mut config = load_config(default_config_path().as_deref())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from a specific override file, then apply environment variables
    pub fn with_config_path(path: &Path) -> Result<Self> {
        let mut config = load_config(Some(path))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse config from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Settings of the selected backend
    pub fn settings(&self) -> &BackendSettings {
        match self.backend {
            BackendKind::Gemini | BackendKind::Mock => &self.gemini,
            BackendKind::OpenAICompatible => &self.openai_compatible,
            BackendKind::Ollama => &self.ollama,
        }
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(backend) = get("AI_BACKEND") {
            self.backend = backend.parse()?;
        }

        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(host) = get("GEMINI_HOST") {
            self.gemini.host = host;
        }

        if let Some(host) = get("OPENAI_COMPATIBLE_HOST") {
            self.openai_compatible.host = host;
        }
        if let Some(model) = get("OPENAI_COMPATIBLE_MODEL") {
            self.openai_compatible.model = model;
        }
        if let Some(key) = get("OPENAI_COMPATIBLE_API_KEY") {
            self.openai_compatible.api_key = Some(key);
        }

        if let Some(host) = get("OLLAMA_HOST") {
            self.ollama.host = host;
        }
        if let Some(model) = get("OLLAMA_MODEL") {
            self.ollama.model = model;
        }

        if let Some(secs) = get("ASSISTANT_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid ASSISTANT_TIMEOUT_SECS: {}", secs)))?;
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = get("ASSISTANT_MAX_RETRIES") {
            self.retry.max_retries = retries.trim().parse().map_err(|_| {
                Error::Config(format!("Invalid ASSISTANT_MAX_RETRIES: {}", retries))
            })?;
        }

        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("fiscal").join("config").join("assistant.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<AssistantConfig> {
    let content = match override_path {
        Some(path) if path.exists() => fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    assistant: Option<RawAssistant>,
    retry: Option<RawRetry>,
    gemini: Option<RawBackend>,
    openai_compatible: Option<RawBackend>,
    ollama: Option<RawBackend>,
}

#[derive(Debug, Deserialize)]
struct RawAssistant {
    backend: Option<String>,
    timeout_secs: Option<u64>,
    history_limit: Option<usize>,
    history_sent: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawRetry {
    max_retries: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawBackend {
    host: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
}

impl RawBackend {
    fn apply(self, settings: &mut BackendSettings) {
        if let Some(host) = self.host {
            settings.host = host;
        }
        if let Some(model) = self.model {
            settings.model = model;
        }
        if self.api_key.is_some() {
            settings.api_key = self.api_key;
        }
    }
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<AssistantConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AssistantConfig::default();

    if let Some(assistant) = raw.assistant {
        if let Some(backend) = assistant.backend {
            config.backend = backend.parse()?;
        }
        if let Some(timeout) = assistant.timeout_secs {
            config.timeout = Duration::from_secs(timeout);
        }
        if let Some(limit) = assistant.history_limit {
            config.history_limit = limit;
        }
        if let Some(sent) = assistant.history_sent {
            config.history_sent = sent;
        }
    }

    if let Some(retry) = raw.retry {
        if let Some(max) = retry.max_retries {
            config.retry.max_retries = max;
        }
        if let Some(ms) = retry.base_delay_ms {
            config.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = retry.max_delay_ms {
            config.retry.max_delay = Duration::from_millis(ms);
        }
    }

    if let Some(gemini) = raw.gemini {
        gemini.apply(&mut config.gemini);
    }
    if let Some(openai) = raw.openai_compatible {
        openai.apply(&mut config.openai_compatible);
    }
    if let Some(ollama) = raw.ollama {
        ollama.apply(&mut config.ollama);
    }

    if config.history_sent > config.history_limit {
        return Err(Error::Config(format!(
            "history_sent ({}) exceeds history_limit ({})",
            config.history_sent, config.history_limit
        )));
    }

    Ok(config)
}
