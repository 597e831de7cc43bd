//! Assistant façade
//!
//! Builds the budget context for a question, renders the prompt and sends it
//! to the configured model backend. Every model call is bounded by the
//! configured timeout; transient failures are retried per [`RetryPolicy`].
//! Whatever still fails reaches the caller as `AssistantUnavailable`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::ai::{AIBackend, AIClient, CompletionRequest, Message};
use crate::config::{AssistantConfig, RetryPolicy};
use crate::context::ContextAssembler;
use crate::error::{Error, Result};
use crate::prompts::{PromptId, PromptLibrary};
use crate::store::BudgetStore;

/// Messages included when summarizing a conversation
const SUMMARY_MESSAGES: usize = 10;

const BASE_QUESTIONS: &[&str] = &[
    "What are the major sources of government revenue?",
    "Which ministry receives the highest budget allocation?",
    "How has the fiscal deficit changed over the years?",
    "What are the key infrastructure spending priorities?",
    "Compare defence spending with education spending",
    "What are the major welfare schemes and their allocations?",
    "How has GST revenue performed since its introduction?",
    "What are the trends in capital vs revenue expenditure?",
];

/// Questions to offer the user, year-specific ones first when a year is
/// selected
pub fn suggested_questions(year: Option<i32>) -> Vec<String> {
    match year {
        Some(year) => {
            let mut questions = vec![
                format!("What were the budget highlights for {}?", year),
                format!("Which schemes received major funding in {}?", year),
                format!("How did the fiscal position change in {}?", year),
                format!("What were the revenue growth drivers in {}?", year),
            ];
            questions.extend(BASE_QUESTIONS.iter().take(4).map(|q| q.to_string()));
            questions
        }
        None => BASE_QUESTIONS.iter().map(|q| q.to_string()).collect(),
    }
}

/// Model-backed question answering over a [`BudgetStore`]
#[derive(Clone)]
pub struct Assistant {
    client: AIClient,
    timeout: Duration,
    retry: RetryPolicy,
    history_sent: usize,
    history_limit: usize,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl Assistant {
    pub fn new(client: AIClient, config: &AssistantConfig) -> Self {
        Self {
            client,
            timeout: config.timeout,
            retry: config.retry,
            history_sent: config.history_sent,
            history_limit: config.history_limit,
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Build the assistant and its backend from configuration
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        let client = AIClient::from_config(config)?;
        info!(
            "Assistant using {} backend ({} at {})",
            client.backend_name(),
            client.model(),
            client.host()
        );
        Ok(Self::new(client, config))
    }

    /// Load configuration and build the assistant
    ///
    /// Returns None (with a warning) if no backend can be configured.
    pub fn from_env() -> Option<Self> {
        match AssistantConfig::load().and_then(|c| Self::from_config(&c)) {
            Ok(assistant) => Some(assistant),
            Err(e) => {
                warn!("Assistant not configured: {}", e);
                None
            }
        }
    }

    /// Use a specific prompt library (e.g. embedded prompts only)
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(RwLock::new(prompts));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn client(&self) -> &AIClient {
        &self.client
    }

    /// A fresh conversation sized by this assistant's history limit
    pub fn conversation(&self) -> Conversation {
        Conversation::new(self.history_limit)
    }

    /// Check if the backend is reachable
    pub async fn is_available(&self) -> bool {
        self.client.health_check().await
    }

    /// Answer a question about the budget
    ///
    /// The last `history_sent` messages of `history` are sent along with the
    /// question. The answer is returned exactly as the model produced it.
    pub async fn answer(
        &self,
        store: &BudgetStore,
        question: &str,
        year: Option<i32>,
        history: &[Message],
    ) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidData("Question is empty".into()));
        }

        let context = ContextAssembler::new(store).context_for(question, year);
        debug!("Context for question: {} bytes", context.len());

        let year_text = year.map(|y| y.to_string()).unwrap_or_default();
        let mut vars = HashMap::new();
        vars.insert("question", question);
        vars.insert("year", year_text.as_str());
        vars.insert("context", context.as_str());

        let skip = history.len().saturating_sub(self.history_sent);
        let request = self
            .render(PromptId::AnswerQuestion, &vars)?
            .with_history(history[skip..].to_vec());

        self.complete(&request).await
    }

    /// Ask within a conversation, recording both sides on success
    pub async fn chat(
        &self,
        store: &BudgetStore,
        conversation: &mut Conversation,
        question: &str,
        year: Option<i32>,
    ) -> Result<String> {
        let answer = self
            .answer(store, question, year, conversation.messages())
            .await?;
        conversation.push(Message::user(question.trim()));
        conversation.push(Message::assistant(answer.clone()));
        Ok(answer)
    }

    /// Relate a year's budget speech to its allocations
    pub async fn analyze_speech(&self, store: &BudgetStore, year: i32) -> Result<String> {
        let speech = store
            .speech(year)
            .ok_or_else(|| Error::NotFound(format!("No budget speech data for {}", year)))?;
        let context = ContextAssembler::new(store).for_year(year)?;

        let year_text = year.to_string();
        let mut vars = HashMap::new();
        vars.insert("year", year_text.as_str());
        vars.insert("speech", speech);
        vars.insert("context", context.as_str());

        let request = self.render(PromptId::AnalyzeSpeech, &vars)?;
        self.complete(&request).await
    }

    /// Summarize the most recent messages of a conversation
    pub async fn summarize(&self, conversation: &Conversation) -> Result<String> {
        if conversation.is_empty() {
            return Err(Error::InvalidData("No conversation history available".into()));
        }

        let messages = conversation.messages();
        let skip = messages.len().saturating_sub(SUMMARY_MESSAGES);
        let transcript = messages[skip..]
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = HashMap::new();
        vars.insert("conversation", transcript.as_str());

        let request = self.render(PromptId::SummarizeConversation, &vars)?;
        self.complete(&request).await
    }

    fn render(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<CompletionRequest> {
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        let template = prompts.get(id)?;

        let mut request = CompletionRequest::new(template.render_user(vars));
        if let Some(system) = template.system_section() {
            request = request.with_system(system.trim());
        }
        Ok(request)
    }

    /// One model call with timeout and retries
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, self.client.complete(request))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(Error::AssistantUnavailable(format!(
                    "model call timed out after {:?}",
                    self.timeout
                ))),
            };

            let err = match result {
                Ok(text) if text.is_empty() => {
                    return Err(Error::AssistantUnavailable("model returned no text".into()));
                }
                Ok(text) => return Ok(text),
                Err(e) => e,
            };

            if err.is_transient() && attempt < self.retry.max_retries {
                let delay = self.retry.delay(attempt);
                warn!(
                    "Model call failed (attempt {}): {}; retrying in {:?}",
                    attempt + 1,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            warn!("Model call failed (attempt {}): {}", attempt + 1, err);
            return Err(match err {
                Error::AssistantUnavailable(_) => err,
                other => Error::AssistantUnavailable(other.to_string()),
            });
        }
    }
}

/// Bounded chat history, oldest messages dropped first
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    limit: usize,
}

impl Conversation {
    pub fn new(limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        if self.messages.len() > self.limit {
            let excess = self.messages.len() - self.limit;
            self.messages.drain(..excess);
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
