//! Assistant handlers
//!
//! Conversation history lives with the client and is sent with each question.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use fiscal_core::{suggested_questions, Message};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, MAX_HISTORY_MESSAGES, MAX_QUESTION_LEN};

/// Query parameters for suggestions
#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    pub year: Option<i32>,
}

/// GET /api/suggestions?year= - Suggested questions
pub async fn get_suggestions(Query(params): Query<SuggestionsQuery>) -> Json<Vec<String>> {
    Json(suggested_questions(params.year))
}

/// Request body for asking a question
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub year: Option<i32>,
    /// Earlier messages of the conversation, oldest first
    #[serde(default)]
    pub history: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub year: Option<i32>,
}

/// POST /api/ask - Answer a question about the budget
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(AppError::bad_request("Question is empty"));
    }
    if question.chars().count() > MAX_QUESTION_LEN {
        return Err(AppError::bad_request(&format!(
            "Question exceeds {} characters",
            MAX_QUESTION_LEN
        )));
    }
    if req.history.len() > MAX_HISTORY_MESSAGES {
        return Err(AppError::bad_request(&format!(
            "History exceeds {} messages",
            MAX_HISTORY_MESSAGES
        )));
    }

    let assistant = state.assistant()?;
    let answer = assistant
        .answer(&state.store, question, req.year, &req.history)
        .await?;

    Ok(Json(AskResponse {
        answer,
        year: req.year,
    }))
}

#[derive(Debug, Serialize)]
pub struct SpeechAnalysisResponse {
    pub year: i32,
    pub analysis: String,
}

/// POST /api/years/:year/speech-analysis - Relate the budget speech to allocations
pub async fn analyze_speech(
    State(state): State<Arc<AppState>>,
    Path(year): Path<i32>,
) -> Result<Json<SpeechAnalysisResponse>, AppError> {
    let assistant = state.assistant()?;
    let analysis = assistant.analyze_speech(&state.store, year).await?;
    Ok(Json(SpeechAnalysisResponse { year, analysis }))
}
