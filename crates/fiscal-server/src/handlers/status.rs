//! Health and status handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use fiscal_core::{AIBackend, LoadReport};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: DateTime<Utc>,
}

/// GET /api/health - Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        time: Utc::now(),
    })
}

#[derive(Debug, Serialize)]
pub struct AssistantInfo {
    pub configured: bool,
    pub backend: Option<&'static str>,
    pub model: Option<String>,
    /// Backend answered a health check just now
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub years: Vec<i32>,
    pub latest_year: Option<i32>,
    pub report: LoadReport,
    pub assistant: AssistantInfo,
}

/// GET /api/status - Loaded files, years and assistant availability
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let assistant = match state.assistant {
        Some(ref assistant) => AssistantInfo {
            configured: true,
            backend: Some(assistant.client().backend_name()),
            model: Some(assistant.client().model().to_string()),
            available: assistant.is_available().await,
        },
        None => AssistantInfo {
            configured: false,
            backend: None,
            model: None,
            available: false,
        },
    };

    Json(StatusResponse {
        years: state.store.years(),
        latest_year: state.store.latest_year(),
        report: state.report.clone(),
        assistant,
    })
}
