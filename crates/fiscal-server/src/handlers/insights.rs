//! Insight and search handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use fiscal_core::{Insights, SearchResults};
use serde::Deserialize;

use crate::{AppError, AppState};

/// GET /api/insights - Growth, fiscal ratios, ministry consistency, key findings
pub async fn get_insights(State(state): State<Arc<AppState>>) -> Json<Insights> {
    Json(state.store.insights())
}

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /api/search?q= - Ministries, schemes and revenue sources matching a term
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResults>, AppError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(AppError::bad_request("Missing search query"));
    }
    Ok(Json(state.store.search(&query)))
}
