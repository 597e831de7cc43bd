//! Ministry handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use fiscal_core::{MinistryAllocation, MinistryDetail};
use serde::Deserialize;

use crate::{AppError, AppState};

/// Query parameters for listing ministries
#[derive(Debug, Deserialize)]
pub struct MinistriesQuery {
    /// Maximum number of ministries (all when absent)
    pub limit: Option<usize>,
}

/// GET /api/years/:year/ministries - Ministries ranked by expenditure
pub async fn list_ministries(
    State(state): State<Arc<AppState>>,
    Path(year): Path<i32>,
    Query(params): Query<MinistriesQuery>,
) -> Result<Json<Vec<MinistryAllocation>>, AppError> {
    let mut ministries = state.store.ministries(year)?;
    if let Some(limit) = params.limit {
        ministries.truncate(limit);
    }
    Ok(Json(ministries))
}

/// GET /api/years/:year/ministries/:name - One ministry's detail
///
/// The name matches case-insensitively, exact names first, then partial.
pub async fn get_ministry(
    State(state): State<Arc<AppState>>,
    Path((year, name)): Path<(i32, String)>,
) -> Result<Json<MinistryDetail>, AppError> {
    Ok(Json(state.store.ministry_detail(year, &name)?))
}
