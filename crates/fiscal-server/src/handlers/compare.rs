//! Year comparison handler

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use fiscal_core::YearComparison;
use serde::Deserialize;

use crate::{AppError, AppState};

/// Most years accepted in one comparison
const MAX_COMPARE_YEARS: usize = 10;

/// Query parameters for comparing years
#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    /// Comma-separated years, e.g. `2022,2024`
    pub years: Option<String>,
}

/// Parse `2022,2024` into a set of years
pub fn parse_years(raw: &str) -> Result<BTreeSet<i32>, AppError> {
    let mut years = BTreeSet::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let year = part
            .parse::<i32>()
            .map_err(|_| AppError::bad_request(&format!("Invalid year: {}", part)))?;
        years.insert(year);
    }
    if years.is_empty() {
        return Err(AppError::bad_request("At least one year is required"));
    }
    if years.len() > MAX_COMPARE_YEARS {
        return Err(AppError::bad_request(&format!(
            "At most {} years can be compared",
            MAX_COMPARE_YEARS
        )));
    }
    Ok(years)
}

/// GET /api/compare?years=2022,2024 - Side-by-side view of several years
pub async fn compare_years(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompareQuery>,
) -> Result<Json<YearComparison>, AppError> {
    let raw = params
        .years
        .ok_or_else(|| AppError::bad_request("Missing 'years' parameter"))?;
    let years = parse_years(&raw)?;
    Ok(Json(state.store.compare_years(&years)?))
}
