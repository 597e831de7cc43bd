//! Per-year handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use fiscal_core::{RevenueExpenditureSplit, YearOverview, YearSummary};
use serde::Serialize;

use crate::{AppError, AppState};

#[derive(Debug, Serialize)]
pub struct YearsResponse {
    pub years: Vec<i32>,
    pub latest: Option<i32>,
}

/// GET /api/years - Loaded budget years, ascending
pub async fn list_years(State(state): State<Arc<AppState>>) -> Json<YearsResponse> {
    Json(YearsResponse {
        years: state.store.years(),
        latest: state.store.latest_year(),
    })
}

/// GET /api/years/:year/summary - Totals, deficit and GDP ratios
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(year): Path<i32>,
) -> Result<Json<YearSummary>, AppError> {
    Ok(Json(state.store.yearly_summary(year)?))
}

/// GET /api/years/:year/overview - Dashboard view of a year
pub async fn get_overview(
    State(state): State<Arc<AppState>>,
    Path(year): Path<i32>,
) -> Result<Json<YearOverview>, AppError> {
    Ok(Json(state.store.year_overview(year)?))
}

/// GET /api/years/:year/split - Revenue sources vs expenditure by ministry
pub async fn get_split(
    State(state): State<Arc<AppState>>,
    Path(year): Path<i32>,
) -> Result<Json<RevenueExpenditureSplit>, AppError> {
    Ok(Json(state.store.revenue_expenditure_split(year)?))
}
