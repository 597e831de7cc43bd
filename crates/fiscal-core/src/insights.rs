//! Cross-year analysis of the loaded budget
//!
//! Computes revenue growth, expenditure patterns, fiscal ratios and
//! per-ministry allocation statistics over every loaded year, and condenses
//! them into short key-finding sentences for the dashboard and the assistant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::YearAmount;
use crate::store::{pct_change, BudgetStore};

/// Points the early and recent deficit averages must differ by before the
/// fiscal trend counts as a change
const FISCAL_TREND_BAND: f64 = 0.5;

/// Years averaged at each end of the period for the fiscal trend
const FISCAL_TREND_WINDOW: usize = 3;

const TOP_GROWING: usize = 10;
const DECLINING: usize = 5;
const TOP_STATS: usize = 10;

/// Year-over-year growth of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub year: i32,
    pub growth_rate: f64,
}

/// Growth of one revenue source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueGrowth {
    pub source: String,
    pub growth_rates: Vec<GrowthPoint>,
    /// Mean of the year-over-year rates, 0 when there are none
    pub avg_growth: f64,
}

/// Change in a ministry's expenditure between the first and last loaded year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinistryGrowth {
    pub ministry: String,
    pub from_year: i32,
    pub to_year: i32,
    pub growth_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenditurePatterns {
    pub yearly_totals: Vec<YearAmount>,
    /// Largest growth first
    pub top_growing: Vec<MinistryGrowth>,
    /// Largest decline first
    pub declining: Vec<MinistryGrowth>,
}

/// Fiscal ratios for one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalYearRatio {
    pub year: i32,
    pub fiscal_deficit_pct: Option<f64>,
    pub expenditure_to_gdp_pct: Option<f64>,
    pub revenue_to_gdp_pct: Option<f64>,
}

/// Direction of the reported fiscal deficit over the loaded period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiscalTrend {
    Improving,
    Deteriorating,
    Stable,
    InsufficientData,
}

impl FiscalTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "Improving fiscal health",
            Self::Deteriorating => "Deteriorating fiscal health",
            Self::Stable => "Stable fiscal health",
            Self::InsufficientData => "Insufficient data",
        }
    }
}

impl std::fmt::Display for FiscalTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalAnalysis {
    pub yearly: Vec<FiscalYearRatio>,
    pub average_deficit_pct: Option<f64>,
    pub average_expenditure_to_gdp_pct: Option<f64>,
    pub trend: FiscalTrend,
}

/// Allocation statistics for one ministry across the loaded years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinistryStats {
    pub ministry: String,
    pub years: usize,
    pub average: f64,
    pub total: f64,
    /// Population variance of the yearly allocations
    pub variance: f64,
    /// `1 / (1 + variance / average)`, 0 when the average is not positive
    pub consistency_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinistryPerformance {
    pub top_by_total: Vec<MinistryStats>,
    pub most_consistent: Vec<MinistryStats>,
}

/// Everything [`BudgetStore::insights`] computes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub revenue_growth: Vec<RevenueGrowth>,
    pub expenditure_patterns: ExpenditurePatterns,
    pub fiscal_analysis: FiscalAnalysis,
    pub ministry_performance: MinistryPerformance,
    pub key_findings: Vec<String>,
}

pub(crate) fn analyze(store: &BudgetStore) -> Insights {
    let revenue_growth = revenue_growth(store);
    let expenditure_patterns = expenditure_patterns(store);
    let fiscal_analysis = fiscal_analysis(store);
    let ministry_performance = ministry_performance(store);
    let key_findings = key_findings(store, &expenditure_patterns, &fiscal_analysis);

    Insights {
        revenue_growth,
        expenditure_patterns,
        fiscal_analysis,
        ministry_performance,
        key_findings,
    }
}

fn revenue_growth(store: &BudgetStore) -> Vec<RevenueGrowth> {
    store
        .revenue_sources()
        .iter()
        .map(|series| {
            let points: Vec<(&i32, &f64)> = series.amounts.iter().collect();
            let growth_rates: Vec<GrowthPoint> = points
                .windows(2)
                .filter_map(|pair| {
                    let (_, &previous) = pair[0];
                    let (&year, &current) = pair[1];
                    pct_change(previous, current).map(|growth_rate| GrowthPoint { year, growth_rate })
                })
                .collect();

            let avg_growth = mean(growth_rates.iter().map(|g| g.growth_rate)).unwrap_or(0.0);

            RevenueGrowth {
                source: series.source.clone(),
                growth_rates,
                avg_growth,
            }
        })
        .collect()
}

/// Expenditure per ministry per year
fn ministry_series(store: &BudgetStore) -> BTreeMap<&str, BTreeMap<i32, f64>> {
    let mut series: BTreeMap<&str, BTreeMap<i32, f64>> = BTreeMap::new();
    for record in store.records() {
        *series
            .entry(record.ministry.as_str())
            .or_default()
            .entry(record.year)
            .or_default() += record.expenditure;
    }
    series
}

fn expenditure_patterns(store: &BudgetStore) -> ExpenditurePatterns {
    let yearly_totals = store
        .years()
        .into_iter()
        .filter_map(|year| {
            store.yearly_summary(year).ok().map(|s| YearAmount {
                year,
                amount: s.total_expenditure,
            })
        })
        .collect();

    let years = store.years();
    let mut growth: Vec<MinistryGrowth> = match (years.first(), years.last()) {
        (Some(&first), Some(&last)) if first < last => ministry_series(store)
            .into_iter()
            .filter_map(|(ministry, amounts)| {
                let start = *amounts.get(&first)?;
                let end = *amounts.get(&last)?;
                pct_change(start, end).map(|growth_pct| MinistryGrowth {
                    ministry: ministry.to_string(),
                    from_year: first,
                    to_year: last,
                    growth_pct,
                })
            })
            .collect(),
        _ => Vec::new(),
    };
    growth.sort_by(|a, b| {
        b.growth_pct
            .total_cmp(&a.growth_pct)
            .then_with(|| a.ministry.cmp(&b.ministry))
    });

    let mut declining: Vec<MinistryGrowth> = growth
        .iter()
        .rev()
        .filter(|g| g.growth_pct < 0.0)
        .take(DECLINING)
        .cloned()
        .collect();
    declining.sort_by(|a, b| a.growth_pct.total_cmp(&b.growth_pct));

    growth.truncate(TOP_GROWING);

    ExpenditurePatterns {
        yearly_totals,
        top_growing: growth,
        declining,
    }
}

fn fiscal_analysis(store: &BudgetStore) -> FiscalAnalysis {
    let yearly: Vec<FiscalYearRatio> = store
        .years()
        .into_iter()
        .filter_map(|year| store.yearly_summary(year).ok())
        .map(|s| FiscalYearRatio {
            year: s.year,
            fiscal_deficit_pct: s.fiscal_deficit_pct,
            expenditure_to_gdp_pct: s.expenditure_to_gdp_pct,
            revenue_to_gdp_pct: s.revenue_to_gdp_pct,
        })
        .collect();

    let deficits: Vec<f64> = yearly.iter().filter_map(|y| y.fiscal_deficit_pct).collect();

    FiscalAnalysis {
        average_deficit_pct: mean(deficits.iter().copied()),
        average_expenditure_to_gdp_pct: mean(yearly.iter().filter_map(|y| y.expenditure_to_gdp_pct)),
        trend: classify_fiscal_trend(&deficits),
        yearly,
    }
}

/// Compare the average deficit of the first and last few years
fn classify_fiscal_trend(deficits: &[f64]) -> FiscalTrend {
    if deficits.len() < 2 {
        return FiscalTrend::InsufficientData;
    }

    let window = FISCAL_TREND_WINDOW.min(deficits.len());
    let early = mean(deficits[..window].iter().copied()).unwrap_or(0.0);
    let recent = mean(deficits[deficits.len() - window..].iter().copied()).unwrap_or(0.0);

    if recent < early - FISCAL_TREND_BAND {
        FiscalTrend::Improving
    } else if recent > early + FISCAL_TREND_BAND {
        FiscalTrend::Deteriorating
    } else {
        FiscalTrend::Stable
    }
}

fn ministry_performance(store: &BudgetStore) -> MinistryPerformance {
    let stats: Vec<MinistryStats> = ministry_series(store)
        .into_iter()
        .map(|(ministry, amounts)| {
            let values: Vec<f64> = amounts.values().copied().collect();
            let total: f64 = values.iter().sum();
            let average = total / values.len() as f64;
            let variance =
                values.iter().map(|v| (v - average).powi(2)).sum::<f64>() / values.len() as f64;
            let consistency_score = if average > 0.0 {
                1.0 / (1.0 + variance / average)
            } else {
                0.0
            };

            MinistryStats {
                ministry: ministry.to_string(),
                years: values.len(),
                average,
                total,
                variance,
                consistency_score,
            }
        })
        .collect();

    let mut top_by_total = stats.clone();
    top_by_total.sort_by(|a, b| b.total.total_cmp(&a.total));
    top_by_total.truncate(TOP_STATS);

    let mut most_consistent = stats;
    most_consistent.sort_by(|a, b| b.consistency_score.total_cmp(&a.consistency_score));
    most_consistent.truncate(TOP_STATS);

    MinistryPerformance {
        top_by_total,
        most_consistent,
    }
}

fn key_findings(
    store: &BudgetStore,
    patterns: &ExpenditurePatterns,
    fiscal: &FiscalAnalysis,
) -> Vec<String> {
    let mut findings = Vec::new();

    // Fastest growing revenue source over its whole series
    let revenue = store
        .revenue_sources()
        .iter()
        .filter_map(|series| {
            let (&first_year, &first) = series.amounts.iter().find(|(_, a)| **a > 0.0)?;
            let (&last_year, &last) = series.amounts.iter().next_back()?;
            (last_year > first_year)
                .then(|| pct_change(first, last))
                .flatten()
                .map(|g| (series.source.as_str(), first_year, last_year, g))
        })
        .max_by(|a, b| a.3.total_cmp(&b.3));
    if let Some((source, from, to, growth)) = revenue {
        findings.push(format!(
            "{} revenue has grown by {:.1}% between {} and {}",
            source, growth, from, to
        ));
    }

    if let Some(top) = patterns.top_growing.first().filter(|g| g.growth_pct > 0.0) {
        findings.push(format!(
            "{} spending has increased by {:.1}% between {} and {}",
            top.ministry, top.growth_pct, top.from_year, top.to_year
        ));
    }

    if let Some((year, pct)) = fiscal
        .yearly
        .iter()
        .rev()
        .find_map(|y| y.fiscal_deficit_pct.map(|p| (y.year, p)))
    {
        findings.push(format!(
            "The fiscal deficit for {} is {:.1}% of GDP",
            year, pct
        ));
    }

    let leaders: Vec<(i32, String)> = store
        .years()
        .into_iter()
        .filter_map(|year| {
            store
                .ministries(year)
                .ok()?
                .into_iter()
                .next()
                .map(|m| (year, m.ministry))
        })
        .collect();
    if let Some((latest, leader)) = leaders.last() {
        if leaders.len() > 1 && leaders.iter().all(|(_, m)| m == leader) {
            findings.push(format!(
                "{} remains the largest spender across all loaded years",
                leader
            ));
        } else {
            findings.push(format!("{} was the largest spender in {}", leader, latest));
        }
    }

    if fiscal.trend != FiscalTrend::InsufficientData {
        findings.push(format!(
            "Overall trend of the deficit: {}",
            fiscal.trend.as_str().to_lowercase()
        ));
    }

    findings
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}
