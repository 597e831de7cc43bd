//! Domain models for Fiscal
//!
//! All amounts are held in crores after loading, whatever unit the source
//! file used.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// First budget year the dashboard covers
pub const MIN_YEAR: i32 = 2016;

/// Last budget year the dashboard covers
pub const MAX_YEAR: i32 = 2025;

/// Whether a year falls inside the supported budget range
pub fn is_supported_year(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

/// Unit an amount was reported in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyUnit {
    /// 10,000,000 rupees
    #[default]
    Crore,
    /// 100,000 rupees
    Lakh,
    Rupee,
}

impl CurrencyUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crore => "crore",
            Self::Lakh => "lakh",
            Self::Rupee => "rupee",
        }
    }

    /// Convert an amount in this unit to crores
    pub fn to_crores(&self, amount: f64) -> f64 {
        match self {
            Self::Crore => amount,
            Self::Lakh => amount / 100.0,
            Self::Rupee => amount / 10_000_000.0,
        }
    }
}

impl std::str::FromStr for CurrencyUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crore" | "crores" | "cr" | "inr crore" => Ok(Self::Crore),
            "lakh" | "lakhs" | "lac" => Ok(Self::Lakh),
            "rupee" | "rupees" | "inr" | "rs" => Ok(Self::Rupee),
            _ => Err(format!("Unknown currency unit: {}", s)),
        }
    }
}

impl std::fmt::Display for CurrencyUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One budget line: a (year, ministry, category) triple with its amounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub year: i32,
    pub ministry: String,
    pub category: String,
    /// Expenditure in crores
    pub expenditure: f64,
    /// Revenue in crores
    pub revenue: f64,
    /// Unit the amounts were reported in
    pub unit: CurrencyUnit,
}

/// Macro-economic indicators for a budget year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroIndicators {
    pub year: i32,
    /// Nominal GDP in crores
    pub gdp_nominal: Option<f64>,
    /// Fiscal deficit as reported, in percent of GDP
    pub fiscal_deficit_pct: Option<f64>,
}

/// A revenue source with its amount per year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSourceSeries {
    pub source: String,
    pub amounts: BTreeMap<i32, f64>,
}

/// A grant or scheme allocation under a ministry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeAllocation {
    pub year: i32,
    pub ministry: String,
    pub scheme: String,
    pub amount: f64,
    /// Revenue or capital expenditure
    pub expenditure_type: Option<String>,
    /// BE, RE or Actual
    pub estimate_type: Option<String>,
}

/// Budget speech summary for a year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSummary {
    pub year: i32,
    pub summary: String,
}

/// Aggregate figures for one budget year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: i32,
    pub total_expenditure: f64,
    pub total_revenue: f64,
    /// Expenditure minus revenue
    pub deficit: f64,
    pub expenditure_to_gdp_pct: Option<f64>,
    pub revenue_to_gdp_pct: Option<f64>,
    /// Fiscal deficit as reported in the macro table
    pub fiscal_deficit_pct: Option<f64>,
    pub ministry_count: usize,
    pub record_count: usize,
}

/// Amounts for one category within a ministry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAmount {
    pub category: String,
    pub expenditure: f64,
    pub revenue: f64,
}

/// A single (year, amount) point of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearAmount {
    pub year: i32,
    pub amount: f64,
}

/// Ministry figures for a year, with its history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinistryDetail {
    pub year: i32,
    pub ministry: String,
    pub expenditure: f64,
    pub revenue: f64,
    /// 1 = largest expenditure in the year
    pub rank: usize,
    /// Share of the year's total expenditure
    pub share_pct: f64,
    pub categories: Vec<CategoryAmount>,
    /// Expenditure for every loaded year the ministry appears in
    pub history: Vec<YearAmount>,
    pub total_all_years: f64,
    pub schemes: Vec<SchemeAllocation>,
}

/// A ministry's allocation within a year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinistryAllocation {
    pub ministry: String,
    pub amount: f64,
    pub rank: usize,
    pub percentage: f64,
}

/// A revenue source's share of a year's revenue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueShare {
    pub source: String,
    pub amount: f64,
    pub percentage: f64,
}

/// Where a year's money came from and where it went
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueExpenditureSplit {
    pub year: i32,
    pub total_revenue: f64,
    pub total_expenditure: f64,
    pub deficit: f64,
    pub revenue_sources: Vec<RevenueShare>,
    pub expenditure_by_ministry: Vec<MinistryAllocation>,
}

/// Change between two consecutive compared years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearChange {
    pub from_year: i32,
    pub to_year: i32,
    pub expenditure_change_pct: Option<f64>,
    pub revenue_change_pct: Option<f64>,
    pub deficit_change: f64,
}

/// A named series across years (a ministry or a revenue source)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub name: String,
    pub points: Vec<YearAmount>,
}

/// Side-by-side view of several years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearComparison {
    /// Requested years, ascending
    pub years: Vec<i32>,
    /// One summary per requested year, ascending
    pub summaries: Vec<YearSummary>,
    pub changes: Vec<YearChange>,
    pub ministry_trends: Vec<Trend>,
    pub revenue_trends: Vec<Trend>,
}

/// Direction of the fiscal deficit against the previous year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeficitTrend {
    Improving,
    Deteriorating,
    Stable,
    NoTrendData,
}

impl DeficitTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Deteriorating => "deteriorating",
            Self::Stable => "stable",
            Self::NoTrendData => "no trend data",
        }
    }
}

impl std::fmt::Display for DeficitTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fiscal health indicators for a year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalHealth {
    pub expenditure_to_gdp_pct: Option<f64>,
    pub revenue_to_gdp_pct: Option<f64>,
    pub fiscal_deficit_pct: Option<f64>,
    pub deficit_trend: DeficitTrend,
}

/// Everything the dashboard shows for a selected year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearOverview {
    pub summary: YearSummary,
    pub top_ministries: Vec<MinistryAllocation>,
    pub revenue_breakdown: Vec<RevenueShare>,
    pub key_schemes: Vec<SchemeAllocation>,
    pub speech_summary: Option<String>,
    pub fiscal_health: FiscalHealth,
}

/// A ministry matching a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinistryHit {
    pub name: String,
    pub latest_year: i32,
    pub latest_allocation: f64,
    pub rank: usize,
}

impl MinistryHit {
    /// Most recent year first, then by allocation rank within that year
    pub fn by_latest_rank(a: &Self, b: &Self) -> std::cmp::Ordering {
        b.latest_year
            .cmp(&a.latest_year)
            .then(a.rank.cmp(&b.rank))
            .then_with(|| a.name.cmp(&b.name))
    }
}

/// A revenue source matching a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueHit {
    pub source: String,
    pub latest_year: Option<i32>,
    pub latest_amount: Option<f64>,
}

/// Search hits across the loaded tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub ministries: Vec<MinistryHit>,
    pub schemes: Vec<SchemeAllocation>,
    pub revenue_sources: Vec<RevenueHit>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.ministries.is_empty() && self.schemes.is_empty() && self.revenue_sources.is_empty()
    }

    /// Merge another result set, skipping entries already present
    pub fn merge(&mut self, other: SearchResults) {
        for hit in other.ministries {
            if !self.ministries.iter().any(|m| m.name == hit.name) {
                self.ministries.push(hit);
            }
        }
        self.ministries.sort_by(MinistryHit::by_latest_rank);
        for scheme in other.schemes {
            if !self.schemes.contains(&scheme) {
                self.schemes.push(scheme);
            }
        }
        for hit in other.revenue_sources {
            if !self.revenue_sources.iter().any(|r| r.source == hit.source) {
                self.revenue_sources.push(hit);
            }
        }
    }
}

/// Percentage of `part` in `whole`, 0 when the whole is not positive
pub(crate) fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_unit_parse() {
        assert_eq!("Crores".parse::<CurrencyUnit>(), Ok(CurrencyUnit::Crore));
        assert_eq!(" lakh ".parse::<CurrencyUnit>(), Ok(CurrencyUnit::Lakh));
        assert_eq!("INR".parse::<CurrencyUnit>(), Ok(CurrencyUnit::Rupee));
        assert!("dollars".parse::<CurrencyUnit>().is_err());
    }

    #[test]
    fn test_currency_unit_to_crores() {
        assert_eq!(CurrencyUnit::Crore.to_crores(12.5), 12.5);
        assert_eq!(CurrencyUnit::Lakh.to_crores(250.0), 2.5);
        assert_eq!(CurrencyUnit::Rupee.to_crores(30_000_000.0), 3.0);
    }

    #[test]
    fn test_supported_years() {
        assert!(is_supported_year(2016));
        assert!(is_supported_year(2025));
        assert!(!is_supported_year(2015));
        assert!(!is_supported_year(2026));
    }

    #[test]
    fn test_search_results_merge_dedupes() {
        let hit = MinistryHit {
            name: "Ministry of Health".into(),
            latest_year: 2025,
            latest_allocation: 90.0,
            rank: 2,
        };
        let mut a = SearchResults {
            ministries: vec![hit.clone()],
            ..Default::default()
        };
        let b = SearchResults {
            ministries: vec![hit],
            revenue_sources: vec![RevenueHit {
                source: "Income Tax".into(),
                latest_year: Some(2025),
                latest_amount: Some(10.0),
            }],
            ..Default::default()
        };
        a.merge(b);
        assert_eq!(a.ministries.len(), 1);
        assert_eq!(a.revenue_sources.len(), 1);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_percent_of_zero_whole() {
        assert_eq!(percent_of(5.0, 0.0), 0.0);
        assert_eq!(percent_of(25.0, 100.0), 25.0);
    }
}
