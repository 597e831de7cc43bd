//! Query layer over the loaded budget tables
//!
//! [`BudgetStore`] is immutable once built. Every query is a pure function of
//! the loaded tables, so one store can be shared behind an `Arc` by the CLI
//! and every server request.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::insights::{self, Insights};
use crate::load::{load_dir, LoadOptions, LoadReport, Tables};
use crate::models::{
    percent_of, BudgetRecord, CategoryAmount, DeficitTrend, FiscalHealth, MacroIndicators,
    MinistryAllocation, MinistryDetail, MinistryHit, RevenueExpenditureSplit, RevenueHit,
    RevenueShare, RevenueSourceSeries, SchemeAllocation, SearchResults, Trend, YearAmount,
    YearChange, YearComparison, YearOverview, YearSummary,
};

/// How many ministries the overview and comparison trends cover
pub const TOP_MINISTRIES: usize = 10;

/// How many schemes the overview lists
pub const KEY_SCHEMES: usize = 10;

/// Read-only budget tables with query operations
#[derive(Debug, Default)]
pub struct BudgetStore {
    records: Vec<BudgetRecord>,
    macros: BTreeMap<i32, MacroIndicators>,
    revenue_sources: Vec<RevenueSourceSeries>,
    schemes: Vec<SchemeAllocation>,
    speeches: BTreeMap<i32, String>,
    /// Record indices per year
    by_year: BTreeMap<i32, Vec<usize>>,
}

/// Per-ministry totals within one year
#[derive(Debug, Clone)]
pub(crate) struct MinistryTotals {
    pub name: String,
    pub expenditure: f64,
    pub revenue: f64,
}

impl BudgetStore {
    /// Load a data directory with default options
    pub fn load(dir: &Path) -> Result<(Self, LoadReport)> {
        Self::load_with(dir, &LoadOptions::default())
    }

    /// Load a data directory
    pub fn load_with(dir: &Path, options: &LoadOptions) -> Result<(Self, LoadReport)> {
        let (tables, report) = load_dir(dir, options)?;
        Ok((Self::from_tables(tables), report))
    }

    /// Build a store from already parsed tables
    pub fn from_tables(tables: Tables) -> Self {
        let mut by_year: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (i, record) in tables.records.iter().enumerate() {
            by_year.entry(record.year).or_default().push(i);
        }

        let macros = tables.macros.into_iter().map(|m| (m.year, m)).collect();
        let speeches = tables
            .speeches
            .into_iter()
            .map(|s| (s.year, s.summary))
            .collect();

        debug!(
            records = tables.records.len(),
            years = by_year.len(),
            "Built budget store"
        );

        Self {
            records: tables.records,
            macros,
            revenue_sources: tables.revenue_sources,
            schemes: tables.schemes,
            speeches,
            by_year,
        }
    }

    /// Build a store holding only budget records
    pub fn from_records(records: Vec<BudgetRecord>) -> Self {
        Self::from_tables(Tables {
            records,
            ..Default::default()
        })
    }

    /// Years with at least one budget record, ascending
    pub fn years(&self) -> Vec<i32> {
        self.by_year.keys().copied().collect()
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.by_year.contains_key(&year)
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.by_year.keys().next_back().copied()
    }

    pub fn records(&self) -> &[BudgetRecord] {
        &self.records
    }

    pub fn revenue_sources(&self) -> &[RevenueSourceSeries] {
        &self.revenue_sources
    }

    pub fn schemes(&self) -> &[SchemeAllocation] {
        &self.schemes
    }

    pub fn macro_indicators(&self, year: i32) -> Option<&MacroIndicators> {
        self.macros.get(&year)
    }

    pub fn speech(&self, year: i32) -> Option<&str> {
        self.speeches.get(&year).map(String::as_str)
    }

    fn year_records(&self, year: i32) -> Result<impl Iterator<Item = &BudgetRecord> + '_> {
        let indices = self
            .by_year
            .get(&year)
            .ok_or_else(|| Error::NotFound(format!("No budget data for year {}", year)))?;
        Ok(indices.iter().map(move |&i| &self.records[i]))
    }

    /// Totals per ministry for a year, largest expenditure first
    pub(crate) fn ministry_totals(&self, year: i32) -> Result<Vec<MinistryTotals>> {
        let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
        for record in self.year_records(year)? {
            let entry = totals.entry(record.ministry.as_str()).or_default();
            entry.0 += record.expenditure;
            entry.1 += record.revenue;
        }

        let mut totals: Vec<MinistryTotals> = totals
            .into_iter()
            .map(|(name, (expenditure, revenue))| MinistryTotals {
                name: name.to_string(),
                expenditure,
                revenue,
            })
            .collect();
        totals.sort_by(|a, b| {
            b.expenditure
                .total_cmp(&a.expenditure)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(totals)
    }

    /// Aggregate figures for one year
    pub fn yearly_summary(&self, year: i32) -> Result<YearSummary> {
        let mut total_expenditure = 0.0;
        let mut total_revenue = 0.0;
        let mut ministries = BTreeSet::new();
        let mut record_count = 0;

        for record in self.year_records(year)? {
            total_expenditure += record.expenditure;
            total_revenue += record.revenue;
            ministries.insert(record.ministry.as_str());
            record_count += 1;
        }

        let indicators = self.macros.get(&year);
        let gdp = indicators.and_then(|m| m.gdp_nominal).filter(|g| *g > 0.0);

        Ok(YearSummary {
            year,
            total_expenditure,
            total_revenue,
            deficit: total_expenditure - total_revenue,
            expenditure_to_gdp_pct: gdp.map(|g| total_expenditure / g * 100.0),
            revenue_to_gdp_pct: gdp.map(|g| total_revenue / g * 100.0),
            fiscal_deficit_pct: indicators.and_then(|m| m.fiscal_deficit_pct),
            ministry_count: ministries.len(),
            record_count,
        })
    }

    /// Ministries for a year with rank and share of expenditure
    pub fn ministries(&self, year: i32) -> Result<Vec<MinistryAllocation>> {
        let totals = self.ministry_totals(year)?;
        let year_total: f64 = totals.iter().map(|t| t.expenditure).sum();

        Ok(totals
            .into_iter()
            .enumerate()
            .map(|(i, t)| MinistryAllocation {
                percentage: percent_of(t.expenditure, year_total),
                ministry: t.name,
                amount: t.expenditure,
                rank: i + 1,
            })
            .collect())
    }

    /// Resolve a user-supplied ministry name against one year's ministries
    ///
    /// Exact case-insensitive match wins; otherwise the alphabetically first
    /// name containing the query.
    fn resolve_ministry<'a>(&self, totals: &'a [MinistryTotals], query: &str) -> Option<&'a str> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        if let Some(t) = totals.iter().find(|t| t.name.to_lowercase() == query) {
            return Some(t.name.as_str());
        }

        totals
            .iter()
            .filter(|t| t.name.to_lowercase().contains(&query))
            .map(|t| t.name.as_str())
            .min()
    }

    /// One ministry in one year, with category breakdown and history
    pub fn ministry_detail(&self, year: i32, ministry: &str) -> Result<MinistryDetail> {
        let totals = self.ministry_totals(year)?;
        let name = self
            .resolve_ministry(&totals, ministry)
            .ok_or_else(|| {
                Error::NotFound(format!("Ministry '{}' not found in {}", ministry.trim(), year))
            })?
            .to_string();

        let year_total: f64 = totals.iter().map(|t| t.expenditure).sum();
        let (rank, current) = totals
            .iter()
            .enumerate()
            .find(|(_, t)| t.name == name)
            .map(|(i, t)| (i + 1, t))
            .ok_or_else(|| Error::NotFound(format!("Ministry '{}' not found in {}", name, year)))?;

        let mut categories: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
        for record in self.year_records(year)?.filter(|r| r.ministry == name) {
            let entry = categories.entry(record.category.as_str()).or_default();
            entry.0 += record.expenditure;
            entry.1 += record.revenue;
        }
        let mut categories: Vec<CategoryAmount> = categories
            .into_iter()
            .map(|(category, (expenditure, revenue))| CategoryAmount {
                category: category.to_string(),
                expenditure,
                revenue,
            })
            .collect();
        categories.sort_by(|a, b| b.expenditure.total_cmp(&a.expenditure));

        let history = self.ministry_history(&name, None);
        let total_all_years = history.iter().map(|p| p.amount).sum();

        let mut schemes: Vec<SchemeAllocation> = self
            .schemes
            .iter()
            .filter(|s| s.year == year && ministry_matches(&s.ministry, &name))
            .cloned()
            .collect();
        schemes.sort_by(|a, b| b.amount.total_cmp(&a.amount));

        Ok(MinistryDetail {
            year,
            expenditure: current.expenditure,
            revenue: current.revenue,
            rank,
            share_pct: percent_of(current.expenditure, year_total),
            categories,
            history,
            total_all_years,
            schemes,
            ministry: name,
        })
    }

    /// Expenditure of a ministry per year, optionally limited to some years
    fn ministry_history(&self, name: &str, only: Option<&BTreeSet<i32>>) -> Vec<YearAmount> {
        self.by_year
            .iter()
            .filter(|(year, _)| only.map_or(true, |set| set.contains(year)))
            .filter_map(|(&year, indices)| {
                let mut found = false;
                let mut amount = 0.0;
                for &i in indices {
                    let record = &self.records[i];
                    if record.ministry == name {
                        found = true;
                        amount += record.expenditure;
                    }
                }
                found.then_some(YearAmount { year, amount })
            })
            .collect()
    }

    /// Summaries for the requested years plus changes and trends
    pub fn compare_years(&self, years: &BTreeSet<i32>) -> Result<YearComparison> {
        if years.is_empty() {
            return Err(Error::InvalidData("No years to compare".into()));
        }

        let missing: Vec<String> = years
            .iter()
            .filter(|y| !self.has_year(**y))
            .map(|y| y.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::NotFound(format!(
                "No budget data for year(s) {}",
                missing.join(", ")
            )));
        }

        let summaries = years
            .iter()
            .map(|&y| self.yearly_summary(y))
            .collect::<Result<Vec<_>>>()?;

        let changes = summaries
            .windows(2)
            .map(|pair| YearChange {
                from_year: pair[0].year,
                to_year: pair[1].year,
                expenditure_change_pct: pct_change(
                    pair[0].total_expenditure,
                    pair[1].total_expenditure,
                ),
                revenue_change_pct: pct_change(pair[0].total_revenue, pair[1].total_revenue),
                deficit_change: pair[1].deficit - pair[0].deficit,
            })
            .collect();

        let mut spend: BTreeMap<&str, f64> = BTreeMap::new();
        for &year in years {
            for &i in &self.by_year[&year] {
                let record = &self.records[i];
                *spend.entry(record.ministry.as_str()).or_default() += record.expenditure;
            }
        }
        let mut top: Vec<(&str, f64)> = spend.into_iter().collect();
        top.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let ministry_trends = top
            .into_iter()
            .take(TOP_MINISTRIES)
            .map(|(name, _)| Trend {
                name: name.to_string(),
                points: self.ministry_history(name, Some(years)),
            })
            .collect();

        let revenue_trends = self
            .revenue_sources
            .iter()
            .filter_map(|series| {
                let points: Vec<YearAmount> = years
                    .iter()
                    .filter_map(|y| {
                        series.amounts.get(y).map(|&amount| YearAmount { year: *y, amount })
                    })
                    .collect();
                (!points.is_empty()).then(|| Trend {
                    name: series.source.clone(),
                    points,
                })
            })
            .collect();

        Ok(YearComparison {
            years: years.iter().copied().collect(),
            summaries,
            changes,
            ministry_trends,
            revenue_trends,
        })
    }

    /// Revenue shares for a year
    ///
    /// Uses the revenue-source table when it has figures for the year,
    /// otherwise the revenue recorded against record categories.
    fn revenue_shares(&self, year: i32) -> Result<Vec<RevenueShare>> {
        let mut amounts: Vec<(String, f64)> = self
            .revenue_sources
            .iter()
            .filter_map(|s| s.amounts.get(&year).map(|&a| (s.source.clone(), a)))
            .collect();

        if amounts.is_empty() {
            let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
            for record in self.year_records(year)?.filter(|r| r.revenue > 0.0) {
                *by_category.entry(record.category.as_str()).or_default() += record.revenue;
            }
            amounts = by_category
                .into_iter()
                .map(|(c, a)| (c.to_string(), a))
                .collect();
        }

        let total: f64 = amounts.iter().map(|(_, a)| a).sum();
        let mut shares: Vec<RevenueShare> = amounts
            .into_iter()
            .map(|(source, amount)| RevenueShare {
                percentage: percent_of(amount, total),
                source,
                amount,
            })
            .collect();
        shares.sort_by(|a, b| {
            b.amount
                .total_cmp(&a.amount)
                .then_with(|| a.source.cmp(&b.source))
        });
        Ok(shares)
    }

    /// Where a year's revenue came from and where its expenditure went
    pub fn revenue_expenditure_split(&self, year: i32) -> Result<RevenueExpenditureSplit> {
        let summary = self.yearly_summary(year)?;
        Ok(RevenueExpenditureSplit {
            year,
            total_revenue: summary.total_revenue,
            total_expenditure: summary.total_expenditure,
            deficit: summary.deficit,
            revenue_sources: self.revenue_shares(year)?,
            expenditure_by_ministry: self.ministries(year)?,
        })
    }

    /// Direction of the deficit against the previous year
    ///
    /// Compares the reported deficit percentage when both years have one,
    /// otherwise the absolute deficit from the records.
    pub fn deficit_trend(&self, year: i32) -> DeficitTrend {
        let reported = |y: i32| self.macros.get(&y).and_then(|m| m.fiscal_deficit_pct);
        let measured = |y: i32| self.yearly_summary(y).ok().map(|s| s.deficit);

        let pair = match (reported(year), reported(year - 1)) {
            (Some(current), Some(previous)) => Some((current, previous)),
            _ => measured(year).zip(measured(year - 1)),
        };

        match pair {
            Some((current, previous)) if current < previous => DeficitTrend::Improving,
            Some((current, previous)) if current > previous => DeficitTrend::Deteriorating,
            Some(_) => DeficitTrend::Stable,
            None => DeficitTrend::NoTrendData,
        }
    }

    /// Everything the dashboard shows for a selected year
    pub fn year_overview(&self, year: i32) -> Result<YearOverview> {
        let summary = self.yearly_summary(year)?;

        let mut top_ministries = self.ministries(year)?;
        top_ministries.truncate(TOP_MINISTRIES);

        let mut key_schemes: Vec<SchemeAllocation> = self
            .schemes
            .iter()
            .filter(|s| s.year == year)
            .cloned()
            .collect();
        key_schemes.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        key_schemes.truncate(KEY_SCHEMES);

        let fiscal_health = FiscalHealth {
            expenditure_to_gdp_pct: summary.expenditure_to_gdp_pct,
            revenue_to_gdp_pct: summary.revenue_to_gdp_pct,
            fiscal_deficit_pct: summary.fiscal_deficit_pct,
            deficit_trend: self.deficit_trend(year),
        };

        Ok(YearOverview {
            top_ministries,
            revenue_breakdown: self.revenue_shares(year)?,
            key_schemes,
            speech_summary: self.speech(year).map(str::to_string),
            fiscal_health,
            summary,
        })
    }

    /// Case-insensitive substring search across ministries, schemes and
    /// revenue sources
    pub fn search(&self, query: &str) -> SearchResults {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return SearchResults::default();
        }

        let names: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.ministry.as_str())
            .filter(|name| name.to_lowercase().contains(&query))
            .collect();

        let mut ministries: Vec<MinistryHit> = names
            .into_iter()
            .filter_map(|name| {
                let latest = self.ministry_history(name, None).pop()?;
                let rank = self
                    .ministry_totals(latest.year)
                    .ok()?
                    .iter()
                    .position(|t| t.name == name)?
                    + 1;
                Some(MinistryHit {
                    name: name.to_string(),
                    latest_year: latest.year,
                    latest_allocation: latest.amount,
                    rank,
                })
            })
            .collect();
        ministries.sort_by(MinistryHit::by_latest_rank);

        let mut schemes: Vec<SchemeAllocation> = self
            .schemes
            .iter()
            .filter(|s| {
                s.scheme.to_lowercase().contains(&query)
                    || s.ministry.to_lowercase().contains(&query)
            })
            .cloned()
            .collect();
        schemes.sort_by(|a, b| b.year.cmp(&a.year).then(b.amount.total_cmp(&a.amount)));

        let revenue_sources = self
            .revenue_sources
            .iter()
            .filter(|s| s.source.to_lowercase().contains(&query))
            .map(|s| {
                let latest = s.amounts.iter().next_back();
                RevenueHit {
                    source: s.source.clone(),
                    latest_year: latest.map(|(y, _)| *y),
                    latest_amount: latest.map(|(_, a)| *a),
                }
            })
            .collect();

        SearchResults {
            ministries,
            schemes,
            revenue_sources,
        }
    }

    /// Cross-year statistics and key findings
    pub fn insights(&self) -> Insights {
        insights::analyze(self)
    }
}

/// Percentage change from `from` to `to`, `None` when `from` is not positive
pub(crate) fn pct_change(from: f64, to: f64) -> Option<f64> {
    (from > 0.0).then(|| (to - from) / from * 100.0)
}

/// Whether a scheme's ministry label refers to a record ministry
///
/// Scheme tables often carry the full title ("Ministry of Health and Family
/// Welfare") while records use a short name ("Health").
fn ministry_matches(label: &str, name: &str) -> bool {
    let label = label.to_lowercase();
    let name = name.to_lowercase();
    label == name || label.contains(&name) || name.contains(&label)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{record, sample_store};
    use super::*;

    #[test]
    fn test_yearly_summary_totals() {
        let store = BudgetStore::from_records(vec![
            record(2023, "Health", "General", 100.0, 0.0),
            record(2023, "Defense", "General", 50.0, 0.0),
        ]);
        let summary = store.yearly_summary(2023).unwrap();
        assert_eq!(summary.total_expenditure, 150.0);
        assert_eq!(summary.total_revenue, 0.0);
        assert_eq!(summary.deficit, 150.0);
        assert_eq!(summary.ministry_count, 2);
        assert_eq!(summary.expenditure_to_gdp_pct, None);
    }

    #[test]
    fn test_deficit_is_expenditure_minus_revenue_for_every_year() {
        let store = sample_store();
        for year in store.years() {
            let summary = store.yearly_summary(year).unwrap();
            let exp: f64 = store
                .records()
                .iter()
                .filter(|r| r.year == year)
                .map(|r| r.expenditure)
                .sum();
            let rev: f64 = store
                .records()
                .iter()
                .filter(|r| r.year == year)
                .map(|r| r.revenue)
                .sum();
            assert_eq!(summary.deficit, exp - rev);
        }
    }

    #[test]
    fn test_yearly_summary_gdp_ratios() {
        let store = sample_store();
        let summary = store.yearly_summary(2022).unwrap();
        assert_eq!(summary.total_expenditure, 750.0);
        assert!((summary.expenditure_to_gdp_pct.unwrap() - 7.5).abs() < 1e-9);
        assert!((summary.revenue_to_gdp_pct.unwrap() - 6.0).abs() < 1e-9);
        assert_eq!(summary.fiscal_deficit_pct, Some(6.4));
    }

    #[test]
    fn test_yearly_summary_unknown_year() {
        let store = sample_store();
        assert!(matches!(store.yearly_summary(2019), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_ministries_ranked_by_expenditure() {
        let store = sample_store();
        let ministries = store.ministries(2022).unwrap();
        assert_eq!(ministries[0].ministry, "Defence");
        assert_eq!(ministries[0].amount, 500.0);
        assert_eq!(ministries[0].rank, 1);
        assert_eq!(ministries[1].ministry, "Health");
        let total: f64 = ministries.iter().map(|m| m.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_ministry_detail() {
        let store = sample_store();
        let detail = store.ministry_detail(2022, "defence").unwrap();
        assert_eq!(detail.ministry, "Defence");
        assert_eq!(detail.expenditure, 500.0);
        assert_eq!(detail.rank, 1);
        assert_eq!(detail.categories.len(), 2);
        assert_eq!(detail.categories[0].category, "Capital Outlay");
        assert_eq!(detail.history.len(), 3);
        assert_eq!(detail.total_all_years, 500.0 + 450.0 + 480.0);
    }

    #[test]
    fn test_ministry_detail_partial_match_and_schemes() {
        let store = sample_store();
        let detail = store.ministry_detail(2023, "heal").unwrap();
        assert_eq!(detail.ministry, "Health");
        assert_eq!(detail.schemes.len(), 1);
        assert_eq!(detail.schemes[0].scheme, "National Health Mission");
    }

    #[test]
    fn test_ministry_absent_in_year() {
        let store = sample_store();
        // Education only appears from 2023
        assert!(matches!(
            store.ministry_detail(2022, "Education"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.ministry_detail(2022, "   "),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_compare_years_ascending() {
        let store = sample_store();
        let years = BTreeSet::from([2023, 2022]);
        let comparison = store.compare_years(&years).unwrap();
        assert_eq!(comparison.summaries.len(), 2);
        assert_eq!(comparison.summaries[0].year, 2022);
        assert_eq!(comparison.summaries[1].year, 2023);
        assert_eq!(comparison.changes.len(), 1);
        let change = comparison.changes[0].expenditure_change_pct.unwrap();
        assert!((change - 20.0).abs() < 1e-9);
        assert_eq!(comparison.ministry_trends[0].name, "Defence");
        assert_eq!(comparison.ministry_trends[0].points.len(), 2);
        assert_eq!(comparison.revenue_trends.len(), 2);
    }

    #[test]
    fn test_compare_years_reports_every_missing_year() {
        let store = sample_store();
        let err = store
            .compare_years(&BTreeSet::from([2017, 2022, 2019]))
            .unwrap_err();
        match err {
            Error::NotFound(msg) => {
                assert!(msg.contains("2017"));
                assert!(msg.contains("2019"));
                assert!(!msg.contains("2022"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            store.compare_years(&BTreeSet::new()),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_split_uses_revenue_sources() {
        let store = sample_store();
        let split = store.revenue_expenditure_split(2024).unwrap();
        assert_eq!(split.revenue_sources[0].source, "Income Tax");
        assert_eq!(split.revenue_sources.len(), 2);
        assert_eq!(split.total_revenue, 820.0);
        assert_eq!(split.deficit, 980.0 - 820.0);
    }

    #[test]
    fn test_split_falls_back_to_categories() {
        let store = BudgetStore::from_records(vec![
            record(2020, "Finance", "Customs", 0.0, 30.0),
            record(2020, "Finance", "Income Tax", 0.0, 90.0),
            record(2020, "Defence", "General", 100.0, 0.0),
        ]);
        let split = store.revenue_expenditure_split(2020).unwrap();
        assert_eq!(split.revenue_sources[0].source, "Income Tax");
        assert_eq!(split.revenue_sources[0].percentage, 75.0);
    }

    #[test]
    fn test_year_overview() {
        let store = sample_store();
        let overview = store.year_overview(2023).unwrap();
        assert_eq!(overview.top_ministries.len(), 4);
        assert_eq!(overview.key_schemes.len(), 2);
        assert!(overview.speech_summary.is_some());
        assert_eq!(overview.fiscal_health.deficit_trend, DeficitTrend::Improving);
        assert_eq!(store.deficit_trend(2024), DeficitTrend::Stable);
        assert_eq!(store.deficit_trend(2022), DeficitTrend::NoTrendData);
    }

    #[test]
    fn test_search() {
        let store = sample_store();
        let results = store.search("HEALTH");
        assert_eq!(results.ministries.len(), 1);
        assert_eq!(results.ministries[0].latest_year, 2024);
        assert_eq!(results.ministries[0].rank, 2);
        assert_eq!(results.schemes.len(), 1);
        assert!(results.revenue_sources.is_empty());

        let results = store.search("tax");
        assert_eq!(results.revenue_sources.len(), 2);

        let results = store.search("income");
        assert_eq!(results.revenue_sources.len(), 1);
        assert_eq!(results.revenue_sources[0].latest_amount, Some(420.0));

        assert!(store.search("  ").is_empty());
    }

    #[test]
    fn test_search_orders_ministries_by_latest_rank() {
        let store = sample_store();
        let names: Vec<String> = store
            .search("e")
            .ministries
            .into_iter()
            .map(|hit| hit.name)
            .collect();
        assert_eq!(names, ["Defence", "Health", "Education", "Finance"]);

        let store = BudgetStore::from_records(vec![
            record(2023, "Ministry of Railways", "Capital", 300.0, 0.0),
            record(2024, "Ministry of Coal", "Mining", 50.0, 0.0),
            record(2024, "Ministry of Roads", "Highways", 200.0, 0.0),
        ]);
        let hits = store.search("ministry of").ministries;
        let order: Vec<(&str, usize)> = hits.iter().map(|h| (h.name.as_str(), h.rank)).collect();
        assert_eq!(
            order,
            [
                ("Ministry of Roads", 1),
                ("Ministry of Coal", 2),
                ("Ministry of Railways", 1)
            ]
        );
    }

    #[test]
    fn test_pct_change() {
        assert_eq!(pct_change(100.0, 120.0), Some(20.0));
        assert_eq!(pct_change(0.0, 120.0), None);
    }
}
