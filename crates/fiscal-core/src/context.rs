//! Context assembly and formatting for the assistant
//!
//! [`ContextAssembler`] picks the query results relevant to a question;
//! [`InsightFormatter`] renders them into a compact text block. The output
//! depends only on the results passed in, so identical inputs always produce
//! byte-identical text.

use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::models::{
    MinistryDetail, RevenueExpenditureSplit, SearchResults, YearComparison, YearOverview,
    YearSummary,
};
use crate::store::BudgetStore;

/// Text used when there is nothing to format
pub const NO_DATA: &str = "No specific data found for this query.";

/// Default number of entries listed per section
pub const DEFAULT_MAX_ITEMS: usize = 5;

/// Key findings included with every question
const FINDINGS_IN_CONTEXT: usize = 3;

/// Words ignored when searching for question keywords
const STOPWORDS: &[&str] = &[
    "about", "all", "and", "are", "budget", "can", "compare", "compared", "did", "does", "for",
    "from", "give", "government", "has", "have", "how", "in", "is", "its", "ministries",
    "ministry", "much", "of", "over", "show", "spend", "spending", "tell", "than", "that", "the",
    "this", "was", "were", "what", "when", "which", "who", "why", "with", "year", "years",
];

/// One query result handed to the formatter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum QueryResult {
    Summary(YearSummary),
    Ministry(MinistryDetail),
    Comparison(YearComparison),
    Split(RevenueExpenditureSplit),
    Overview(YearOverview),
    Search {
        query: String,
        results: SearchResults,
    },
    Findings(Vec<String>),
}

/// Renders query results as plain text for a model prompt
#[derive(Debug, Clone)]
pub struct InsightFormatter {
    max_items: usize,
}

impl Default for InsightFormatter {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

impl InsightFormatter {
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items: max_items.max(1),
        }
    }

    /// One section per result, separated by a blank line
    pub fn format(&self, results: &[QueryResult]) -> String {
        let sections: Vec<String> = results
            .iter()
            .map(|r| self.format_one(r))
            .filter(|s| !s.is_empty())
            .collect();

        if sections.is_empty() {
            NO_DATA.to_string()
        } else {
            sections.join("\n\n")
        }
    }

    fn format_one(&self, result: &QueryResult) -> String {
        let mut out = String::new();
        match result {
            QueryResult::Summary(summary) => self.write_summary(&mut out, summary),
            QueryResult::Ministry(detail) => self.write_ministry(&mut out, detail),
            QueryResult::Comparison(comparison) => self.write_comparison(&mut out, comparison),
            QueryResult::Split(split) => self.write_split(&mut out, split),
            QueryResult::Overview(overview) => self.write_overview(&mut out, overview),
            QueryResult::Search { query, results } => self.write_search(&mut out, query, results),
            QueryResult::Findings(findings) => {
                if !findings.is_empty() {
                    out.push_str("## Key findings");
                    for finding in findings.iter().take(self.max_items) {
                        let _ = write!(out, "\n- {}", finding);
                    }
                }
            }
        }
        out
    }

    fn write_summary(&self, out: &mut String, s: &YearSummary) {
        let _ = write!(out, "## Budget {}", s.year);
        let _ = write!(
            out,
            "\n- Total expenditure: {}",
            format_crores(s.total_expenditure)
        );
        let _ = write!(out, "\n- Total revenue: {}", format_crores(s.total_revenue));
        let _ = write!(
            out,
            "\n- Deficit (expenditure minus revenue): {}",
            format_crores(s.deficit)
        );
        if let Some(pct) = s.expenditure_to_gdp_pct {
            let _ = write!(out, "\n- Expenditure to GDP: {}", format_pct(pct));
        }
        if let Some(pct) = s.revenue_to_gdp_pct {
            let _ = write!(out, "\n- Revenue to GDP: {}", format_pct(pct));
        }
        if let Some(pct) = s.fiscal_deficit_pct {
            let _ = write!(out, "\n- Reported fiscal deficit: {} of GDP", format_pct(pct));
        }
        let _ = write!(out, "\n- Ministries: {}", s.ministry_count);
    }

    fn write_ministry(&self, out: &mut String, d: &MinistryDetail) {
        let _ = write!(out, "## {} ({})", d.ministry, d.year);
        let _ = write!(
            out,
            "\n- Expenditure: {} (rank #{}, {} of total)",
            format_crores(d.expenditure),
            d.rank,
            format_pct(d.share_pct)
        );
        if d.revenue > 0.0 {
            let _ = write!(out, "\n- Revenue: {}", format_crores(d.revenue));
        }
        if !d.categories.is_empty() {
            out.push_str("\n- Categories:");
            for c in d.categories.iter().take(self.max_items) {
                let _ = write!(out, "\n  - {}: {}", c.category, format_crores(c.expenditure));
            }
        }
        if !d.history.is_empty() {
            let skip = d.history.len().saturating_sub(self.max_items);
            let points: Vec<String> = d.history[skip..]
                .iter()
                .map(|p| format!("{} {}", p.year, format_crores(p.amount)))
                .collect();
            let _ = write!(out, "\n- History: {}", points.join(", "));
            let _ = write!(
                out,
                "\n- Total across loaded years: {}",
                format_crores(d.total_all_years)
            );
        }
        if !d.schemes.is_empty() {
            out.push_str("\n- Schemes:");
            for s in d.schemes.iter().take(self.max_items) {
                let _ = write!(out, "\n  - {}: {}", s.scheme, format_crores(s.amount));
            }
        }
    }

    fn write_comparison(&self, out: &mut String, c: &YearComparison) {
        let years: Vec<String> = c.years.iter().map(|y| y.to_string()).collect();
        let _ = write!(out, "## Comparison {}", years.join(", "));
        for s in &c.summaries {
            let _ = write!(
                out,
                "\n- {}: expenditure {}, revenue {}, deficit {}",
                s.year,
                format_crores(s.total_expenditure),
                format_crores(s.total_revenue),
                format_crores(s.deficit)
            );
        }
        for change in &c.changes {
            let _ = write!(
                out,
                "\n- {} to {}: expenditure {}, revenue {}",
                change.from_year,
                change.to_year,
                format_change(change.expenditure_change_pct),
                format_change(change.revenue_change_pct)
            );
        }
        if !c.ministry_trends.is_empty() {
            out.push_str("\nLargest ministries:");
            for trend in c.ministry_trends.iter().take(self.max_items) {
                let points: Vec<String> = trend
                    .points
                    .iter()
                    .map(|p| format!("{} {}", p.year, format_crores(p.amount)))
                    .collect();
                let _ = write!(out, "\n- {}: {}", trend.name, points.join(", "));
            }
        }
        if !c.revenue_trends.is_empty() {
            out.push_str("\nRevenue sources:");
            for trend in c.revenue_trends.iter().take(self.max_items) {
                let points: Vec<String> = trend
                    .points
                    .iter()
                    .map(|p| format!("{} {}", p.year, format_crores(p.amount)))
                    .collect();
                let _ = write!(out, "\n- {}: {}", trend.name, points.join(", "));
            }
        }
    }

    fn write_split(&self, out: &mut String, s: &RevenueExpenditureSplit) {
        let _ = write!(out, "## Revenue and expenditure {}", s.year);
        let _ = write!(
            out,
            "\n- Revenue: {}, expenditure: {}, deficit: {}",
            format_crores(s.total_revenue),
            format_crores(s.total_expenditure),
            format_crores(s.deficit)
        );
        if !s.revenue_sources.is_empty() {
            out.push_str("\nRevenue sources:");
            for r in s.revenue_sources.iter().take(self.max_items) {
                let _ = write!(
                    out,
                    "\n- {}: {} ({})",
                    r.source,
                    format_crores(r.amount),
                    format_pct(r.percentage)
                );
            }
        }
        if !s.expenditure_by_ministry.is_empty() {
            out.push_str("\nExpenditure by ministry:");
            for m in s.expenditure_by_ministry.iter().take(self.max_items) {
                let _ = write!(
                    out,
                    "\n- #{} {}: {} ({})",
                    m.rank,
                    m.ministry,
                    format_crores(m.amount),
                    format_pct(m.percentage)
                );
            }
        }
    }

    fn write_overview(&self, out: &mut String, o: &YearOverview) {
        self.write_summary(out, &o.summary);
        let _ = write!(
            out,
            "\n- Deficit trend vs previous year: {}",
            o.fiscal_health.deficit_trend
        );

        if !o.top_ministries.is_empty() {
            out.push_str("\nTop ministries:");
            for m in o.top_ministries.iter().take(self.max_items) {
                let _ = write!(
                    out,
                    "\n- #{} {}: {} ({})",
                    m.rank,
                    m.ministry,
                    format_crores(m.amount),
                    format_pct(m.percentage)
                );
            }
        }
        if !o.revenue_breakdown.is_empty() {
            out.push_str("\nRevenue sources:");
            for r in o.revenue_breakdown.iter().take(self.max_items) {
                let _ = write!(
                    out,
                    "\n- {}: {} ({})",
                    r.source,
                    format_crores(r.amount),
                    format_pct(r.percentage)
                );
            }
        }
        if !o.key_schemes.is_empty() {
            out.push_str("\nKey schemes:");
            for s in o.key_schemes.iter().take(self.max_items) {
                let _ = write!(
                    out,
                    "\n- {} ({}): {}",
                    s.scheme,
                    s.ministry,
                    format_crores(s.amount)
                );
            }
        }
        if let Some(ref speech) = o.speech_summary {
            let _ = write!(out, "\nBudget speech: {}", speech.trim());
        }
    }

    fn write_search(&self, out: &mut String, query: &str, r: &SearchResults) {
        if r.is_empty() {
            return;
        }
        let _ = write!(out, "## Matches for \"{}\"", query);
        if !r.ministries.is_empty() {
            out.push_str("\nMinistries:");
            for m in r.ministries.iter().take(self.max_items) {
                let _ = write!(
                    out,
                    "\n- {}: {} in {} (rank #{})",
                    m.name,
                    format_crores(m.latest_allocation),
                    m.latest_year,
                    m.rank
                );
            }
        }
        if !r.schemes.is_empty() {
            out.push_str("\nSchemes:");
            for s in r.schemes.iter().take(self.max_items) {
                let _ = write!(
                    out,
                    "\n- {} ({}, {}): {}",
                    s.scheme,
                    s.ministry,
                    s.year,
                    format_crores(s.amount)
                );
            }
        }
        if !r.revenue_sources.is_empty() {
            out.push_str("\nRevenue sources:");
            for s in r.revenue_sources.iter().take(self.max_items) {
                match (s.latest_year, s.latest_amount) {
                    (Some(year), Some(amount)) => {
                        let _ = write!(
                            out,
                            "\n- {}: {} in {}",
                            s.source,
                            format_crores(amount),
                            year
                        );
                    }
                    _ => {
                        let _ = write!(out, "\n- {}: no figures", s.source);
                    }
                }
            }
        }
    }
}

/// Format an amount in crores with Indian digit grouping: `₹1,25,000 Cr`
///
/// Amounts of 100 crore and more are rounded to whole crores; smaller
/// fractional amounts keep two decimals.
pub fn format_crores(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();

    if abs < 100.0 && abs.fract() != 0.0 {
        let whole = abs.trunc() as u64;
        let cents = ((abs - abs.trunc()) * 100.0).round() as u64;
        let (whole, cents) = if cents == 100 {
            (whole + 1, 0)
        } else {
            (whole, cents)
        };
        return format!("{}₹{}.{:02} Cr", sign, group_indian(whole), cents);
    }

    format!("{}₹{} Cr", sign, group_indian(abs.round() as u64))
}

/// `1234567` → `12,34,567`
fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Percentage with one decimal
pub fn format_pct(value: f64) -> String {
    format!("{:.1}%", value)
}

fn format_change(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:+.1}%", v),
        None => "n/a".to_string(),
    }
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(20\d{2})\b").expect("valid regex"))
}

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z][A-Za-z&\-]+").expect("valid regex"))
}

/// Years mentioned in free text
pub fn mentioned_years(text: &str) -> BTreeSet<i32> {
    year_regex()
        .captures_iter(text)
        .filter_map(|c| c[1].parse().ok())
        .collect()
}

/// Search keywords in a question: words of three letters or more that are
/// not stopwords, lowercased, in order of first appearance
pub fn keywords(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    word_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.len() >= 3 && !STOPWORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Picks the query results relevant to a question
pub struct ContextAssembler<'a> {
    store: &'a BudgetStore,
    formatter: InsightFormatter,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(store: &'a BudgetStore) -> Self {
        Self {
            store,
            formatter: InsightFormatter::default(),
        }
    }

    pub fn with_formatter(mut self, formatter: InsightFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Results for a question: the selected year's overview, the years the
    /// question mentions, keyword matches and the first key findings
    pub fn for_question(&self, question: &str, selected_year: Option<i32>) -> Vec<QueryResult> {
        let mut results = Vec::new();

        if let Some(year) = selected_year {
            if let Ok(overview) = self.store.year_overview(year) {
                results.push(QueryResult::Overview(overview));
            }
        }

        let mentioned: BTreeSet<i32> = mentioned_years(question)
            .into_iter()
            .filter(|y| self.store.has_year(*y))
            .collect();
        if mentioned.len() > 1 {
            if let Ok(comparison) = self.store.compare_years(&mentioned) {
                results.push(QueryResult::Comparison(comparison));
            }
        } else {
            for year in mentioned.into_iter().filter(|y| Some(*y) != selected_year) {
                if let Ok(summary) = self.store.yearly_summary(year) {
                    results.push(QueryResult::Summary(summary));
                }
            }
        }

        let words = keywords(question);
        let mut matches = SearchResults::default();
        for word in &words {
            matches.merge(self.store.search(word));
        }
        if !matches.is_empty() {
            results.push(QueryResult::Search {
                query: words.join(" "),
                results: matches,
            });
        }

        let findings: Vec<String> = self
            .store
            .insights()
            .key_findings
            .into_iter()
            .take(FINDINGS_IN_CONTEXT)
            .collect();
        if !findings.is_empty() {
            results.push(QueryResult::Findings(findings));
        }

        results
    }

    /// Formatted context text for a question
    pub fn context_for(&self, question: &str, selected_year: Option<i32>) -> String {
        self.formatter
            .format(&self.for_question(question, selected_year))
    }

    /// Context for a budget-speech analysis: the year overview only
    pub fn for_year(&self, year: i32) -> crate::error::Result<String> {
        let overview = self.store.year_overview(year)?;
        Ok(self.formatter.format(&[QueryResult::Overview(overview)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::sample_store;

    #[test]
    fn test_format_crores_indian_grouping() {
        assert_eq!(format_crores(125000.0), "₹1,25,000 Cr");
        assert_eq!(format_crores(4_820_512.4), "₹48,20,512 Cr");
        assert_eq!(format_crores(999.0), "₹999 Cr");
        assert_eq!(format_crores(1000.0), "₹1,000 Cr");
        assert_eq!(format_crores(0.0), "₹0 Cr");
        assert_eq!(format_crores(-1500.0), "-₹1,500 Cr");
        assert_eq!(format_crores(12.5), "₹12.50 Cr");
        assert_eq!(format_crores(0.999), "₹1.00 Cr");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(5.94), "5.9%");
        assert_eq!(format_pct(100.0), "100.0%");
        assert_eq!(format_change(Some(20.0)), "+20.0%");
        assert_eq!(format_change(Some(-3.25)), "-3.2%");
        assert_eq!(format_change(None), "n/a");
    }

    #[test]
    fn test_empty_results() {
        let formatter = InsightFormatter::default();
        assert_eq!(formatter.format(&[]), NO_DATA);
        assert_eq!(
            formatter.format(&[QueryResult::Search {
                query: "x".into(),
                results: SearchResults::default(),
            }]),
            NO_DATA
        );
    }

    #[test]
    fn test_summary_section() {
        let store = sample_store();
        let text =
            InsightFormatter::default().format(&[QueryResult::Summary(store.yearly_summary(2022).unwrap())]);
        assert!(text.starts_with("## Budget 2022\n"));
        assert!(text.contains("- Total expenditure: ₹750 Cr"));
        assert!(text.contains("- Total revenue: ₹600 Cr"));
        assert!(text.contains("- Expenditure to GDP: 7.5%"));
        assert!(text.contains("- Reported fiscal deficit: 6.4% of GDP"));
    }

    #[test]
    fn test_sections_joined_by_blank_line() {
        let store = sample_store();
        let results = vec![
            QueryResult::Summary(store.yearly_summary(2022).unwrap()),
            QueryResult::Findings(vec!["One".into()]),
        ];
        let text = InsightFormatter::default().format(&results);
        assert!(text.contains("- Ministries: 3\n\n## Key findings\n- One"));
    }

    #[test]
    fn test_lists_truncated() {
        let findings: Vec<String> = (1..=8).map(|i| format!("finding {}", i)).collect();
        let text = InsightFormatter::default().format(&[QueryResult::Findings(findings)]);
        assert!(text.contains("finding 5"));
        assert!(!text.contains("finding 6"));

        let text = InsightFormatter::new(2).format(&[QueryResult::Findings(vec![
            "a".into(),
            "b".into(),
            "c".into(),
        ])]);
        assert_eq!(text, "## Key findings\n- a\n- b");
    }

    #[test]
    fn test_format_is_deterministic() {
        let store = sample_store();
        let assembler = ContextAssembler::new(&store);
        let first = assembler.context_for("Compare health in 2022 and 2023", Some(2024));
        let second = assembler.context_for("Compare health in 2022 and 2023", Some(2024));
        assert_eq!(first, second);
    }

    #[test]
    fn test_mentioned_years_and_keywords() {
        assert_eq!(
            mentioned_years("Compare 2022 with 2023, not 12023"),
            BTreeSet::from([2022, 2023])
        );
        assert_eq!(
            keywords("How much did Defence and defence get for GST in 2023?"),
            vec!["defence", "get", "gst"]
        );
        assert_eq!(
            keywords("Which ministry receives the highest budget allocation?"),
            vec!["receives", "highest", "allocation"]
        );
        assert_eq!(
            keywords("Government ministries like the Defence Ministry"),
            vec!["like", "defence"]
        );
    }

    #[test]
    fn test_for_question_collects_relevant_results() {
        let store = sample_store();
        let assembler = ContextAssembler::new(&store);

        let results = assembler.for_question("What did Health get in 2023?", Some(2024));
        assert!(matches!(results[0], QueryResult::Overview(ref o) if o.summary.year == 2024));
        assert!(matches!(results[1], QueryResult::Summary(ref s) if s.year == 2023));
        assert!(results
            .iter()
            .any(|r| matches!(r, QueryResult::Search { results, .. } if results.ministries[0].name == "Health")));
        assert!(matches!(results.last(), Some(QueryResult::Findings(f)) if f.len() == 3));
    }

    #[test]
    fn test_for_question_compares_multiple_years() {
        let store = sample_store();
        let results = ContextAssembler::new(&store).for_question("2022 vs 2024 vs 2030", None);
        match &results[0] {
            QueryResult::Comparison(c) => assert_eq!(c.years, vec![2022, 2024]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_for_year_unknown() {
        let store = sample_store();
        assert!(ContextAssembler::new(&store).for_year(2018).is_err());
        assert!(ContextAssembler::new(&store)
            .for_year(2023)
            .unwrap()
            .contains("Budget speech: Capital investment raised"));
    }
}
