//! CSV loaders for the budget data directory
//!
//! A data directory holds one CSV file per record type. Header names are
//! matched case-insensitively and extra columns are ignored, so exports with
//! additional bookkeeping columns load unchanged.
//!
//! Row-level problems (bad number, out-of-range year, negative amount) skip
//! the row and are counted in the [`LoadReport`]; only unreadable files, files
//! without their key columns, or a directory with none of the required files
//! fail the load.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{
    is_supported_year, BudgetRecord, CurrencyUnit, MacroIndicators, RevenueSourceSeries,
    SchemeAllocation, SpeechSummary, MAX_YEAR, MIN_YEAR,
};

/// How many skip reasons are kept per file
const MAX_SKIP_REASONS: usize = 20;

/// The kinds of file a data directory can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// `year,ministry,category,expenditure,revenue[,currency_unit]`
    Records,
    /// `year,gdp_nominal_in_crores,fiscal_deficit_as_gdp_pct`
    Macro,
    /// `Revenue Source,2016,...,2025`
    RevenueSources,
    /// `year,ministry_name,grant_or_scheme_name,amount_in_crores,...`
    Schemes,
    /// `year,ai_summary`
    Speeches,
}

impl FileKind {
    pub fn all() -> &'static [FileKind] {
        &[
            Self::Records,
            Self::Macro,
            Self::RevenueSources,
            Self::Schemes,
            Self::Speeches,
        ]
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Records => "budget_records.csv",
            Self::Macro => "budget_summary.csv",
            Self::RevenueSources => "year_wise_revenue.csv",
            Self::Schemes => "expenditures_detailed.csv",
            Self::Speeches => "speeches.csv",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Self::Records | Self::Macro)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Records => "records",
            Self::Macro => "macro",
            Self::RevenueSources => "revenue_sources",
            Self::Schemes => "schemes",
            Self::Speeches => "speeches",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options applied while loading
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Years to keep; rows outside the window are skipped
    pub years: RangeInclusive<i32>,
}

impl LoadOptions {
    /// Restrict loading to a window inside the supported range
    pub fn with_years(years: RangeInclusive<i32>) -> Result<Self> {
        if years.is_empty() || !is_supported_year(*years.start()) || !is_supported_year(*years.end())
        {
            return Err(Error::InvalidData(format!(
                "Year window {}..={} is outside {}..={}",
                years.start(),
                years.end(),
                MIN_YEAR,
                MAX_YEAR
            )));
        }
        Ok(Self { years })
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            years: MIN_YEAR..=MAX_YEAR,
        }
    }
}

/// Rows parsed from one file
#[derive(Debug)]
pub struct Parsed<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
    pub skip_reasons: Vec<String>,
}

impl<T> Parsed<T> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            skipped: 0,
            skip_reasons: Vec::new(),
        }
    }

    fn skip(&mut self, record: &StringRecord, err: Error) {
        self.note_skip(record.position().map(|p| p.line()), &err);
    }

    /// A row the csv reader could not read at all (bad quoting, invalid UTF-8)
    fn skip_unreadable(&mut self, err: csv::Error) {
        self.note_skip(err.position().map(|p| p.line()), &Error::Csv(err));
    }

    fn note_skip(&mut self, line: Option<u64>, err: &Error) {
        self.skipped += 1;
        if self.skip_reasons.len() < MAX_SKIP_REASONS {
            self.skip_reasons
                .push(format!("line {}: {}", line.unwrap_or(0), err));
        }
    }
}

/// Outcome of loading one file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub kind: FileKind,
    pub path: PathBuf,
    pub loaded: usize,
    pub skipped: usize,
    pub skip_reasons: Vec<String>,
}

/// Outcome of loading a data directory
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub data_dir: PathBuf,
    pub loaded_at: DateTime<Utc>,
    pub files: Vec<FileReport>,
    pub missing: Vec<FileKind>,
}

impl LoadReport {
    /// Required files that were not found
    pub fn missing_required(&self) -> Vec<FileKind> {
        self.missing
            .iter()
            .copied()
            .filter(|k| k.is_required())
            .collect()
    }

    /// Rows skipped across all files
    pub fn total_skipped(&self) -> usize {
        self.files.iter().map(|f| f.skipped).sum()
    }

    /// Report for a given file kind, if it was loaded
    pub fn file(&self, kind: FileKind) -> Option<&FileReport> {
        self.files.iter().find(|f| f.kind == kind)
    }

    /// Fail if any required file was missing
    pub fn ensure_complete(&self) -> Result<()> {
        let missing = self.missing_required();
        if missing.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = missing.iter().map(|k| k.file_name()).collect();
        Err(Error::DataLoad(format!(
            "Missing required file(s) in {}: {}",
            self.data_dir.display(),
            names.join(", ")
        )))
    }
}

/// All tables read from a data directory
#[derive(Debug, Default)]
pub struct Tables {
    pub records: Vec<BudgetRecord>,
    pub macros: Vec<MacroIndicators>,
    pub revenue_sources: Vec<RevenueSourceSeries>,
    pub schemes: Vec<SchemeAllocation>,
    pub speeches: Vec<SpeechSummary>,
}

/// Load every known file from a data directory
pub fn load_dir(dir: &Path, options: &LoadOptions) -> Result<(Tables, LoadReport)> {
    if !dir.is_dir() {
        return Err(Error::DataLoad(format!(
            "Data directory not found: {}",
            dir.display()
        )));
    }

    let mut tables = Tables::default();
    let mut files = Vec::new();
    let mut missing = Vec::new();

    for &kind in FileKind::all() {
        let path = dir.join(kind.file_name());
        if !path.is_file() {
            if kind.is_required() {
                warn!(file = %path.display(), "Required data file missing");
            } else {
                debug!(file = %path.display(), "Optional data file not present");
            }
            missing.push(kind);
            continue;
        }

        let file = File::open(&path).map_err(|e| {
            Error::DataLoad(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let (loaded, skipped, skip_reasons) = match kind {
            FileKind::Records => {
                let parsed = parse_records(file, options).map_err(|e| in_file(&path, e))?;
                let counts = (parsed.rows.len(), parsed.skipped, parsed.skip_reasons);
                tables.records = parsed.rows;
                counts
            }
            FileKind::Macro => {
                let parsed = parse_macro(file, options).map_err(|e| in_file(&path, e))?;
                let counts = (parsed.rows.len(), parsed.skipped, parsed.skip_reasons);
                tables.macros = parsed.rows;
                counts
            }
            FileKind::RevenueSources => {
                let parsed =
                    parse_revenue_sources(file, options).map_err(|e| in_file(&path, e))?;
                let counts = (parsed.rows.len(), parsed.skipped, parsed.skip_reasons);
                tables.revenue_sources = parsed.rows;
                counts
            }
            FileKind::Schemes => {
                let parsed = parse_schemes(file, options).map_err(|e| in_file(&path, e))?;
                let counts = (parsed.rows.len(), parsed.skipped, parsed.skip_reasons);
                tables.schemes = parsed.rows;
                counts
            }
            FileKind::Speeches => {
                let parsed = parse_speeches(file, options).map_err(|e| in_file(&path, e))?;
                let counts = (parsed.rows.len(), parsed.skipped, parsed.skip_reasons);
                tables.speeches = parsed.rows;
                counts
            }
        };

        if skipped > 0 {
            warn!(
                file = %path.display(),
                skipped,
                "Skipped malformed rows"
            );
        }
        debug!(file = %path.display(), loaded, "Loaded data file");

        files.push(FileReport {
            kind,
            path,
            loaded,
            skipped,
            skip_reasons,
        });
    }

    if FileKind::all()
        .iter()
        .filter(|k| k.is_required())
        .all(|k| missing.contains(k))
    {
        return Err(Error::DataLoad(format!(
            "No required data files found in {}",
            dir.display()
        )));
    }

    let report = LoadReport {
        data_dir: dir.to_path_buf(),
        loaded_at: Utc::now(),
        files,
        missing,
    };

    info!(
        dir = %dir.display(),
        records = tables.records.len(),
        skipped = report.total_skipped(),
        missing = report.missing.len(),
        "Budget data loaded"
    );

    Ok((tables, report))
}

fn in_file(path: &Path, err: Error) -> Error {
    match err {
        Error::DataLoad(msg) => Error::DataLoad(format!("{}: {}", path.display(), msg)),
        other => Error::DataLoad(format!("{}: {}", path.display(), other)),
    }
}

/// Parse `budget_records.csv`
pub fn parse_records<R: Read>(reader: R, options: &LoadOptions) -> Result<Parsed<BudgetRecord>> {
    let mut rdr = csv_reader(reader);
    let columns = Columns::new(rdr.headers()?);
    let year_col = columns.require(&["year"])?;
    let ministry_col = columns.require(&["ministry", "ministry_name", "ministry name"])?;
    let category_col = columns.find(&["category", "head", "category_name"]);
    let expenditure_col = columns.find(&["expenditure", "expenditure_amount"]);
    let revenue_col = columns.find(&["revenue", "revenue_amount"]);
    let unit_col = columns.find(&["currency_unit", "unit", "currency"]);

    if expenditure_col.is_none() && revenue_col.is_none() {
        return Err(Error::DataLoad(
            "Missing column: expenditure or revenue".into(),
        ));
    }

    let mut parsed = Parsed::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                parsed.skip_unreadable(e);
                continue;
            }
        };

        let row = (|| -> Result<BudgetRecord> {
            let year = parse_year_in(field(&record, Some(year_col)), options)?;

            let ministry = field(&record, Some(ministry_col)).trim().to_string();
            if ministry.is_empty() {
                return Err(Error::InvalidData("Empty ministry name".into()));
            }

            let category = field(&record, category_col).trim();
            let category = if category.is_empty() {
                "General".to_string()
            } else {
                category.to_string()
            };

            let unit_str = field(&record, unit_col).trim();
            let unit = if unit_str.is_empty() {
                CurrencyUnit::default()
            } else {
                unit_str.parse::<CurrencyUnit>().map_err(Error::InvalidData)?
            };

            let expenditure = parse_amount(field(&record, expenditure_col))?.unwrap_or(0.0);
            let revenue = parse_amount(field(&record, revenue_col))?.unwrap_or(0.0);

            Ok(BudgetRecord {
                year,
                ministry,
                category,
                expenditure: unit.to_crores(expenditure),
                revenue: unit.to_crores(revenue),
                unit,
            })
        })();

        match row {
            Ok(r) => parsed.rows.push(r),
            Err(e) => parsed.skip(&record, e),
        }
    }

    debug!("Parsed {} budget records", parsed.rows.len());
    Ok(parsed)
}

/// Parse `budget_summary.csv`
pub fn parse_macro<R: Read>(reader: R, options: &LoadOptions) -> Result<Parsed<MacroIndicators>> {
    let mut rdr = csv_reader(reader);
    let columns = Columns::new(rdr.headers()?);
    let year_col = columns.require(&["year"])?;
    let gdp_col = columns.find(&["gdp_nominal_in_crores", "gdp_nominal", "gdp"]);
    let deficit_col = columns.find(&["fiscal_deficit_as_gdp_pct", "fiscal_deficit_pct"]);

    if gdp_col.is_none() && deficit_col.is_none() {
        return Err(Error::DataLoad(
            "Missing column: gdp_nominal_in_crores or fiscal_deficit_as_gdp_pct".into(),
        ));
    }

    let mut seen = BTreeSet::new();
    let mut parsed = Parsed::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                parsed.skip_unreadable(e);
                continue;
            }
        };

        let row = (|| -> Result<MacroIndicators> {
            let year = parse_year_in(field(&record, Some(year_col)), options)?;
            if !seen.insert(year) {
                return Err(Error::InvalidData(format!("Duplicate year {}", year)));
            }

            let gdp_nominal = parse_amount(field(&record, gdp_col))?;
            if gdp_nominal == Some(0.0) {
                return Err(Error::InvalidData("GDP must be positive".into()));
            }
            let fiscal_deficit_pct = parse_signed(field(&record, deficit_col))?;

            Ok(MacroIndicators {
                year,
                gdp_nominal,
                fiscal_deficit_pct,
            })
        })();

        match row {
            Ok(r) => parsed.rows.push(r),
            Err(e) => parsed.skip(&record, e),
        }
    }

    debug!("Parsed {} macro indicator rows", parsed.rows.len());
    Ok(parsed)
}

/// Parse the wide `year_wise_revenue.csv` table
///
/// Every header that reads as a year becomes a year column; columns for
/// years outside the load window are ignored.
pub fn parse_revenue_sources<R: Read>(
    reader: R,
    options: &LoadOptions,
) -> Result<Parsed<RevenueSourceSeries>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns = Columns::new(&headers);
    let source_col = columns.find(&["revenue source", "source", "revenue_source"]).unwrap_or(0);

    let year_cols: Vec<(usize, i32)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != source_col)
        .filter_map(|(i, h)| parse_year(h).ok().map(|y| (i, y)))
        .filter(|(_, y)| options.years.contains(y))
        .collect();

    if year_cols.is_empty() {
        return Err(Error::DataLoad("No year columns in revenue table".into()));
    }

    let mut parsed = Parsed::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                parsed.skip_unreadable(e);
                continue;
            }
        };

        let row = (|| -> Result<RevenueSourceSeries> {
            let source = field(&record, Some(source_col)).trim().to_string();
            if source.is_empty() {
                return Err(Error::InvalidData("Empty revenue source".into()));
            }

            let mut amounts = BTreeMap::new();
            for &(col, year) in &year_cols {
                if let Some(amount) = parse_amount(field(&record, Some(col)))? {
                    amounts.insert(year, amount);
                }
            }

            Ok(RevenueSourceSeries { source, amounts })
        })();

        match row {
            Ok(r) => parsed.rows.push(r),
            Err(e) => parsed.skip(&record, e),
        }
    }

    debug!("Parsed {} revenue sources", parsed.rows.len());
    Ok(parsed)
}

/// Parse `expenditures_detailed.csv`
pub fn parse_schemes<R: Read>(reader: R, options: &LoadOptions) -> Result<Parsed<SchemeAllocation>> {
    let mut rdr = csv_reader(reader);
    let columns = Columns::new(rdr.headers()?);
    let year_col = columns.require(&["year"])?;
    let ministry_col = columns.require(&["ministry_name", "ministry"])?;
    let scheme_col = columns.require(&["grant_or_scheme_name", "scheme", "scheme_name"])?;
    let amount_col = columns.require(&["amount_in_crores", "amount"])?;
    let type_col = columns.find(&["expenditure_type"]);
    let estimate_col = columns.find(&["estimate_type"]);

    let mut parsed = Parsed::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                parsed.skip_unreadable(e);
                continue;
            }
        };

        let row = (|| -> Result<SchemeAllocation> {
            let year = parse_year_in(field(&record, Some(year_col)), options)?;
            let ministry = field(&record, Some(ministry_col)).trim().to_string();
            let scheme = field(&record, Some(scheme_col)).trim().to_string();
            if ministry.is_empty() || scheme.is_empty() {
                return Err(Error::InvalidData("Empty ministry or scheme name".into()));
            }
            let amount = parse_amount(field(&record, Some(amount_col)))?
                .ok_or_else(|| Error::InvalidData("Missing amount".into()))?;

            Ok(SchemeAllocation {
                year,
                ministry,
                scheme,
                amount,
                expenditure_type: non_empty(field(&record, type_col)),
                estimate_type: non_empty(field(&record, estimate_col)),
            })
        })();

        match row {
            Ok(r) => parsed.rows.push(r),
            Err(e) => parsed.skip(&record, e),
        }
    }

    debug!("Parsed {} scheme allocations", parsed.rows.len());
    Ok(parsed)
}

/// Parse `speeches.csv`
pub fn parse_speeches<R: Read>(reader: R, options: &LoadOptions) -> Result<Parsed<SpeechSummary>> {
    let mut rdr = csv_reader(reader);
    let columns = Columns::new(rdr.headers()?);
    let year_col = columns.require(&["year"])?;
    let summary_col = columns.require(&["ai_summary", "summary"])?;

    let mut seen = BTreeSet::new();
    let mut parsed = Parsed::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                parsed.skip_unreadable(e);
                continue;
            }
        };

        let row = (|| -> Result<SpeechSummary> {
            let year = parse_year_in(field(&record, Some(year_col)), options)?;
            let summary = non_empty(field(&record, Some(summary_col)))
                .ok_or_else(|| Error::InvalidData("Empty speech summary".into()))?;
            if !seen.insert(year) {
                return Err(Error::InvalidData(format!("Duplicate year {}", year)));
            }
            Ok(SpeechSummary { year, summary })
        })();

        match row {
            Ok(r) => parsed.rows.push(r),
            Err(e) => parsed.skip(&record, e),
        }
    }

    Ok(parsed)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader)
}

/// Header lookup by case-insensitive name
struct Columns {
    names: Vec<String>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Self {
            names: headers
                .iter()
                .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
                .collect(),
        }
    }

    fn find(&self, candidates: &[&str]) -> Option<usize> {
        candidates
            .iter()
            .find_map(|c| self.names.iter().position(|n| n == c))
    }

    fn require(&self, candidates: &[&str]) -> Result<usize> {
        self.find(candidates)
            .ok_or_else(|| Error::DataLoad(format!("Missing column: {}", candidates[0])))
    }
}

fn field(record: &StringRecord, col: Option<usize>) -> &str {
    col.and_then(|c| record.get(c)).unwrap_or("")
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Parse a budget year: `2023`, `2023.0` or fiscal-year style `2023-24`
fn parse_year(s: &str) -> Result<i32> {
    let s = s.trim();
    let head = s
        .split_once('-')
        .map(|(y, _)| y)
        .or_else(|| s.strip_suffix(".0"))
        .unwrap_or(s);
    head.parse::<i32>()
        .map_err(|_| Error::InvalidData(format!("Unable to parse year: {}", s)))
}

fn parse_year_in(s: &str, options: &LoadOptions) -> Result<i32> {
    let year = parse_year(s)?;
    if !is_supported_year(year) {
        return Err(Error::InvalidData(format!(
            "Year {} outside {}..={}",
            year, MIN_YEAR, MAX_YEAR
        )));
    }
    if !options.years.contains(&year) {
        return Err(Error::InvalidData(format!("Year {} filtered out", year)));
    }
    Ok(year)
}

/// Parse a non-negative amount, stripping separators and currency symbols
///
/// Empty cells and placeholders (`-`, `NA`, `N/A`, `nan`) are absent values.
pub(crate) fn parse_amount(s: &str) -> Result<Option<f64>> {
    match parse_signed(s)? {
        Some(v) if v < 0.0 => Err(Error::InvalidData(format!("Negative amount: {}", s.trim()))),
        other => Ok(other),
    }
}

fn parse_signed(s: &str) -> Result<Option<f64>> {
    let cleaned: String = s
        .trim()
        .replace([',', '"', ' ', '₹'], "")
        .trim_end_matches('%')
        .to_string();

    match cleaned.to_lowercase().as_str() {
        "" | "-" | "na" | "n/a" | "nan" => return Ok(None),
        _ => {}
    }

    let value = cleaned
        .parse::<f64>()
        .map_err(|_| Error::InvalidData(format!("Unable to parse amount: {}", s.trim())))?;
    if !value.is_finite() {
        return Err(Error::InvalidData(format!("Non-finite amount: {}", s.trim())));
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,25,000.50").unwrap(), Some(125000.5));
        assert_eq!(parse_amount("\"4,500\"").unwrap(), Some(4500.0));
        assert_eq!(parse_amount("₹ 99").unwrap(), Some(99.0));
        assert_eq!(parse_amount("").unwrap(), None);
        assert_eq!(parse_amount("N/A").unwrap(), None);
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_parse_year_formats() {
        assert_eq!(parse_year("2023").unwrap(), 2023);
        assert_eq!(parse_year("2023.0").unwrap(), 2023);
        assert_eq!(parse_year("2023-24").unwrap(), 2023);
        assert!(parse_year("FY").is_err());
    }

    #[test]
    fn test_parse_records() {
        let csv = "year,ministry,category,expenditure,revenue,currency_unit
2023,Health,Hospitals,100,0,crore
2023,Defense,,50,,
2023,Railways,Freight,\"1,000\",2500,lakh";

        let parsed = parse_records(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[0].expenditure, 100.0);
        assert_eq!(parsed.rows[1].category, "General");
        assert_eq!(parsed.rows[1].revenue, 0.0);
        assert_eq!(parsed.rows[2].unit, CurrencyUnit::Lakh);
        assert_eq!(parsed.rows[2].expenditure, 10.0);
        assert_eq!(parsed.rows[2].revenue, 25.0);
    }

    #[test]
    fn test_parse_records_skips_malformed_rows() {
        let csv = "year,ministry,category,expenditure,revenue
2023,Health,General,100,0
2031,Health,General,100,0
2023,,General,100,0
2023,Health,General,-4,0
2023,Health,General,lots,0
2023,Health,General,10,0,extra";

        let parsed = parse_records(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.skipped, 4);
        assert_eq!(parsed.skip_reasons.len(), 4);
        assert!(parsed.skip_reasons[0].starts_with("line 3"));
    }

    #[test]
    fn test_parse_records_currency_units() {
        let csv = "year,ministry,expenditure,revenue,currency_unit
2023,Health,100,0,crore
2023,Health,500,0,lakh
2023,Health,100,0,dollars
2023,Defence,40,0,";

        let parsed = parse_records(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[1].unit, CurrencyUnit::Lakh);
        assert_eq!(parsed.rows[1].expenditure, 5.0);
        assert_eq!(parsed.rows[2].unit, CurrencyUnit::Crore);

        assert_eq!(parsed.skipped, 1);
        assert!(parsed.skip_reasons[0].starts_with("line 4"));
        assert!(parsed.skip_reasons[0].contains("dollars"));
    }

    #[test]
    fn test_unreadable_rows_have_reasons() {
        let records: &[u8] = b"year,ministry,expenditure\n2023,Health,10\n2023,\xff\xfe,20\n2024,Defence,30\n";
        let parsed = parse_records(records, &LoadOptions::default()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.skip_reasons.len(), 1);
        assert!(parsed.skip_reasons[0].contains("CSV"));

        let speeches: &[u8] = b"year,ai_summary\n2023,\xc3\x28\n2024,Growth focus\n";
        let parsed = parse_speeches(speeches, &LoadOptions::default()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.skip_reasons.len(), 1);
    }

    #[test]
    fn test_parse_records_year_window() {
        let csv = "year,ministry,expenditure
2020,Health,10
2023,Health,20";
        let options = LoadOptions::with_years(2022..=2025).unwrap();
        let parsed = parse_records(csv.as_bytes(), &options).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].year, 2023);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_load_options_rejects_unsupported_window() {
        assert!(LoadOptions::with_years(2010..=2020).is_err());
        assert!(LoadOptions::with_years(2020..=2026).is_err());
        assert!(LoadOptions::with_years(2018..=2020).is_ok());
    }

    #[test]
    fn test_parse_records_missing_columns() {
        let csv = "year,department,expenditure\n2023,Health,10";
        let err = parse_records(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::DataLoad(_)));
    }

    #[test]
    fn test_parse_macro() {
        let csv = "year,total_receipts,total_expenditure,gdp_nominal_in_crores,fiscal_deficit_in_crores,fiscal_deficit_as_gdp_pct
2022,\"2,269,000\",\"3,944,000\",\"27,240,000\",\"1,675,000\",6.4
2023,2400000,4100000,30100000,1700000,5.9
2023,2400000,4100000,30100000,1700000,5.9";

        let parsed = parse_macro(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.rows[0].gdp_nominal, Some(27_240_000.0));
        assert_eq!(parsed.rows[1].fiscal_deficit_pct, Some(5.9));
    }

    #[test]
    fn test_parse_revenue_sources_wide() {
        let csv = "Revenue Source,2016,2017,2018,2030
Income Tax,\"3,500\",\"4,100\",,9
Goods and Services Tax (GST),,\"2,100\",\"4,400\",9";

        let parsed = parse_revenue_sources(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        let income = &parsed.rows[0];
        assert_eq!(income.source, "Income Tax");
        assert_eq!(income.amounts.get(&2016), Some(&3500.0));
        assert_eq!(income.amounts.get(&2018), None);
        assert_eq!(income.amounts.get(&2030), None);
        assert_eq!(parsed.rows[1].amounts.len(), 2);
    }

    #[test]
    fn test_parse_schemes() {
        let csv = "year,ministry_name,grant_or_scheme_name,amount_in_crores,expenditure_type,estimate_type
2023,Ministry of Health,National Health Mission,36785,Revenue,BE
2023,Ministry of Health,,100,Revenue,BE";

        let parsed = parse_schemes(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.rows[0].estimate_type.as_deref(), Some("BE"));
    }

    #[test]
    fn test_parse_speeches() {
        let csv = "year,ai_summary
2024,Focus on infrastructure.
2025,";
        let parsed = parse_speeches(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].summary, "Focus on infrastructure.");
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_load_dir_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("budget_records.csv"),
            "year,ministry,category,expenditure,revenue\n2023,Health,General,100,0\n",
        )
        .unwrap();

        let (tables, report) = load_dir(dir.path(), &LoadOptions::default()).unwrap();
        assert_eq!(tables.records.len(), 1);
        assert_eq!(report.missing_required(), vec![FileKind::Macro]);
        assert!(report.missing.contains(&FileKind::Speeches));
        assert!(report.ensure_complete().is_err());
        assert_eq!(report.file(FileKind::Records).unwrap().loaded, 1);
    }

    #[test]
    fn test_load_dir_without_required_files_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("speeches.csv"), "year,ai_summary\n2023,x\n").unwrap();
        let err = load_dir(dir.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::DataLoad(_)));
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let err = load_dir(Path::new("/nonexistent/fiscal-data"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::DataLoad(_)));
    }
}
