//! Budget query commands (summary, overview, ministries, compare, split, insights, search)

use std::collections::BTreeSet;

use anyhow::Result;
use fiscal_core::{format_crores, format_pct, BudgetStore, YearSummary};

use super::{print_json, truncate};

fn pct_or_dash(value: Option<f64>) -> String {
    value.map(format_pct).unwrap_or_else(|| "-".to_string())
}

fn change_or_dash(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:+.1}%", v))
        .unwrap_or_else(|| "-".to_string())
}

fn print_summary(summary: &YearSummary) {
    println!("  Expenditure:       {}", format_crores(summary.total_expenditure));
    println!("  Revenue:           {}", format_crores(summary.total_revenue));
    println!("  Deficit:           {}", format_crores(summary.deficit));
    println!(
        "  Expenditure / GDP: {}",
        pct_or_dash(summary.expenditure_to_gdp_pct)
    );
    println!("  Revenue / GDP:     {}", pct_or_dash(summary.revenue_to_gdp_pct));
    println!(
        "  Fiscal deficit:    {} of GDP (reported)",
        pct_or_dash(summary.fiscal_deficit_pct)
    );
    println!(
        "  Ministries:        {} ({} records)",
        summary.ministry_count, summary.record_count
    );
}

pub fn cmd_summary(store: &BudgetStore, year: i32, json: bool) -> Result<()> {
    let summary = store.yearly_summary(year)?;
    if json {
        return print_json(&summary);
    }

    println!();
    println!("📊 Budget {}", year);
    println!("   ─────────────────────────────────────────────");
    print_summary(&summary);
    println!();
    Ok(())
}

pub fn cmd_overview(store: &BudgetStore, year: i32, json: bool) -> Result<()> {
    let overview = store.year_overview(year)?;
    if json {
        return print_json(&overview);
    }

    println!();
    println!("📊 Budget {} Overview", year);
    println!("   ─────────────────────────────────────────────");
    print_summary(&overview.summary);
    println!(
        "  Deficit trend:     {}",
        overview.fiscal_health.deficit_trend
    );

    if !overview.top_ministries.is_empty() {
        println!();
        println!("  🏛️  Top ministries");
        for m in &overview.top_ministries {
            println!(
                "   {:>2}. {:<45} {:>18} {:>6}",
                m.rank,
                truncate(&m.ministry, 45),
                format_crores(m.amount),
                format_pct(m.percentage)
            );
        }
    }

    if !overview.revenue_breakdown.is_empty() {
        println!();
        println!("  💰 Revenue sources");
        for r in &overview.revenue_breakdown {
            println!(
                "       {:<45} {:>18} {:>6}",
                truncate(&r.source, 45),
                format_crores(r.amount),
                format_pct(r.percentage)
            );
        }
    }

    if !overview.key_schemes.is_empty() {
        println!();
        println!("  📋 Key schemes");
        for s in &overview.key_schemes {
            println!(
                "       {:<45} {:>18}  {}",
                truncate(&s.scheme, 45),
                format_crores(s.amount),
                s.ministry
            );
        }
    }

    if let Some(ref speech) = overview.speech_summary {
        println!();
        println!("  🎤 Budget speech");
        println!("     {}", speech.trim());
    }

    println!();
    Ok(())
}

pub fn cmd_ministries(store: &BudgetStore, year: i32, limit: usize, json: bool) -> Result<()> {
    let mut ministries = store.ministries(year)?;
    if limit > 0 {
        ministries.truncate(limit);
    }
    if json {
        return print_json(&ministries);
    }

    println!();
    println!("🏛️  Ministries by expenditure, {}", year);
    println!("   ─────────────────────────────────────────────");
    for m in &ministries {
        println!(
            "   {:>3}. {:<45} {:>18} {:>6}",
            m.rank,
            truncate(&m.ministry, 45),
            format_crores(m.amount),
            format_pct(m.percentage)
        );
    }
    println!();
    Ok(())
}

pub fn cmd_ministry(store: &BudgetStore, year: i32, name: &str, json: bool) -> Result<()> {
    let detail = store.ministry_detail(year, name)?;
    if json {
        return print_json(&detail);
    }

    println!();
    println!("🏛️  {} ({})", detail.ministry, detail.year);
    println!("   ─────────────────────────────────────────────");
    println!("  Expenditure: {}", format_crores(detail.expenditure));
    if detail.revenue > 0.0 {
        println!("  Revenue:     {}", format_crores(detail.revenue));
    }
    println!(
        "  Rank:        #{} ({} of total)",
        detail.rank,
        format_pct(detail.share_pct)
    );

    if !detail.categories.is_empty() {
        println!();
        println!("  Categories");
        for c in &detail.categories {
            println!(
                "     {:<40} {:>18}",
                truncate(&c.category, 40),
                format_crores(c.expenditure)
            );
        }
    }

    if !detail.history.is_empty() {
        println!();
        println!("  History");
        for point in &detail.history {
            println!("     {}  {:>18}", point.year, format_crores(point.amount));
        }
        println!("     Total {:>18}", format_crores(detail.total_all_years));
    }

    if !detail.schemes.is_empty() {
        println!();
        println!("  Schemes");
        for s in &detail.schemes {
            println!(
                "     {:<40} {:>18}",
                truncate(&s.scheme, 40),
                format_crores(s.amount)
            );
        }
    }

    println!();
    Ok(())
}

pub fn cmd_compare(store: &BudgetStore, years: &[i32], json: bool) -> Result<()> {
    let years: BTreeSet<i32> = years.iter().copied().collect();
    let comparison = store.compare_years(&years)?;
    if json {
        return print_json(&comparison);
    }

    println!();
    println!(
        "📈 Comparison {}",
        comparison
            .years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(" vs ")
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:<6} {:>18} {:>18} {:>18} {:>8}",
        "YEAR", "EXPENDITURE", "REVENUE", "DEFICIT", "FD/GDP"
    );
    for s in &comparison.summaries {
        println!(
            "   {:<6} {:>18} {:>18} {:>18} {:>8}",
            s.year,
            format_crores(s.total_expenditure),
            format_crores(s.total_revenue),
            format_crores(s.deficit),
            pct_or_dash(s.fiscal_deficit_pct)
        );
    }

    if !comparison.changes.is_empty() {
        println!();
        for change in &comparison.changes {
            println!(
                "   {} → {}: expenditure {}, revenue {}, deficit {}",
                change.from_year,
                change.to_year,
                change_or_dash(change.expenditure_change_pct),
                change_or_dash(change.revenue_change_pct),
                format_crores(change.deficit_change)
            );
        }
    }

    if !comparison.ministry_trends.is_empty() {
        println!();
        println!("  🏛️  Largest ministries");
        for trend in &comparison.ministry_trends {
            let points: Vec<String> = trend
                .points
                .iter()
                .map(|p| format!("{} {}", p.year, format_crores(p.amount)))
                .collect();
            println!("     {}: {}", truncate(&trend.name, 40), points.join(", "));
        }
    }

    if !comparison.revenue_trends.is_empty() {
        println!();
        println!("  💰 Revenue sources");
        for trend in &comparison.revenue_trends {
            let points: Vec<String> = trend
                .points
                .iter()
                .map(|p| format!("{} {}", p.year, format_crores(p.amount)))
                .collect();
            println!("     {}: {}", truncate(&trend.name, 40), points.join(", "));
        }
    }

    println!();
    Ok(())
}

pub fn cmd_split(store: &BudgetStore, year: i32, json: bool) -> Result<()> {
    let split = store.revenue_expenditure_split(year)?;
    if json {
        return print_json(&split);
    }

    println!();
    println!("⚖️  Revenue and expenditure, {}", year);
    println!("   ─────────────────────────────────────────────");
    println!("  Revenue:     {}", format_crores(split.total_revenue));
    println!("  Expenditure: {}", format_crores(split.total_expenditure));
    println!("  Deficit:     {}", format_crores(split.deficit));

    println!();
    println!("  💰 Revenue sources");
    if split.revenue_sources.is_empty() {
        println!("     (no revenue data)");
    }
    for r in &split.revenue_sources {
        println!(
            "     {:<40} {:>18} {:>6}",
            truncate(&r.source, 40),
            format_crores(r.amount),
            format_pct(r.percentage)
        );
    }

    println!();
    println!("  🏛️  Expenditure by ministry");
    for m in &split.expenditure_by_ministry {
        println!(
            "     {:<40} {:>18} {:>6}",
            truncate(&m.ministry, 40),
            format_crores(m.amount),
            format_pct(m.percentage)
        );
    }

    println!();
    Ok(())
}

pub fn cmd_insights(store: &BudgetStore, json: bool) -> Result<()> {
    let insights = store.insights();
    if json {
        return print_json(&insights);
    }

    println!();
    println!("💡 Budget Insights");
    println!("   ─────────────────────────────────────────────");

    if !insights.key_findings.is_empty() {
        for finding in &insights.key_findings {
            println!("  • {}", finding);
        }
        println!();
    }

    let fiscal = &insights.fiscal_analysis;
    println!("  Fiscal trend: {}", fiscal.trend);
    println!(
        "  Average fiscal deficit: {} of GDP",
        pct_or_dash(fiscal.average_deficit_pct)
    );
    println!(
        "  Average expenditure: {} of GDP",
        pct_or_dash(fiscal.average_expenditure_to_gdp_pct)
    );

    if !insights.revenue_growth.is_empty() {
        println!();
        println!("  💰 Revenue growth (average per year)");
        for growth in &insights.revenue_growth {
            println!(
                "     {:<40} {:>8}",
                truncate(&growth.source, 40),
                format!("{:+.1}%", growth.avg_growth)
            );
        }
    }

    let patterns = &insights.expenditure_patterns;
    if !patterns.top_growing.is_empty() {
        println!();
        println!("  📈 Fastest-growing ministries");
        for g in &patterns.top_growing {
            println!(
                "     {:<40} {:>8}  ({}-{})",
                truncate(&g.ministry, 40),
                format!("{:+.1}%", g.growth_pct),
                g.from_year,
                g.to_year
            );
        }
    }
    if !patterns.declining.is_empty() {
        println!();
        println!("  📉 Declining ministries");
        for g in &patterns.declining {
            println!(
                "     {:<40} {:>8}  ({}-{})",
                truncate(&g.ministry, 40),
                format!("{:+.1}%", g.growth_pct),
                g.from_year,
                g.to_year
            );
        }
    }

    let performance = &insights.ministry_performance;
    if !performance.most_consistent.is_empty() {
        println!();
        println!("  🎯 Most consistent allocations");
        for stats in &performance.most_consistent {
            println!(
                "     {:<40} score {:.3}  avg {}",
                truncate(&stats.ministry, 40),
                stats.consistency_score,
                format_crores(stats.average)
            );
        }
    }

    println!();
    Ok(())
}

pub fn cmd_search(store: &BudgetStore, query: &str, json: bool) -> Result<()> {
    let results = store.search(query);
    if json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!("No matches for \"{}\".", query);
        return Ok(());
    }

    println!();
    println!("🔍 Matches for \"{}\"", query);

    if !results.ministries.is_empty() {
        println!();
        println!("  🏛️  Ministries");
        for m in &results.ministries {
            println!(
                "     {:<45} {:>18} in {} (rank #{})",
                truncate(&m.name, 45),
                format_crores(m.latest_allocation),
                m.latest_year,
                m.rank
            );
        }
    }

    if !results.schemes.is_empty() {
        println!();
        println!("  📋 Schemes");
        for s in &results.schemes {
            println!(
                "     {:<45} {:>18} in {}  {}",
                truncate(&s.scheme, 45),
                format_crores(s.amount),
                s.year,
                s.ministry
            );
        }
    }

    if !results.revenue_sources.is_empty() {
        println!();
        println!("  💰 Revenue sources");
        for r in &results.revenue_sources {
            match (r.latest_year, r.latest_amount) {
                (Some(year), Some(amount)) => println!(
                    "     {:<45} {:>18} in {}",
                    truncate(&r.source, 45),
                    format_crores(amount),
                    year
                ),
                _ => println!("     {:<45} (no figures)", truncate(&r.source, 45)),
            }
        }
    }

    println!();
    Ok(())
}
