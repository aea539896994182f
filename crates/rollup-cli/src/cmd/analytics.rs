use anyhow::Context;
use rollup_core::report::{GroupRow, IndicatorRow, ProductRow};

use super::{block_on, pct, FilterArgs, Globals};
use crate::output::{print_json, print_table};

// ---------------------------------------------------------------------------
// analytics
// ---------------------------------------------------------------------------

pub fn run(globals: &Globals, filters: FilterArgs) -> anyhow::Result<()> {
    let (_, engine) = globals.engine()?;
    let report = block_on(engine.analytics(filters.into()))?.context("analytics failed")?;

    if globals.json {
        return print_json(&report);
    }

    let s = &report.summary;
    println!(
        "Products: {}  Indicators: {}  Tasks: {} ({} completed, {} overdue)  Completion: {}",
        s.total_products,
        s.total_indicators,
        s.counts.total_tasks,
        s.counts.completed_tasks,
        s.counts.overdue_count,
        pct(s.counts.completion_percentage),
    );
    if !report.degraded.is_empty() {
        let names: Vec<&str> = report.degraded.iter().map(|r| r.as_str()).collect();
        println!("Degraded: {}", names.join(", "));
    }

    section("Indicators");
    indicator_table(&report.by_indicator);
    section("Countries");
    group_table(&report.by_country);
    section("Products");
    product_table(&report.by_product);
    section("Organizations");
    group_table(&report.by_organization);
    section("Outputs");
    group_table(&report.by_output);
    section("Phases");
    group_table(&report.by_phase);
    Ok(())
}

// ---------------------------------------------------------------------------
// indicators
// ---------------------------------------------------------------------------

pub fn run_indicators(globals: &Globals, filters: FilterArgs) -> anyhow::Result<()> {
    let (_, engine) = globals.engine()?;
    let metrics =
        block_on(engine.indicator_metrics(filters.into()))?.context("indicator metrics failed")?;

    if globals.json {
        return print_json(&metrics);
    }

    println!(
        "Indicators: {}  Products: {}  Average adoption: {}",
        metrics.total_indicators,
        metrics.total_products,
        pct(metrics.average_adoption),
    );
    println!();
    indicator_table(&metrics.indicators);
    Ok(())
}

// ---------------------------------------------------------------------------
// products
// ---------------------------------------------------------------------------

pub fn run_products(globals: &Globals, filters: FilterArgs) -> anyhow::Result<()> {
    let (_, engine) = globals.engine()?;
    let metrics =
        block_on(engine.product_metrics(filters.into()))?.context("product metrics failed")?;

    if globals.json {
        return print_json(&metrics);
    }

    let d = &metrics.delivery;
    println!(
        "Delivery: {} overdue, {} due today, {} on time, {} pending",
        d.overdue, d.due_today, d.on_time, d.pending
    );
    println!();
    product_table(&metrics.products);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn section(title: &str) {
    println!();
    println!("{title}");
}

fn indicator_table(rows: &[IndicatorRow]) {
    if rows.is_empty() {
        println!("(none)");
        return;
    }
    let table = rows
        .iter()
        .map(|r| {
            vec![
                r.code.clone(),
                r.name.clone(),
                r.products_count.to_string(),
                pct(r.adoption_percentage),
                format!("{}/{}", r.counts.completed_tasks, r.counts.total_tasks),
                pct(r.counts.completion_percentage),
            ]
        })
        .collect();
    print_table(
        &["CODE", "NAME", "PRODUCTS", "ADOPTION", "TASKS", "COMPLETION"],
        table,
    );
}

fn group_table(rows: &[GroupRow]) {
    if rows.is_empty() {
        println!("(none)");
        return;
    }
    let table = rows
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.name.clone(),
                format!("{}/{}", r.counts.completed_tasks, r.counts.total_tasks),
                r.counts.overdue_count.to_string(),
                pct(r.counts.completion_percentage),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "TASKS", "OVERDUE", "COMPLETION"], table);
}

fn product_table(rows: &[ProductRow]) {
    if rows.is_empty() {
        println!("(none)");
        return;
    }
    let table = rows
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.name.clone(),
                r.country.clone(),
                format!("{}/{}", r.counts.completed_tasks, r.counts.total_tasks),
                pct(r.counts.completion_percentage),
                r.delivery_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                r.delivery_status.to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "COUNTRY", "TASKS", "COMPLETION", "DELIVERY", "STATUS"],
        table,
    );
}
