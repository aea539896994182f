//! The rollup coordinator: runs a plan of independent rollups concurrently
//! and merges their rows into one response.
//!
//! Every rollup issues its own store reads on the blocking pool. A failing
//! rollup costs only its own slot: it comes back empty and is named in
//! `degraded`, while its siblings report normally.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::checkin;
use crate::error::{Result, RollupError};
use crate::filter::{FilterField, Filters};
use crate::grouper::{
    group_by, percentage, rank, round2, tally_all, Dimension, Grouping, KeyPart, Tally, COUNTRY,
    ORGANIZATION, OUTPUT, PHASE, PRODUCT,
};
use crate::records::{prepare_tasks, IndicatorRecord, PreparedTask, ProductRecord};
use crate::report::{
    AnalyticsReport, CheckInReport, DeliveryCounts, GroupRow, IndicatorMetrics, IndicatorRow,
    ProductMetrics, ProductRow, Summary,
};
use crate::status::StatusAliases;
use crate::store::{CancelFlag, RecordQuery, RecordStore};
use crate::temporal::Calendar;
use crate::types::RollupName;

// ---------------------------------------------------------------------------
// Row builders
// ---------------------------------------------------------------------------

/// Whether an indicator belongs in a filtered view: it has an in-scope
/// product, or it is the indicator the filter names.
fn indicator_in_scope(ind: &IndicatorRecord, filters: &Filters) -> bool {
    filters.is_empty()
        || !ind.product_ids.is_empty()
        || filters.get(FilterField::Indicator) == Some(ind.id.as_str())
}

/// One row per indicator in scope.
pub fn indicator_rows(
    indicators: Vec<IndicatorRecord>,
    tasks: &[PreparedTask],
    total_products: u64,
    calendar: &Calendar,
    filters: &Filters,
) -> Vec<IndicatorRow> {
    let mut rows: Vec<IndicatorRow> = indicators
        .into_iter()
        .filter(|ind| indicator_in_scope(ind, filters))
        .map(|ind| {
            let (tally, products_count) = {
                let products: HashSet<&str> = ind.product_ids.iter().map(String::as_str).collect();
                let mut tally = Tally::default();
                for task in tasks
                    .iter()
                    .filter(|t| products.contains(t.record.product_id.as_str()))
                {
                    tally.add(&task.fact, calendar);
                }
                (tally, products.len() as u64)
            };
            IndicatorRow {
                id: ind.id,
                code: ind.code,
                name: ind.name,
                output: ind.output_name.or(ind.output_id),
                counts: tally.counts(),
                products_count,
                adoption_percentage: percentage(products_count, total_products),
            }
        })
        .collect();
    rank(&mut rows);
    rows
}

fn group_rows(grouping: Grouping, product_counts: Option<&HashMap<String, u64>>) -> Vec<GroupRow> {
    let mut rows: Vec<GroupRow> = grouping
        .into_groups()
        .filter_map(|(key, tally)| {
            let part = key.into_iter().next()?;
            let mut row = GroupRow::new(part, &tally);
            if let Some(counts) = product_counts {
                row.products_count = Some(counts.get(&row.id).copied().unwrap_or(0));
            }
            Some(row)
        })
        .collect();
    rank(&mut rows);
    rows
}

/// Rows for a task-only dimension (organization, phase).
pub fn dimension_rows(tasks: &[PreparedTask], dim: Dimension, calendar: &Calendar) -> Vec<GroupRow> {
    group_rows(group_by(tasks, &[dim], *calendar), None)
}

/// Country rows. Every country with an in-scope product is listed, even one
/// whose products have no tasks yet.
pub fn country_rows(products: &[ProductRecord], tasks: &[PreparedTask], calendar: &Calendar) -> Vec<GroupRow> {
    let mut grouping = Grouping::new(*calendar);
    let mut counts: HashMap<String, u64> = HashMap::new();
    for p in products {
        grouping.seed(vec![KeyPart::new(&p.country_id, p.country_name.as_deref())]);
        *counts.entry(p.country_id.clone()).or_default() += 1;
    }
    grouping.extend(tasks, &[COUNTRY]);
    group_rows(grouping, Some(&counts))
}

/// Output rows, seeded from the in-scope products like [`country_rows`].
pub fn output_rows(products: &[ProductRecord], tasks: &[PreparedTask], calendar: &Calendar) -> Vec<GroupRow> {
    let mut grouping = Grouping::new(*calendar);
    let mut counts: HashMap<String, u64> = HashMap::new();
    for p in products {
        if let Some(id) = &p.output_id {
            grouping.seed(vec![KeyPart::new(id, p.output_name.as_deref())]);
            *counts.entry(id.clone()).or_default() += 1;
        }
    }
    grouping.extend(tasks, &[OUTPUT]);
    group_rows(grouping, Some(&counts))
}

/// Product rows with delivery status. A product whose delivery date does not
/// parse is skipped.
pub fn product_rows(products: Vec<ProductRecord>, tasks: &[PreparedTask], calendar: &Calendar) -> Vec<ProductRow> {
    let tallies: HashMap<String, Tally> = group_by(tasks, &[PRODUCT], *calendar)
        .into_groups()
        .filter_map(|(key, tally)| key.into_iter().next().map(|k| (k.id, tally)))
        .collect();

    let mut rows: Vec<ProductRow> = products
        .into_iter()
        .filter_map(|p| {
            let delivery = match p.delivery() {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(rollup = %RollupName::ByProduct, error = %e, "skipping malformed row");
                    return None;
                }
            };
            let tally = tallies.get(&p.id).copied().unwrap_or_default();
            let country = KeyPart::new(&p.country_id, p.country_name.as_deref()).name;
            Some(ProductRow {
                id: p.id,
                name: p.name,
                country_id: p.country_id,
                country,
                output: p.output_name.or(p.output_id),
                counts: tally.counts(),
                delivery_date: delivery,
                delivery_status: calendar.delivery(delivery, tally.is_complete()),
            })
        })
        .collect();
    rank(&mut rows);
    rows
}

pub fn summary(
    products: &[ProductRecord],
    indicators: &[IndicatorRecord],
    tasks: &[PreparedTask],
    calendar: &Calendar,
    filters: &Filters,
) -> Summary {
    let total_indicators = indicators
        .iter()
        .filter(|ind| indicator_in_scope(ind, filters))
        .count();
    Summary {
        total_products: products.len() as u64,
        total_indicators: total_indicators as u64,
        counts: tally_all(tasks, calendar).counts(),
    }
}

// ---------------------------------------------------------------------------
// RollupOutput / SlotResults
// ---------------------------------------------------------------------------

/// What one slot of a plan produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RollupOutput {
    Indicators {
        rows: Vec<IndicatorRow>,
        total_products: u64,
    },
    Groups(Vec<GroupRow>),
    Products(Vec<ProductRow>),
    Summary(Summary),
    CheckIns(CheckInReport),
}

/// Outputs of the slots that succeeded, plus the names of those that did not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotResults {
    outputs: BTreeMap<RollupName, RollupOutput>,
    degraded: Vec<RollupName>,
}

impl SlotResults {
    pub fn get(&self, name: RollupName) -> Option<&RollupOutput> {
        self.outputs.get(&name)
    }

    pub fn degraded(&self) -> &[RollupName] {
        &self.degraded
    }

    fn take_groups(&mut self, name: RollupName) -> Vec<GroupRow> {
        match self.outputs.remove(&name) {
            Some(RollupOutput::Groups(rows)) => rows,
            _ => Vec::new(),
        }
    }

    fn take_indicators(&mut self) -> (Vec<IndicatorRow>, u64) {
        match self.outputs.remove(&RollupName::ByIndicator) {
            Some(RollupOutput::Indicators { rows, total_products }) => (rows, total_products),
            _ => (Vec::new(), 0),
        }
    }

    fn take_products(&mut self) -> Vec<ProductRow> {
        match self.outputs.remove(&RollupName::ByProduct) {
            Some(RollupOutput::Products(rows)) => rows,
            _ => Vec::new(),
        }
    }

    pub fn into_analytics(mut self) -> AnalyticsReport {
        let (by_indicator, _) = self.take_indicators();
        let summary = match self.outputs.remove(&RollupName::Summary) {
            Some(RollupOutput::Summary(s)) => s,
            _ => Summary::default(),
        };
        AnalyticsReport {
            by_indicator,
            by_country: self.take_groups(RollupName::ByCountry),
            by_product: self.take_products(),
            by_organization: self.take_groups(RollupName::ByOrganization),
            by_output: self.take_groups(RollupName::ByOutput),
            by_phase: self.take_groups(RollupName::ByPhase),
            summary,
            degraded: self.degraded,
        }
    }

    pub fn into_indicator_metrics(mut self) -> IndicatorMetrics {
        let (indicators, total_products) = self.take_indicators();
        let average_adoption = if indicators.is_empty() {
            0.0
        } else {
            let sum: f64 = indicators.iter().map(|i| i.adoption_percentage).sum();
            round2(sum / indicators.len() as f64)
        };
        IndicatorMetrics {
            total_indicators: indicators.len() as u64,
            total_products,
            average_adoption,
            indicators,
        }
    }

    pub fn into_product_metrics(mut self) -> ProductMetrics {
        let products = self.take_products();
        let mut delivery = DeliveryCounts::default();
        for p in &products {
            delivery.add(p.delivery_status);
        }
        ProductMetrics { products, delivery }
    }

    pub fn into_check_ins(mut self) -> CheckInReport {
        match self.outputs.remove(&RollupName::CheckIns) {
            Some(RollupOutput::CheckIns(report)) => report,
            _ => CheckInReport::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Everything one rollup needs, cheap to clone into a blocking task.
#[derive(Clone)]
struct Scope {
    store: Arc<dyn RecordStore>,
    aliases: Arc<StatusAliases>,
    calendar: Calendar,
    filters: Filters,
    cancel: CancelFlag,
}

impl Scope {
    fn query(&self, rollup: RollupName) -> RecordQuery<'_> {
        RecordQuery {
            rollup,
            filters: &self.filters,
            cancel: &self.cancel,
        }
    }

    fn tasks(&self, rollup: RollupName) -> Result<Vec<PreparedTask>> {
        let records = self.store.tasks(&self.query(rollup))?;
        Ok(prepare_tasks(records, &self.aliases, rollup))
    }

    fn compute(&self, rollup: RollupName) -> Result<RollupOutput> {
        let q = self.query(rollup);
        let cal = &self.calendar;
        let output = match rollup {
            RollupName::ByIndicator => {
                let indicators = self.store.indicators(&q)?;
                let total_products = self.store.product_count(&q)?;
                let tasks = self.tasks(rollup)?;
                RollupOutput::Indicators {
                    rows: indicator_rows(indicators, &tasks, total_products, cal, &self.filters),
                    total_products,
                }
            }
            RollupName::ByCountry => {
                let products = self.store.products(&q)?;
                RollupOutput::Groups(country_rows(&products, &self.tasks(rollup)?, cal))
            }
            RollupName::ByProduct => {
                let products = self.store.products(&q)?;
                RollupOutput::Products(product_rows(products, &self.tasks(rollup)?, cal))
            }
            RollupName::ByOrganization => {
                RollupOutput::Groups(dimension_rows(&self.tasks(rollup)?, ORGANIZATION, cal))
            }
            RollupName::ByOutput => {
                let products = self.store.products(&q)?;
                RollupOutput::Groups(output_rows(&products, &self.tasks(rollup)?, cal))
            }
            RollupName::ByPhase => RollupOutput::Groups(dimension_rows(&self.tasks(rollup)?, PHASE, cal)),
            RollupName::Summary => {
                let products = self.store.products(&q)?;
                let indicators = self.store.indicators(&q)?;
                let tasks = self.tasks(rollup)?;
                RollupOutput::Summary(summary(&products, &indicators, &tasks, cal, &self.filters))
            }
            RollupName::CheckIns => {
                let records = self.store.tasks(&q)?;
                RollupOutput::CheckIns(checkin::classify(&records, &self.aliases, cal))
            }
        };
        Ok(output)
    }
}

pub struct Coordinator {
    scope: Scope,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        aliases: Arc<StatusAliases>,
        calendar: Calendar,
        filters: Filters,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            scope: Scope {
                store,
                aliases,
                calendar,
                filters,
                cancel,
            },
        }
    }

    /// Run every rollup of `plan` concurrently. Fails only when no slot
    /// succeeded.
    pub async fn run(&self, plan: &[RollupName]) -> Result<SlotResults> {
        let mut tasks = tokio::task::JoinSet::new();
        for &name in plan {
            let scope = self.scope.clone();
            tasks.spawn(async move {
                let result = tokio::task::spawn_blocking(move || scope.compute(name))
                    .await
                    .map_err(|e| RollupError::Join(e.to_string()))
                    .and_then(|r| r);
                (name, result)
            });
        }

        let mut results = SlotResults::default();
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(output))) => {
                    results.outputs.insert(name, output);
                }
                Ok((name, Err(e))) => {
                    tracing::error!(rollup = %name, filters = %self.scope.filters, error = %e, "rollup failed");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, "rollup task join error");
                    first_error.get_or_insert(RollupError::Join(e.to_string()));
                }
            }
        }

        results.degraded = plan
            .iter()
            .copied()
            .filter(|name| !results.outputs.contains_key(name))
            .collect();
        results.degraded.sort();
        results.degraded.dedup();

        if results.outputs.is_empty() && !plan.is_empty() {
            return Err(first_error
                .unwrap_or_else(|| RollupError::StoreUnavailable("every rollup failed".into())));
        }
        Ok(results)
    }
}
