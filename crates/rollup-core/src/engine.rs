//! Request-level entry points shared by the HTTP server and the CLI.
//!
//! Each call validates its filters, runs a rollup plan through the
//! [`Coordinator`] and wraps the whole fan-out in
//! [`resilience::with_fallback`]. Validation and the fan-out share one
//! deadline. Only an invalid filter reaches the caller as an error; a store
//! outage yields the empty report.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Weekday;
use tokio::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, EngineConfig};
use crate::error::{Result, RollupError};
use crate::filter::{FilterParams, Filters};
use crate::report::{AnalyticsReport, CheckInReport, IndicatorMetrics, ProductMetrics};
use crate::resilience;
use crate::rollup::{Coordinator, SlotResults};
use crate::status::StatusAliases;
use crate::store::{CancelFlag, RecordStore, SqliteStore};
use crate::temporal::Calendar;
use crate::types::RollupName;

#[derive(Clone)]
pub struct MetricsEngine {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    aliases: Arc<StatusAliases>,
    deadline: Duration,
    week_start: Weekday,
}

impl MetricsEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        aliases: StatusAliases,
        cfg: &EngineConfig,
    ) -> Self {
        Self {
            store,
            clock,
            aliases: Arc::new(aliases),
            deadline: Duration::from_millis(cfg.deadline_ms),
            week_start: cfg.week_start,
        }
    }

    /// Build the engine the binaries use: SQLite store, system clock, aliases
    /// from config. `db` overrides `store.path`.
    pub fn from_config(cfg: &Config, db: Option<&Path>) -> Result<Self> {
        let path = db
            .map(Path::to_path_buf)
            .or_else(|| cfg.store.path.clone())
            .ok_or_else(|| {
                RollupError::Config(
                    "no store configured; pass --db, set ROLLUP_DB, or set store.path".to_string(),
                )
            })?;
        let store = SqliteStore::open(path, Duration::from_millis(cfg.store.busy_timeout_ms))?;
        let aliases = StatusAliases::from_config(&cfg.statuses)?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(SystemClock),
            aliases,
            &cfg.engine,
        ))
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// The merged dashboard response.
    pub async fn analytics(&self, params: FilterParams) -> Result<AnalyticsReport> {
        self.execute("analytics", params, RollupName::analytics(), SlotResults::into_analytics)
            .await
    }

    pub async fn indicator_metrics(&self, params: FilterParams) -> Result<IndicatorMetrics> {
        self.execute(
            "indicator_metrics",
            params,
            &[RollupName::ByIndicator],
            SlotResults::into_indicator_metrics,
        )
        .await
    }

    pub async fn product_metrics(&self, params: FilterParams) -> Result<ProductMetrics> {
        self.execute(
            "product_metrics",
            params,
            &[RollupName::ByProduct],
            SlotResults::into_product_metrics,
        )
        .await
    }

    pub async fn check_ins(&self, params: FilterParams) -> Result<CheckInReport> {
        self.execute(
            "check_ins",
            params,
            &[RollupName::CheckIns],
            SlotResults::into_check_ins,
        )
        .await
    }

    async fn execute<T: Default>(
        &self,
        label: &str,
        params: FilterParams,
        plan: &[RollupName],
        finish: fn(SlotResults) -> T,
    ) -> Result<T> {
        let cancel = CancelFlag::default();
        // Dropping this future (client gone) stops the store reads too.
        let _guard = cancel.on_drop();

        let started = Instant::now();

        let filters = match self.validate(params).await {
            Ok(filters) => filters,
            Err(e) if e.is_transient() => {
                tracing::error!(request = label, error = %e, "filter validation failed; serving empty report");
                return Ok(T::default());
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(request = label, filters = %filters, "running rollups");

        let coordinator = Coordinator::new(
            self.store.clone(),
            self.aliases.clone(),
            Calendar::from_clock(self.clock.as_ref(), self.week_start),
            filters,
            cancel.clone(),
        );
        let remaining = self.deadline.saturating_sub(started.elapsed());
        let report = resilience::with_fallback(label, remaining, &cancel, async {
            coordinator.run(plan).await.map(finish)
        })
        .await;
        Ok(report)
    }

    async fn validate(&self, params: FilterParams) -> Result<Filters> {
        let store = self.store.clone();
        let lookup = tokio::task::spawn_blocking(move || Filters::validate(params, store.as_ref()));
        match tokio::time::timeout(self.deadline, lookup).await {
            Ok(joined) => joined.map_err(|e| RollupError::Join(e.to_string()))?,
            Err(_) => Err(RollupError::DeadlineExceeded(self.deadline.as_millis() as u64)),
        }
    }
}
