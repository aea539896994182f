pub mod analytics;
pub mod checkins;
pub mod config;
pub mod serve;

use std::future::Future;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use rollup_core::config::Config;
use rollup_core::{FilterParams, MetricsEngine};

/// Flags shared by every subcommand.
pub struct Globals {
    pub db: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub json: bool,
}

impl Globals {
    /// The config file (or defaults) with `--db` applied on top.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config =
            Config::load_or_default(self.config.as_deref()).context("failed to load config")?;
        if let Some(db) = &self.db {
            config.store.path = Some(db.clone());
        }
        Ok(config)
    }

    pub fn engine(&self) -> anyhow::Result<(Config, MetricsEngine)> {
        let config = self.load_config()?;
        let engine = MetricsEngine::from_config(&config, None).context("failed to open store")?;
        Ok((config, engine))
    }
}

/// Scoping filters, same names as the HTTP query parameters.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Restrict to products of this output
    #[arg(long)]
    pub output: Option<String>,

    /// Restrict to products linked to this indicator
    #[arg(long)]
    pub indicator: Option<String>,

    /// Restrict to products of this work package
    #[arg(long)]
    pub work_package: Option<String>,

    /// Restrict to a single product
    #[arg(long)]
    pub product_id: Option<String>,
}

impl From<FilterArgs> for FilterParams {
    fn from(args: FilterArgs) -> Self {
        FilterParams {
            output: args.output,
            indicator: args.indicator,
            work_package: args.work_package,
            product_id: args.product_id,
        }
    }
}

pub fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()?;
    Ok(rt.block_on(fut))
}

pub fn pct(value: f64) -> String {
    format!("{value:.2}%")
}
