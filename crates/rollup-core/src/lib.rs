pub mod checkin;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod grouper;
pub mod io;
pub mod records;
pub mod report;
pub mod resilience;
pub mod rollup;
pub mod status;
pub mod store;
pub mod temporal;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::MetricsEngine;
pub use error::{Result, RollupError};
pub use filter::FilterParams;
