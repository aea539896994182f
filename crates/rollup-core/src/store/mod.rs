//! Read-only access to the dashboard's relational store.

pub mod schema;
pub mod sqlite;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, RollupError};
use crate::filter::{FilterField, Filters};
use crate::records::{IndicatorRecord, ProductRecord, TaskRecord};
use crate::types::RollupName;

pub use sqlite::SqliteStore;

// ---------------------------------------------------------------------------
// CancelFlag
// ---------------------------------------------------------------------------

/// Cooperative cancellation shared by every query of one fan-out.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(RollupError::Cancelled);
        }
        Ok(())
    }

    /// Raise the flag when the returned guard is dropped.
    pub fn on_drop(&self) -> CancelOnDrop {
        CancelOnDrop(self.clone())
    }
}

pub struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

// ---------------------------------------------------------------------------
// RecordQuery
// ---------------------------------------------------------------------------

/// Parameters of one store read: which rollup is asking (for logs and
/// per-rollup routing), the request filters, and the cancellation flag.
#[derive(Debug, Clone, Copy)]
pub struct RecordQuery<'a> {
    pub rollup: RollupName,
    pub filters: &'a Filters,
    pub cancel: &'a CancelFlag,
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

/// Blocking, read-only store interface. Implementations must tolerate
/// concurrent calls from several rollups at once.
pub trait RecordStore: Send + Sync {
    /// Tasks of the products in scope.
    fn tasks(&self, query: &RecordQuery<'_>) -> Result<Vec<TaskRecord>>;

    /// Products in scope.
    fn products(&self, query: &RecordQuery<'_>) -> Result<Vec<ProductRecord>>;

    /// Indicators, each carrying the ids of its in-scope products.
    fn indicators(&self, query: &RecordQuery<'_>) -> Result<Vec<IndicatorRecord>>;

    /// Every product in the store, ignoring filters.
    fn product_count(&self, query: &RecordQuery<'_>) -> Result<u64>;

    /// Whether `id` names an existing entity of the kind `field` filters on.
    fn exists(&self, field: FilterField, id: &str) -> Result<bool>;
}
