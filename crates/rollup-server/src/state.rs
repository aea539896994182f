use std::sync::Arc;

use rollup_core::MetricsEngine;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MetricsEngine>,
}

impl AppState {
    pub fn new(engine: MetricsEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
