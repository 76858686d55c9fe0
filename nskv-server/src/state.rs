use std::sync::Arc;

use nskv_core::Store;

use crate::metrics::Metrics;

/// Shared state handed to every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub metrics: Arc<Metrics>,
}
