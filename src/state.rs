// src/state.rs

use crate::config::AppConfig;
use crate::error::Result;
use crate::metrics::MetricsHandle;
use crate::promotion::{PromotionPolicy, PromotionService, SystemClock};
use crate::storage;
use std::sync::Arc;
use tracing::info;

/// Shared state handed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub promotion: PromotionService,
    metrics: Option<MetricsHandle>,
}

impl AppState {
    pub fn new(promotion: PromotionService) -> Self {
        Self {
            promotion,
            metrics: None,
        }
    }

    /// Builds the configured store and a service running on server local time.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = storage::build_store(&config.store)?;
        info!(store.backend = store.backend_name(), "Counter store ready");
        let promotion = PromotionService::new(
            store,
            Arc::new(SystemClock),
            PromotionPolicy::from(&config.promotion),
        );
        Ok(Self::new(promotion))
    }

    pub fn with_metrics(mut self, metrics: Option<MetricsHandle>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Option<&MetricsHandle> {
        self.metrics.as_ref()
    }
}
