pub mod ai;
pub mod analytics;
pub mod extract;
pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::analytics::AnalyticsEngine;
use crate::enrichment::EnrichmentService;
use crate::processing::IncidentProcessor;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<IncidentProcessor>,
    pub analytics: Arc<AnalyticsEngine>,
}

impl AppState {
    pub fn new(processor: Arc<IncidentProcessor>, analytics: Arc<AnalyticsEngine>) -> Self {
        Self {
            processor,
            analytics,
        }
    }

    /// Build the analytics engine over the processor's store
    pub fn from_processor(processor: Arc<IncidentProcessor>) -> Self {
        let analytics = Arc::new(AnalyticsEngine::with_defaults(processor.store().clone()));
        Self::new(processor, analytics)
    }

    pub fn enrichment(&self) -> &Arc<EnrichmentService> {
        self.processor.enrichment()
    }
}
