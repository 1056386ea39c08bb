//! Prometheus metrics for the HTTP surface, incident lifecycle and the
//! enrichment pipeline.
//!
//! ```no_run
//! use waste_incident_platform::metrics::{self, INCIDENTS_TOTAL};
//!
//! metrics::init_metrics().expect("metrics registry");
//! INCIDENTS_TOTAL.with_label_values(&["created"]).inc();
//! ```

mod middleware;

pub use middleware::track_http_metrics;

use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use prometheus::{CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "waste_incident_platform";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration in seconds
    ///
    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    /// Incident lifecycle events
    ///
    /// Labels: action (created, updated, deleted)
    pub static ref INCIDENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("incidents_total", "Total number of incident lifecycle events")
            .namespace(NAMESPACE),
        &["action"]
    ).expect("Failed to create INCIDENTS_TOTAL metric");

    /// Incidents classified, by assigned category
    ///
    /// Labels: waste_type
    pub static ref INCIDENTS_CLASSIFIED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("incidents_classified_total", "Incidents classified by waste type")
            .namespace(NAMESPACE),
        &["waste_type"]
    ).expect("Failed to create INCIDENTS_CLASSIFIED_TOTAL metric");

    /// Enrichment stage duration in seconds
    ///
    /// Labels: stage (process, similar, search)
    pub static ref ENRICHMENT_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "enrichment_duration_seconds",
            "Enrichment stage duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["stage"]
    ).expect("Failed to create ENRICHMENT_DURATION_SECONDS metric");

    /// Enrichment failures
    ///
    /// Labels: stage
    pub static ref ENRICHMENT_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("enrichment_errors_total", "Total number of enrichment failures")
            .namespace(NAMESPACE),
        &["stage"]
    ).expect("Failed to create ENRICHMENT_ERRORS_TOTAL metric");

    /// 1 once the embedding model and category centroids are loaded
    pub static ref ENRICHMENT_MODEL_LOADED: Gauge = Gauge::with_opts(
        Opts::new("enrichment_model_loaded", "Whether the enrichment model is loaded")
            .namespace(NAMESPACE)
    ).expect("Failed to create ENRICHMENT_MODEL_LOADED metric");
}

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    INITIALIZED
        .get_or_try_init(|| {
            PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(INCIDENTS_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(INCIDENTS_CLASSIFIED_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(ENRICHMENT_DURATION_SECONDS.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(ENRICHMENT_ERRORS_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(ENRICHMENT_MODEL_LOADED.clone()))?;

            tracing::info!("Prometheus metrics initialized successfully");
            Ok(())
        })
        .map(|_| ())
}

/// Generate Prometheus text format metrics for the /metrics endpoint
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_gather_metrics() {
        init_metrics().unwrap();
        INCIDENTS_TOTAL.with_label_values(&["created"]).inc();

        let metrics = gather_metrics();
        assert!(metrics.contains("waste_incident_platform_incidents_total"));
    }
}
