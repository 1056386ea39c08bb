use crate::api::{ai, analytics, handlers, AppState};
use crate::config::ServerConfig;
use crate::metrics::track_http_metrics;
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// CORS policy from the configured origins; `*` allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

/// Build the main API router
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let api = Router::new()
        // Incident management
        .route(
            "/incidents",
            post(handlers::create_incident).get(handlers::list_incidents),
        )
        .route("/incidents/search/semantic", get(handlers::semantic_search))
        .route(
            "/incidents/:id",
            get(handlers::get_incident)
                .put(handlers::update_incident)
                .delete(handlers::delete_incident),
        )
        // Dashboard analytics
        .route("/analytics/summary", get(analytics::summary))
        .route("/analytics/time-series", get(analytics::time_series))
        .route("/analytics/waste-type-trends", get(analytics::waste_type_trends))
        .route("/analytics/heatmap", get(analytics::heatmap))
        .route("/analytics/anomalies", get(analytics::anomalies))
        .route("/analytics/keywords", get(analytics::keywords))
        .route("/analytics/trends", get(analytics::trends))
        .route("/analytics/admin-summary", get(analytics::admin_summary))
        // Enrichment utilities
        .route("/ai/classify", post(ai::classify))
        .route("/ai/extract-keywords", post(ai::extract_keywords))
        .route("/ai/similar-incidents", post(ai::similar_incidents));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .nest("/api", api)
        // Add state
        .with_state(state)
        // Add middleware
        .layer(middleware::from_fn(track_http_metrics))
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_response(DefaultOnResponse::new().include_headers(false)),
        )
        .layer(cors_layer(&server.cors_origins))
}
