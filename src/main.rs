use std::net::SocketAddr;
use std::sync::Arc;
use waste_incident_platform::{
    api::{build_router, AppState},
    config::Config,
    enrichment::EnrichmentService,
    processing::IncidentProcessor,
    state::create_store,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize tracing
    telemetry::init_tracing(&config.observability)?;

    tracing::info!(
        "Starting {} v{}",
        config.observability.service_name,
        env!("CARGO_PKG_VERSION")
    );

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = waste_incident_platform::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("✅ Prometheus metrics initialized");
        }
    } else {
        tracing::info!("⚠️  Prometheus metrics disabled in configuration");
    }

    // Initialize storage backend
    tracing::info!("Storage backend: {:?}", config.state.backend);
    let store = create_store(&config.state)?;
    tracing::info!("✅ Storage backend initialized");

    // Enrichment loads its model in the background; requests that need it
    // wait for the same initialization.
    let enrichment = Arc::new(EnrichmentService::new(config.ai.clone()));
    let warmup = enrichment.clone();
    tokio::spawn(async move {
        match warmup.initialize().await {
            Ok(()) => tracing::info!("✅ Enrichment engine warmed up"),
            Err(e) => tracing::error!("Enrichment warm-up failed: {}", e),
        }
    });

    let processor = Arc::new(IncidentProcessor::new(store, enrichment));
    let state = AppState::from_processor(processor);
    let app = build_router(state, &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.http_port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🚀 HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
