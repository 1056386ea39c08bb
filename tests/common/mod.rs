//! Shared helpers for integration tests

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use waste_incident_platform::{
    api::{build_router, AppState},
    config::{AiConfig, ServerConfig},
    enrichment::EnrichmentService,
    models::NewIncident,
    processing::IncidentProcessor,
    state::{IncidentStore, InMemoryStore},
};

pub fn new_incident(description: &str, location: &str) -> NewIncident {
    NewIncident {
        description: description.to_string(),
        timestamp: None,
        location: location.to_string(),
        latitude: None,
        longitude: None,
    }
}

pub fn processor_with(store: Arc<dyn IncidentStore>) -> Arc<IncidentProcessor> {
    Arc::new(IncidentProcessor::new(
        store,
        Arc::new(EnrichmentService::new(AiConfig::default())),
    ))
}

/// Router over a fresh in-memory store
pub fn test_app() -> (Router, AppState) {
    let state = AppState::from_processor(processor_with(Arc::new(InMemoryStore::new())));
    let router = build_router(state.clone(), &ServerConfig::default());
    (router, state)
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Parse Prometheus exposition format into metric name -> lines
pub fn parse_prometheus_output(output: &str) -> HashMap<String, Vec<String>> {
    let mut metrics = HashMap::new();
    let mut current_metric = String::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("# HELP") || line.starts_with("# TYPE") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                current_metric = parts[2].to_string();
                metrics
                    .entry(current_metric.clone())
                    .or_insert_with(Vec::new)
                    .push(line.to_string());
            }
        } else if !line.starts_with('#') && !current_metric.is_empty() {
            metrics
                .entry(current_metric.clone())
                .or_insert_with(Vec::new)
                .push(line.to_string());
        }
    }

    metrics
}
