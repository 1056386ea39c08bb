use crate::api::extract::{finite_threshold, AppJson, AppPath, AppQuery};
use crate::api::AppState;
use crate::enrichment::{SEARCH_LIMIT, SEARCH_THRESHOLD};
use crate::error::Result;
use crate::models::*;
use crate::state::IncidentFilter;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub status: String,
}

/// Service banner
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Waste Incident Reporting & AI Insight Platform".to_string(),
        version: "1.0.0".to_string(),
        status: "operational".to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}

/// Report a new incident; enrichment runs before the response is sent
pub async fn create_incident(
    State(state): State<AppState>,
    AppJson(request): AppJson<NewIncident>,
) -> Result<(StatusCode, Json<IncidentResponse>)> {
    let created = state.processor.create_incident(request).await?;
    Ok((StatusCode::CREATED, Json(IncidentResponse::from(created))))
}

/// Get an incident by ID
pub async fn get_incident(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<IncidentResponse>> {
    let incident = state.processor.get_incident(&id).await?;
    Ok(Json(IncidentResponse::from(incident)))
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListIncidentsQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
    pub waste_type: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// List incidents, newest first
pub async fn list_incidents(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListIncidentsQuery>,
) -> Result<Json<ListIncidentsResponse>> {
    params.validate()?;

    let filter = IncidentFilter {
        waste_type: params.waste_type,
        location: params.location,
        start: params.start_date,
        end: params.end_date,
    };

    let page = state
        .processor
        .list_incidents(&filter, params.page, params.page_size)
        .await?;

    Ok(Json(ListIncidentsResponse {
        items: page.items.into_iter().map(IncidentResponse::from).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
    }))
}

/// Update the user-editable fields of an incident
pub async fn update_incident(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<IncidentUpdate>,
) -> Result<Json<IncidentResponse>> {
    let incident = state.processor.update_incident(&id, request).await?;
    Ok(Json(IncidentResponse::from(incident)))
}

pub async fn delete_incident(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode> {
    state.processor.delete_incident(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn default_search_threshold() -> f32 {
    SEARCH_THRESHOLD
}

fn default_search_limit() -> usize {
    SEARCH_LIMIT
}

#[derive(Debug, Deserialize, Validate)]
pub struct SemanticSearchQuery {
    #[validate(length(min = 1))]
    pub query: String,
    #[serde(default = "default_search_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: f32,
    #[serde(default = "default_search_limit")]
    #[validate(range(min = 1, max = 50))]
    pub limit: usize,
}

/// Natural-language search over incident embeddings
pub async fn semantic_search(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SemanticSearchQuery>,
) -> Result<Json<Vec<IncidentResponse>>> {
    params.validate()?;
    finite_threshold(params.threshold)?;

    let results = state
        .processor
        .semantic_search(&params.query, params.threshold, params.limit)
        .await?;

    Ok(Json(
        results
            .into_iter()
            .map(|scored| IncidentResponse::from(scored.incident))
            .collect(),
    ))
}

/// Incident response DTO, without the embedding vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentResponse {
    pub id: Uuid,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub waste_type: Option<WasteCategory>,
    pub waste_type_confidence: Option<f64>,
    pub keywords: Vec<String>,
    pub similar_incident_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Incident> for IncidentResponse {
    fn from(incident: Incident) -> Self {
        Self {
            id: incident.id,
            description: incident.description,
            timestamp: incident.timestamp,
            location: incident.location,
            latitude: incident.latitude,
            longitude: incident.longitude,
            waste_type: incident.waste_type,
            waste_type_confidence: incident.waste_type_confidence,
            keywords: incident.keywords,
            similar_incident_ids: incident.similar_incident_ids,
            created_at: incident.created_at,
            updated_at: incident.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListIncidentsResponse {
    pub items: Vec<IncidentResponse>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}
