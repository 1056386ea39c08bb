//! Stateless enrichment endpoints

use crate::api::extract::{finite_threshold, AppJson};
use crate::api::AppState;
use crate::error::Result;
use crate::ml::keywords::DEFAULT_TOP_N;
use crate::models::WasteCategory;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ClassifyRequest {
    #[validate(length(min = 10))]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub waste_type: WasteCategory,
    pub confidence: f64,
    pub description: String,
}

/// Classify a description without storing anything
pub async fn classify(
    State(state): State<AppState>,
    AppJson(request): AppJson<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>> {
    request.validate()?;

    let classification = state.enrichment().classify(&request.description).await?;

    Ok(Json(ClassifyResponse {
        waste_type: classification.category,
        confidence: classification.confidence,
        description: request.description,
    }))
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExtractKeywordsRequest {
    #[validate(length(min = 10))]
    pub text: String,
    #[serde(default = "default_top_n")]
    #[validate(range(min = 1, max = 20))]
    pub top_n: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractKeywordsResponse {
    pub keywords: Vec<String>,
    pub text: String,
}

pub async fn extract_keywords(
    State(state): State<AppState>,
    AppJson(request): AppJson<ExtractKeywordsRequest>,
) -> Result<Json<ExtractKeywordsResponse>> {
    request.validate()?;

    let keywords = state.enrichment().extract_keywords(&request.text, request.top_n);

    Ok(Json(ExtractKeywordsResponse {
        keywords,
        text: request.text,
    }))
}

fn default_similar_threshold() -> f32 {
    0.75
}

fn default_similar_limit() -> usize {
    5
}

#[derive(Debug, Deserialize, Validate)]
pub struct SimilarIncidentsRequest {
    pub incident_id: Uuid,
    #[validate(length(min = 10))]
    pub description: String,
    #[serde(default = "default_similar_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: f32,
    #[serde(default = "default_similar_limit")]
    #[validate(range(min = 1, max = 20))]
    pub limit: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimilarIncidentItem {
    pub id: Uuid,
    pub description: String,
    pub location: String,
    pub waste_type: Option<WasteCategory>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimilarIncidentsResponse {
    pub incident_id: Uuid,
    pub similar_incidents: Vec<SimilarIncidentItem>,
    pub count: usize,
}

/// Stored incidents close to a description, excluding `incident_id`
pub async fn similar_incidents(
    State(state): State<AppState>,
    AppJson(request): AppJson<SimilarIncidentsRequest>,
) -> Result<Json<SimilarIncidentsResponse>> {
    request.validate()?;
    finite_threshold(request.threshold)?;

    let similar = state
        .processor
        .similar_to(
            request.incident_id,
            &request.description,
            request.threshold,
            request.limit,
        )
        .await?;

    let similar_incidents: Vec<SimilarIncidentItem> = similar
        .into_iter()
        .map(|scored| SimilarIncidentItem {
            id: scored.incident.id,
            description: scored.incident.description,
            location: scored.incident.location,
            waste_type: scored.incident.waste_type,
        })
        .collect();

    Ok(Json(SimilarIncidentsResponse {
        incident_id: request.incident_id,
        count: similar_incidents.len(),
        similar_incidents,
    }))
}
