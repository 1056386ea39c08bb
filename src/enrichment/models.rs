use crate::ml::Classification;
use crate::models::{EnrichmentOutcome, Incident, WasteCategory};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-text enrichment: category, keywords and embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedText {
    pub waste_type: WasteCategory,
    pub confidence: f64,
    pub keywords: Vec<String>,
    pub embedding: Vec<f32>,
}

impl ProcessedText {
    pub fn new(classification: Classification, keywords: Vec<String>, embedding: Vec<f32>) -> Self {
        Self {
            waste_type: classification.category,
            confidence: classification.confidence,
            keywords,
            embedding,
        }
    }

    /// Combine with the near-duplicate lookup into the stored outcome
    pub fn into_outcome(self, similar_incident_ids: Vec<Uuid>) -> EnrichmentOutcome {
        EnrichmentOutcome {
            waste_type: self.waste_type,
            confidence: self.confidence,
            embedding: self.embedding,
            keywords: self.keywords,
            similar_incident_ids,
        }
    }
}

/// An incident with its similarity to a query
#[derive(Debug, Clone)]
pub struct ScoredIncident {
    pub incident: Incident,
    pub similarity: f32,
}

/// Default cut-off for free-text semantic search
pub const SEARCH_THRESHOLD: f32 = 0.70;

/// Default result count for free-text semantic search
pub const SEARCH_LIMIT: usize = 10;
