/// Incident enrichment
///
/// Runs the offline NLP pipeline over incoming reports:
/// - Waste category classification (centroid similarity + keyword heuristic)
/// - Keyword extraction
/// - Embedding generation
/// - Near-duplicate lookup and free-text semantic search over stored incidents

pub mod models;
pub mod service;

pub use models::{ProcessedText, ScoredIncident, SEARCH_LIMIT, SEARCH_THRESHOLD};
pub use service::EnrichmentService;
