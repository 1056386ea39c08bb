use crate::config::AiConfig;
use crate::enrichment::models::{ProcessedText, ScoredIncident};
use crate::error::{AppError, Result};
use crate::metrics::{ENRICHMENT_DURATION_SECONDS, ENRICHMENT_ERRORS_TOTAL, ENRICHMENT_MODEL_LOADED};
use crate::ml::{
    create_embedder, rank_by_similarity, Classification, Embedder, KeywordExtractor,
    WasteClassifier,
};
use crate::state::{AppCache, IncidentStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Loaded model state, built once on first use
struct EnrichmentEngine {
    embedder: Arc<dyn Embedder>,
    classifier: WasteClassifier,
    query_cache: AppCache<String, Vec<f32>>,
}

/// Enrichment service: classification, keyword extraction, embeddings and
/// near-duplicate lookup.
///
/// The embedding model and category centroids are loaded lazily so that
/// server start-up never blocks on a model download.
pub struct EnrichmentService {
    config: AiConfig,
    embedder: Option<Arc<dyn Embedder>>,
    engine: OnceCell<EnrichmentEngine>,
    keywords: KeywordExtractor,
}

impl EnrichmentService {
    /// Create a service whose embedder is built from `config` on first use
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            embedder: None,
            engine: OnceCell::new(),
            keywords: KeywordExtractor::new(),
        }
    }

    /// Create a service around an existing embedder
    pub fn with_embedder(config: AiConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder: Some(embedder),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Load the model now instead of on the first request
    pub async fn initialize(&self) -> Result<()> {
        self.engine().await.map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.initialized()
    }

    async fn engine(&self) -> Result<&EnrichmentEngine> {
        self.engine
            .get_or_try_init(|| async {
                info!("🚀 Initializing enrichment engine");

                let embedder = match &self.embedder {
                    Some(embedder) => embedder.clone(),
                    None => {
                        let config = self.config.clone();
                        tokio::task::spawn_blocking(move || create_embedder(&config)).await??
                    }
                };

                if embedder.dimension() != self.config.dimension {
                    warn!(
                        configured = self.config.dimension,
                        actual = embedder.dimension(),
                        "Embedding dimension differs from configuration"
                    );
                }

                let classifier = WasteClassifier::new(embedder.clone()).await.map_err(|e| {
                    ENRICHMENT_ERRORS_TOTAL.with_label_values(&["init"]).inc();
                    error!(error = %e, "Failed to initialize enrichment engine");
                    e
                })?;

                let query_cache = AppCache::new(
                    self.config.embedding_cache_capacity,
                    Duration::from_secs(self.config.embedding_cache_ttl_secs),
                );

                ENRICHMENT_MODEL_LOADED.set(1.0);
                info!(model = %embedder.model_name(), "Enrichment engine ready");

                Ok(EnrichmentEngine {
                    embedder,
                    classifier,
                    query_cache,
                })
            })
            .await
    }

    /// Classify a description into a waste category
    pub async fn classify(&self, description: &str) -> Result<Classification> {
        let engine = self.engine().await?;
        Ok(engine.classifier.classify(description).await)
    }

    /// Most frequent content words of `text`
    pub fn extract_keywords(&self, text: &str, top_n: usize) -> Vec<String> {
        self.keywords.extract(text, top_n)
    }

    /// Embedding of arbitrary text
    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let engine = self.engine().await?;
        engine.embedder.embed_one(text).await
    }

    /// Classify, extract keywords and embed `"{description} {location}"`
    pub async fn process_incident(&self, description: &str, location: &str) -> Result<ProcessedText> {
        let _timer = ENRICHMENT_DURATION_SECONDS
            .with_label_values(&["process"])
            .start_timer();

        let engine = self.engine().await?;

        let classification = engine.classifier.classify(description).await;
        let keywords = self.keywords.extract(description, self.config.keyword_top_n);
        let embedding = engine
            .embedder
            .embed_one(&format!("{} {}", description, location))
            .await
            .map_err(|e| {
                ENRICHMENT_ERRORS_TOTAL.with_label_values(&["process"]).inc();
                e
            })?;

        info!(
            waste_type = %classification.category,
            confidence = classification.confidence,
            keywords = ?keywords.iter().take(3).collect::<Vec<_>>(),
            "Incident processed"
        );

        Ok(ProcessedText::new(classification, keywords, embedding))
    }

    /// Stored incidents whose embedding is within `threshold` of `embedding`,
    /// excluding `exclude_id`. Failures are logged and yield an empty list.
    pub async fn find_similar(
        &self,
        store: &dyn IncidentStore,
        exclude_id: Uuid,
        embedding: &[f32],
        threshold: Option<f32>,
        limit: usize,
    ) -> Vec<ScoredIncident> {
        let _timer = ENRICHMENT_DURATION_SECONDS
            .with_label_values(&["similar"])
            .start_timer();
        let threshold = threshold.unwrap_or(self.config.similarity_threshold);

        let incidents = match store.all_incidents().await {
            Ok(incidents) => incidents,
            Err(e) => {
                ENRICHMENT_ERRORS_TOTAL.with_label_values(&["similar"]).inc();
                error!(error = %e, "Error finding similar incidents");
                return Vec::new();
            }
        };

        let candidates = incidents.iter().filter(|i| i.id != exclude_id).filter_map(|i| {
            i.embedding
                .as_deref()
                .filter(|e| !e.is_empty())
                .map(|e| (i, e))
        });

        let similar: Vec<ScoredIncident> = rank_by_similarity(embedding, candidates, threshold, limit)
            .into_iter()
            .map(|(incident, similarity)| ScoredIncident {
                incident: incident.clone(),
                similarity,
            })
            .collect();

        debug!(count = similar.len(), threshold, "Similar incidents found");
        similar
    }

    /// Rank stored incidents against a free-text query
    pub async fn semantic_search(
        &self,
        store: &dyn IncidentStore,
        query: &str,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredIncident>> {
        let _timer = ENRICHMENT_DURATION_SECONDS
            .with_label_values(&["search"])
            .start_timer();

        let engine = self.engine().await?;
        let embedder = engine.embedder.clone();
        let text = query.to_string();

        let query_embedding = engine
            .query_cache
            .get_or_try_insert(query.to_string(), async move { embedder.embed_one(&text).await })
            .await
            .map_err(|e| AppError::Enrichment(e.to_string()))?;

        let incidents = store.all_incidents().await?;
        let candidates = incidents.iter().filter_map(|i| {
            i.embedding
                .as_deref()
                .filter(|e| !e.is_empty())
                .map(|e| (i, e))
        });

        let results: Vec<ScoredIncident> =
            rank_by_similarity(&query_embedding, candidates, threshold, limit)
                .into_iter()
                .map(|(incident, similarity)| ScoredIncident {
                    incident: incident.clone(),
                    similarity,
                })
                .collect();

        info!(
            query = %query,
            threshold,
            results_count = results.len(),
            "Semantic search completed"
        );

        Ok(results)
    }
}
