//! Text embedding backends.
//!
//! The default [`HashingEmbedder`] runs fully offline with no model files.
//! With the `local-embed` feature the pretrained all-MiniLM-L6-v2 sentence
//! encoder is available through fastembed.

use crate::config::{AiConfig, EmbeddingBackend};
use crate::error::{AppError, Result};
use crate::ml::keywords::{is_stopword, tokenize};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Enrichment("Embedder returned no vectors".to_string()))
    }

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn normalize_embedding(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|v| v / norm).collect()
}

const STOPWORD_WEIGHT: f32 = 0.2;
const BIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic bag-of-words encoder using signed feature hashing.
///
/// Each lower-cased token (with light plural folding) and each pair of
/// adjacent content words is hashed with SHA-256 into one of `dimension`
/// buckets with a hash-derived sign. The result is L2-normalised, so texts
/// sharing vocabulary have high cosine similarity and identical texts
/// score exactly 1.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            model_name: format!("feature-hashing-{}", dimension.max(1)),
        }
    }

    /// Synchronous encoding used by the async trait method
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let mut previous: Option<String> = None;

        for token in tokenize(text) {
            let term = fold_plural(&token);

            if is_stopword(&token) {
                self.accumulate(&mut vector, "u", &term, STOPWORD_WEIGHT);
                previous = None;
                continue;
            }

            self.accumulate(&mut vector, "u", &term, 1.0);
            if let Some(prev) = previous.as_deref() {
                self.accumulate(&mut vector, "b", &format!("{} {}", prev, term), BIGRAM_WEIGHT);
            }
            previous = Some(term);
        }

        normalize_embedding(&vector)
    }

    fn accumulate(&self, vector: &mut [f32], namespace: &str, feature: &str, weight: f32) {
        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        hasher.update([0u8]);
        hasher.update(feature.as_bytes());
        let digest = hasher.finalize();

        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };

        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

/// "bottles" -> "bottle", "batteries" -> "battery"; short words and "-ss" are kept
fn fold_plural(token: &str) -> String {
    if token.len() > 4 && token.ends_with("ies") {
        format!("{}y", &token[..token.len() - 3])
    } else if token.len() > 3 && token.ends_with('s') && !token.ends_with("ss") {
        token[..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.encode(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(feature = "local-embed")]
pub use fastembed_impl::FastEmbedder;

#[cfg(feature = "local-embed")]
mod fastembed_impl {
    use super::Embedder;
    use crate::error::{AppError, Result};
    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tracing::{debug, info};

    /// Pretrained sentence encoder backed by fastembed (ONNX runtime)
    pub struct FastEmbedder {
        model: Arc<Mutex<TextEmbedding>>,
        model_name: String,
        dimension: usize,
    }

    impl FastEmbedder {
        /// Load the model. Downloads weights on first use, so call from a blocking context.
        pub fn new(model_name: &str) -> Result<Self> {
            info!(model = %model_name, "Initializing FastEmbed");

            let (model_enum, dimension) = match model_name {
                "sentence-transformers/all-MiniLM-L6-v2" | "all-MiniLM-L6-v2" => {
                    (EmbeddingModel::AllMiniLML6V2, 384)
                }
                "BAAI/bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
                other => {
                    debug!("Unknown model '{}', using all-MiniLM-L6-v2", other);
                    (EmbeddingModel::AllMiniLML6V2, 384)
                }
            };

            let options = InitOptions::new(model_enum).with_show_download_progress(true);
            let model = TextEmbedding::try_new(options).map_err(|e| {
                AppError::Enrichment(format!("Failed to initialize model: {}", e))
            })?;

            info!("FastEmbed model loaded successfully");

            Ok(Self {
                model: Arc::new(Mutex::new(model)),
                model_name: model_name.to_string(),
                dimension,
            })
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            debug!("Embedding {} texts", texts.len());

            // FastEmbed is synchronous
            let model = self.model.clone();
            tokio::task::spawn_blocking(move || {
                let model = model.blocking_lock();
                model.embed(texts, None)
            })
            .await?
            .map_err(|e| AppError::Enrichment(format!("Embedding failed: {}", e)))
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            &self.model_name
        }
    }
}

/// Create an embedder based on configuration.
///
/// The fastembed backend may download model weights; call from a blocking context.
pub fn create_embedder(config: &AiConfig) -> Result<Arc<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::Hashing => {
            tracing::info!(dimension = config.dimension, "Using feature-hashing embedder");
            Ok(Arc::new(HashingEmbedder::new(config.dimension)))
        }

        #[cfg(feature = "local-embed")]
        EmbeddingBackend::Fastembed => {
            Ok(Arc::new(FastEmbedder::new(&config.model_name)?))
        }

        #[cfg(not(feature = "local-embed"))]
        EmbeddingBackend::Fastembed => Err(AppError::Configuration(
            "The fastembed backend requires building with the 'local-embed' feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::similarity::cosine_similarity;

    #[tokio::test]
    async fn test_dimension_and_unit_norm() {
        let embedder = HashingEmbedder::new(384);
        let vectors = embedder
            .embed(vec![
                "Plastic bottles in the canal".to_string(),
                "Old tyres dumped behind the school".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(vectors.len(), 2);
        for v in vectors {
            assert_eq!(v.len(), 384);
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4);
        }
    }

    #[tokio::test]
    async fn test_deterministic_and_self_similar() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed_one("Broken glass near the playground").await.unwrap();
        let b = embedder.embed_one("Broken glass near the playground").await.unwrap();

        assert_eq!(a, b);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_related_texts_score_higher() {
        let embedder = HashingEmbedder::default();
        let base = embedder.embed_one("plastic bottles on the beach").await.unwrap();
        let related = embedder.embed_one("plastic bottle on beach sand").await.unwrap();
        let unrelated = embedder.embed_one("concrete rubble from demolition").await.unwrap();

        assert!(cosine_similarity(&base, &related) > cosine_similarity(&base, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        assert!(embedder.encode("").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_fold_plural() {
        assert_eq!(fold_plural("bottles"), "bottle");
        assert_eq!(fold_plural("batteries"), "battery");
        assert_eq!(fold_plural("glass"), "glass");
        assert_eq!(fold_plural("bus"), "bus");
    }

    #[cfg(not(feature = "local-embed"))]
    #[test]
    fn test_fastembed_backend_needs_feature() {
        let config = AiConfig {
            backend: EmbeddingBackend::Fastembed,
            ..Default::default()
        };
        assert!(matches!(
            create_embedder(&config),
            Err(AppError::Configuration(_))
        ));
    }
}
