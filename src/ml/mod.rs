//! Offline NLP building blocks used to enrich incident reports:
//! text embeddings, cosine ranking, waste-category classification and
//! keyword extraction.

pub mod classifier;
pub mod embedding;
pub mod keywords;
pub mod similarity;

pub use classifier::{Classification, WasteClassifier, CATEGORY_PROFILES};
pub use embedding::{create_embedder, normalize_embedding, Embedder, HashingEmbedder};
#[cfg(feature = "local-embed")]
pub use embedding::FastEmbedder;
pub use keywords::KeywordExtractor;
pub use similarity::{cosine_similarity, rank_by_similarity};
