use crate::error::Result;
use crate::ml::embedding::Embedder;
use crate::ml::similarity::cosine_similarity;
use crate::models::WasteCategory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Semantic similarity at or above which the nearest centroid wins outright
pub const SEMANTIC_CONFIDENCE_THRESHOLD: f64 = 0.50;

/// Weight of the keyword score added to a confident semantic match
const KEYWORD_BOOST: f64 = 0.2;

/// Weight of the semantic score added when it agrees with the keyword winner
const SEMANTIC_BOOST: f64 = 0.3;

/// Centroid text and keyword list for one category
#[derive(Debug, Clone, Copy)]
pub struct CategoryProfile {
    pub category: WasteCategory,
    pub description: &'static str,
    pub keywords: &'static [&'static str],
}

pub const CATEGORY_PROFILES: [CategoryProfile; 10] = [
    CategoryProfile {
        category: WasteCategory::Plastic,
        description: "Plastic waste including bottles, bags, packaging, containers, wrappers, polythene, polyethylene, PET bottles, HDPE containers, PVC materials, straws, cups, lids, plastic film, and synthetic polymers",
        keywords: &[
            "plastic", "bottle", "bag", "packaging", "container", "wrapper", "polythene",
            "polyethylene", "pet", "hdpe", "pvc", "straw", "cup", "lid", "film",
        ],
    },
    CategoryProfile {
        category: WasteCategory::Organic,
        description: "Organic and biodegradable waste including food scraps, kitchen waste, vegetables, fruits, compostable materials, garden waste, plant matter, banana peels, apple cores, leftovers, spoiled food, rotten produce, and natural biodegradable matter",
        keywords: &[
            "food", "organic", "kitchen", "vegetable", "fruit", "compost", "biodegradable",
            "garden", "plant", "waste", "banana", "apple", "leftover", "spoiled", "rotten",
        ],
    },
    CategoryProfile {
        category: WasteCategory::Paper,
        description: "Paper and cardboard waste including newspapers, magazines, cardboard boxes, cartons, tissue paper, documents, books, notebooks, envelopes, and paper packaging materials",
        keywords: &[
            "paper", "cardboard", "newspaper", "magazine", "box", "carton", "tissue",
            "document", "book", "notebook", "envelope",
        ],
    },
    CategoryProfile {
        category: WasteCategory::Glass,
        description: "Glass waste including bottles, jars, broken glass, window glass, mirrors, wine bottles, beer bottles, glassware, and glass containers",
        keywords: &[
            "glass", "bottle", "jar", "window", "broken glass", "mirror", "wine bottle",
            "beer bottle", "glassware",
        ],
    },
    CategoryProfile {
        category: WasteCategory::Metal,
        description: "Metal waste including cans, aluminum, steel, tin, iron, copper, metal foil, wire, scrap metal, batteries with metal components, and metallic materials",
        keywords: &[
            "metal", "can", "aluminum", "steel", "tin", "iron", "copper", "foil", "wire",
            "scrap metal", "battery",
        ],
    },
    CategoryProfile {
        category: WasteCategory::Electronic,
        description: "Electronic waste and e-waste including computers, phones, mobile devices, laptops, televisions, monitors, cables, chargers, batteries, appliances, electronic devices, and gadgets",
        keywords: &[
            "electronic", "e-waste", "computer", "phone", "mobile", "laptop", "television",
            "tv", "monitor", "cable", "charger", "battery", "appliance", "device", "gadget",
        ],
    },
    CategoryProfile {
        category: WasteCategory::Hazardous,
        description: "Hazardous and toxic waste including chemicals, toxic substances, paint, oil, solvents, batteries, pesticides, medicines, pharmaceuticals, dangerous materials, flammable substances, and corrosive materials",
        keywords: &[
            "chemical", "hazardous", "toxic", "paint", "oil", "solvent", "battery", "pesticide",
            "medicine", "pharmaceutical", "dangerous", "flammable", "corrosive",
        ],
    },
    CategoryProfile {
        category: WasteCategory::Textile,
        description: "Textile and fabric waste including clothing, fabric scraps, cloth, clothes, shirts, pants, dresses, shoes, leather items, and rags",
        keywords: &[
            "clothing", "fabric", "textile", "cloth", "clothes", "shirt", "pants", "dress",
            "shoes", "leather", "rag",
        ],
    },
    CategoryProfile {
        category: WasteCategory::Construction,
        description: "Construction and demolition waste including concrete, bricks, wood, debris, rubble, tiles, drywall, lumber, and building materials",
        keywords: &[
            "construction", "demolition", "concrete", "brick", "wood", "debris", "rubble",
            "tile", "drywall", "lumber",
        ],
    },
    CategoryProfile {
        category: WasteCategory::Mixed,
        description: "Mixed and general waste including household waste, municipal waste, various types of waste, assorted waste materials, multiple waste types, and diverse waste materials",
        keywords: &[
            "mixed", "general", "household", "municipal", "various", "assorted", "multiple",
            "diverse",
        ],
    },
];

/// Category decision with confidence in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: WasteCategory,
    pub confidence: f64,
}

impl Classification {
    fn new(category: WasteCategory, confidence: f64) -> Self {
        Self {
            category,
            confidence: round2(confidence.clamp(0.0, 1.0)),
        }
    }

    pub fn unclassified() -> Self {
        Self {
            category: WasteCategory::Unclassified,
            confidence: 0.0,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Hybrid classifier: nearest category centroid, refined by keyword hits
pub struct WasteClassifier {
    embedder: Arc<dyn Embedder>,
    centroids: Vec<(WasteCategory, Vec<f32>)>,
}

impl WasteClassifier {
    /// Build the classifier, embedding every category description once
    pub async fn new(embedder: Arc<dyn Embedder>) -> Result<Self> {
        let texts = CATEGORY_PROFILES
            .iter()
            .map(|p| p.description.to_string())
            .collect();
        let vectors = embedder.embed(texts).await?;

        let centroids: Vec<(WasteCategory, Vec<f32>)> = CATEGORY_PROFILES
            .iter()
            .map(|p| p.category)
            .zip(vectors)
            .collect();

        debug!(categories = centroids.len(), "Pre-computed category centroids");

        Ok(Self {
            embedder,
            centroids,
        })
    }

    /// Classify a description. Falls back to keywords alone if embedding fails.
    pub async fn classify(&self, description: &str) -> Classification {
        match self.embedder.embed_one(description).await {
            Ok(embedding) => self.classify_embedded(&embedding, description),
            Err(e) => {
                warn!(error = %e, "Semantic classification failed, using keyword fallback");
                Self::classify_by_keywords(description)
            }
        }
    }

    /// Classify using an already computed embedding of `description`
    pub fn classify_embedded(&self, embedding: &[f32], description: &str) -> Classification {
        let Some((semantic_category, semantic_confidence)) = self.nearest_centroid(embedding)
        else {
            return Self::classify_by_keywords(description);
        };

        let keyword_scores = Self::keyword_scores(description);

        if semantic_confidence >= SEMANTIC_CONFIDENCE_THRESHOLD {
            let boost = keyword_scores
                .iter()
                .find(|(category, _)| *category == semantic_category)
                .map(|(_, score)| score * KEYWORD_BOOST)
                .unwrap_or(0.0);

            debug!(
                category = %semantic_category,
                semantic_conf = semantic_confidence,
                keyword_boost = boost,
                "Classification (semantic primary)"
            );
            return Classification::new(semantic_category, (semantic_confidence + boost).min(1.0));
        }

        if let Some((keyword_category, keyword_score)) = best_of(&keyword_scores) {
            let mut confidence = (keyword_score * 2.0).min(1.0);
            if keyword_category == semantic_category {
                confidence = (confidence + semantic_confidence * SEMANTIC_BOOST).min(1.0);
            }

            debug!(
                category = %keyword_category,
                semantic_conf = semantic_confidence,
                final_conf = confidence,
                "Classification (keyword primary)"
            );
            return Classification::new(keyword_category, confidence);
        }

        debug!(
            category = %semantic_category,
            semantic_conf = semantic_confidence,
            "Classification (low confidence)"
        );
        Classification::new(semantic_category, semantic_confidence)
    }

    /// Keyword-only classification; `unclassified` with 0 when nothing matches
    pub fn classify_by_keywords(description: &str) -> Classification {
        match best_of(&Self::keyword_scores(description)) {
            Some((category, score)) => Classification::new(category, (score * 2.0).min(1.0)),
            None => Classification::unclassified(),
        }
    }

    /// Per-category keyword score: summed word count of matching keywords,
    /// divided by the size of the keyword list. Categories without a hit are omitted.
    pub fn keyword_scores(description: &str) -> Vec<(WasteCategory, f64)> {
        let lowered = description.to_lowercase();

        CATEGORY_PROFILES
            .iter()
            .filter_map(|profile| {
                let hits: usize = profile
                    .keywords
                    .iter()
                    .filter(|keyword| lowered.contains(*keyword))
                    .map(|keyword| keyword.split_whitespace().count())
                    .sum();

                (hits > 0).then(|| {
                    (
                        profile.category,
                        hits as f64 / profile.keywords.len() as f64,
                    )
                })
            })
            .collect()
    }

    fn nearest_centroid(&self, embedding: &[f32]) -> Option<(WasteCategory, f64)> {
        let scores: Vec<(WasteCategory, f64)> = self
            .centroids
            .iter()
            .map(|(category, centroid)| (*category, cosine_similarity(embedding, centroid) as f64))
            .collect();
        best_of(&scores)
    }
}

/// Highest score; the earliest category wins ties
fn best_of(scores: &[(WasteCategory, f64)]) -> Option<(WasteCategory, f64)> {
    scores.iter().copied().fold(None, |best, candidate| match best {
        Some((_, best_score)) if candidate.1 <= best_score => best,
        _ => Some(candidate),
    })
}
