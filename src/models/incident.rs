use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A user-submitted waste report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Incident {
    /// Unique identifier
    pub id: Uuid,

    /// Free-text description of what was observed
    pub description: String,

    /// When the incident happened
    pub timestamp: DateTime<Utc>,

    /// Human-readable location
    pub location: String,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Inferred waste category
    pub waste_type: Option<WasteCategory>,

    /// Classification confidence in [0, 1]
    pub waste_type_confidence: Option<f64>,

    /// Sentence embedding of description + location
    pub embedding: Option<Vec<f32>>,

    /// Extracted keywords, most frequent first
    pub keywords: Vec<String>,

    /// Near-duplicate incidents found at creation time
    pub similar_incident_ids: Vec<Uuid>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    /// Create a new, not yet enriched incident
    pub fn new(input: NewIncident) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            description: input.description,
            timestamp: input.timestamp.unwrap_or(now),
            location: input.location,
            latitude: input.latitude,
            longitude: input.longitude,
            waste_type: None,
            waste_type_confidence: None,
            embedding: None,
            keywords: Vec::new(),
            similar_incident_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Returns the names of the fields that changed.
    pub fn apply_update(&mut self, update: IncidentUpdate) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if let Some(description) = update.description {
            self.description = description;
            changed.push("description");
        }
        if let Some(location) = update.location {
            self.location = location;
            changed.push("location");
        }
        if let Some(latitude) = update.latitude {
            self.latitude = latitude;
            changed.push("latitude");
        }
        if let Some(longitude) = update.longitude {
            self.longitude = longitude;
            changed.push("longitude");
        }

        self.updated_at = Utc::now();
        changed
    }

    /// Write enrichment results onto the record
    pub fn apply_enrichment(&mut self, outcome: EnrichmentOutcome) {
        self.waste_type = Some(outcome.waste_type);
        self.waste_type_confidence = Some(outcome.confidence.clamp(0.0, 1.0));
        self.embedding = Some(outcome.embedding);
        self.keywords = outcome.keywords;
        self.similar_incident_ids = outcome.similar_incident_ids;
        self.updated_at = Utc::now();
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Waste categories assigned by the classifier
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    EnumIter,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WasteCategory {
    Plastic,
    Organic,
    Paper,
    Glass,
    Metal,
    Electronic,
    Hazardous,
    Textile,
    Construction,
    Mixed,
    /// Only produced by the keyword fallback when nothing matched
    Unclassified,
}

impl WasteCategory {
    /// The ten classifiable categories, in classification order
    pub fn classifiable() -> impl Iterator<Item = WasteCategory> {
        WasteCategory::iter().filter(|c| *c != WasteCategory::Unclassified)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::Plastic => "plastic",
            WasteCategory::Organic => "organic",
            WasteCategory::Paper => "paper",
            WasteCategory::Glass => "glass",
            WasteCategory::Metal => "metal",
            WasteCategory::Electronic => "electronic",
            WasteCategory::Hazardous => "hazardous",
            WasteCategory::Textile => "textile",
            WasteCategory::Construction => "construction",
            WasteCategory::Mixed => "mixed",
            WasteCategory::Unclassified => "unclassified",
        }
    }

    /// Label with the first letter upper-cased ("Plastic")
    pub fn title(&self) -> String {
        let label = self.as_str();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Result of the enrichment pipeline for one incident
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentOutcome {
    pub waste_type: WasteCategory,
    pub confidence: f64,
    pub embedding: Vec<f32>,
    pub keywords: Vec<String>,
    pub similar_incident_ids: Vec<Uuid>,
}

/// Payload for reporting a new incident
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewIncident {
    #[validate(length(min = 10, max = 5000))]
    pub description: String,

    /// Defaults to the time of submission
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[validate(length(min = 3, max = 500))]
    pub location: String,

    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

/// Partial update; absent fields are left unchanged.
///
/// Coordinates distinguish an absent key (`None`) from an explicit `null`
/// (`Some(None)`), which clears the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_update_coordinates"))]
pub struct IncidentUpdate {
    #[serde(default)]
    #[validate(length(min = 10, max = 5000))]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(length(min = 3, max = 500))]
    pub location: Option<String>,

    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<Option<f64>>,

    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<Option<f64>>,
}

/// Only called when the key is present, so `null` becomes `Some(None)`
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

fn validate_update_coordinates(update: &IncidentUpdate) -> Result<(), ValidationError> {
    let in_range = |value: Option<Option<f64>>, limit: f64| match value.flatten() {
        Some(v) => (-limit..=limit).contains(&v),
        None => true,
    };

    if !in_range(update.latitude, 90.0) {
        return Err(ValidationError::new("latitude must be between -90 and 90"));
    }
    if !in_range(update.longitude, 180.0) {
        return Err(ValidationError::new("longitude must be between -180 and 180"));
    }
    Ok(())
}

impl IncidentUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.location.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}
