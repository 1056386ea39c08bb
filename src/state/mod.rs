pub mod cache;
pub mod factory;
pub mod sled_store;
pub mod store;

pub use cache::*;
pub use factory::{create_in_memory_store, create_store};
pub use sled_store::SledStore;
pub use store::*;

use crate::error::Result;
use crate::models::Incident;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Trait for incident storage operations
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Save an incident
    async fn save_incident(&self, incident: &Incident) -> Result<()>;

    /// Get an incident by ID
    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>>;

    /// Replace an existing incident. Fails with `NotFound` if absent.
    async fn update_incident(&self, incident: &Incident) -> Result<()>;

    /// Delete an incident. Fails with `NotFound` if absent.
    async fn delete_incident(&self, id: &Uuid) -> Result<()>;

    /// List incidents matching `filter`, newest `timestamp` first.
    /// `page` is 1-based.
    async fn list_incidents(
        &self,
        filter: &IncidentFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Incident>>;

    /// Count incidents matching filter
    async fn count_incidents(&self, filter: &IncidentFilter) -> Result<u64>;

    /// Every stored incident, in no particular order
    async fn all_incidents(&self) -> Result<Vec<Incident>>;
}

/// Filter for querying incidents
#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    /// Case-insensitive substring of the category label
    pub waste_type: Option<String>,
    /// Case-insensitive substring of the location
    pub location: Option<String>,
    /// Inclusive lower bound on `timestamp`
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`
    pub end: Option<DateTime<Utc>>,
}

impl IncidentFilter {
    pub fn matches(&self, incident: &Incident) -> bool {
        let waste_type_match = match &self.waste_type {
            Some(needle) => incident
                .waste_type
                .map(|wt| wt.as_str().contains(&needle.to_lowercase()))
                .unwrap_or(false),
            None => true,
        };

        let location_match = match &self.location {
            Some(needle) => incident
                .location
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        };

        let start_match = self.start.map_or(true, |start| incident.timestamp >= start);
        let end_match = self.end.map_or(true, |end| incident.timestamp <= end);

        waste_type_match && location_match && start_match && end_match
    }

    /// Only the time window of this filter
    pub fn between(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start,
            end,
            ..Default::default()
        }
    }
}

/// Offset of a 1-based page. Page 0 is treated as page 1.
pub(crate) fn page_offset(page: u32, page_size: u32) -> usize {
    page.saturating_sub(1) as usize * page_size as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewIncident, WasteCategory};
    use chrono::Duration;

    fn incident(location: &str, waste_type: Option<WasteCategory>) -> Incident {
        let mut incident = Incident::new(NewIncident {
            description: "Overflowing bins near the bus stop".to_string(),
            timestamp: None,
            location: location.to_string(),
            latitude: None,
            longitude: None,
        });
        incident.waste_type = waste_type;
        incident
    }

    #[test]
    fn test_filter_substring_is_case_insensitive() {
        let item = incident("Riverside Park", Some(WasteCategory::Electronic));

        let filter = IncidentFilter {
            waste_type: Some("ELECTRO".to_string()),
            location: Some("river".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&item));

        let filter = IncidentFilter {
            waste_type: Some("glass".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&item));
    }

    #[test]
    fn test_filter_waste_type_requires_classification() {
        let item = incident("Harbour", None);
        let filter = IncidentFilter {
            waste_type: Some("plastic".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&item));
    }

    #[test]
    fn test_filter_time_bounds_are_inclusive() {
        let item = incident("Harbour", None);
        let ts = item.timestamp;

        assert!(IncidentFilter::between(Some(ts), Some(ts)).matches(&item));
        assert!(!IncidentFilter::between(Some(ts + Duration::seconds(1)), None).matches(&item));
        assert!(!IncidentFilter::between(None, Some(ts - Duration::seconds(1))).matches(&item));
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
        assert_eq!(page_offset(0, 20), 0);
    }
}
