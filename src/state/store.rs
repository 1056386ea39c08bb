use crate::error::{AppError, Result};
use crate::models::Incident;
use crate::state::{page_offset, IncidentFilter, IncidentStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory incident store (for development and testing)
#[derive(Clone, Default)]
pub struct InMemoryStore {
    incidents: Arc<DashMap<Uuid, Incident>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matching(&self, filter: &IncidentFilter) -> Vec<Incident> {
        self.incidents
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl IncidentStore for InMemoryStore {
    async fn save_incident(&self, incident: &Incident) -> Result<()> {
        self.incidents.insert(incident.id, incident.clone());
        tracing::debug!(incident_id = %incident.id, "Incident saved");
        Ok(())
    }

    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>> {
        Ok(self.incidents.get(id).map(|entry| entry.clone()))
    }

    async fn update_incident(&self, incident: &Incident) -> Result<()> {
        match self.incidents.get_mut(&incident.id) {
            Some(mut entry) => {
                *entry = incident.clone();
                tracing::debug!(incident_id = %incident.id, "Incident updated");
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Incident {} not found",
                incident.id
            ))),
        }
    }

    async fn delete_incident(&self, id: &Uuid) -> Result<()> {
        if self.incidents.remove(id).is_some() {
            tracing::debug!(incident_id = %id, "Incident deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Incident {} not found", id)))
        }
    }

    async fn list_incidents(
        &self,
        filter: &IncidentFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Incident>> {
        let mut incidents = self.matching(filter);

        // Newest first
        incidents.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(incidents
            .into_iter()
            .skip(page_offset(page, page_size))
            .take(page_size as usize)
            .collect())
    }

    async fn count_incidents(&self, filter: &IncidentFilter) -> Result<u64> {
        let count = self
            .incidents
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count();

        Ok(count as u64)
    }

    async fn all_incidents(&self) -> Result<Vec<Incident>> {
        Ok(self.matching(&IncidentFilter::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncidentUpdate, NewIncident, WasteCategory};
    use chrono::{Duration, Utc};

    fn new_incident(location: &str, hours_ago: i64) -> Incident {
        Incident::new(NewIncident {
            description: "Construction rubble left on the sidewalk".to_string(),
            timestamp: Some(Utc::now() - Duration::hours(hours_ago)),
            location: location.to_string(),
            latitude: None,
            longitude: None,
        })
    }

    #[tokio::test]
    async fn test_save_and_get_incident() {
        let store = InMemoryStore::new();
        let incident = new_incident("Main Street", 1);
        let id = incident.id;

        store.save_incident(&incident).await.unwrap();

        let retrieved = store.get_incident(&id).await.unwrap();
        assert_eq!(retrieved, Some(incident));
    }

    #[tokio::test]
    async fn test_update_incident() {
        let store = InMemoryStore::new();
        let mut incident = new_incident("Main Street", 1);
        store.save_incident(&incident).await.unwrap();

        incident.apply_update(IncidentUpdate {
            location: Some("Second Street".to_string()),
            ..Default::default()
        });
        store.update_incident(&incident).await.unwrap();

        let retrieved = store.get_incident(&incident.id).await.unwrap().unwrap();
        assert_eq!(retrieved.location, "Second Street");
    }

    #[tokio::test]
    async fn test_update_missing_incident_is_not_found() {
        let store = InMemoryStore::new();
        let incident = new_incident("Main Street", 1);

        let result = store.update_incident(&incident).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_incident() {
        let store = InMemoryStore::new();
        let incident = new_incident("Main Street", 1);
        let id = incident.id;
        store.save_incident(&incident).await.unwrap();

        store.delete_incident(&id).await.unwrap();

        assert!(store.get_incident(&id).await.unwrap().is_none());
        assert!(matches!(
            store.delete_incident(&id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_and_paginates() {
        let store = InMemoryStore::new();
        for hours_ago in [5, 1, 3, 2, 4] {
            store
                .save_incident(&new_incident(&format!("Site {}", hours_ago), hours_ago))
                .await
                .unwrap();
        }

        let filter = IncidentFilter::default();
        let first = store.list_incidents(&filter, 1, 2).await.unwrap();
        let second = store.list_incidents(&filter, 2, 2).await.unwrap();
        let third = store.list_incidents(&filter, 3, 2).await.unwrap();

        assert_eq!(first[0].location, "Site 1");
        assert_eq!(first[1].location, "Site 2");
        assert_eq!(second[0].location, "Site 3");
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].location, "Site 5");
    }

    #[tokio::test]
    async fn test_count_with_filter() {
        let store = InMemoryStore::new();
        for i in 0..6 {
            let mut incident = new_incident("Depot", i);
            incident.waste_type = Some(if i < 2 {
                WasteCategory::Glass
            } else {
                WasteCategory::Paper
            });
            store.save_incident(&incident).await.unwrap();
        }

        let filter = IncidentFilter {
            waste_type: Some("gla".to_string()),
            ..Default::default()
        };
        assert_eq!(store.count_incidents(&filter).await.unwrap(), 2);
        assert_eq!(store.all_incidents().await.unwrap().len(), 6);
    }
}
