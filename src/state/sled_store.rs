use crate::error::{AppError, Result};
use crate::models::Incident;
use crate::state::{page_offset, IncidentFilter, IncidentStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sled::Db;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Persistent incident store using the Sled embedded database.
///
/// Records live in the `incidents` tree keyed by id. The `timeline` tree
/// holds `(timestamp, id)` keys so listings can walk newest-first without
/// loading and sorting every record.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    incidents_tree: sled::Tree,
    timeline_tree: sled::Tree,
}

impl SledStore {
    /// Open (or create) a Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            AppError::Database(format!("Failed to open Sled database: {}", e))
        })?;

        let incidents_tree = db.open_tree("incidents").map_err(|e| {
            AppError::Database(format!("Failed to open incidents tree: {}", e))
        })?;

        let timeline_tree = db.open_tree("timeline").map_err(|e| {
            AppError::Database(format!("Failed to open timeline tree: {}", e))
        })?;

        tracing::info!(path = ?path.as_ref(), "Initialized Sled store");

        Ok(Self {
            db: Arc::new(db),
            incidents_tree,
            timeline_tree,
        })
    }

    fn serialize_incident(incident: &Incident) -> Result<Vec<u8>> {
        bincode::serialize(incident).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize incident: {}", e))
        })
    }

    fn deserialize_incident(bytes: &[u8]) -> Result<Incident> {
        bincode::deserialize(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize incident: {}", e))
        })
    }

    fn incident_key(id: &Uuid) -> Vec<u8> {
        id.as_bytes().to_vec()
    }

    /// Big-endian key that sorts by timestamp, then id.
    /// The sign bit is flipped so pre-1970 timestamps order correctly.
    fn timeline_key(timestamp: &DateTime<Utc>, id: &Uuid) -> Vec<u8> {
        let micros = (timestamp.timestamp_micros() as u64) ^ (1 << 63);
        let mut key = Vec::with_capacity(24);
        key.extend_from_slice(&micros.to_be_bytes());
        key.extend_from_slice(id.as_bytes());
        key
    }

    fn id_from_timeline_key(key: &[u8]) -> Result<Uuid> {
        key.get(8..24)
            .and_then(|bytes| Uuid::from_slice(bytes).ok())
            .ok_or_else(|| AppError::Database("Corrupt timeline key".to_string()))
    }

    fn write_incident(&self, incident: &Incident) -> Result<()> {
        let value = Self::serialize_incident(incident)?;
        let previous = self
            .incidents_tree
            .insert(Self::incident_key(&incident.id), value)?;

        // Drop the stale timeline entry if the timestamp moved
        if let Some(previous) = previous {
            let previous = Self::deserialize_incident(&previous)?;
            if previous.timestamp != incident.timestamp {
                self.timeline_tree
                    .remove(Self::timeline_key(&previous.timestamp, &previous.id))?;
            }
        }

        self.timeline_tree.insert(
            Self::timeline_key(&incident.timestamp, &incident.id),
            &[] as &[u8],
        )?;

        self.incidents_tree.flush()?;
        self.timeline_tree.flush()?;
        Ok(())
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| AppError::Database(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl IncidentStore for SledStore {
    async fn save_incident(&self, incident: &Incident) -> Result<()> {
        self.write_incident(incident)?;
        tracing::debug!(incident_id = %incident.id, "Incident saved to Sled");
        Ok(())
    }

    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>> {
        match self.incidents_tree.get(Self::incident_key(id))? {
            Some(bytes) => Ok(Some(Self::deserialize_incident(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn update_incident(&self, incident: &Incident) -> Result<()> {
        if !self
            .incidents_tree
            .contains_key(Self::incident_key(&incident.id))?
        {
            return Err(AppError::NotFound(format!(
                "Incident {} not found",
                incident.id
            )));
        }

        self.write_incident(incident)?;
        tracing::debug!(incident_id = %incident.id, "Incident updated in Sled");
        Ok(())
    }

    async fn delete_incident(&self, id: &Uuid) -> Result<()> {
        let removed = self
            .incidents_tree
            .remove(Self::incident_key(id))?
            .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))?;

        let incident = Self::deserialize_incident(&removed)?;
        self.timeline_tree
            .remove(Self::timeline_key(&incident.timestamp, id))?;

        self.incidents_tree.flush()?;
        self.timeline_tree.flush()?;

        tracing::debug!(incident_id = %id, "Incident deleted from Sled");
        Ok(())
    }

    async fn list_incidents(
        &self,
        filter: &IncidentFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Incident>> {
        let offset = page_offset(page, page_size);
        let mut skipped = 0usize;
        let mut incidents = Vec::with_capacity(page_size as usize);

        for entry in self.timeline_tree.iter().rev() {
            if incidents.len() >= page_size as usize {
                break;
            }

            let (key, _) = entry?;
            let id = Self::id_from_timeline_key(&key)?;

            let Some(incident) = self.get_incident(&id).await? else {
                continue;
            };

            if !filter.matches(&incident) {
                continue;
            }

            if skipped < offset {
                skipped += 1;
                continue;
            }

            incidents.push(incident);
        }

        Ok(incidents)
    }

    async fn count_incidents(&self, filter: &IncidentFilter) -> Result<u64> {
        let mut count = 0u64;

        for entry in self.incidents_tree.iter() {
            let (_, value) = entry?;
            if filter.matches(&Self::deserialize_incident(&value)?) {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn all_incidents(&self) -> Result<Vec<Incident>> {
        self.incidents_tree
            .iter()
            .map(|entry| {
                let (_, value) = entry?;
                Self::deserialize_incident(&value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnrichmentOutcome, NewIncident, WasteCategory};
    use chrono::Duration;
    use tempfile::TempDir;

    fn create_test_store() -> (SledStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    fn new_incident(location: &str, hours_ago: i64) -> Incident {
        Incident::new(NewIncident {
            description: "Broken glass bottles scattered on the beach".to_string(),
            timestamp: Some(Utc::now() - Duration::hours(hours_ago)),
            location: location.to_string(),
            latitude: Some(7.88),
            longitude: Some(98.39),
        })
    }

    #[tokio::test]
    async fn test_save_and_get_enriched_incident() {
        let (store, _temp_dir) = create_test_store();

        let mut incident = new_incident("Patong Beach", 1);
        incident.apply_enrichment(EnrichmentOutcome {
            waste_type: WasteCategory::Glass,
            confidence: 0.82,
            embedding: vec![0.25, -0.5, 0.75, 0.0],
            keywords: vec!["glass".to_string(), "bottles".to_string()],
            similar_incident_ids: vec![Uuid::new_v4()],
        });

        store.save_incident(&incident).await.unwrap();

        let retrieved = store.get_incident(&incident.id).await.unwrap().unwrap();
        assert_eq!(retrieved, incident);
    }

    #[tokio::test]
    async fn test_update_moves_timeline_entry() {
        let (store, _temp_dir) = create_test_store();

        let mut older = new_incident("Old Pier", 10);
        let newer = new_incident("New Pier", 1);
        store.save_incident(&older).await.unwrap();
        store.save_incident(&newer).await.unwrap();

        older.timestamp = Utc::now();
        store.update_incident(&older).await.unwrap();

        let listed = store
            .list_incidents(&IncidentFilter::default(), 1, 10)
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].location, "Old Pier");
        assert_eq!(store.timeline_tree.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_incident() {
        let (store, _temp_dir) = create_test_store();
        let incident = new_incident("Harbour", 2);
        let id = incident.id;
        store.save_incident(&incident).await.unwrap();

        store.delete_incident(&id).await.unwrap();

        assert!(store.get_incident(&id).await.unwrap().is_none());
        assert!(store.timeline_tree.is_empty());
        assert!(matches!(
            store.delete_incident(&id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_incidents_with_filter_and_pages() {
        let (store, _temp_dir) = create_test_store();

        for i in 0..5 {
            let location = if i % 2 == 0 { "North Market" } else { "South Depot" };
            store
                .save_incident(&new_incident(location, i))
                .await
                .unwrap();
        }

        let filter = IncidentFilter {
            location: Some("market".to_string()),
            ..Default::default()
        };

        let page_one = store.list_incidents(&filter, 1, 2).await.unwrap();
        let page_two = store.list_incidents(&filter, 2, 2).await.unwrap();
        assert_eq!(page_one.len(), 2);
        assert_eq!(page_two.len(), 1);
        assert!(page_one[0].timestamp > page_one[1].timestamp);
        assert!(page_one[1].timestamp > page_two[0].timestamp);
        assert_eq!(store.count_incidents(&filter).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_persistence_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();
        let id;

        {
            let store = SledStore::new(&path).unwrap();
            let incident = new_incident("Canal Road", 3);
            id = incident.id;
            store.save_incident(&incident).await.unwrap();
            store.flush().await.unwrap();
        }

        {
            let store = SledStore::new(&path).unwrap();
            let incidents = store.all_incidents().await.unwrap();
            assert_eq!(incidents.len(), 1);
            assert_eq!(incidents[0].id, id);
            assert_eq!(incidents[0].location, "Canal Road");
        }
    }

    #[test]
    fn test_timeline_key_orders_by_time() {
        let id = Uuid::new_v4();
        let early = Utc::now() - Duration::days(365 * 60);
        let late = Utc::now();

        let a = SledStore::timeline_key(&early, &id);
        let b = SledStore::timeline_key(&late, &id);
        assert!(a < b);
        assert_eq!(SledStore::id_from_timeline_key(&b).unwrap(), id);
    }
}
