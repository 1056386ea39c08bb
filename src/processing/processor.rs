use crate::audit::{AuditLogger, AuditStatus};
use crate::enrichment::{EnrichmentService, ScoredIncident};
use crate::error::{AppError, Result};
use crate::metrics::{INCIDENTS_CLASSIFIED_TOTAL, INCIDENTS_TOTAL};
use crate::models::{Incident, IncidentUpdate, NewIncident};
use crate::state::{IncidentFilter, IncidentStore};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// One page of a filtered listing
#[derive(Debug, Clone)]
pub struct IncidentPage {
    pub items: Vec<Incident>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

/// `ceil(total / page_size)`, 0 for an empty result
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if total == 0 || page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64)
}

/// Incident service: persistence plus synchronous enrichment on create
pub struct IncidentProcessor {
    store: Arc<dyn IncidentStore>,
    enrichment: Arc<EnrichmentService>,
    audit: AuditLogger,
}

impl IncidentProcessor {
    pub fn new(store: Arc<dyn IncidentStore>, enrichment: Arc<EnrichmentService>) -> Self {
        Self {
            store,
            enrichment,
            audit: AuditLogger::new(),
        }
    }

    /// Get a reference to the incident store
    pub fn store(&self) -> &Arc<dyn IncidentStore> {
        &self.store
    }

    /// Get a reference to the enrichment service
    pub fn enrichment(&self) -> &Arc<EnrichmentService> {
        &self.enrichment
    }

    /// Validate, persist and enrich a new report.
    ///
    /// If enrichment fails the report is kept unenriched and returned as is.
    pub async fn create_incident(&self, input: NewIncident) -> Result<Incident> {
        input.validate()?;

        let mut incident = Incident::new(input);
        self.store.save_incident(&incident).await?;

        self.audit.log_action(
            "create",
            "incident",
            Some(&incident.id.to_string()),
            None,
            AuditStatus::Success,
        );
        INCIDENTS_TOTAL.with_label_values(&["created"]).inc();

        tracing::info!(
            incident_id = %incident.id,
            location = %incident.location,
            "Incident created"
        );

        let processed = match self
            .enrichment
            .process_incident(&incident.description, &incident.location)
            .await
        {
            Ok(processed) => processed,
            Err(e) => {
                tracing::error!(
                    incident_id = %incident.id,
                    error = %e,
                    "Failed to enrich incident, keeping it unenriched"
                );
                return Ok(incident);
            }
        };

        let similar_ids: Vec<Uuid> = self
            .enrichment
            .find_similar(
                self.store.as_ref(),
                incident.id,
                &processed.embedding,
                None,
                self.enrichment.config().similar_limit,
            )
            .await
            .into_iter()
            .map(|s| s.incident.id)
            .collect();

        INCIDENTS_CLASSIFIED_TOTAL
            .with_label_values(&[processed.waste_type.as_str()])
            .inc();

        incident.apply_enrichment(processed.into_outcome(similar_ids));
        self.store.update_incident(&incident).await?;

        tracing::info!(
            incident_id = %incident.id,
            waste_type = ?incident.waste_type,
            confidence = ?incident.waste_type_confidence,
            similar = incident.similar_incident_ids.len(),
            "Enrichment fields updated"
        );

        Ok(incident)
    }

    pub async fn get_incident(&self, id: &Uuid) -> Result<Incident> {
        self.store
            .get_incident(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))
    }

    /// Filtered, newest-first page. `page` is 1-based.
    pub async fn list_incidents(
        &self,
        filter: &IncidentFilter,
        page: u32,
        page_size: u32,
    ) -> Result<IncidentPage> {
        if page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if !(1..=100).contains(&page_size) {
            return Err(AppError::Validation(
                "page_size must be between 1 and 100".to_string(),
            ));
        }

        let total = self.store.count_incidents(filter).await?;
        let items = self.store.list_incidents(filter, page, page_size).await?;

        Ok(IncidentPage {
            items,
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        })
    }

    /// Partial update of user-editable fields. Enrichment is not recomputed.
    pub async fn update_incident(&self, id: &Uuid, update: IncidentUpdate) -> Result<Incident> {
        update.validate()?;

        let mut incident = self.get_incident(id).await?;
        let details = serde_json::to_value(&update)?;
        let changed = incident.apply_update(update);
        self.store.update_incident(&incident).await?;

        self.audit.log_action(
            "update",
            "incident",
            Some(&id.to_string()),
            Some(&json!({ "fields": changed, "values": details })),
            AuditStatus::Success,
        );
        INCIDENTS_TOTAL.with_label_values(&["updated"]).inc();

        Ok(incident)
    }

    pub async fn delete_incident(&self, id: &Uuid) -> Result<()> {
        if let Err(e) = self.store.delete_incident(id).await {
            self.audit.log_action(
                "delete",
                "incident",
                Some(&id.to_string()),
                Some(&json!({ "error": e.to_string() })),
                AuditStatus::Failure,
            );
            return Err(e);
        }

        self.audit.log_action(
            "delete",
            "incident",
            Some(&id.to_string()),
            None,
            AuditStatus::Success,
        );
        INCIDENTS_TOTAL.with_label_values(&["deleted"]).inc();

        Ok(())
    }

    /// Free-text search over stored incident embeddings
    pub async fn semantic_search(
        &self,
        query: &str,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredIncident>> {
        self.enrichment
            .semantic_search(self.store.as_ref(), query, threshold, limit)
            .await
    }

    /// Incidents similar to `description`, never including `incident_id` itself
    pub async fn similar_to(
        &self,
        incident_id: Uuid,
        description: &str,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredIncident>> {
        let embedding = self.enrichment.generate_embedding(description).await?;

        Ok(self
            .enrichment
            .find_similar(
                self.store.as_ref(),
                incident_id,
                &embedding,
                Some(threshold),
                limit,
            )
            .await)
    }
}
