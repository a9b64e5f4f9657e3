//! Differential-diagnosis list maintenance.

use crate::audit::AuditLog;
use crate::constants::tables;
use crate::error::WsResult;
use crate::records::{ActorKind, DdxEntry, DdxSource, EventKind, NewDdxEntry, NewPatientEvent};
use crate::store::StoreClient;
use edw_types::{NonEmptyText, Probability};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DdxService {
    store: Arc<StoreClient>,
    audit: AuditLog,
}

impl DdxService {
    pub fn new(store: Arc<StoreClient>, audit: AuditLog) -> Self {
        Self { store, audit }
    }

    /// Adds a clinician-authored entry to the differential.
    ///
    /// AI-authored entries are written in bulk by the assistant service, not
    /// here.
    pub async fn add(
        &self,
        encounter_id: Uuid,
        name: NonEmptyText,
        probability: Option<Probability>,
        reason: Option<String>,
    ) -> WsResult<DdxEntry> {
        let row = NewDdxEntry {
            encounter_id,
            source: DdxSource::Human,
            name: name.into_inner(),
            probability: probability.map(|p| p.value()),
            reason,
        };
        let entry: DdxEntry = self.store.insert_one(tables::DDX_ENTRIES, &row).await?;

        self.audit
            .record(
                NewPatientEvent::new(encounter_id, ActorKind::Clinician, EventKind::DdxAdded)
                    .with_entity("ddx_entry", entry.id)
                    .with_payload(serde_json::json!({
                        "name": entry.name,
                        "probability": entry.probability,
                    })),
            )
            .await;

        Ok(entry)
    }

    /// Lists an encounter's differential, newest first.
    pub async fn list(&self, encounter_id: Uuid) -> WsResult<Vec<DdxEntry>> {
        self.store
            .select(
                tables::DDX_ENTRIES,
                &[("encounter_id", encounter_id.to_string())],
            )
            .await
    }
}
