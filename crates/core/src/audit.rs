//! Best-effort audit trail.
//!
//! Every mutating action appends one row to `patient_events`. The trail is
//! advisory: it is not transactional with the primary write it documents, so
//! a failed append is logged and swallowed rather than surfaced. Audit and
//! primary data can therefore diverge on partial failure.

use crate::constants::tables;
use crate::error::WsResult;
use crate::records::{NewPatientEvent, PatientEvent};
use crate::store::StoreClient;
use std::sync::Arc;
use uuid::Uuid;

/// Append-only writer and reader for the `patient_events` table.
#[derive(Debug, Clone)]
pub struct AuditLog {
    store: Arc<StoreClient>,
}

impl AuditLog {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Append one event, swallowing any failure.
    ///
    /// The primary write this event documents has already succeeded by the
    /// time this runs; a lost event must never fail or roll back that write.
    pub async fn record(&self, event: NewPatientEvent) {
        let kind = event.event;
        if let Err(e) = self
            .store
            .insert::<_, PatientEvent>(tables::PATIENT_EVENTS, &event)
            .await
        {
            tracing::warn!("audit append failed for {:?}: {}", kind, e);
        }
    }

    /// Read the audit trail for an encounter, newest first.
    pub async fn list(&self, encounter_id: Uuid) -> WsResult<Vec<PatientEvent>> {
        self.store
            .select(
                tables::PATIENT_EVENTS,
                &[("encounter_id", encounter_id.to_string())],
            )
            .await
    }
}
