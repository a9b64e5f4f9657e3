//! Result recording (labs, vitals, imaging findings).

use crate::audit::AuditLog;
use crate::constants::tables;
use crate::error::WsResult;
use crate::records::{ActorKind, EventKind, NewObservation, NewPatientEvent, Observation};
use crate::store::StoreClient;
use edw_types::NonEmptyText;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ObservationService {
    store: Arc<StoreClient>,
    audit: AuditLog,
}

impl ObservationService {
    pub fn new(store: Arc<StoreClient>, audit: AuditLog) -> Self {
        Self { store, audit }
    }

    /// Records a result against an encounter. Results are immutable once
    /// recorded; corrections arrive as new rows.
    pub async fn record(
        &self,
        encounter_id: Uuid,
        category: NonEmptyText,
        name: NonEmptyText,
        value: NonEmptyText,
        unit: Option<String>,
        flag: Option<String>,
    ) -> WsResult<Observation> {
        let row = NewObservation {
            encounter_id,
            category: category.into_inner(),
            name: name.into_inner(),
            value: value.into_inner(),
            unit,
            flag,
        };
        let observation: Observation = self.store.insert_one(tables::OBSERVATIONS, &row).await?;

        self.audit
            .record(
                NewPatientEvent::new(
                    encounter_id,
                    ActorKind::Clinician,
                    EventKind::ObservationRecorded,
                )
                .with_entity("observation", observation.id)
                .with_payload(serde_json::json!({
                    "category": observation.category,
                    "name": observation.name,
                    "flag": observation.flag,
                })),
            )
            .await;

        Ok(observation)
    }

    /// Lists an encounter's results, newest first.
    pub async fn list(&self, encounter_id: Uuid) -> WsResult<Vec<Observation>> {
        self.store
            .select(
                tables::OBSERVATIONS,
                &[("encounter_id", encounter_id.to_string())],
            )
            .await
    }
}
