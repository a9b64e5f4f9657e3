//! Encounter creation and encounter-scoped data loading.

use crate::audit::AuditLog;
use crate::constants::tables;
use crate::error::{WorkstationError, WsResult};
use crate::records::{
    ActorKind, DdxEntry, Encounter, EventKind, NewEncounter, NewPatientEvent, Note, Observation,
    Order,
};
use crate::store::StoreClient;
use edw_types::NonEmptyText;
use std::sync::Arc;
use uuid::Uuid;

/// Everything loaded for a selected encounter, one vector per dependent table.
#[derive(Debug, Clone, Default)]
pub struct EncounterData {
    pub notes: Vec<Note>,
    pub orders: Vec<Order>,
    pub observations: Vec<Observation>,
    pub ddx: Vec<DdxEntry>,
}

#[derive(Debug, Clone)]
pub struct EncounterService {
    store: Arc<StoreClient>,
    audit: AuditLog,
}

impl EncounterService {
    pub fn new(store: Arc<StoreClient>, audit: AuditLog) -> Self {
        Self { store, audit }
    }

    /// Opens a new encounter for a patient at the given location.
    ///
    /// Status is recorded once at creation; the workstation never transitions
    /// it afterwards.
    pub async fn create(
        &self,
        patient_id: Uuid,
        location: NonEmptyText,
        status: NonEmptyText,
    ) -> WsResult<Encounter> {
        let row = NewEncounter {
            patient_id,
            location: location.into_inner(),
            status: status.into_inner(),
        };
        let encounter: Encounter = self.store.insert_one(tables::ENCOUNTERS, &row).await?;

        self.audit
            .record(
                NewPatientEvent::new(encounter.id, ActorKind::Clinician, EventKind::EncounterCreated)
                    .with_entity("encounter", encounter.id)
                    .with_payload(serde_json::json!({
                        "patient_id": encounter.patient_id,
                        "location": encounter.location,
                    })),
            )
            .await;

        Ok(encounter)
    }

    /// Lists a patient's encounters, newest first.
    pub async fn list_for_patient(&self, patient_id: Uuid) -> WsResult<Vec<Encounter>> {
        self.store
            .select(tables::ENCOUNTERS, &[("patient_id", patient_id.to_string())])
            .await
    }

    /// Fetches a single encounter by id.
    pub async fn get(&self, encounter_id: Uuid) -> WsResult<Encounter> {
        let mut rows: Vec<Encounter> = self
            .store
            .select(tables::ENCOUNTERS, &[("id", encounter_id.to_string())])
            .await?;
        if rows.is_empty() {
            return Err(WorkstationError::EncounterNotFound(encounter_id));
        }
        Ok(rows.remove(0))
    }

    /// Loads the four encounter-dependent tables concurrently.
    ///
    /// The requests are independent; there is no ordering dependency between
    /// them, so they are issued in parallel and joined.
    pub async fn load_data(&self, encounter_id: Uuid) -> WsResult<EncounterData> {
        let filter = || vec![("encounter_id", encounter_id.to_string())];
        let (notes_filter, orders_filter, observations_filter, ddx_filter) =
            (filter(), filter(), filter(), filter());

        let (notes, orders, observations, ddx) = tokio::join!(
            self.store.select::<Note>(tables::NOTES, &notes_filter),
            self.store.select::<Order>(tables::ORDERS, &orders_filter),
            self.store
                .select::<Observation>(tables::OBSERVATIONS, &observations_filter),
            self.store.select::<DdxEntry>(tables::DDX_ENTRIES, &ddx_filter),
        );

        Ok(EncounterData {
            notes: notes?,
            orders: orders?,
            observations: observations?,
            ddx: ddx?,
        })
    }
}
