//! Encounter workspace orchestration.
//!
//! The workspace is the derived state tree a clinician works inside: one
//! selected patient, one selected encounter, and the loaded rows for that
//! encounter. It is a plain projection of the store - every mutation writes
//! through a service and then re-fetches the affected encounter data, so the
//! tree never drifts far from the backend.
//!
//! There is no request queue, no debouncing and no cancellation of in-flight
//! requests. Two workstations writing to the same encounter race freely and
//! the store's last write wins; this module makes no attempt at conflict
//! detection.

use crate::ai::{AiClient, AssessmentContext};
use crate::audit::AuditLog;
use crate::config::CoreConfig;
use crate::error::{WorkstationError, WsResult};
use crate::records::{
    DdxEntry, Encounter, Note, Observation, Order, Patient, PatientEvent, Sex,
};
use crate::services::{
    AiOutcome, AssistantService, DdxService, EncounterData, EncounterService, NoteService,
    ObservationService, OrderService, PatientService,
};
use crate::store::StoreClient;
use chrono::{DateTime, Utc};
use edw_types::{NonEmptyText, Probability};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// The state tree derived from the current selection.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceState {
    pub patient: Option<Patient>,
    /// Encounters of the selected patient, newest first.
    pub encounters: Vec<Encounter>,
    pub encounter: Option<Encounter>,
    /// Loaded rows for the selected encounter.
    pub data: EncounterData,
    /// Most recent AI run and its suggestions, if any.
    pub latest_ai: Option<AiOutcome>,
}

impl WorkspaceState {
    fn clear_encounter(&mut self) {
        self.encounter = None;
        self.data = EncounterData::default();
        self.latest_ai = None;
    }
}

/// A single clinician's working view over one patient and encounter.
#[derive(Debug, Clone)]
pub struct Workspace {
    patients: PatientService,
    encounters: EncounterService,
    notes: NoteService,
    orders: OrderService,
    observations: ObservationService,
    ddx: DdxService,
    assistant: AssistantService,
    audit: AuditLog,
    state: WorkspaceState,
}

impl Workspace {
    /// Builds a workspace with fresh clients from the resolved configuration.
    pub fn new(cfg: &CoreConfig) -> WsResult<Self> {
        let store = Arc::new(StoreClient::new(cfg)?);
        let audit = AuditLog::new(store.clone());
        let ai_client = AiClient::new(cfg)?;

        Ok(Self {
            patients: PatientService::new(store.clone()),
            encounters: EncounterService::new(store.clone(), audit.clone()),
            notes: NoteService::new(store.clone(), audit.clone()),
            orders: OrderService::new(store.clone(), audit.clone()),
            observations: ObservationService::new(store.clone(), audit.clone()),
            ddx: DdxService::new(store.clone(), audit.clone()),
            assistant: AssistantService::new(store, audit.clone(), ai_client),
            audit,
            state: WorkspaceState::default(),
        })
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    fn selected_encounter_id(&self) -> WsResult<Uuid> {
        self.state
            .encounter
            .as_ref()
            .map(|e| e.id)
            .ok_or(WorkstationError::NoEncounterSelected)
    }

    // ------------------------------------------------------------------
    // Browsing
    // ------------------------------------------------------------------

    /// Lists all patients.
    pub async fn list_patients(&self) -> WsResult<Vec<Patient>> {
        self.patients.list().await
    }

    /// Registers a patient. Does not change the current selection.
    pub async fn create_patient(
        &self,
        name: NonEmptyText,
        identifier: NonEmptyText,
        sex: Sex,
    ) -> WsResult<Patient> {
        self.patients.create(name, identifier, sex).await
    }

    /// Lists a patient's encounters without changing the current selection.
    pub async fn list_encounters(&self, patient_id: Uuid) -> WsResult<Vec<Encounter>> {
        self.encounters.list_for_patient(patient_id).await
    }

    /// Selects a patient, clearing any previously selected encounter and all
    /// of its dependent views before the patient's encounters are loaded.
    pub async fn select_patient(&mut self, patient: Patient) -> WsResult<()> {
        self.state.clear_encounter();
        self.state.encounters = Vec::new();
        self.state.patient = Some(patient.clone());

        self.state.encounters = self.encounters.list_for_patient(patient.id).await?;
        Ok(())
    }

    /// Opens a new encounter for the selected patient and selects it.
    pub async fn create_encounter(
        &mut self,
        location: NonEmptyText,
        status: NonEmptyText,
    ) -> WsResult<Encounter> {
        let patient_id = self
            .state
            .patient
            .as_ref()
            .map(|p| p.id)
            .ok_or(WorkstationError::NoPatientSelected)?;

        let encounter = self.encounters.create(patient_id, location, status).await?;
        self.state.encounters = self.encounters.list_for_patient(patient_id).await?;
        self.select_encounter(encounter.clone()).await?;
        Ok(encounter)
    }

    /// Selects an encounter and loads its dependent tables.
    ///
    /// The five fetches (notes, orders, observations, ddx, latest AI state)
    /// are independent requests issued concurrently.
    pub async fn select_encounter(&mut self, encounter: Encounter) -> WsResult<()> {
        let (data, latest_ai) = tokio::join!(
            self.encounters.load_data(encounter.id),
            self.assistant.latest(encounter.id),
        );

        self.state.encounter = Some(encounter);
        self.state.data = data?;
        self.state.latest_ai = latest_ai?;
        Ok(())
    }

    /// Fetches an encounter by id and selects it.
    pub async fn open_encounter(&mut self, encounter_id: Uuid) -> WsResult<()> {
        let encounter = self.encounters.get(encounter_id).await?;
        self.select_encounter(encounter).await
    }

    /// Re-fetches the selected encounter's data and latest AI state.
    pub async fn reload(&mut self) -> WsResult<()> {
        let encounter_id = self.selected_encounter_id()?;

        let (data, latest_ai) = tokio::join!(
            self.encounters.load_data(encounter_id),
            self.assistant.latest(encounter_id),
        );

        self.state.data = data?;
        self.state.latest_ai = latest_ai?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutations - write through a service, then re-fetch
    // ------------------------------------------------------------------

    /// Authors a note against the selected encounter.
    pub async fn create_note(
        &mut self,
        kind: NonEmptyText,
        title: NonEmptyText,
        content: String,
        occurred_at: Option<DateTime<Utc>>,
    ) -> WsResult<Note> {
        let encounter_id = self.selected_encounter_id()?;
        let note = self
            .notes
            .create(encounter_id, kind, title, content, occurred_at)
            .await?;
        self.reload().await?;
        Ok(note)
    }

    /// Edits an existing note on the selected encounter.
    pub async fn update_note(
        &mut self,
        note_id: Uuid,
        title: NonEmptyText,
        content: String,
    ) -> WsResult<Note> {
        let encounter_id = self.selected_encounter_id()?;
        let note = self.notes.update(encounter_id, note_id, title, content).await?;
        self.reload().await?;
        Ok(note)
    }

    /// Places an order from free text.
    ///
    /// Blank text creates nothing and skips the reload entirely.
    pub async fn place_order(&mut self, text: &str) -> WsResult<Option<Order>> {
        let encounter_id = self.selected_encounter_id()?;
        let placed = self.orders.place_from_text(encounter_id, text).await?;
        if placed.is_some() {
            self.reload().await?;
        }
        Ok(placed)
    }

    /// Records a result against the selected encounter.
    pub async fn record_observation(
        &mut self,
        category: NonEmptyText,
        name: NonEmptyText,
        value: NonEmptyText,
        unit: Option<String>,
        flag: Option<String>,
    ) -> WsResult<Observation> {
        let encounter_id = self.selected_encounter_id()?;
        let observation = self
            .observations
            .record(encounter_id, category, name, value, unit, flag)
            .await?;
        self.reload().await?;
        Ok(observation)
    }

    /// Adds a clinician-authored entry to the differential.
    pub async fn add_ddx(
        &mut self,
        name: NonEmptyText,
        probability: Option<Probability>,
        reason: Option<String>,
    ) -> WsResult<DdxEntry> {
        let encounter_id = self.selected_encounter_id()?;
        let entry = self
            .ddx
            .add(encounter_id, name, probability, reason)
            .await?;
        self.reload().await?;
        Ok(entry)
    }

    // ------------------------------------------------------------------
    // AI assistant
    // ------------------------------------------------------------------

    /// Runs the assistant over the currently loaded data.
    ///
    /// The context is a projection of what is already in the state tree, not
    /// a fresh fetch. A failed call leaves both the store and this workspace
    /// untouched; on success the encounter data and AI state are reloaded.
    pub async fn run_assistant(&mut self) -> WsResult<AiOutcome> {
        let encounter_id = self.selected_encounter_id()?;
        let context = AssessmentContext::from_loaded(&self.state.data);

        let outcome = self
            .assistant
            .run_assessment(encounter_id, &context)
            .await?;

        self.reload().await?;
        Ok(outcome)
    }

    /// Applies the selected order-type suggestions from the latest AI run.
    ///
    /// An empty effective selection is a no-op: nothing is inserted and the
    /// workspace is not reloaded.
    pub async fn apply_order_suggestions(
        &mut self,
        selected: &HashSet<Uuid>,
    ) -> WsResult<Vec<Order>> {
        let encounter_id = self.selected_encounter_id()?;
        let suggestions = self
            .state
            .latest_ai
            .as_ref()
            .map(|o| o.suggestions.clone())
            .unwrap_or_default();

        let orders = self
            .assistant
            .apply_order_suggestions(encounter_id, &suggestions, selected)
            .await?;

        if !orders.is_empty() {
            self.reload().await?;
        }
        Ok(orders)
    }

    // ------------------------------------------------------------------
    // Audit trail
    // ------------------------------------------------------------------

    /// Reads the audit trail for the selected encounter, newest first.
    pub async fn events(&self) -> WsResult<Vec<PatientEvent>> {
        let encounter_id = self.selected_encounter_id()?;
        self.audit.list(encounter_id).await
    }
}
