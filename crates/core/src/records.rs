//! Row types for the remote relational store.
//!
//! Every entity maps one-to-one onto a persisted row: a generated UUID, an
//! owning foreign key, and a `created_at`/`updated_at` timestamp pair. All
//! uniqueness and referential invariants live in the store itself; these types
//! only describe the shape of what comes back over the wire.
//!
//! Each row type has a matching `New*` insert payload without the generated
//! columns; the store fills in `id` and the timestamps and returns the full
//! representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::WorkstationError;

// ============================================================================
// CLOSED VOCABULARIES
// ============================================================================

/// Administrative sex recorded on the patient row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
    Other,
    Unknown,
}

impl FromStr for Sex {
    type Err = WorkstationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" | "f" => Ok(Sex::Female),
            "male" | "m" => Ok(Sex::Male),
            "other" => Ok(Sex::Other),
            "unknown" => Ok(Sex::Unknown),
            other => Err(WorkstationError::InvalidInput(format!(
                "unrecognised sex: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sex::Female => "female",
            Sex::Male => "male",
            Sex::Other => "other",
            Sex::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Who authored a differential-diagnosis entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DdxSource {
    Human,
    Ai,
}

/// What an AI suggestion proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Diagnosis,
    Order,
}

/// Who performed an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Clinician,
    Ai,
    System,
}

/// Typed audit event names.
///
/// Serialized snake_case; these are the wire values in `patient_events` and
/// must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    EncounterCreated,
    NoteCreated,
    NoteUpdated,
    OrderPlaced,
    ObservationRecorded,
    DdxAdded,
    AiRunCompleted,
    AiOrderApplied,
}

// ============================================================================
// ROWS
// ============================================================================

/// A patient known to the department. Never deleted in-app.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    /// Medical record number or other external identifier.
    pub identifier: String,
    pub sex: Sex,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub identifier: String,
    pub sex: Sex,
}

/// One emergency-department visit for a patient.
///
/// Status is recorded at creation and never transitioned in-app.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Encounter {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub location: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEncounter {
    pub patient_id: Uuid,
    pub location: String,
    pub status: String,
}

/// A free-text clinical note against an encounter. Editable, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Note {
    pub id: Uuid,
    pub encounter_id: Uuid,
    /// Note category, e.g. "triage", "progress", "procedure".
    pub kind: String,
    pub title: String,
    pub content: String,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNote {
    pub encounter_id: Uuid,
    pub kind: String,
    pub title: String,
    pub content: String,
    pub occurred_at: DateTime<Utc>,
}

/// Patch payload for editing an existing note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotePatch {
    pub title: String,
    pub content: String,
}

/// A clinical instruction logged against an encounter.
///
/// Status is fixed at [`crate::constants::ORDER_STATUS_SENT`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub encounter_id: Uuid,
    pub code: Option<String>,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub encounter_id: Uuid,
    pub code: Option<String>,
    pub name: String,
    pub status: String,
}

/// A recorded result (lab, vital sign, imaging finding) for an encounter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Observation {
    pub id: Uuid,
    pub encounter_id: Uuid,
    /// Result category, e.g. "lab", "vitals", "imaging".
    pub category: String,
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
    /// Abnormality flag, e.g. "H", "L", "critical".
    pub flag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewObservation {
    pub encounter_id: Uuid,
    pub category: String,
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
    pub flag: Option<String>,
}

/// A differential-diagnosis list entry, human- or AI-authored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DdxEntry {
    pub id: Uuid,
    pub encounter_id: Uuid,
    pub source: DdxSource,
    pub name: String,
    pub probability: Option<f64>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDdxEntry {
    pub encounter_id: Uuid,
    pub source: DdxSource,
    pub name: String,
    pub probability: Option<f64>,
    pub reason: Option<String>,
}

/// Snapshot of one AI assistant invocation: what was sent and what came back.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AiRun {
    pub id: Uuid,
    pub encounter_id: Uuid,
    pub provider: String,
    pub model: String,
    /// The full request payload sent to the assistant.
    #[schema(value_type = Object)]
    pub prompt: serde_json::Value,
    /// The raw response body, unmodified.
    #[schema(value_type = Object)]
    pub response: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAiRun {
    pub encounter_id: Uuid,
    pub provider: String,
    pub model: String,
    pub prompt: serde_json::Value,
    pub response: serde_json::Value,
}

/// One proposal extracted from an AI run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AiSuggestion {
    pub id: Uuid,
    pub ai_run_id: Uuid,
    pub encounter_id: Uuid,
    pub kind: SuggestionKind,
    pub code: Option<String>,
    pub name: String,
    pub probability: Option<f64>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAiSuggestion {
    pub ai_run_id: Uuid,
    pub encounter_id: Uuid,
    pub kind: SuggestionKind,
    pub code: Option<String>,
    pub name: String,
    pub probability: Option<f64>,
    pub reason: Option<String>,
}

/// Append-only audit record for an encounter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientEvent {
    pub id: Uuid,
    pub encounter_id: Uuid,
    pub actor: ActorKind,
    pub event: EventKind,
    pub entity_kind: Option<String>,
    pub entity_id: Option<Uuid>,
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatientEvent {
    pub encounter_id: Uuid,
    pub actor: ActorKind,
    pub event: EventKind,
    pub entity_kind: Option<String>,
    pub entity_id: Option<Uuid>,
    pub payload: Option<serde_json::Value>,
}

impl NewPatientEvent {
    /// Start an event with no entity reference or payload.
    pub fn new(encounter_id: Uuid, actor: ActorKind, event: EventKind) -> Self {
        Self {
            encounter_id,
            actor,
            event,
            entity_kind: None,
            entity_id: None,
            payload: None,
        }
    }

    /// Attach the entity this event documents.
    pub fn with_entity(mut self, kind: impl Into<String>, id: Uuid) -> Self {
        self.entity_kind = Some(kind.into());
        self.entity_id = Some(id);
        self
    }

    /// Attach a free-form payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}
