//! Request and response bodies for the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Register a new patient.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePatientReq {
    pub name: String,
    /// Medical record number or other external identifier.
    pub identifier: String,
    /// One of `female`, `male`, `other`, `unknown`.
    pub sex: String,
}

/// Open a new encounter for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateEncounterReq {
    pub patient_id: Uuid,
    pub location: String,
    /// Initial status; defaults to `active` when omitted.
    #[serde(default)]
    pub status: Option<String>,
}

/// Author a note against an encounter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateNoteReq {
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// When the documented event happened; defaults to now.
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Edit the title and content of an existing note.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateNoteReq {
    pub title: String,
    pub content: String,
}

/// Place an order from a free-text line.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlaceOrderReq {
    pub text: String,
}

/// Record a result against an encounter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordObservationReq {
    pub category: String,
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
}

/// Add a clinician-authored differential-diagnosis entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddDdxReq {
    pub name: String,
    /// Likelihood in `0.0..=1.0`.
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Apply a selection of AI order suggestions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplySuggestionsReq {
    pub suggestion_ids: Vec<Uuid>,
}
