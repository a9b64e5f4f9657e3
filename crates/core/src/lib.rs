//! # EDW Core
//!
//! Core logic for the emergency-department workstation.
//!
//! This crate contains the data-access client for the remote relational
//! store, the per-entity services, the AI assistant round trip, the
//! best-effort audit log, and the encounter workspace that ties them together.
//!
//! **No API concerns**: HTTP servers, OpenAPI documentation and CLI parsing
//! belong in `api-rest`, `api-shared` and `edw-cli`.

pub mod ai;
pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod records;
pub mod scratchpad;
pub mod services;
pub mod store;
pub mod workspace;

pub use ai::{AiAssessment, AiClient, AiDiagnosis, AiRecommendation, AssessmentContext};
pub use audit::AuditLog;
pub use config::CoreConfig;
pub use error::{WorkstationError, WsResult};
pub use records::{
    ActorKind, AiRun, AiSuggestion, DdxEntry, DdxSource, Encounter, EventKind, Note, Observation,
    Order, Patient, PatientEvent, Sex, SuggestionKind,
};
pub use scratchpad::{DraftNote, DraftOrder, Scratchpad};
pub use services::{
    parse_order_text, AiOutcome, AssistantService, DdxService, EncounterData, EncounterService,
    NoteService, ObservationService, OrderService, ParsedOrder, PatientService,
};
pub use store::StoreClient;
pub use workspace::{Workspace, WorkspaceState};

// Re-export the validated value types so downstream crates take one dependency.
pub use edw_types::{NonEmptyText, Probability};
