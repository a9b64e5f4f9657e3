//! # API REST
//!
//! REST API implementation for the EDW workstation.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//!
//! Uses `api-shared` for request bodies and the health check; all domain
//! behaviour lives in `edw-core`.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    AddDdxReq, ApplySuggestionsReq, CreateEncounterReq, CreateNoteReq, CreatePatientReq,
    HealthRes, HealthService, PlaceOrderReq, RecordObservationReq, UpdateNoteReq,
};
use edw_core::records::{
    ActorKind, AiRun, AiSuggestion, DdxEntry, DdxSource, Encounter, EventKind, Note, Observation,
    Order, Patient, PatientEvent, Sex, SuggestionKind,
};
use edw_core::{
    AiClient, AssessmentContext, AssistantService, AuditLog, CoreConfig, DdxService,
    EncounterService, NonEmptyText, NoteService, ObservationService, OrderService, PatientService,
    Probability, StoreClient, WorkstationError, WsResult,
};

/// Application state for the REST API server.
///
/// Contains the shared store client and the per-entity services every
/// request handler reaches for.
#[derive(Clone)]
pub struct AppState {
    patients: PatientService,
    encounters: EncounterService,
    notes: NoteService,
    orders: OrderService,
    observations: ObservationService,
    ddx: DdxService,
    assistant: AssistantService,
    audit: AuditLog,
}

impl AppState {
    /// Builds the state from the resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns a `WorkstationError` if the HTTP clients cannot be built.
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
        })
    }
}

/// Everything a client needs to render one encounter.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct EncounterSnapshotRes {
    pub encounter: Encounter,
    pub notes: Vec<Note>,
    pub orders: Vec<Order>,
    pub observations: Vec<Observation>,
    pub ddx: Vec<DdxEntry>,
    pub latest_ai: Option<AiRunRes>,
}

/// A persisted AI run with its suggestions.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct AiRunRes {
    pub run: AiRun,
    pub suggestions: Vec<AiSuggestion>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        create_patient,
        list_encounters,
        create_encounter,
        encounter_snapshot,
        create_note,
        update_note,
        place_order,
        record_observation,
        add_ddx,
        run_assistant,
        latest_assistant_run,
        apply_order_suggestions,
        list_events,
    ),
    components(schemas(
        HealthRes,
        CreatePatientReq,
        CreateEncounterReq,
        CreateNoteReq,
        UpdateNoteReq,
        PlaceOrderReq,
        RecordObservationReq,
        AddDdxReq,
        ApplySuggestionsReq,
        Patient,
        Encounter,
        Note,
        Order,
        Observation,
        DdxEntry,
        AiRun,
        AiSuggestion,
        PatientEvent,
        Sex,
        DdxSource,
        SuggestionKind,
        ActorKind,
        EventKind,
        EncounterSnapshotRes,
        AiRunRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with all routes, Swagger UI and CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients))
        .route("/patients", post(create_patient))
        .route("/patients/:id/encounters", get(list_encounters))
        .route("/encounters", post(create_encounter))
        .route("/encounters/:id", get(encounter_snapshot))
        .route("/encounters/:id/notes", post(create_note))
        .route("/encounters/:id/notes/:note_id", put(update_note))
        .route("/encounters/:id/orders", post(place_order))
        .route("/encounters/:id/observations", post(record_observation))
        .route("/encounters/:id/ddx", post(add_ddx))
        .route("/encounters/:id/ai/run", post(run_assistant))
        .route("/encounters/:id/ai/latest", get(latest_assistant_run))
        .route("/encounters/:id/ai/apply-orders", post(apply_order_suggestions))
        .route("/encounters/:id/events", get(list_events))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type HandlerError = (StatusCode, &'static str);

/// Maps a core error onto an HTTP status, logging the detail server-side.
fn map_core_error(context: &'static str, e: WorkstationError) -> HandlerError {
    match e {
        WorkstationError::InvalidInput(_) | WorkstationError::Text(_) => {
            tracing::warn!("{context}: {e}");
            (StatusCode::BAD_REQUEST, "Invalid input")
        }
        WorkstationError::EncounterNotFound(_) => {
            tracing::warn!("{context}: {e}");
            (StatusCode::NOT_FOUND, "Encounter not found")
        }
        _ => {
            tracing::error!("{context}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

fn non_empty(value: &str, error: &'static str) -> Result<NonEmptyText, HandlerError> {
    NonEmptyText::new(value).map_err(|_| (StatusCode::BAD_REQUEST, error))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API.
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "List of patients", body = [Patient]),
        (status = 500, description = "Internal server error")
    )
)]
/// List all patients, newest first.
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<Patient>>, HandlerError> {
    state
        .patients
        .list()
        .await
        .map(Json)
        .map_err(|e| map_core_error("List patients error", e))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientReq,
    responses(
        (status = 200, description = "Patient created", body = Patient),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Register a new patient.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<CreatePatientReq>,
) -> Result<Json<Patient>, HandlerError> {
    let name = non_empty(&req.name, "name cannot be empty")?;
    let identifier = non_empty(&req.identifier, "identifier cannot be empty")?;
    let sex: Sex = req
        .sex
        .parse()
        .map_err(|e| map_core_error("Create patient error", e))?;

    state
        .patients
        .create(name, identifier, sex)
        .await
        .map(Json)
        .map_err(|e| map_core_error("Create patient error", e))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/encounters",
    responses(
        (status = 200, description = "The patient's encounters", body = [Encounter]),
        (status = 500, description = "Internal server error")
    )
)]
/// List a patient's encounters, newest first.
#[axum::debug_handler]
async fn list_encounters(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<uuid::Uuid>,
) -> Result<Json<Vec<Encounter>>, HandlerError> {
    state
        .encounters
        .list_for_patient(id)
        .await
        .map(Json)
        .map_err(|e| map_core_error("List encounters error", e))
}

#[utoipa::path(
    post,
    path = "/encounters",
    request_body = CreateEncounterReq,
    responses(
        (status = 200, description = "Encounter created", body = Encounter),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Open a new encounter for a patient.
#[axum::debug_handler]
async fn create_encounter(
    State(state): State<AppState>,
    Json(req): Json<CreateEncounterReq>,
) -> Result<Json<Encounter>, HandlerError> {
    let location = non_empty(&req.location, "location cannot be empty")?;
    let status = non_empty(
        req.status.as_deref().unwrap_or("active"),
        "status cannot be empty",
    )?;

    state
        .encounters
        .create(req.patient_id, location, status)
        .await
        .map(Json)
        .map_err(|e| map_core_error("Create encounter error", e))
}

#[utoipa::path(
    get,
    path = "/encounters/{id}",
    responses(
        (status = 200, description = "Full encounter snapshot", body = EncounterSnapshotRes),
        (status = 404, description = "Encounter not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Fetch everything loaded for an encounter in one round trip.
///
/// The dependent tables are independent requests issued concurrently; there
/// is no ordering dependency between them.
#[axum::debug_handler]
async fn encounter_snapshot(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<uuid::Uuid>,
) -> Result<Json<EncounterSnapshotRes>, HandlerError> {
    let encounter = state
        .encounters
        .get(id)
        .await
        .map_err(|e| map_core_error("Encounter snapshot error", e))?;

    let (data, latest) = tokio::join!(state.encounters.load_data(id), state.assistant.latest(id));
    let data = data.map_err(|e| map_core_error("Encounter snapshot error", e))?;
    let latest = latest.map_err(|e| map_core_error("Encounter snapshot error", e))?;

    Ok(Json(EncounterSnapshotRes {
        encounter,
        notes: data.notes,
        orders: data.orders,
        observations: data.observations,
        ddx: data.ddx,
        latest_ai: latest.map(|o| AiRunRes {
            run: o.run,
            suggestions: o.suggestions,
        }),
    }))
}

#[utoipa::path(
    post,
    path = "/encounters/{id}/notes",
    request_body = CreateNoteReq,
    responses(
        (status = 200, description = "Note created", body = Note),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Author a note against an encounter.
#[axum::debug_handler]
async fn create_note(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<uuid::Uuid>,
    Json(req): Json<CreateNoteReq>,
) -> Result<Json<Note>, HandlerError> {
    let kind = non_empty(&req.kind, "kind cannot be empty")?;
    let title = non_empty(&req.title, "title cannot be empty")?;

    state
        .notes
        .create(id, kind, title, req.content, req.occurred_at)
        .await
        .map(Json)
        .map_err(|e| map_core_error("Create note error", e))
}

#[utoipa::path(
    put,
    path = "/encounters/{id}/notes/{note_id}",
    request_body = UpdateNoteReq,
    responses(
        (status = 200, description = "Note updated", body = Note),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Edit the title and content of an existing note.
#[axum::debug_handler]
async fn update_note(
    State(state): State<AppState>,
    AxumPath((id, note_id)): AxumPath<(uuid::Uuid, uuid::Uuid)>,
    Json(req): Json<UpdateNoteReq>,
) -> Result<Json<Note>, HandlerError> {
    let title = non_empty(&req.title, "title cannot be empty")?;

    state
        .notes
        .update(id, note_id, title, req.content)
        .await
        .map(Json)
        .map_err(|e| map_core_error("Update note error", e))
}

#[utoipa::path(
    post,
    path = "/encounters/{id}/orders",
    request_body = PlaceOrderReq,
    responses(
        (status = 200, description = "Order placed; null when the text was blank", body = Order),
        (status = 500, description = "Internal server error")
    )
)]
/// Place an order parsed from a free-text line.
///
/// Blank text creates nothing and the response body is `null`.
#[axum::debug_handler]
async fn place_order(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<uuid::Uuid>,
    Json(req): Json<PlaceOrderReq>,
) -> Result<Json<Option<Order>>, HandlerError> {
    state
        .orders
        .place_from_text(id, &req.text)
        .await
        .map(Json)
        .map_err(|e| map_core_error("Place order error", e))
}

#[utoipa::path(
    post,
    path = "/encounters/{id}/observations",
    request_body = RecordObservationReq,
    responses(
        (status = 200, description = "Result recorded", body = Observation),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Record a result against an encounter.
#[axum::debug_handler]
async fn record_observation(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<uuid::Uuid>,
    Json(req): Json<RecordObservationReq>,
) -> Result<Json<Observation>, HandlerError> {
    let category = non_empty(&req.category, "category cannot be empty")?;
    let name = non_empty(&req.name, "name cannot be empty")?;
    let value = non_empty(&req.value, "value cannot be empty")?;

    state
        .observations
        .record(id, category, name, value, req.unit, req.flag)
        .await
        .map(Json)
        .map_err(|e| map_core_error("Record observation error", e))
}

#[utoipa::path(
    post,
    path = "/encounters/{id}/ddx",
    request_body = AddDdxReq,
    responses(
        (status = 200, description = "Differential entry added", body = DdxEntry),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Add a clinician-authored entry to the differential.
#[axum::debug_handler]
async fn add_ddx(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<uuid::Uuid>,
    Json(req): Json<AddDdxReq>,
) -> Result<Json<DdxEntry>, HandlerError> {
    let name = non_empty(&req.name, "name cannot be empty")?;
    let probability = req
        .probability
        .map(Probability::new)
        .transpose()
        .map_err(|e| {
            tracing::warn!("Add ddx error: {e}");
            (StatusCode::BAD_REQUEST, "probability must be within 0.0..=1.0")
        })?;

    state
        .ddx
        .add(id, name, probability, req.reason)
        .await
        .map(Json)
        .map_err(|e| map_core_error("Add ddx error", e))
}

#[utoipa::path(
    post,
    path = "/encounters/{id}/ai/run",
    responses(
        (status = 200, description = "Assistant run persisted", body = AiRunRes),
        (status = 502, description = "Assistant call failed"),
        (status = 500, description = "Internal server error")
    )
)]
/// Run the AI assistant over the encounter's current data.
///
/// A failed assistant call persists nothing and surfaces as 502.
#[axum::debug_handler]
async fn run_assistant(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<uuid::Uuid>,
) -> Result<Json<AiRunRes>, HandlerError> {
    let data = state
        .encounters
        .load_data(id)
        .await
        .map_err(|e| map_core_error("Run assistant error", e))?;
    let context = AssessmentContext::from_loaded(&data);

    match state.assistant.run_assessment(id, &context).await {
        Ok(outcome) => Ok(Json(AiRunRes {
            run: outcome.run,
            suggestions: outcome.suggestions,
        })),
        Err(
            e @ (WorkstationError::AiRequest(_)
            | WorkstationError::AiStatus { .. }
            | WorkstationError::AiMalformed(_)),
        ) => {
            tracing::error!("Run assistant error: {e}");
            Err((StatusCode::BAD_GATEWAY, "Assistant call failed"))
        }
        Err(e) => Err(map_core_error("Run assistant error", e)),
    }
}

#[utoipa::path(
    get,
    path = "/encounters/{id}/ai/latest",
    responses(
        (status = 200, description = "Most recent run, null when none exists", body = AiRunRes),
        (status = 500, description = "Internal server error")
    )
)]
/// Fetch the most recent assistant run and its suggestions.
#[axum::debug_handler]
async fn latest_assistant_run(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<uuid::Uuid>,
) -> Result<Json<Option<AiRunRes>>, HandlerError> {
    state
        .assistant
        .latest(id)
        .await
        .map(|latest| {
            Json(latest.map(|o| AiRunRes {
                run: o.run,
                suggestions: o.suggestions,
            }))
        })
        .map_err(|e| map_core_error("Latest assistant run error", e))
}

#[utoipa::path(
    post,
    path = "/encounters/{id}/ai/apply-orders",
    request_body = ApplySuggestionsReq,
    responses(
        (status = 200, description = "Orders created from the selected suggestions", body = [Order]),
        (status = 500, description = "Internal server error")
    )
)]
/// Apply a selection of order-type AI suggestions.
///
/// Diagnosis-type selections are ignored; an empty effective selection is a
/// no-op returning an empty array.
#[axum::debug_handler]
async fn apply_order_suggestions(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<uuid::Uuid>,
    Json(req): Json<ApplySuggestionsReq>,
) -> Result<Json<Vec<Order>>, HandlerError> {
    let suggestions = state
        .assistant
        .latest(id)
        .await
        .map_err(|e| map_core_error("Apply suggestions error", e))?
        .map(|o| o.suggestions)
        .unwrap_or_default();

    let selected: HashSet<uuid::Uuid> = req.suggestion_ids.into_iter().collect();

    state
        .assistant
        .apply_order_suggestions(id, &suggestions, &selected)
        .await
        .map(Json)
        .map_err(|e| map_core_error("Apply suggestions error", e))
}

#[utoipa::path(
    get,
    path = "/encounters/{id}/events",
    responses(
        (status = 200, description = "Audit trail, newest first", body = [PatientEvent]),
        (status = 500, description = "Internal server error")
    )
)]
/// Read the encounter's audit trail.
#[axum::debug_handler]
async fn list_events(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<uuid::Uuid>,
) -> Result<Json<Vec<PatientEvent>>, HandlerError> {
    state
        .audit
        .list(id)
        .await
        .map(Json)
        .map_err(|e| map_core_error("List events error", e))
}
