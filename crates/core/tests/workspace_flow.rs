//! End-to-end workspace flows against an in-process stub store.
//!
//! The stub speaks just enough of the store's HTTP dialect (equality filters,
//! newest-first ordering, `return=representation` on writes) to exercise the
//! real client, services and workspace orchestration without a database.

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use edw_core::records::{DdxSource, SuggestionKind};
use edw_core::{CoreConfig, NonEmptyText, Probability, Sex, Workspace, WorkstationError};

#[derive(Clone, Default)]
struct StubState {
    tables: Arc<Mutex<HashMap<String, Vec<serde_json::Value>>>>,
    fail_inserts: Arc<Mutex<HashSet<String>>>,
    ai_should_fail: Arc<Mutex<bool>>,
    seq: Arc<Mutex<i64>>,
}

impl StubState {
    fn rows(&self, table: &str) -> Vec<serde_json::Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn fail_inserts_into(&self, table: &str) {
        self.fail_inserts.lock().unwrap().insert(table.to_string());
    }

    fn set_ai_failing(&self, failing: bool) {
        *self.ai_should_fail.lock().unwrap() = failing;
    }

    fn next_timestamp(&self) -> String {
        let mut seq = self.seq.lock().unwrap();
        *seq += 1;
        chrono::DateTime::from_timestamp(1_700_000_000 + *seq, 0)
            .unwrap()
            .to_rfc3339()
    }
}

fn parse_filters(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| *key != "order")
        .filter_map(|(key, value)| {
            value
                .strip_prefix("eq.")
                .map(|v| (key.to_string(), v.to_string()))
        })
        .collect()
}

fn matches_filters(row: &serde_json::Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(column, expected)| {
        row.get(column)
            .and_then(|v| v.as_str())
            .map(|v| v == expected)
            .unwrap_or(false)
    })
}

async fn select_rows(
    State(state): State<StubState>,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
) -> Json<Vec<serde_json::Value>> {
    let filters = parse_filters(query.as_deref().unwrap_or(""));
    let mut rows: Vec<serde_json::Value> = state
        .rows(&table)
        .into_iter()
        .filter(|row| matches_filters(row, &filters))
        .collect();

    // Newest first, as the real store orders by created_at descending.
    rows.sort_by(|a, b| {
        let a = a["created_at"].as_str().unwrap_or("");
        let b = b["created_at"].as_str().unwrap_or("");
        b.cmp(a)
    });

    Json(rows)
}

async fn insert_rows(
    State(state): State<StubState>,
    Path(table): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Vec<serde_json::Value>>, StatusCode> {
    if state.fail_inserts.lock().unwrap().contains(&table) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let incoming = match body {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };

    let mut created = Vec::new();
    for mut row in incoming {
        let obj = row.as_object_mut().ok_or(StatusCode::BAD_REQUEST)?;
        let ts = state.next_timestamp();
        obj.insert("id".into(), serde_json::json!(uuid::Uuid::new_v4()));
        obj.insert("created_at".into(), serde_json::json!(ts));
        obj.insert("updated_at".into(), serde_json::json!(ts));
        created.push(row);
    }

    state
        .tables
        .lock()
        .unwrap()
        .entry(table)
        .or_default()
        .extend(created.clone());

    Ok(Json(created))
}

async fn patch_rows(
    State(state): State<StubState>,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Vec<serde_json::Value>>, StatusCode> {
    let filters = parse_filters(query.as_deref().unwrap_or(""));
    let patch = body.as_object().ok_or(StatusCode::BAD_REQUEST)?.clone();
    let ts = state.next_timestamp();

    let mut tables = state.tables.lock().unwrap();
    let rows = tables.entry(table).or_default();
    let mut updated = Vec::new();
    for row in rows.iter_mut() {
        if matches_filters(row, &filters) {
            let obj = row.as_object_mut().ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
            for (key, value) in &patch {
                obj.insert(key.clone(), value.clone());
            }
            obj.insert("updated_at".into(), serde_json::json!(ts));
            updated.push(row.clone());
        }
    }

    Ok(Json(updated))
}

async fn ai_assess(State(state): State<StubState>) -> Result<Json<serde_json::Value>, StatusCode> {
    if *state.ai_should_fail.lock().unwrap() {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    Ok(Json(serde_json::json!({
        "diagnoses": [
            {"name": "Sepsis", "prob": 0.42, "reason": "fever, tachycardia, hypotension"},
            {"name": "Pyelonephritis"}
        ],
        "recommendations": [
            {"code": "LAC01", "name": "Serum lactate", "reason": "sepsis workup"},
            {"name": "Blood cultures x2"}
        ]
    })))
}

async fn spawn_stub() -> (StubState, CoreConfig) {
    let state = StubState::default();

    let app = Router::new()
        .route("/assess", post(ai_assess))
        .route(
            "/:table",
            get(select_rows).post(insert_rows).patch(patch_rows),
        )
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("stub should bind");
    let addr = listener.local_addr().expect("stub should have an address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub should serve");
    });

    let cfg = CoreConfig::new(
        format!("http://{addr}"),
        "test-key".into(),
        format!("http://{addr}/assess"),
        "hosted-ai".into(),
        "triage-1".into(),
        None,
    )
    .expect("config should build");

    (state, cfg)
}

fn text(s: &str) -> NonEmptyText {
    NonEmptyText::new(s).expect("test input should be non-empty")
}

/// Creates a patient and an encounter and selects both.
async fn seed_selected_encounter(ws: &mut Workspace) {
    let patient = ws
        .create_patient(text("Avery Quinn"), text("MRN-1001"), Sex::Female)
        .await
        .expect("create patient should succeed");
    ws.select_patient(patient).await.expect("select patient should succeed");
    ws.create_encounter(text("Resus 2"), text("active"))
        .await
        .expect("create encounter should succeed");
}

#[tokio::test]
async fn selecting_a_patient_clears_previous_encounter_state() {
    let (_state, cfg) = spawn_stub().await;
    let mut ws = Workspace::new(&cfg).expect("workspace should build");

    seed_selected_encounter(&mut ws).await;
    ws.create_note(text("triage"), text("Arrival"), "Fever and rigors".into(), None)
        .await
        .expect("create note should succeed");
    assert!(ws.state().encounter.is_some());
    assert_eq!(ws.state().data.notes.len(), 1);

    let other = ws
        .create_patient(text("Sam Okafor"), text("MRN-1002"), Sex::Male)
        .await
        .expect("create patient should succeed");
    ws.select_patient(other).await.expect("select patient should succeed");

    assert!(
        ws.state().encounter.is_none(),
        "selecting a patient must clear the previous encounter"
    );
    assert!(ws.state().data.notes.is_empty(), "dependent views must be cleared");
    assert!(ws.state().data.orders.is_empty());
    assert!(ws.state().latest_ai.is_none());
    assert!(
        ws.state().encounters.is_empty(),
        "the new patient has no encounters yet"
    );
}

#[tokio::test]
async fn mutations_write_through_and_reload() {
    let (state, cfg) = spawn_stub().await;
    let mut ws = Workspace::new(&cfg).expect("workspace should build");
    seed_selected_encounter(&mut ws).await;

    let note = ws
        .create_note(text("triage"), text("Arrival"), "RLQ pain, 6h".into(), None)
        .await
        .expect("create note should succeed");
    assert_eq!(ws.state().data.notes.len(), 1);

    ws.update_note(note.id, text("Arrival (amended)"), "RLQ pain, 8h".into())
        .await
        .expect("update note should succeed");
    assert_eq!(ws.state().data.notes[0].title, "Arrival (amended)");

    let placed = ws
        .place_order("IV001 N/S 500ml")
        .await
        .expect("place order should succeed")
        .expect("non-blank text should create an order");
    assert_eq!(placed.code.as_deref(), Some("IV001"));
    assert_eq!(placed.name, "N/S 500ml");
    assert_eq!(placed.status, "sent");

    let blank = ws.place_order("   ").await.expect("blank order should not error");
    assert!(blank.is_none(), "blank text must not create an order");
    assert_eq!(state.rows("orders").len(), 1, "store must hold exactly one order");

    ws.record_observation(text("lab"), text("WBC"), text("17.2"), Some("10^9/L".into()), Some("H".into()))
        .await
        .expect("record observation should succeed");
    assert_eq!(ws.state().data.observations.len(), 1);

    ws.add_ddx(
        text("Appendicitis"),
        Some(Probability::new(0.7).unwrap()),
        Some("classic migration of pain".into()),
    )
    .await
    .expect("add ddx should succeed");
    assert_eq!(ws.state().data.ddx.len(), 1);
    assert_eq!(ws.state().data.ddx[0].source, DdxSource::Human);

    // Every mutation above should have left an audit event.
    let events = ws.events().await.expect("events should load");
    assert!(events.len() >= 5, "expected encounter/note/order/observation/ddx events");
}

#[tokio::test]
async fn assistant_round_trip_persists_run_suggestions_and_ddx() {
    let (state, cfg) = spawn_stub().await;
    let mut ws = Workspace::new(&cfg).expect("workspace should build");
    seed_selected_encounter(&mut ws).await;

    ws.create_note(text("triage"), text("Arrival"), "Fever, flank pain".into(), None)
        .await
        .expect("create note should succeed");

    let outcome = ws.run_assistant().await.expect("assistant run should succeed");

    assert_eq!(outcome.run.provider, "hosted-ai");
    assert_eq!(outcome.run.model, "triage-1");
    assert_eq!(outcome.suggestions.len(), 4, "2 diagnoses + 2 recommendations");

    assert_eq!(state.rows("ai_runs").len(), 1);
    assert_eq!(state.rows("ai_suggestions").len(), 4);

    let latest = ws.state().latest_ai.as_ref().expect("latest AI state should be loaded");
    assert_eq!(latest.run.id, outcome.run.id);
    assert_eq!(latest.suggestions.len(), 4);

    let ai_ddx: Vec<_> = ws
        .state()
        .data
        .ddx
        .iter()
        .filter(|d| d.source == DdxSource::Ai)
        .collect();
    assert_eq!(ai_ddx.len(), 2, "both proposed diagnoses should join the differential");
    assert!(ai_ddx.iter().any(|d| d.name == "Sepsis" && d.probability == Some(0.42)));
}

#[tokio::test]
async fn failed_assistant_call_persists_nothing_and_leaves_state() {
    let (state, cfg) = spawn_stub().await;
    let mut ws = Workspace::new(&cfg).expect("workspace should build");
    seed_selected_encounter(&mut ws).await;

    ws.create_note(text("triage"), text("Arrival"), "Fever".into(), None)
        .await
        .expect("create note should succeed");
    let notes_before = ws.state().data.notes.len();

    state.set_ai_failing(true);
    let err = ws.run_assistant().await.expect_err("assistant run should fail");
    assert!(
        matches!(err, WorkstationError::AiStatus { status: 500, .. }),
        "unexpected error: {err:?}"
    );

    assert!(state.rows("ai_runs").is_empty(), "no run row on failure");
    assert!(state.rows("ai_suggestions").is_empty(), "no suggestions on failure");
    assert_eq!(ws.state().data.notes.len(), notes_before, "workspace state unchanged");
    assert!(ws.state().latest_ai.is_none());
    assert!(
        state
            .rows("ddx_entries")
            .iter()
            .all(|row| row["source"] == "human"),
        "no ai ddx rows on failure"
    );
}

#[tokio::test]
async fn applying_zero_order_suggestions_is_a_noop() {
    let (state, cfg) = spawn_stub().await;
    let mut ws = Workspace::new(&cfg).expect("workspace should build");
    seed_selected_encounter(&mut ws).await;

    ws.run_assistant().await.expect("assistant run should succeed");
    let orders_before = state.rows("orders").len();

    // Empty selection.
    let applied = ws
        .apply_order_suggestions(&HashSet::new())
        .await
        .expect("apply should succeed");
    assert!(applied.is_empty());

    // A selection containing only a diagnosis-type suggestion.
    let diagnosis_id = ws
        .state()
        .latest_ai
        .as_ref()
        .unwrap()
        .suggestions
        .iter()
        .find(|s| s.kind == SuggestionKind::Diagnosis)
        .map(|s| s.id)
        .expect("stub assessment includes diagnoses");
    let applied = ws
        .apply_order_suggestions(&HashSet::from([diagnosis_id]))
        .await
        .expect("apply should succeed");
    assert!(applied.is_empty(), "diagnosis selections must be ignored");

    assert_eq!(state.rows("orders").len(), orders_before, "no order inserted");
    let apply_events = state
        .rows("patient_events")
        .iter()
        .filter(|row| row["event"] == "ai_order_applied")
        .count();
    assert_eq!(apply_events, 0, "a no-op apply must not be audited");
}

#[tokio::test]
async fn applying_selected_order_suggestions_creates_sent_orders_with_backlink() {
    let (state, cfg) = spawn_stub().await;
    let mut ws = Workspace::new(&cfg).expect("workspace should build");
    seed_selected_encounter(&mut ws).await;

    ws.run_assistant().await.expect("assistant run should succeed");

    let selected: HashSet<uuid::Uuid> = ws
        .state()
        .latest_ai
        .as_ref()
        .unwrap()
        .suggestions
        .iter()
        .filter(|s| s.kind == SuggestionKind::Order)
        .map(|s| s.id)
        .collect();
    assert_eq!(selected.len(), 2);

    let applied = ws
        .apply_order_suggestions(&selected)
        .await
        .expect("apply should succeed");
    assert_eq!(applied.len(), 2);
    assert!(applied.iter().all(|o| o.status == "sent"));
    assert!(applied.iter().any(|o| o.code.as_deref() == Some("LAC01")));

    // The workspace reloaded and now shows the new orders.
    assert_eq!(ws.state().data.orders.len(), 2);

    // Each application was mirrored into the audit trail with a backlink.
    let events = state.rows("patient_events");
    let apply_events: Vec<_> = events
        .iter()
        .filter(|row| row["event"] == "ai_order_applied")
        .collect();
    assert_eq!(apply_events.len(), 2);
    for event in apply_events {
        assert!(event["payload"]["ai_run_id"].is_string());
        assert!(event["payload"]["suggestion_id"].is_string());
    }
}

#[tokio::test]
async fn audit_failure_never_blocks_the_primary_write() {
    let (state, cfg) = spawn_stub().await;
    let mut ws = Workspace::new(&cfg).expect("workspace should build");
    seed_selected_encounter(&mut ws).await;

    state.fail_inserts_into("patient_events");

    let note = ws
        .create_note(text("progress"), text("Reassessment"), "Improving".into(), None)
        .await
        .expect("note creation must succeed despite audit failure");
    assert_eq!(note.title, "Reassessment");
    assert_eq!(
        state.rows("notes").len(),
        1,
        "the primary write must land even when the audit insert fails"
    );
}

#[tokio::test]
async fn ddx_mirror_failure_is_tolerated_by_the_assistant_run() {
    let (state, cfg) = spawn_stub().await;
    let mut ws = Workspace::new(&cfg).expect("workspace should build");
    seed_selected_encounter(&mut ws).await;

    state.fail_inserts_into("ddx_entries");

    let outcome = ws
        .run_assistant()
        .await
        .expect("run should survive a failed ddx mirror");
    assert_eq!(outcome.suggestions.len(), 4, "suggestions already saved");
    assert_eq!(state.rows("ai_runs").len(), 1);
    assert!(state.rows("ddx_entries").is_empty(), "mirror insert failed");
    assert!(ws.state().latest_ai.is_some(), "AI state still resynchronised");
}
