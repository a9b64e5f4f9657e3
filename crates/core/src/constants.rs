//! Shared constants for the EDW core crate.

/// Table names in the remote relational store.
pub mod tables {
    pub const PATIENTS: &str = "patients";
    pub const ENCOUNTERS: &str = "encounters";
    pub const NOTES: &str = "notes";
    pub const ORDERS: &str = "orders";
    pub const OBSERVATIONS: &str = "observations";
    pub const DDX_ENTRIES: &str = "ddx_entries";
    pub const AI_RUNS: &str = "ai_runs";
    pub const AI_SUGGESTIONS: &str = "ai_suggestions";
    pub const PATIENT_EVENTS: &str = "patient_events";
}

/// Status assigned to every order placed through the workstation.
///
/// Orders are never transitioned in-app; downstream systems own the rest of
/// the lifecycle.
pub const ORDER_STATUS_SENT: &str = "sent";

/// Name used for an order when the free text carries a code but no remainder.
pub const DEFAULT_ORDER_NAME: &str = "General Order";

/// Column used to order every table select, newest first.
pub const CREATED_AT_COLUMN: &str = "created_at";

/// HTTP request timeout applied to both the store and the assistant clients.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Scratchpad file holding draft notes in the standalone prototype mode.
pub const SCRATCHPAD_NOTES_FILE: &str = "draft_notes.json";

/// Scratchpad file holding draft orders in the standalone prototype mode.
pub const SCRATCHPAD_ORDERS_FILE: &str = "draft_orders.json";
