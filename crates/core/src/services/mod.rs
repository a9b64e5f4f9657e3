//! Entity services over the remote store.
//!
//! One service per entity, mirroring the one-row-per-entity data model. Each
//! service owns a handle to the store client and the audit log; every
//! mutation writes its row first and then appends a best-effort audit event.

pub mod assistant;
pub mod ddx;
pub mod encounters;
pub mod notes;
pub mod observations;
pub mod orders;
pub mod patients;

pub use assistant::{AiOutcome, AssistantService};
pub use ddx::DdxService;
pub use encounters::{EncounterData, EncounterService};
pub use notes::NoteService;
pub use observations::ObservationService;
pub use orders::{parse_order_text, OrderService, ParsedOrder};
pub use patients::PatientService;
