//! Free-text clinical notes.

use crate::audit::AuditLog;
use crate::constants::tables;
use crate::error::WsResult;
use crate::records::{ActorKind, EventKind, NewNote, NewPatientEvent, Note, NotePatch};
use crate::store::StoreClient;
use chrono::{DateTime, Utc};
use edw_types::NonEmptyText;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NoteService {
    store: Arc<StoreClient>,
    audit: AuditLog,
}

impl NoteService {
    pub fn new(store: Arc<StoreClient>, audit: AuditLog) -> Self {
        Self { store, audit }
    }

    /// Authors a new note against an encounter.
    ///
    /// `occurred_at` defaults to now when the clinician does not backdate.
    pub async fn create(
        &self,
        encounter_id: Uuid,
        kind: NonEmptyText,
        title: NonEmptyText,
        content: String,
        occurred_at: Option<DateTime<Utc>>,
    ) -> WsResult<Note> {
        let row = NewNote {
            encounter_id,
            kind: kind.into_inner(),
            title: title.into_inner(),
            content,
            occurred_at: occurred_at.unwrap_or_else(Utc::now),
        };
        let note: Note = self.store.insert_one(tables::NOTES, &row).await?;

        self.audit
            .record(
                NewPatientEvent::new(encounter_id, ActorKind::Clinician, EventKind::NoteCreated)
                    .with_entity("note", note.id)
                    .with_payload(serde_json::json!({"kind": note.kind, "title": note.title})),
            )
            .await;

        Ok(note)
    }

    /// Edits the title and content of an existing note.
    ///
    /// Notes are never deleted; editing is the only mutation after creation.
    pub async fn update(
        &self,
        encounter_id: Uuid,
        note_id: Uuid,
        title: NonEmptyText,
        content: String,
    ) -> WsResult<Note> {
        let patch = NotePatch {
            title: title.into_inner(),
            content,
        };
        let note: Note = self.store.update_one(tables::NOTES, note_id, &patch).await?;

        self.audit
            .record(
                NewPatientEvent::new(encounter_id, ActorKind::Clinician, EventKind::NoteUpdated)
                    .with_entity("note", note.id),
            )
            .await;

        Ok(note)
    }

    /// Lists an encounter's notes, newest first.
    pub async fn list(&self, encounter_id: Uuid) -> WsResult<Vec<Note>> {
        self.store
            .select(tables::NOTES, &[("encounter_id", encounter_id.to_string())])
            .await
    }
}
