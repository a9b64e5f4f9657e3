//! Local draft persistence for the standalone prototype mode.
//!
//! When the workstation runs without a live store connection, draft notes and
//! draft orders are kept in two JSON files and rehydrated on load. The
//! scratchpad is deliberately forgiving: a missing or corrupt file degrades
//! to an empty draft list rather than an error, because losing a draft must
//! never stop the application from starting.

use crate::constants::{SCRATCHPAD_NOTES_FILE, SCRATCHPAD_ORDERS_FILE};
use crate::error::{WorkstationError, WsResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A note draft not yet persisted to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftNote {
    pub kind: String,
    pub title: String,
    pub content: String,
}

/// An order line draft not yet parsed and placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub text: String,
}

/// File-backed draft storage.
#[derive(Debug, Clone)]
pub struct Scratchpad {
    dir: PathBuf,
}

impl Scratchpad {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Rehydrates draft notes, returning an empty list if the file is
    /// missing or unreadable.
    pub fn load_notes(&self) -> Vec<DraftNote> {
        self.load(SCRATCHPAD_NOTES_FILE)
    }

    /// Persists the full draft note list, replacing the previous contents.
    pub fn save_notes(&self, notes: &[DraftNote]) -> WsResult<()> {
        self.save(SCRATCHPAD_NOTES_FILE, notes)
    }

    /// Rehydrates draft orders, returning an empty list if the file is
    /// missing or unreadable.
    pub fn load_orders(&self) -> Vec<DraftOrder> {
        self.load(SCRATCHPAD_ORDERS_FILE)
    }

    /// Persists the full draft order list, replacing the previous contents.
    pub fn save_orders(&self, orders: &[DraftOrder]) -> WsResult<()> {
        self.save(SCRATCHPAD_ORDERS_FILE, orders)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn load<T: DeserializeOwned>(&self, file: &str) -> Vec<T> {
        let path = self.path(file);
        if !path.exists() {
            return Vec::new();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("discarding corrupt scratchpad file {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!("failed to read scratchpad file {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    fn save<T: Serialize>(&self, file: &str, items: &[T]) -> WsResult<()> {
        fs::create_dir_all(&self.dir).map_err(WorkstationError::ScratchpadWrite)?;

        let json =
            serde_json::to_string_pretty(items).map_err(|e| WorkstationError::Serialization {
                what: "scratchpad drafts",
                source: e,
            })?;
        fs::write(self.path(file), json).map_err(WorkstationError::ScratchpadWrite)?;
        Ok(())
    }
}

/// Convenience accessor for the scratchpad directory check used by binaries.
pub fn scratchpad_at(dir: Option<&Path>) -> Option<Scratchpad> {
    dir.map(Scratchpad::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_notes() -> Vec<DraftNote> {
        vec![
            DraftNote {
                kind: "progress".into(),
                title: "Reassessment".into(),
                content: "Pain improving after analgesia".into(),
            },
            DraftNote {
                kind: "triage".into(),
                title: "Arrival".into(),
                content: "".into(),
            },
        ]
    }

    #[test]
    fn saves_and_rehydrates_notes() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pad = Scratchpad::new(temp_dir.path());

        let notes = sample_notes();
        pad.save_notes(&notes).expect("save should succeed");

        let loaded = pad.load_notes();
        assert_eq!(loaded, notes, "rehydrated notes should match saved drafts");
    }

    #[test]
    fn saves_and_rehydrates_orders_independently_of_notes() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pad = Scratchpad::new(temp_dir.path());

        pad.save_notes(&sample_notes()).expect("save should succeed");
        pad.save_orders(&[DraftOrder {
            text: "CBC with differential".into(),
        }])
        .expect("save should succeed");

        assert_eq!(pad.load_orders().len(), 1);
        assert_eq!(pad.load_notes().len(), 2, "order save must not clobber notes");
    }

    #[test]
    fn missing_files_load_as_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pad = Scratchpad::new(temp_dir.path().join("never-created"));

        assert!(pad.load_notes().is_empty());
        assert!(pad.load_orders().is_empty());
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pad = Scratchpad::new(temp_dir.path());

        std::fs::write(
            temp_dir.path().join(SCRATCHPAD_NOTES_FILE),
            "not json at all {{{",
        )
        .expect("should write corrupt file");

        assert!(pad.load_notes().is_empty(), "corrupt drafts should be discarded");
    }

    #[test]
    fn save_replaces_previous_contents() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pad = Scratchpad::new(temp_dir.path());

        pad.save_orders(&[
            DraftOrder { text: "CBC".into() },
            DraftOrder { text: "BMP".into() },
        ])
        .expect("save should succeed");
        pad.save_orders(&[DraftOrder { text: "TROP".into() }])
            .expect("save should succeed");

        let loaded = pad.load_orders();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text, "TROP");
    }
}
