//! Persistence adapter: durable round-trip of the canvas list and the
//! active canvas id through a single key-value slot.
//!
//! Only `{ canvases, currentCanvasId }` is stored. The live mirror is
//! rebuilt from the active canvas record on load. A slot that cannot be
//! read or parsed yields an empty state; the error is logged, never
//! returned.

use crate::error::{EngineError, StorageError};
use marble_core::{Canvas, CanvasId};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the storage slot.
pub const STORAGE_SLOT: &str = "marble-storage";

/// A single opaque storage slot. Each call is one scoped access.
pub trait Storage {
    /// Read the slot. `Ok(None)` means nothing has been stored yet.
    fn read(&mut self) -> Result<Option<String>, StorageError>;

    /// Replace the slot contents.
    fn write(&mut self, data: &str) -> Result<(), StorageError>;
}

// ─── In-memory slot ──────────────────────────────────────────────────────

/// Slot held in memory. Used by tests and embedders that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Option<String>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw slot contents, valid or not.
    pub fn with_contents(data: impl Into<String>) -> Self {
        Self {
            slot: Some(data.into()),
            writes: 0,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    /// Number of writes performed since construction.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Storage for MemoryStorage {
    fn read(&mut self) -> Result<Option<String>, StorageError> {
        Ok(self.slot.clone())
    }

    fn write(&mut self, data: &str) -> Result<(), StorageError> {
        self.slot = Some(data.to_string());
        self.writes += 1;
        Ok(())
    }
}

// ─── File slot ───────────────────────────────────────────────────────────

/// Slot backed by a JSON file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/marble-storage.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{STORAGE_SLOT}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn read(&mut self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, data: &str) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path)?;
        Ok(())
    }
}

// ─── Stored record ───────────────────────────────────────────────────────

/// The durable subset of engine state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub canvases: Vec<Canvas>,
    #[serde(default)]
    pub current_canvas_id: Option<CanvasId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedStateRef<'a> {
    canvases: &'a [Canvas],
    current_canvas_id: Option<CanvasId>,
}

/// Read and decode the slot, falling back to an empty state on any failure.
pub fn load_state<S: Storage>(storage: &mut S) -> PersistedState {
    let raw = match storage.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => return PersistedState::default(),
        Err(err) => {
            log::warn!("storage slot `{STORAGE_SLOT}` unreadable, starting empty: {err}");
            return PersistedState::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(state) => state,
        Err(err) => {
            log::warn!("storage slot `{STORAGE_SLOT}` corrupt, starting empty: {err}");
            PersistedState::default()
        }
    }
}

/// Encode and write the durable subset.
pub fn save_state<S: Storage>(
    storage: &mut S,
    canvases: &[Canvas],
    current_canvas_id: Option<CanvasId>,
) -> Result<(), EngineError> {
    let record = PersistedStateRef {
        canvases,
        current_canvas_id,
    };
    let data = serde_json::to_string(&record).map_err(EngineError::Serialize)?;
    storage.write(&data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_slot_loads_default() {
        let mut storage = MemoryStorage::new();
        assert_eq!(load_state(&mut storage), PersistedState::default());
    }

    #[test]
    fn corrupt_slot_loads_default() {
        let mut storage = MemoryStorage::with_contents("{ not json");
        assert_eq!(load_state(&mut storage), PersistedState::default());

        let mut storage = MemoryStorage::with_contents(r#"{"canvases": 42}"#);
        assert_eq!(load_state(&mut storage), PersistedState::default());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let mut storage = MemoryStorage::new();
        let canvas = Canvas::new("Roadmap");
        save_state(&mut storage, std::slice::from_ref(&canvas), Some(canvas.id)).unwrap();

        let raw = storage.contents().unwrap();
        assert!(raw.contains("\"currentCanvasId\""));

        let state = load_state(&mut storage);
        assert_eq!(state.canvases, vec![canvas.clone()]);
        assert_eq!(state.current_canvas_id, Some(canvas.id));
    }
}
