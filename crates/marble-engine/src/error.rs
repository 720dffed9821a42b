use thiserror::Error;

/// Failure reading or writing the durable storage slot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to replace storage file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Errors surfaced by the canvas engine.
///
/// Unknown canvas, node, and connection ids are not errors: the mutators
/// treat them as no-ops.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The import payload was not a valid canvas export.
    #[error("failed to parse canvas import: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to serialize canvas state: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
