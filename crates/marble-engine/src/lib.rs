pub mod config;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod session;
pub mod snapshot;

pub use config::EngineConfig;
pub use engine::{CanvasEngine, CanvasSummary, ResolvedConnection};
pub use error::{EngineError, StorageError};
pub use persistence::{FileStorage, MemoryStorage, PersistedState, STORAGE_SLOT, Storage};
pub use session::ActiveSession;
pub use snapshot::{EXPORT_VERSION, ExportedCanvas, ImportedCanvas};
