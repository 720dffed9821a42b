//! Engine configuration.

/// Configuration for `CanvasEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Write the storage slot after every persisting operation. When off,
    /// writes are deferred until `flush()`, a canvas switch, or drop.
    /// Default: **true**.
    pub autosave: bool,

    /// Emit exports as two-space-indented JSON. Default: **true**.
    pub pretty_export: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autosave: true,
            pretty_export: true,
        }
    }
}

impl EngineConfig {
    /// Deferred-write configuration: storage is only touched on flush.
    pub fn deferred() -> Self {
        Self {
            autosave: false,
            ..Self::default()
        }
    }
}
