// # Output Store Trait
//
// Defines the interface for the generated configuration's destination.
//
// ## Purpose
//
// The output store is the only state that survives a reconcile pass. Its
// previous content is the baseline for change detection: a pass only writes
// (and notifies) when the freshly rendered text differs byte-for-byte.
//
// ## Implementations
//
// - File-based: `FileOutputStore` (the daemon's default)
// - In-memory: `MemoryOutputStore` (tests, embedding)

use async_trait::async_trait;

/// Trait for output store implementations
///
/// # Responsibilities
///
/// - `read` returns `Ok(None)` when nothing was written yet. Any other
///   failure is returned as an error; the engine treats it as empty
///   previous content.
/// - `write` replaces the whole content. Never append.
/// - Stores hold no business logic: they do not compare, render or notify.
#[async_trait]
pub trait OutputStore: Send + Sync {
    /// Read the previously written configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: The current content
    /// - `Ok(None)`: Nothing written yet
    /// - `Err(Error)`: Storage error
    async fn read(&self) -> Result<Option<String>, crate::Error>;

    /// Replace the stored configuration
    async fn write(&self, content: &str) -> Result<(), crate::Error>;

    /// Human-readable location, used in log lines
    fn location(&self) -> String;
}
