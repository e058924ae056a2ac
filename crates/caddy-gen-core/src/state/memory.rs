// # Memory Output Store
//
// In-memory implementation of OutputStore.
//
// ## When to Use
//
// - Testing environments
// - Embedding the engine where the caller ships the text elsewhere

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::OutputStore;

/// In-memory output store implementation
///
/// Clones share the same content, so a test can hand one clone to the engine
/// and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutputStore {
    content: Arc<RwLock<Option<String>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryOutputStore {
    /// Create an empty store (reads as "nothing written yet")
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `content`
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Arc::new(RwLock::new(Some(content.into()))),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Current content
    pub async fn content(&self) -> Option<String> {
        self.content.read().await.clone()
    }

    /// Number of writes since creation
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutputStore for MemoryOutputStore {
    async fn read(&self) -> Result<Option<String>, Error> {
        Ok(self.content.read().await.clone())
    }

    async fn write(&self, content: &str) -> Result<(), Error> {
        *self.content.write().await = Some(content.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
