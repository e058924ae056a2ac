// # File Output Store
//
// File-based implementation of OutputStore.
//
// ## Purpose
//
// Holds the generated Caddyfile snippet that Caddy imports. The file's
// current content is the baseline for change detection, so the daemon keeps
// no other state across restarts.
//
// ## Write Strategy
//
// The file is truncated and rewritten in place. The output is usually a
// single-file bind mount shared with the Caddy container; replacing it with
// a rename would swap the inode and the other container would keep seeing
// the old file.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::OutputStore;

/// File-based output store
///
/// # Example
///
/// ```rust,no_run
/// use caddy_gen_core::state::FileOutputStore;
/// use caddy_gen_core::traits::OutputStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileOutputStore::new("/data/docker-sites.caddy").await?;
///
///     store.write("@caddy-gen-0 host example.com").await?;
///     assert!(store.read().await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileOutputStore {
    path: PathBuf,
}

impl FileOutputStore {
    /// Create a store for `path`
    ///
    /// Parent directories are created if needed. The file itself is only
    /// created by the first write.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::output_store(format!(
                        "Failed to create output directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(Self { path })
    }

    /// Output file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OutputStore for FileOutputStore {
    async fn read(&self) -> Result<Option<String>, Error> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Output file does not exist yet: {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(Error::output_store(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write(&self, content: &str) -> Result<(), Error> {
        // File::create truncates an existing file without replacing its inode
        let mut file = fs::File::create(&self.path).await.map_err(|e| {
            Error::output_store(format!("Failed to open {}: {}", self.path.display(), e))
        })?;

        file.write_all(content.as_bytes()).await.map_err(|e| {
            Error::output_store(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        file.flush().await.map_err(|e| {
            Error::output_store(format!("Failed to flush {}: {}", self.path.display(), e))
        })?;

        tracing::trace!(bytes = content.len(), "Output written: {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
