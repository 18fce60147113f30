//! Document I/O collaborators
//!
//! The engine never touches the filesystem directly. It asks a [`DocumentIo`]
//! whether the document exists, reads it, and hands it serialized text to
//! write. Hosts plug in [`FsDocumentIo`]; tests use [`MemoryDocumentIo`].

use crate::error::{BoardError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::fs;

/// Existence check plus read/write pair for the backing document
#[async_trait]
pub trait DocumentIo: Send + Sync {
    /// Whether the document exists yet
    async fn exists(&self) -> bool;

    /// Read the raw document text
    async fn read(&self) -> Result<String>;

    /// Replace the document with `content`
    async fn write(&self, content: &str) -> Result<()>;
}

/// A document stored as a single file on disk
#[derive(Debug, Clone)]
pub struct FsDocumentIo {
    path: PathBuf,
}

impl FsDocumentIo {
    /// Create an I/O handle for the document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentIo for FsDocumentIo {
    async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    async fn read(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.path).await?)
    }

    async fn write(&self, content: &str) -> Result<()> {
        atomic_write(&self.path, content.as_bytes()).await
    }
}

/// Atomic write via temp file and rename
async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    // Temp file lives next to the target so the rename stays on one filesystem
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;
    fs::rename(&temp_path, path).await?;

    Ok(())
}

/// In-memory document, used by tests and embedders without a filesystem
#[derive(Debug, Default)]
pub struct MemoryDocumentIo {
    content: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryDocumentIo {
    /// A document that does not exist yet
    pub fn new() -> Self {
        Self::default()
    }

    /// A document that already holds `content`
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(Some(content.into())),
            ..Self::default()
        }
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current content, if any
    pub fn content(&self) -> Option<String> {
        self.content.lock().ok().and_then(|c| c.clone())
    }

    /// Overwrite the content as an outside editor would, bypassing the write counter
    pub fn replace_externally(&self, content: impl Into<String>) {
        if let Ok(mut slot) = self.content.lock() {
            *slot = Some(content.into());
        }
    }
}

#[async_trait]
impl DocumentIo for MemoryDocumentIo {
    async fn exists(&self) -> bool {
        self.content().is_some()
    }

    async fn read(&self) -> Result<String> {
        self.content().ok_or_else(|| {
            BoardError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "document does not exist",
            ))
        })
    }

    async fn write(&self, content: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BoardError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "document is read-only",
            )));
        }
        let mut slot = self
            .content
            .lock()
            .map_err(|e| BoardError::persist(e.to_string()))?;
        *slot = Some(content.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_roundtrip() {
        let temp = TempDir::new().unwrap();
        let io = FsDocumentIo::new(temp.path().join("nested").join("board.json"));

        assert!(!io.exists().await);
        io.write("{\"columns\": []}\n").await.unwrap();
        assert!(io.exists().await);
        assert_eq!(io.read().await.unwrap(), "{\"columns\": []}\n");
        assert!(!io.path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_fs_read_missing_is_io_error() {
        let temp = TempDir::new().unwrap();
        let io = FsDocumentIo::new(temp.path().join("missing.json"));
        assert!(matches!(io.read().await, Err(BoardError::Io(_))));
    }

    #[tokio::test]
    async fn test_memory_write_failure() {
        let io = MemoryDocumentIo::with_content("old");
        io.set_fail_writes(true);
        assert!(io.write("new").await.is_err());
        assert_eq!(io.content().as_deref(), Some("old"));
        assert_eq!(io.write_count(), 0);

        io.set_fail_writes(false);
        io.write("new").await.unwrap();
        assert_eq!(io.content().as_deref(), Some("new"));
        assert_eq!(io.write_count(), 1);
    }
}
