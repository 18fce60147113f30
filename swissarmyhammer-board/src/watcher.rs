//! File watching for the backing document
//!
//! Writes go through temp-file-and-rename, which replaces the inode, so the
//! watcher watches the parent directory and filters events down to the
//! document's file name. Each relevant event only queues a notification; the
//! session reads the file when it gets to it, so it never acts on text that
//! was already superseded by a later write.

use crate::error::{BoardError, Result};
use crate::session::SessionHandle;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Watches one document file and forwards its content on change
pub struct DocumentWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl DocumentWatcher {
    /// Start watching `path`, feeding changes into `session`
    pub fn start(path: impl Into<PathBuf>, session: SessionHandle) -> Result<Self> {
        let path = path.into();
        let (dir, file_name) = split(&path)?;

        let (tx, mut rx) = mpsc::channel::<Event>(100);
        let mut watcher = RecommendedWatcher::new(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) => {
                    if let Err(e) = tx.blocking_send(event) {
                        tracing::error!("failed to forward document watch event: {}", e);
                    }
                }
                Err(e) => tracing::warn!("document watch error: {}", e),
            },
            notify::Config::default(),
        )
        .map_err(|e| BoardError::Watch {
            message: format!("failed to create watcher: {e}"),
        })?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| BoardError::Watch {
                message: format!("failed to watch {}: {e}", dir.display()),
            })?;
        tracing::info!(path = %path.display(), "watching board document");

        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if is_relevant(&event, &file_name) && !session.external_change() {
                    break;
                }
            }
        });

        Ok(Self {
            path,
            _watcher: watcher,
            task,
        })
    }

    /// The watched document
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DocumentWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn split(path: &Path) -> Result<(PathBuf, OsString)> {
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| BoardError::Watch {
            message: format!("not a file path: {}", path.display()),
        })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}

fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
