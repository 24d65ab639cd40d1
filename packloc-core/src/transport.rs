//! File transport seam: directory enumeration and raw JSON fetch.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use crate::error::{PackLocError, Result};

/// Transport used to enumerate candidate files and fetch JSON documents.
///
/// Implementations are expected to be cheap to call repeatedly; caching of
/// directory listings happens above this seam.
#[async_trait]
pub trait FileTransport: Send + Sync {
    /// List the files directly inside `dir`. Non-recursive.
    async fn browse(&self, dir: &str) -> Result<Vec<String>>;

    /// Fetch and parse one JSON document.
    async fn fetch_json(&self, path: &str) -> Result<Value>;

    /// Whether this transport may enumerate directories at all. When `false`
    /// the loader falls back to a previously persisted file list.
    fn can_browse(&self) -> bool {
        true
    }
}

/// Transport rooted at a local directory tree.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    root: PathBuf,
}

impl LocalTransport {
    /// Create a transport serving files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl FileTransport for LocalTransport {
    async fn browse(&self, dir: &str) -> Result<Vec<String>> {
        let full = self.resolve(dir);
        let mut reader = fs::read_dir(&full).await.map_err(|e| PackLocError::Browse {
            dir: dir.to_string(),
            message: e.to_string(),
        })?;

        let mut files = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| PackLocError::Browse {
            dir: dir.to_string(),
            message: e.to_string(),
        })? {
            let is_file = entry
                .file_type()
                .await
                .map(|kind| kind.is_file())
                .unwrap_or(false);
            if is_file {
                files.push(format!(
                    "{}/{}",
                    dir.trim_end_matches('/'),
                    entry.file_name().to_string_lossy()
                ));
            }
        }
        files.sort();
        Ok(files)
    }

    async fn fetch_json(&self, path: &str) -> Result<Value> {
        let raw = fs::read_to_string(self.resolve(path))
            .await
            .map_err(|e| PackLocError::Fetch {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// In-memory transport, for tests and embedded catalogs.
///
/// Tracks how many fetches were issued, which makes single-flight behavior
/// observable.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    files: HashMap<String, Value>,
    browse_denied: bool,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a JSON document at `path`.
    pub fn with_file(mut self, path: impl Into<String>, document: Value) -> Self {
        self.files.insert(path.into(), document);
        self
    }

    /// Deny browse permission; fetches still work.
    pub fn without_browse(mut self) -> Self {
        self.browse_denied = true;
        self
    }

    /// Delay every fetch, so interleaved callers actually overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of fetches issued so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileTransport for MemoryTransport {
    async fn browse(&self, dir: &str) -> Result<Vec<String>> {
        if self.browse_denied {
            return Err(PackLocError::Browse {
                dir: dir.to_string(),
                message: "browse permission denied".to_string(),
            });
        }

        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let mut files: Vec<String> = self
            .files
            .keys()
            .filter(|path| {
                path.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            })
            .cloned()
            .collect();
        files.sort();
        Ok(files)
    }

    async fn fetch_json(&self, path: &str) -> Result<Value> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.files.get(path) {
            Some(document) => Ok(document.clone()),
            None => {
                debug!(path, "memory transport miss");
                Err(PackLocError::Fetch {
                    path: path.to_string(),
                    message: "not found".to_string(),
                })
            }
        }
    }

    fn can_browse(&self) -> bool {
        !self.browse_denied
    }
}
