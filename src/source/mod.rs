//! Configuration Sources
//!
//! A [`Repository`] fetches a configuration document and serves lookups from
//! the last successfully parsed snapshot. The client only depends on this
//! trait; the file, URL and git implementations live in the submodules.

pub mod file;
pub mod git;
pub mod url;

pub use file::FileRepository;
pub use git::GitRepository;
pub use url::UrlRepository;

use crate::error::SourceError;
use crate::value::{Snapshot, Value};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Data source backing a [`Client`](crate::Client)
///
/// Implementations must publish snapshots atomically: a `get_data` call
/// running concurrently with `refresh` observes either the complete previous
/// snapshot or the complete new one. A failed refresh must leave the current
/// snapshot untouched. [`SnapshotStore`] provides both guarantees.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Fetch and parse the latest document, replacing the current snapshot
    async fn refresh(&self) -> Result<(), SourceError>;

    /// Look up a top-level key in the current snapshot
    fn get_data(&self, key: &str) -> Option<Value>;

    /// Human-readable name for log output
    fn name(&self) -> String;

    /// Whole current snapshot, if the repository can expose it
    fn snapshot(&self) -> Option<Arc<Snapshot>> {
        None
    }
}

#[async_trait]
impl<R: Repository + ?Sized> Repository for Arc<R> {
    async fn refresh(&self) -> Result<(), SourceError> {
        (**self).refresh().await
    }

    fn get_data(&self, key: &str) -> Option<Value> {
        (**self).get_data(key)
    }

    fn name(&self) -> String {
        (**self).name()
    }

    fn snapshot(&self) -> Option<Arc<Snapshot>> {
        (**self).snapshot()
    }
}

/// Lock-free holder of the current snapshot
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole snapshot
    pub fn publish(&self, snapshot: Snapshot) {
        self.current.store(Arc::new(snapshot));
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.current.load().get(key).cloned()
    }

    /// Current snapshot, shared
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }
}

/// Document encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON, everything else is treated as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }

    /// Parse a document into a snapshot
    ///
    /// An empty document yields an empty snapshot; any other non-mapping
    /// root is rejected.
    pub fn parse(self, content: &str) -> Result<Snapshot, SourceError> {
        if content.trim().is_empty() {
            return Ok(Snapshot::new());
        }

        let root: Value = match self {
            Format::Yaml => serde_yaml::from_str(content)?,
            Format::Json => serde_json::from_str(content)?,
        };

        match root {
            Value::Mapping(map) => Ok(map),
            Value::Null => Ok(Snapshot::new()),
            _ => Err(SourceError::NotAMapping),
        }
    }
}
