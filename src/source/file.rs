//! Local File Source

use super::{Format, Repository, SnapshotStore};
use crate::error::SourceError;
use crate::value::{Snapshot, Value};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Reads a YAML or JSON document from the local filesystem
#[derive(Debug)]
pub struct FileRepository {
    path: PathBuf,
    format: Format,
    store: SnapshotStore,
}

impl FileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = Format::from_path(&path);
        Self {
            path,
            format,
            store: SnapshotStore::new(),
        }
    }

    /// Override the extension-based format detection
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Repository for FileRepository {
    async fn refresh(&self) -> Result<(), SourceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let snapshot = self.format.parse(&content)?;
        debug!("Loaded {} keys from {}", snapshot.len(), self.path.display());
        self.store.publish(snapshot);
        Ok(())
    }

    fn get_data(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    fn snapshot(&self) -> Option<Arc<Snapshot>> {
        Some(self.store.load())
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
