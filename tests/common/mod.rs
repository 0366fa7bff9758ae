//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use remote_config::source::{Repository, SnapshotStore};
use remote_config::{Snapshot, SourceError, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// When the stub repository should fail its refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    Never,
    /// Only the first (construction-time) refresh fails
    First,
    /// Every refresh after the first fails
    AfterFirst,
}

/// In-memory repository that counts refreshes and publishes a staged
/// snapshot on the next successful refresh
pub struct StubRepository {
    store: SnapshotStore,
    staged: Mutex<Option<Snapshot>>,
    refreshes: AtomicUsize,
    fail_mode: FailMode,
}

impl StubRepository {
    pub fn new(initial: Snapshot) -> Arc<Self> {
        Self::with_fail_mode(initial, FailMode::Never)
    }

    pub fn with_fail_mode(initial: Snapshot, fail_mode: FailMode) -> Arc<Self> {
        Arc::new(Self {
            store: SnapshotStore::new(),
            staged: Mutex::new(Some(initial)),
            refreshes: AtomicUsize::new(0),
            fail_mode,
        })
    }

    /// Snapshot to publish on the next successful refresh
    pub fn stage(&self, snapshot: Snapshot) {
        *self.staged.lock().unwrap() = Some(snapshot);
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Repository for StubRepository {
    async fn refresh(&self) -> Result<(), SourceError> {
        let call = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;

        let fail = match self.fail_mode {
            FailMode::Never => false,
            FailMode::First => call == 1,
            FailMode::AfterFirst => call > 1,
        };
        if fail {
            return Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("stub refresh {} failed", call),
            )));
        }

        if let Some(snapshot) = self.staged.lock().unwrap().take() {
            self.store.publish(snapshot);
        }
        Ok(())
    }

    fn get_data(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    fn name(&self) -> String {
        "stub".to_string()
    }

    fn snapshot(&self) -> Option<Arc<Snapshot>> {
        Some(self.store.load())
    }
}

/// Build a snapshot from a YAML document
pub fn yaml(doc: &str) -> Snapshot {
    serde_yaml::from_str(doc).expect("test fixture must be valid YAML")
}
