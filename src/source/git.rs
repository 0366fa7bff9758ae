//! Git Repository Source
//!
//! Keeps a shallow checkout of one branch in a private temporary directory
//! and reads a single document from it. The `git` executable must be on
//! `PATH`.

use super::{Format, Repository, SnapshotStore};
use crate::error::SourceError;
use crate::value::{Snapshot, Value};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Reads a YAML or JSON document from a file tracked in a git branch
#[derive(Debug)]
pub struct GitRepository {
    remote_url: String,
    branch: String,
    file_path: PathBuf,
    format: Format,
    workdir: TempDir,
    // Serialises clone/fetch/reset against concurrent refreshes
    checkout_lock: Mutex<()>,
    store: SnapshotStore,
}

impl GitRepository {
    /// `file_path` is relative to the repository root
    pub fn new(
        remote_url: impl Into<String>,
        branch: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Result<Self, SourceError> {
        let file_path = file_path.into();
        let format = Format::from_path(&file_path);
        let workdir = tempfile::Builder::new().prefix("remote-config-git-").tempdir()?;

        Ok(Self {
            remote_url: remote_url.into(),
            branch: branch.into(),
            file_path,
            format,
            workdir,
            checkout_lock: Mutex::new(()),
            store: SnapshotStore::new(),
        })
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn checkout_dir(&self) -> PathBuf {
        self.workdir.path().join("checkout")
    }

    /// Clone on first use, fast-forward to the remote branch head afterwards
    async fn sync_checkout(&self) -> Result<PathBuf, SourceError> {
        let _guard = self.checkout_lock.lock().await;
        let checkout = self.checkout_dir();

        if checkout.join(".git").exists() {
            run_git(
                Some(&checkout),
                &["fetch", "--depth", "1", "--", "origin", &self.branch],
            )
            .await?;
            run_git(Some(&checkout), &["reset", "--hard", "FETCH_HEAD"]).await?;
        } else {
            let target = checkout.to_string_lossy().into_owned();
            info!("Cloning {} ({}) into {}", self.remote_url, self.branch, target);
            run_git(
                None,
                &[
                    "clone",
                    "--quiet",
                    "--depth",
                    "1",
                    "--single-branch",
                    "--branch",
                    &self.branch,
                    "--",
                    &self.remote_url,
                    &target,
                ],
            )
            .await?;
        }

        Ok(checkout)
    }
}

async fn run_git(cwd: Option<&Path>, args: &[&str]) -> Result<(), SourceError> {
    let mut command = Command::new("git");
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command.args(args).env("GIT_TERMINAL_PROMPT", "0");

    let output = command.output().await?;
    if output.status.success() {
        Ok(())
    } else {
        Err(SourceError::Git {
            command: args.first().copied().unwrap_or_default().to_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

#[async_trait]
impl Repository for GitRepository {
    async fn refresh(&self) -> Result<(), SourceError> {
        let checkout = self.sync_checkout().await?;
        let content = tokio::fs::read_to_string(checkout.join(&self.file_path)).await?;
        let snapshot = self.format.parse(&content)?;
        debug!(
            "Loaded {} keys from {}@{}:{}",
            snapshot.len(),
            self.remote_url,
            self.branch,
            self.file_path.display()
        );
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
        format!(
            "git:{}@{}:{}",
            self.remote_url,
            self.branch,
            self.file_path.display()
        )
    }
}
