//! Settings Manager

use super::{Settings, SourceKind};
use crate::client::{Client, ClientBuilder};
use crate::source::{FileRepository, GitRepository, Repository, UrlRepository};
use crate::Result;
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Manages settings loading and validation
pub struct SettingsManager;

impl SettingsManager {
    /// Load settings from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Settings> {
        tracing::info!("Loading settings from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

        settings
            .validate()
            .with_context(|| "Settings validation failed")?;

        tracing::info!("Settings loaded and validated successfully");
        Ok(settings)
    }

    /// Load settings from environment variables on top of the defaults
    pub fn load_from_env() -> Result<Settings> {
        let mut settings = Settings::default();
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load a settings file layered over the environment and the defaults
    ///
    /// Keys present in the file win; anything the file leaves out keeps the
    /// value from `REMOTE_CONFIG_*` variables, then the built-in default.
    pub fn load_layered(path: &Path) -> Result<Settings> {
        let mut base = Settings::default();
        base.apply_env_overrides()?;
        Self::load_from_file_over(path, base)
    }

    /// Load a settings file, taking every key it omits from `base`
    pub fn load_from_file_over(path: &Path, base: Settings) -> Result<Settings> {
        tracing::info!("Loading settings from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let overlay: toml::Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

        let mut merged = match toml::Value::try_from(&base)? {
            toml::Value::Table(table) => table,
            _ => bail!("Settings did not serialize to a table"),
        };
        merge_tables(&mut merged, overlay);

        let settings: Settings = toml::Value::Table(merged)
            .try_into()
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

        settings
            .validate()
            .with_context(|| "Settings validation failed")?;
        Ok(settings)
    }
}

/// Overlay `overlay` onto `base`, recursing into nested tables
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

impl Settings {
    /// Override fields from `REMOTE_CONFIG_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(kind) = std::env::var("REMOTE_CONFIG_SOURCE") {
            self.source.kind = kind
                .parse::<SourceKind>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid REMOTE_CONFIG_SOURCE: {}", kind))?;
        }

        if let Ok(path) = std::env::var("REMOTE_CONFIG_PATH") {
            self.source.path = Some(PathBuf::from(path));
        }

        if let Ok(url) = std::env::var("REMOTE_CONFIG_URL") {
            self.source.url = Some(url);
        }

        if let Ok(branch) = std::env::var("REMOTE_CONFIG_BRANCH") {
            self.source.branch = Some(branch);
        }

        if let Ok(interval) = std::env::var("REMOTE_CONFIG_REFRESH_INTERVAL") {
            self.refresh_interval = humantime::parse_duration(&interval)
                .with_context(|| format!("Invalid REMOTE_CONFIG_REFRESH_INTERVAL: {}", interval))?;
        }

        if let Ok(level) = std::env::var("REMOTE_CONFIG_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval.is_zero() {
            bail!("refresh_interval must be greater than 0");
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            bail!(
                "logging.level must be one of {}",
                VALID_LOG_LEVELS.join(", ")
            );
        }

        match self.source.kind {
            SourceKind::File => {
                if self.source.path.is_none() {
                    bail!("source.path is required for file sources");
                }
            }
            SourceKind::Url => {
                let url = self.source.url.as_deref().unwrap_or_default();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    bail!("source.url must be an http:// or https:// URL for url sources");
                }
                if self.source.timeout.is_zero() {
                    bail!("source.timeout must be greater than 0");
                }
            }
            SourceKind::Git => {
                if self.source.url.as_deref().map_or(true, str::is_empty) {
                    bail!("source.url (the git remote) is required for git sources");
                }
                if self.source.branch.as_deref().map_or(true, str::is_empty) {
                    bail!("source.branch is required for git sources");
                }
                if self.source.path.is_none() {
                    bail!("source.path (inside the repository) is required for git sources");
                }
            }
        }

        Ok(())
    }

    /// Build the repository these settings describe
    pub fn build_repository(&self) -> Result<Arc<dyn Repository>> {
        self.validate()?;

        let source = &self.source;
        let repository: Arc<dyn Repository> = match source.kind {
            SourceKind::File => Arc::new(FileRepository::new(
                source.path.clone().unwrap_or_default(),
            )),
            SourceKind::Url => Arc::new(
                UrlRepository::with_timeout(
                    source.url.clone().unwrap_or_default(),
                    source.timeout,
                )
                .context("Failed to create HTTP client")?,
            ),
            SourceKind::Git => Arc::new(
                GitRepository::new(
                    source.url.clone().unwrap_or_default(),
                    source.branch.clone().unwrap_or_default(),
                    source.path.clone().unwrap_or_default(),
                )
                .context("Failed to prepare git working directory")?,
            ),
        };

        Ok(repository)
    }

    /// Build and start a client for these settings
    pub async fn connect(&self, parent: &CancellationToken) -> Result<Client> {
        let repository = self.build_repository()?;
        let client = ClientBuilder::from_shared(repository)
            .parent(parent.clone())
            .refresh_interval(self.refresh_interval)
            .register_default(self.register_default)
            .build()
            .await?;
        Ok(client)
    }
}
