//! Settings Types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main settings structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(with = "humantime_serde", default = "default_refresh_interval")]
    pub refresh_interval: Duration,
    #[serde(default = "default_true")]
    pub register_default: bool,
    pub source: SourceSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Which repository to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Url,
    Git,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(SourceKind::File),
            "url" => Ok(SourceKind::Url),
            "git" => Ok(SourceKind::Git),
            other => Err(format!("unknown source kind '{}'", other)),
        }
    }
}

/// Source settings
///
/// `path` is the file path for `file` sources and the in-repository path for
/// `git` sources. `url` is the document URL for `url` sources and the remote
/// for `git` sources.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceSettings {
    pub kind: SourceKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub timeout: Duration,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::File,
            path: Some(PathBuf::from("config.yaml")),
            url: None,
            branch: None,
            timeout: default_request_timeout(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            register_default: true,
            source: SourceSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

fn default_refresh_interval() -> Duration {
    crate::client::DEFAULT_REFRESH_INTERVAL
}

fn default_request_timeout() -> Duration {
    crate::source::url::DEFAULT_REQUEST_TIMEOUT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
