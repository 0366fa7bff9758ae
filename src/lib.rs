//! Remote Config Library
//!
//! Typed configuration values sourced from a local file, an HTTP(S) URL or a
//! file in a git repository, kept fresh by a background polling task.
//!
//! ```no_run
//! use remote_config::{Client, FileRepository};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let shutdown = CancellationToken::new();
//! let client = Client::new(
//!     &shutdown,
//!     FileRepository::new("config/app.yaml"),
//!     Duration::from_secs(30),
//! )
//! .await?;
//!
//! let workers = client.get_config_int("workers", 4).into_value();
//! let hosts = client
//!     .get_config_array_of_strings("hosts", vec!["localhost".into()])
//!     .into_value();
//! # let _ = (workers, hosts);
//! client.close();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod global;
pub mod metrics;
pub mod settings;
pub mod shutdown;
pub mod source;
pub mod value;

pub use client::{Client, ClientBuilder, Lookup};
pub use error::{AccessError, ClientError, SourceError};
pub use settings::{Settings, SettingsManager};
pub use shutdown::ShutdownCoordinator;
pub use source::{FileRepository, GitRepository, Repository, UrlRepository};
pub use value::{Snapshot, Value};

/// Result type for settings loading and the binary
pub type Result<T> = anyhow::Result<T>;
