//! Error Types
//!
//! Client lifecycle, typed access and source errors.

use crate::value::ValueKind;
use thiserror::Error;

/// Errors raised while constructing or driving a [`Client`](crate::Client)
#[derive(Debug, Error)]
pub enum ClientError {
    /// The refresh interval cannot be zero
    #[error("refresh interval must be greater than zero")]
    InvalidInterval,

    /// The first, synchronous refresh failed; no client was produced
    #[error("initial refresh of {source_name} failed: {source}")]
    InitialRefresh {
        source_name: String,
        #[source]
        source: SourceError,
    },

    /// The client has been closed
    #[error("client is closed")]
    Closed,

    /// An on-demand refresh failed
    #[error("refresh failed: {0}")]
    Refresh(#[from] SourceError),
}

/// Errors reported alongside the default value by typed accessors
///
/// These are diagnostic: the accompanying value is always usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    #[error("client is closed")]
    Closed,

    #[error("config not found: {key}")]
    NotFound { key: String },

    #[error("config {key} is not {expected} (found {found})")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("config {key} could not be decoded: {message}")]
    Decode { key: String, message: String },

    /// A static accessor was called before any client was constructed
    #[error("no client configured")]
    NoClientConfigured,
}

/// Errors raised by repositories while fetching or parsing a document
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request to {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("failed to parse YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document root is not a mapping with string keys
    #[error("configuration document root must be a mapping")]
    NotAMapping,
}
