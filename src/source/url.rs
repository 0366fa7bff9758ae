//! Remote URL Source

use super::{Format, Repository, SnapshotStore};
use crate::error::SourceError;
use crate::value::{Snapshot, Value};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Request timeout used when no HTTP client is supplied
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches a YAML or JSON document over HTTP(S) with a GET request
#[derive(Debug)]
pub struct UrlRepository {
    url: String,
    http: reqwest::Client,
    store: SnapshotStore,
}

impl UrlRepository {
    pub fn new(url: impl Into<String>) -> Result<Self, SourceError> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, url))
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, headers)
    pub fn with_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http,
            store: SnapshotStore::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// JSON if the server says so, otherwise fall back to the URL path
    fn detect_format(&self, content_type: Option<&str>) -> Format {
        if let Some(content_type) = content_type {
            if content_type.to_ascii_lowercase().contains("json") {
                return Format::Json;
            }
        }

        let path = self
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        Format::from_path(Path::new(path))
    }
}

#[async_trait]
impl Repository for UrlRepository {
    async fn refresh(&self) -> Result<(), SourceError> {
        let response = self.http.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        let snapshot = self.detect_format(content_type.as_deref()).parse(&body)?;
        debug!("Fetched {} keys from {}", snapshot.len(), self.url);
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
        format!("url:{}", self.url)
    }
}
