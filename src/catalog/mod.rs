//! Static data catalogs (participants and questions).
//!
//! Both catalogs are loaded from the same JSON document:
//! `{ "users": [...], "questions": [...] }`.

mod participants;
mod questions;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

pub use participants::ParticipantCatalog;
pub use questions::{normalize_answer, shuffle, NormalizeOptions, QuestionCatalog};

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while loading a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to load data: {0}")]
    Load(String),

    #[error("Failed to parse data: {0}")]
    Parse(String),
}

/// Where the data document comes from
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the raw JSON document
    async fn fetch(&self) -> CatalogResult<String>;

    /// Human readable location, for logging
    fn describe(&self) -> String;
}

/// Data document served over HTTP
pub struct HttpDataSource {
    url: String,
    client: reqwest::Client,
}

impl HttpDataSource {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self) -> CatalogResult<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CatalogError::Load(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(CatalogError::Load(format!(
                "{} returned status {}",
                self.url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| CatalogError::Load(format!("Failed to read body: {}", e)))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Data document on the local filesystem
pub struct FileDataSource {
    path: PathBuf,
}

impl FileDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for FileDataSource {
    async fn fetch(&self) -> CatalogResult<String> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CatalogError::Load(format!("Cannot read {}: {}", self.path.display(), e))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Pick a data source from a location string (http(s) URL or file path)
pub fn source_for(location: &str) -> Box<dyn DataSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpDataSource::new(location.to_string()))
    } else {
        Box::new(FileDataSource::new(location))
    }
}

fn parse_document<T: DeserializeOwned>(raw: &str) -> CatalogResult<T> {
    serde_json::from_str(raw).map_err(|e| CatalogError::Parse(e.to_string()))
}

/// In-memory document for tests
#[cfg(test)]
pub(crate) struct StaticSource(pub Result<String, String>);

#[cfg(test)]
#[async_trait]
impl DataSource for StaticSource {
    async fn fetch(&self) -> CatalogResult<String> {
        self.0.clone().map_err(CatalogError::Load)
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
