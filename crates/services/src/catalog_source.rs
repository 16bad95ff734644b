use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;

use lesson_core::model::{Catalog, CatalogDocument};

use crate::error::CatalogLoadError;

/// Where the content catalog comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the raw catalog document.
    ///
    /// # Errors
    ///
    /// Returns `CatalogLoadError` on I/O or transport failures.
    async fn fetch(&self) -> Result<String, CatalogLoadError>;
}

/// Parse and validate a catalog document (`{"skills": [...]}`).
///
/// # Errors
///
/// Returns `CatalogLoadError::Parse` for malformed JSON and
/// `CatalogLoadError::Invalid` when the skill tree breaks catalog rules.
pub fn parse_catalog(raw: &str) -> Result<Catalog, CatalogLoadError> {
    let document: CatalogDocument = serde_json::from_str(raw)?;
    Ok(Catalog::try_from(document)?)
}

/// Fetch, parse and validate the catalog from `source`.
///
/// # Errors
///
/// Returns `CatalogLoadError` for any fetch or parse failure.
pub async fn load_catalog(source: &dyn CatalogSource) -> Result<Catalog, CatalogLoadError> {
    let raw = source.fetch().await?;
    let catalog = parse_catalog(&raw)?;
    tracing::info!(
        skills = catalog.skills().len(),
        exercises = catalog.exercise_count(),
        "catalog loaded"
    );
    Ok(catalog)
}

//
// ─── SOURCES ───────────────────────────────────────────────────────────────────
//

/// Reads the catalog from a JSON file.
#[derive(Clone, Debug)]
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn fetch(&self) -> Result<String, CatalogLoadError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogLoadError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Fetches the catalog over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpCatalogSource {
    client: Client,
    url: String,
}

impl HttpCatalogSource {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch(&self) -> Result<String, CatalogLoadError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(CatalogLoadError::HttpStatus(response.status()));
        }

        Ok(response.text().await?)
    }
}

/// Serves a fixed document. Useful for tests and embedded content.
#[derive(Clone, Debug)]
pub struct StaticCatalogSource {
    document: String,
}

impl StaticCatalogSource {
    #[must_use]
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch(&self) -> Result<String, CatalogLoadError> {
        Ok(self.document.clone())
    }
}

/// A catalog location given on the command line or in the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogLocation {
    File(PathBuf),
    Url(String),
}

impl CatalogLocation {
    /// `http://` and `https://` values are URLs; anything else is a path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }

    #[must_use]
    pub fn source(&self) -> Box<dyn CatalogSource> {
        match self {
            Self::File(path) => Box::new(FileCatalogSource::new(path.clone())),
            Self::Url(url) => Box::new(HttpCatalogSource::new(url.clone())),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
