use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use aet_core::model::Pictogram;

use crate::error::PictogramError;

pub const DEFAULT_PICTOGRAM_BASE_URL: &str = "https://api.arasaac.org/v1";
pub const DEFAULT_PICTOGRAM_IMAGE_BASE_URL: &str = "https://static.arasaac.org/pictograms";
pub const DEFAULT_PICTOGRAM_LOCALE: &str = "en";

/// Resolves a keyword to a pictogram.
#[async_trait]
pub trait PictogramSource: Send + Sync {
    /// Best match for `keyword`, or `None` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns `PictogramError` when the lookup itself fails.
    async fn search(&self, keyword: &str) -> Result<Option<Pictogram>, PictogramError>;
}

#[derive(Clone, Debug)]
pub struct PictogramConfig {
    pub base_url: String,
    pub image_base_url: String,
    pub locale: String,
    pub timeout: Duration,
}

impl Default for PictogramConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PICTOGRAM_BASE_URL.into(),
            image_base_url: DEFAULT_PICTOGRAM_IMAGE_BASE_URL.into(),
            locale: DEFAULT_PICTOGRAM_LOCALE.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the ARASAAC pictogram search API.
#[derive(Clone)]
pub struct ArasaacClient {
    client: Client,
    base_url: Url,
    image_base_url: String,
    locale: String,
}

impl ArasaacClient {
    /// # Errors
    ///
    /// Returns `PictogramError` if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: PictogramConfig) -> Result<Self, PictogramError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|_| PictogramError::InvalidBaseUrl(config.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(PictogramError::InvalidBaseUrl(config.base_url));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url,
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            locale: config.locale,
        })
    }

    fn search_url(&self, keyword: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["pictograms", self.locale.as_str(), "search", keyword]);
        }
        url
    }

    fn image_url(&self, id: u64) -> String {
        format!("{}/{id}/{id}_300.png", self.image_base_url)
    }
}

#[async_trait]
impl PictogramSource for ArasaacClient {
    async fn search(&self, keyword: &str) -> Result<Option<Pictogram>, PictogramError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(None);
        }

        let response = self.client.get(self.search_url(keyword)).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(keyword, "no pictogram match");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PictogramError::HttpStatus(status));
        }

        let hits: Vec<SearchHit> = response.json().await?;
        Ok(hits.first().map(|hit| Pictogram {
            id: hit.id,
            image_url: self.image_url(hit.id),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: u64,
}
