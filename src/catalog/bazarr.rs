use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{Client, StatusCode};
use url::Url;

use super::Catalog;
use super::models::{WantedEpisodeDto, WantedItem, WantedMovieDto, WantedResponse};
use crate::app_config::CatalogConfig;
use crate::errors::CatalogError;

const API_KEY_HEADER: &str = "X-API-KEY";

/// Client for the Bazarr HTTP API
#[derive(Debug, Clone)]
pub struct BazarrClient {
    /// Base URL of the Bazarr instance
    base_url: Url,
    api_key: String,
    client: Client,
}

impl BazarrClient {
    /// Create a new client; `base_url` must be an absolute http(s) URL
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("Invalid catalog URL: {}", base_url))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(anyhow!("Catalog URL must use http or https: {}", base_url));
        }
        // Url::join drops the last segment unless the base ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            client,
        })
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::new(
            &config.url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        self.base_url
            .join(path)
            .map_err(|e| CatalogError::Unavailable(format!("Invalid endpoint {}: {}", path, e)))
    }

    async fn get_body(&self, path: &str) -> Result<String, CatalogError> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CatalogError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Catalog API error ({}): {}", status, error_text);
            return Err(CatalogError::Unavailable(format!(
                "{} answered {}: {}",
                url, status, error_text
            )));
        }

        Ok(response.text().await?)
    }
}

/// Split a wanted body into its records; only the envelope has to be valid
fn wanted_records(body: &str) -> Result<Vec<serde_json::Value>, CatalogError> {
    let response: WantedResponse<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
    Ok(response.into_items())
}

/// Decode a wanted-movies body; malformed records are skipped
pub fn parse_wanted_movies(body: &str) -> Result<Vec<WantedItem>, CatalogError> {
    let items = wanted_records(body)?
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<WantedMovieDto>(record) {
            Ok(dto) => Some(WantedItem::from(dto)),
            Err(e) => {
                warn!("Skipping malformed wanted movie: {}", e);
                None
            }
        })
        .collect();
    Ok(items)
}

/// Decode a wanted-episodes body; malformed records are skipped
pub fn parse_wanted_episodes(body: &str) -> Result<Vec<WantedItem>, CatalogError> {
    let items = wanted_records(body)?
        .into_iter()
        .filter_map(|record| {
            let item = serde_json::from_value::<WantedEpisodeDto>(record)
                .map_err(|e| e.to_string())
                .and_then(WantedEpisodeDto::into_item);
            match item {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping malformed wanted episode: {}", e);
                    None
                }
            }
        })
        .collect();
    Ok(items)
}

#[async_trait]
impl Catalog for BazarrClient {
    async fn fetch_wanted_movies(&self) -> Result<Vec<WantedItem>, CatalogError> {
        let body = self.get_body("api/movies/wanted").await?;
        let items = parse_wanted_movies(&body)?;
        debug!("Catalog reports {} wanted movies", items.len());
        Ok(items)
    }

    async fn fetch_wanted_episodes(&self) -> Result<Vec<WantedItem>, CatalogError> {
        let body = self.get_body("api/episodes/wanted").await?;
        let items = parse_wanted_episodes(&body)?;
        debug!("Catalog reports {} wanted episodes", items.len());
        Ok(items)
    }

    async fn test_connection(&self) -> Result<(), CatalogError> {
        let body = self.get_body("api/system/status").await?;
        serde_json::from_str::<serde_json::Value>(&body)
            .map(|_| ())
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))
    }
}
