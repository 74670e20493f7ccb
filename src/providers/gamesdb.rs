use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{ImportError, Result};
use crate::providers::{ReleaseArt, ReleaseArtProvider};

/// Production GamesDB endpoint
pub const GAMESDB_BASE_URL: &str = "https://gamesdb.gog.com";

/// GOG GamesDB provider
pub struct GamesDbProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ExternalReleaseResponse {
    #[serde(default)]
    game: Option<ReleaseArt>,
}

impl GamesDbProvider {
    /// Create a provider against the production service
    pub fn new() -> Self {
        Self::with_base_url(GAMESDB_BASE_URL)
    }

    /// Create a provider against a custom endpoint (used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Lookup URL for one external release
    pub fn release_url(&self, platform: &str, title_id: &str) -> String {
        format!(
            "{}/platforms/{}/external_releases/{}",
            self.base_url,
            platform,
            urlencoding::encode(title_id)
        )
    }
}

impl Default for GamesDbProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReleaseArtProvider for GamesDbProvider {
    async fn release_art(&self, platform: &str, title_id: &str) -> Result<Option<ReleaseArt>> {
        let url = self.release_url(platform, title_id);

        let response = self.client.get(&url).send().await?;
        tracing::debug!("GamesDB {} -> {}", url, response.status());

        // Unknown releases come back as 404; that is "no metadata", not a fault
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(ImportError::Status {
                status: response.status(),
            });
        }

        let body: ExternalReleaseResponse = response.json().await?;
        Ok(body.game)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ImportError::Status {
                status: response.status(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn name(&self) -> &str {
        "gamesdb"
    }

    async fn is_available(&self) -> bool {
        // Probe a release that is known to the service (CS2 - 730)
        matches!(self.release_art("steam", "730").await, Ok(Some(_)))
    }
}
