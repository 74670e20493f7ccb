pub mod gamesdb;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use gamesdb::GamesDbProvider;

/// Trait for release artwork metadata providers
#[async_trait]
pub trait ReleaseArtProvider: Send + Sync {
    /// Fetch the artwork templates for one external release
    ///
    /// `Ok(None)` means the service answered but has no metadata for the
    /// release; transport failures and unexpected statuses are errors.
    async fn release_art(&self, platform: &str, title_id: &str) -> Result<Option<ReleaseArt>>;

    /// Download an image by URL, returning the raw bytes
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;

    /// Get provider name
    fn name(&self) -> &str;

    /// Check if provider is available
    async fn is_available(&self) -> bool;
}

/// Optional cover/background templates for one release
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseArt {
    #[serde(default)]
    pub vertical_cover: Option<UrlTemplate>,

    #[serde(default)]
    pub background: Option<UrlTemplate>,
}

impl ReleaseArt {
    /// True when the release carries no artwork at all
    pub fn is_empty(&self) -> bool {
        self.vertical_cover.is_none() && self.background.is_none()
    }
}

/// Image URL template with literal `{formatter}` and `{ext}` tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlTemplate {
    pub url_format: String,
}

impl UrlTemplate {
    /// Resolve the template to a downloadable URL
    ///
    /// The service leaves `{formatter}` for size/style variants (empty picks
    /// the original) and `{ext}` for the image format.
    pub fn resolve(&self) -> String {
        self.url_format.replace("{formatter}", "").replace("{ext}", "jpg")
    }
}
