use async_trait::async_trait;
use image::imageops::FilterType;
use image::ImageFormat;
use std::path::{Path, PathBuf};

use crate::error::{ImportError, Result};
use crate::store::ArtworkStore;

/// Library cover size in pixels
pub const COVER_WIDTH: u32 = 200;
pub const COVER_HEIGHT: u32 = 300;

/// Filesystem artwork store
///
/// Writes `covers/{game_id}.jpg` and `backgrounds/{game_id}.jpg` under the
/// data directory. An existing image for the same game is overwritten.
pub struct DiskArtworkStore {
    covers_dir: PathBuf,
    backgrounds_dir: PathBuf,
}

impl DiskArtworkStore {
    /// Create a store rooted at `data_dir`, creating subdirectories as needed
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let covers_dir = data_dir.join("covers");
        let backgrounds_dir = data_dir.join("backgrounds");

        std::fs::create_dir_all(&covers_dir)?;
        std::fs::create_dir_all(&backgrounds_dir)?;

        Ok(Self {
            covers_dir,
            backgrounds_dir,
        })
    }

    /// Path a cover is stored at
    pub fn cover_path(&self, game_id: &str) -> PathBuf {
        self.covers_dir.join(format!("{}.jpg", game_id))
    }

    /// Path a background is stored at
    pub fn background_path(&self, game_id: &str) -> PathBuf {
        self.backgrounds_dir.join(format!("{}.jpg", game_id))
    }
}

#[async_trait]
impl ArtworkStore for DiskArtworkStore {
    async fn resize_cover(&self, source: &Path) -> Result<PathBuf> {
        let path = source.to_path_buf();

        // image decodes/encodes synchronously; keep it off the async workers
        tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            let img = image::open(&path)?;
            let resized = img.resize_to_fill(COVER_WIDTH, COVER_HEIGHT, FilterType::Lanczos3);
            // JPEG has no alpha channel
            resized.to_rgb8().save_with_format(&path, ImageFormat::Jpeg)?;
            Ok(path)
        })
        .await
        .map_err(|e| ImportError::Other(format!("Resize worker failed: {}", e)))?
    }

    async fn save_cover(&self, game_id: &str, image: &Path) -> Result<()> {
        let dest = self.cover_path(game_id);
        tokio::fs::copy(image, &dest).await?;
        tracing::debug!("Saved cover for {} to {}", game_id, dest.display());
        Ok(())
    }

    async fn save_background(&self, game_id: &str, image: &Path) -> Result<()> {
        let dest = self.background_path(game_id);
        tokio::fs::copy(image, &dest).await?;
        tracing::debug!("Saved background for {} to {}", game_id, dest.display());
        Ok(())
    }
}
