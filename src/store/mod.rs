pub mod disk;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub use disk::DiskArtworkStore;

/// Trait for artwork persistence backends
///
/// Covers go through `resize_cover` before `save_cover`; backgrounds are
/// saved as-is. Implementations own format and layout decisions.
#[async_trait]
pub trait ArtworkStore: Send + Sync {
    /// Scale a downloaded cover to the library's cover size, returning the
    /// path of the resized image
    async fn resize_cover(&self, source: &Path) -> Result<PathBuf>;

    /// Store a cover image for a game
    async fn save_cover(&self, game_id: &str, image: &Path) -> Result<()>;

    /// Store a background image for a game
    async fn save_background(&self, game_id: &str, image: &Path) -> Result<()>;
}
