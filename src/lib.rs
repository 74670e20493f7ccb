//! # GamesDB Cover Engine
//!
//! Cover art and background importer for game libraries:
//! - GOG GamesDB metadata lookups keyed by platform and external release id
//! - One fire-and-forget background task per game, bounded worker pool
//! - Pluggable artwork storage (bundled filesystem store with cover resizing)
//! - Batch and interactive completion reporting
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gamesdb_cover_engine::{
//!     BatchProgress, DiskArtworkStore, GameRecord, GamesDbProvider, ImportEngine, ImportMode,
//! };
//!
//! struct Entry {
//!     source: String,
//!     game_id: String,
//! }
//!
//! impl GameRecord for Entry {
//!     fn source(&self) -> &str { &self.source }
//!     fn game_id(&self) -> &str { &self.game_id }
//!     fn set_loading(&self, _delta: i32) {}
//!     fn save(&self) {}
//!     fn update(&self) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = Arc::new(GamesDbProvider::new());
//!     let store = Arc::new(DiskArtworkStore::new("./artwork")?);
//!     let progress = Arc::new(BatchProgress::new(1));
//!
//!     let engine = ImportEngine::new(provider, store, ImportMode::Batch(progress.clone()));
//!     engine.submit(vec![Arc::new(Entry {
//!         source: "steam".to_string(),
//!         game_id: "steam_730".to_string(),
//!     })]);
//!
//!     progress.wait_idle().await;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod engine;
pub mod error;
pub mod providers;
pub mod store;

// Re-export primary types
pub use crate::core::{gamesdb_platform, title_id, GameRecord, ImportOutcome};
pub use crate::engine::{
    BatchImporter, BatchProgress, DialogHost, ErrorChoice, ImportEngine, ImportMode,
    MAX_CONCURRENT_IMPORTS,
};
pub use crate::error::{ImportError, Result};
pub use crate::providers::{GamesDbProvider, ReleaseArt, ReleaseArtProvider, UrlTemplate};
pub use crate::store::{ArtworkStore, DiskArtworkStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
