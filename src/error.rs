use thiserror::Error;

/// Main error type for the import engine
#[derive(Error, Debug)]
pub enum ImportError {
    /// Source tag with no GamesDB platform mapping
    #[error("Unsupported platform")]
    UnsupportedPlatform(String),

    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Non-success HTTP status from GamesDB
    #[error("GamesDB returned HTTP {status}")]
    Status { status: reqwest::StatusCode },

    /// GamesDB had no usable metadata for a game
    #[error("Unable to get GamesDB data for game {0}")]
    MissingMetadata(String),

    /// Image decode/resize errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<String> for ImportError {
    fn from(s: String) -> Self {
        ImportError::Other(s)
    }
}

impl From<&str> for ImportError {
    fn from(s: &str) -> Self {
        ImportError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ImportError>;
