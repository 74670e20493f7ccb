use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of one per-game import task
///
/// Each task owns its outcome; errors are recorded here instead of on the
/// coordinator, so concurrent lookups cannot clobber each other's reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Source tag of the record
    pub source: String,

    /// External game id of the record
    pub game_id: String,

    /// Whether a cover was downloaded and stored
    #[serde(default)]
    pub cover_saved: bool,

    /// Whether a background was downloaded and stored
    #[serde(default)]
    pub background_saved: bool,

    /// Human-readable error recorded for this task, if any
    #[serde(default)]
    pub error: Option<String>,

    /// Task latency in milliseconds
    #[serde(default)]
    pub latency_ms: f64,

    /// Timestamp when the lookup ran
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl ImportOutcome {
    /// Create an empty outcome for a record
    pub fn new(source: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            game_id: game_id.into(),
            cover_saved: false,
            background_saved: false,
            error: None,
            latency_ms: 0.0,
            fetched_at: Utc::now(),
        }
    }

    /// True when no error was recorded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        match &self.error {
            Some(error) => format!("{}: {}", self.game_id, error),
            None => format!(
                "{}: cover={} background={} ({:.0}ms)",
                self.game_id, self.cover_saved, self.background_saved, self.latency_ms
            ),
        }
    }
}
