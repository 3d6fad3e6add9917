use thiserror::Error;
use youtube_client::YouTubeError;

pub type Result<T> = std::result::Result<T, ScoutError>;

#[derive(Debug, Error)]
pub enum ScoutError {
    /// Keyword search for a category failed. Category-fatal.
    #[error("Search failed for category \"{category}\": {source}")]
    UpstreamSearch {
        category: String,
        #[source]
        source: YouTubeError,
    },

    /// Batched detail lookup failed. Category-fatal: no per-item data exists.
    #[error("Detail lookup failed for category \"{category}\" ({requested} ids): {source}")]
    UpstreamDetail {
        category: String,
        requested: usize,
        #[source]
        source: YouTubeError,
    },

    /// A single upstream item could not be turned into a channel record.
    #[error("Malformed channel {channel_id} in category \"{category}\": {reason}")]
    MalformedRecord {
        category: String,
        channel_id: String,
        title: Option<String>,
        reason: String,
    },

    /// Storage-layer fault while writing one record.
    #[error("Failed to store channel {channel_id} ({title}): {message}")]
    Persistence {
        channel_id: String,
        title: String,
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScoutError {
    /// Channel the error is attributable to, if it is a record-level error.
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            ScoutError::MalformedRecord { channel_id, .. }
            | ScoutError::Persistence { channel_id, .. } => Some(channel_id.as_str()),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            ScoutError::MalformedRecord { title, .. } => title.as_deref(),
            ScoutError::Persistence { title, .. } => Some(title.as_str()),
            _ => None,
        }
    }
}
