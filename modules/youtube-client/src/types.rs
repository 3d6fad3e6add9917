use serde::Deserialize;

// --- search.list ---

/// Parameters for a channel keyword search.
#[derive(Debug, Clone)]
pub struct ChannelSearch {
    pub query: String,
    pub max_results: u32,
    /// ISO 3166-1 alpha-2 region, e.g. "KR".
    pub region_code: Option<String>,
    /// ISO 639-1 language, e.g. "ko".
    pub relevance_language: Option<String>,
}

impl ChannelSearch {
    pub fn new(query: impl Into<String>, max_results: u32) -> Self {
        Self {
            query: query.into(),
            max_results,
            region_code: None,
            relevance_language: None,
        }
    }

    pub fn with_region(mut self, region_code: Option<String>) -> Self {
        self.region_code = region_code;
        self
    }

    pub fn with_language(mut self, relevance_language: Option<String>) -> Self {
        self.relevance_language = relevance_language;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub id: ResourceId,
}

/// The `id` object of a search result. Only one of the id fields is set,
/// depending on `kind`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceId {
    pub kind: String,
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
}

// --- channels.list ---

/// Response of `channels.list`. The API omits `items` entirely when none of
/// the requested ids exist.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelItem {
    pub id: String,
    pub snippet: Option<ChannelSnippet>,
    pub statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Channel statistics. Counts are string-encoded integers on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelStatistics {
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
    #[serde(rename = "videoCount")]
    pub video_count: Option<String>,
    #[serde(rename = "hiddenSubscriberCount", default)]
    pub hidden_subscriber_count: bool,
}

// --- errors ---

/// Google API error envelope: `{"error": {"code": 403, "message": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}
