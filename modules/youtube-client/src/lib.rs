pub mod error;
pub mod types;

pub use error::{Result, YouTubeError};
pub use types::{
    ChannelItem, ChannelListResponse, ChannelSearch, ChannelSnippet, ChannelStatistics,
    ResourceId, SearchItem, SearchListResponse,
};

use std::time::Duration;

use serde::de::DeserializeOwned;
use types::ErrorEnvelope;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Documented cap on the number of ids accepted by one `channels.list` call.
pub const MAX_CHANNEL_IDS_PER_REQUEST: usize = 50;

/// Documented cap on `maxResults` for `search.list`.
pub const MAX_SEARCH_RESULTS: u32 = 50;

pub struct YouTubeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at a different API root (proxies, local fakes).
    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Keyword search restricted to channel results. Returns the raw search
    /// items; callers pick out `id.channelId`.
    pub async fn search_channels(&self, search: &ChannelSearch) -> Result<Vec<SearchItem>> {
        let max_results = search.max_results.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("part", "snippet"),
            ("type", "channel"),
            ("q", search.query.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(ref region) = search.region_code {
            params.push(("regionCode", region.as_str()));
        }
        if let Some(ref language) = search.relevance_language {
            params.push(("relevanceLanguage", language.as_str()));
        }

        tracing::debug!(query = %search.query, max_results = search.max_results, "YouTube search");
        let resp: SearchListResponse = self.get("search", &params).await?;
        Ok(resp.items)
    }

    /// Batched `channels.list` lookup for snippet and statistics.
    /// The caller keeps `ids` within [`MAX_CHANNEL_IDS_PER_REQUEST`].
    pub async fn list_channels(&self, ids: &[String]) -> Result<Vec<ChannelItem>> {
        let joined = ids.join(",");
        let params = [("part", "snippet,statistics"), ("id", joined.as_str())];

        tracing::debug!(count = ids.len(), "YouTube channels lookup");
        let resp: ChannelListResponse = self.get("channels", &params).await?;
        Ok(resp.items)
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, resource);
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Pull `error.message` out of a Google error envelope, falling back to the
/// raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.to_string(),
    }
}
