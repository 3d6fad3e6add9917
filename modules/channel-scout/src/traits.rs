// Trait seams of the discovery pipeline.
//
// YouTubeApi wraps the REST client so the searcher and fetcher run against
// MockYouTubeApi in tests. CategorySearcher, ChannelDetailFetcher and
// PersistenceSink are the three stages DiscoveryPipeline drives.

use async_trait::async_trait;
use youtube_client::{ChannelItem, ChannelSearch, SearchItem, YouTubeClient};

use crate::error::Result;
use crate::types::{ChannelId, ChannelRecord, WriteOutcome};

// ---------------------------------------------------------------------------
// YouTubeApi — transport seam
// ---------------------------------------------------------------------------

#[async_trait]
pub trait YouTubeApi: Send + Sync {
    async fn search_channels(&self, search: &ChannelSearch) -> youtube_client::Result<Vec<SearchItem>>;

    async fn list_channels(&self, ids: &[String]) -> youtube_client::Result<Vec<ChannelItem>>;
}

#[async_trait]
impl YouTubeApi for YouTubeClient {
    async fn search_channels(&self, search: &ChannelSearch) -> youtube_client::Result<Vec<SearchItem>> {
        YouTubeClient::search_channels(self, search).await
    }

    async fn list_channels(&self, ids: &[String]) -> youtube_client::Result<Vec<ChannelItem>> {
        YouTubeClient::list_channels(self, ids).await
    }
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CategorySearcher: Send + Sync {
    /// Channel ids matching a category keyword, at most `max_results`.
    /// Zero matches is an empty vector, not an error.
    async fn search(&self, category: &str, max_results: u32) -> Result<Vec<ChannelId>>;
}

#[async_trait]
pub trait ChannelDetailFetcher: Send + Sync {
    /// Records for `ids`, stamped with `category`. The outer error is
    /// batch-fatal; inner errors are per-item parse failures.
    /// Order is not guaranteed to follow `ids`.
    async fn fetch_details(
        &self,
        category: &str,
        ids: &[ChannelId],
    ) -> Result<Vec<Result<ChannelRecord>>>;
}

#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Insert the record unless a row with its channel id already exists.
    /// Existing rows are never modified.
    async fn write(&self, record: &ChannelRecord) -> Result<WriteOutcome>;
}
