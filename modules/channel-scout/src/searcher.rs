use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use youtube_client::{ChannelSearch, SearchItem};

use crate::error::{Result, ScoutError};
use crate::file_config::DiscoveryConfig;
use crate::traits::{CategorySearcher, YouTubeApi};
use crate::types::ChannelId;

/// Category search over YouTube `search.list`, restricted to channels and
/// optionally scoped to a region and relevance language.
pub struct YouTubeSearcher {
    api: Arc<dyn YouTubeApi>,
    region_code: Option<String>,
    relevance_language: Option<String>,
}

impl YouTubeSearcher {
    pub fn new(api: Arc<dyn YouTubeApi>) -> Self {
        Self {
            api,
            region_code: None,
            relevance_language: None,
        }
    }

    pub fn from_config(api: Arc<dyn YouTubeApi>, config: &DiscoveryConfig) -> Self {
        Self {
            api,
            region_code: config.region_code(),
            relevance_language: config.relevance_language(),
        }
    }
}

#[async_trait]
impl CategorySearcher for YouTubeSearcher {
    async fn search(&self, category: &str, max_results: u32) -> Result<Vec<ChannelId>> {
        if max_results == 0 {
            return Err(ScoutError::Config("max_results must be positive".to_string()));
        }

        let request = ChannelSearch::new(category, max_results)
            .with_region(self.region_code.clone())
            .with_language(self.relevance_language.clone());

        let items = self
            .api
            .search_channels(&request)
            .await
            .map_err(|source| ScoutError::UpstreamSearch {
                category: category.to_string(),
                source,
            })?;

        let ids = channel_ids(items);
        debug!(category, count = ids.len(), "Search returned channel ids");
        Ok(ids)
    }
}

/// Channel ids in result order, skipping non-channel items and repeats.
fn channel_ids(items: Vec<SearchItem>) -> Vec<ChannelId> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| item.id.channel_id)
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}
