use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use youtube_client::{ChannelItem, MAX_CHANNEL_IDS_PER_REQUEST};

use crate::error::{Result, ScoutError};
use crate::traits::{ChannelDetailFetcher, YouTubeApi};
use crate::types::{ChannelId, ChannelRecord};

/// Batched channel lookup over YouTube `channels.list`.
///
/// Identifier lists longer than `batch_size` are split into sub-batches and
/// the results merged. Any sub-batch failure fails the whole fetch. An item
/// counts as requested only against its own sub-batch, and repeats of an id
/// already returned are dropped.
pub struct YouTubeDetailFetcher {
    api: Arc<dyn YouTubeApi>,
    batch_size: usize,
}

impl YouTubeDetailFetcher {
    pub fn new(api: Arc<dyn YouTubeApi>) -> Self {
        Self {
            api,
            batch_size: MAX_CHANNEL_IDS_PER_REQUEST,
        }
    }

    /// Clamped to `1..=MAX_CHANNEL_IDS_PER_REQUEST`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_CHANNEL_IDS_PER_REQUEST);
        self
    }
}

#[async_trait]
impl ChannelDetailFetcher for YouTubeDetailFetcher {
    async fn fetch_details(
        &self,
        category: &str,
        ids: &[ChannelId],
    ) -> Result<Vec<Result<ChannelRecord>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<String> = HashSet::with_capacity(ids.len());
        let mut records = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(self.batch_size) {
            let requested: HashSet<&str> = chunk.iter().map(String::as_str).collect();
            let items = self
                .api
                .list_channels(chunk)
                .await
                .map_err(|source| ScoutError::UpstreamDetail {
                    category: category.to_string(),
                    requested: chunk.len(),
                    source,
                })?;
            debug!(category, requested = chunk.len(), returned = items.len(), "Channel batch fetched");

            for item in items {
                if !requested.contains(item.id.as_str()) {
                    records.push(Err(malformed(
                        category,
                        &item,
                        "identifier was not requested in this batch".to_string(),
                    )));
                } else if !seen.insert(item.id.clone()) {
                    warn!(category, channel_id = %item.id, "Duplicate channel item dropped");
                } else {
                    records.push(parse_channel(category, item));
                }
            }
        }

        Ok(records)
    }
}

/// Strict parse of one upstream item: a complete record or a tagged failure.
pub fn parse_channel(category: &str, item: ChannelItem) -> Result<ChannelRecord> {
    let Some(snippet) = item.snippet.as_ref() else {
        return Err(malformed(category, &item, "missing snippet".to_string()));
    };
    let Some(statistics) = item.statistics.as_ref() else {
        return Err(malformed(category, &item, "missing statistics".to_string()));
    };

    let subscribers = match statistics.subscriber_count.as_deref() {
        None if statistics.hidden_subscriber_count => {
            Err("subscriberCount is hidden by the channel".to_string())
        }
        value => parse_count("subscriberCount", value),
    };
    let subscriber_count = subscribers.map_err(|reason| malformed(category, &item, reason))?;

    let video_count = parse_count("videoCount", statistics.video_count.as_deref())
        .map_err(|reason| malformed(category, &item, reason))?;

    Ok(ChannelRecord {
        channel_id: item.id.clone(),
        title: snippet.title.clone(),
        description: snippet.description.clone(),
        subscriber_count,
        video_count,
        category: category.to_string(),
    })
}

fn parse_count(field: &str, value: Option<&str>) -> std::result::Result<u64, String> {
    let raw = value.ok_or_else(|| format!("missing {field}"))?;
    raw.trim()
        .parse::<u64>()
        .map_err(|_| format!("{field} is not a non-negative integer: {raw:?}"))
}

fn malformed(category: &str, item: &ChannelItem, reason: String) -> ScoutError {
    ScoutError::MalformedRecord {
        category: category.to_string(),
        channel_id: item.id.clone(),
        title: item.snippet.as_ref().map(|s| s.title.clone()),
        reason,
    }
}
