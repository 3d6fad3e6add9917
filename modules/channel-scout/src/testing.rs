// Test doubles for the discovery pipeline.
//
// - MockYouTubeApi (YouTubeApi) — HashMap-based query→ids and id→item, with
//   call counters and an in-flight gauge so tests can assert on upstream traffic
// - MemoryStore (PersistenceSink) — in-memory channels table with the same
//   conflict-ignore semantics as the Postgres store
//
// Plus helpers for building upstream items and records.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use youtube_client::{
    ChannelItem, ChannelSearch, ChannelSnippet, ChannelStatistics, ResourceId, SearchItem,
    YouTubeError,
};

use crate::error::{Result, ScoutError};
use crate::traits::{PersistenceSink, YouTubeApi};
use crate::types::{ChannelRecord, WriteOutcome};

// ---------------------------------------------------------------------------
// MockYouTubeApi
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered search queries. Channel lookups return the
/// registered items among the requested ids, so unregistered ids go missing.
/// Builder pattern: `.on_search()`, `.fail_search()`, `.on_channel()`.
pub struct MockYouTubeApi {
    searches: HashMap<String, Vec<String>>,
    failing_searches: HashSet<String>,
    channels: HashMap<String, ChannelItem>,
    unrequested: Vec<ChannelItem>,
    scripted_lookups: HashMap<usize, Vec<ChannelItem>>,
    fail_channels: bool,
    failing_lookup: Option<usize>,
    search_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_search: Mutex<Option<ChannelSearch>>,
    lookups: Mutex<Vec<Vec<String>>>,
}

impl MockYouTubeApi {
    pub fn new() -> Self {
        Self {
            searches: HashMap::new(),
            failing_searches: HashSet::new(),
            channels: HashMap::new(),
            unrequested: Vec::new(),
            scripted_lookups: HashMap::new(),
            fail_channels: false,
            failing_lookup: None,
            search_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_search: Mutex::new(None),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn on_search(mut self, query: &str, channel_ids: &[&str]) -> Self {
        self.searches.insert(
            query.to_string(),
            channel_ids.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Searches for `query` fail with a transport fault.
    pub fn fail_search(mut self, query: &str) -> Self {
        self.failing_searches.insert(query.to_string());
        self
    }

    pub fn on_channel(mut self, item: ChannelItem) -> Self {
        self.channels.insert(item.id.clone(), item);
        self
    }

    /// Appended to every lookup response regardless of the requested ids.
    pub fn with_unrequested(mut self, item: ChannelItem) -> Self {
        self.unrequested.push(item);
        self
    }

    /// The `call`-th channel lookup (1-based) returns exactly `items`,
    /// whatever ids it was asked for.
    pub fn respond_to_lookup(mut self, call: usize, items: Vec<ChannelItem>) -> Self {
        self.scripted_lookups.insert(call, items);
        self
    }

    /// Every channel lookup fails with a 500.
    pub fn fail_channels(mut self) -> Self {
        self.fail_channels = true;
        self
    }

    /// Only the `call`-th channel lookup (1-based) fails with a 500.
    pub fn fail_lookup_call(mut self, call: usize) -> Self {
        self.failing_lookup = Some(call);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn last_search(&self) -> Option<ChannelSearch> {
        self.last_search.lock().unwrap().clone()
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }

    /// The id batches passed to each channel lookup, in call order.
    pub fn lookups(&self) -> Vec<Vec<String>> {
        self.lookups.lock().unwrap().clone()
    }

    /// Highest number of search and lookup calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Marks a call in flight and yields once, so concurrent callers overlap.
    async fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        InFlight(&self.in_flight)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for MockYouTubeApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl YouTubeApi for MockYouTubeApi {
    async fn search_channels(&self, search: &ChannelSearch) -> youtube_client::Result<Vec<SearchItem>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let _call = self.enter().await;
        *self.last_search.lock().unwrap() = Some(search.clone());

        if self.failing_searches.contains(&search.query) {
            return Err(YouTubeError::Network(format!(
                "MockYouTubeApi: connection reset searching {}",
                search.query
            )));
        }

        let ids = self.searches.get(&search.query).ok_or_else(|| YouTubeError::Api {
            status: 400,
            message: format!("MockYouTubeApi: no search registered for {}", search.query),
        })?;

        Ok(ids
            .iter()
            .take(search.max_results as usize)
            .map(|id| SearchItem {
                id: ResourceId {
                    kind: "youtube#channel".to_string(),
                    channel_id: Some(id.clone()),
                },
            })
            .collect())
    }

    async fn list_channels(&self, ids: &[String]) -> youtube_client::Result<Vec<ChannelItem>> {
        let call = {
            let mut lookups = self.lookups.lock().unwrap();
            lookups.push(ids.to_vec());
            lookups.len()
        };
        let _call = self.enter().await;

        if self.fail_channels || self.failing_lookup == Some(call) {
            return Err(YouTubeError::Api {
                status: 500,
                message: "MockYouTubeApi: backend error".to_string(),
            });
        }

        if let Some(items) = self.scripted_lookups.get(&call) {
            return Ok(items.clone());
        }

        let mut items: Vec<ChannelItem> = ids
            .iter()
            .filter_map(|id| self.channels.get(id).cloned())
            .collect();
        items.extend(self.unrequested.iter().cloned());
        Ok(items)
    }
}

/// A `channels.list` item with string-encoded counts, as the API sends them.
pub fn channel_item(id: &str, title: &str, subscribers: &str, videos: &str) -> ChannelItem {
    ChannelItem {
        id: id.to_string(),
        snippet: Some(ChannelSnippet {
            title: title.to_string(),
            description: format!("{title} channel"),
        }),
        statistics: Some(ChannelStatistics {
            subscriber_count: Some(subscribers.to_string()),
            video_count: Some(videos.to_string()),
            hidden_subscriber_count: false,
        }),
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory channels table keyed on channel id. First write wins.
pub struct MemoryStore {
    rows: Mutex<BTreeMap<String, ChannelRecord>>,
    failing: HashSet<String>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            failing: HashSet::new(),
            writes: AtomicUsize::new(0),
        }
    }

    /// Writes for `channel_id` fail with a storage fault.
    pub fn fail_on(mut self, channel_id: &str) -> Self {
        self.failing.insert(channel_id.to_string());
        self
    }

    pub fn row(&self, channel_id: &str) -> Option<ChannelRecord> {
        self.rows.lock().unwrap().get(channel_id).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceSink for MemoryStore {
    async fn write(&self, record: &ChannelRecord) -> Result<WriteOutcome> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&record.channel_id) {
            return Err(ScoutError::Persistence {
                channel_id: record.channel_id.clone(),
                title: record.title.clone(),
                message: "MemoryStore: connection refused".to_string(),
                source: None,
            });
        }

        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&record.channel_id) {
            return Ok(WriteOutcome::AlreadyExists);
        }
        rows.insert(record.channel_id.clone(), record.clone());
        Ok(WriteOutcome::Inserted)
    }
}

/// A record as the fetcher would produce it.
pub fn channel_record(id: &str, title: &str, category: &str) -> ChannelRecord {
    ChannelRecord {
        channel_id: id.to_string(),
        title: title.to_string(),
        description: format!("{title} channel"),
        subscriber_count: 100,
        video_count: 10,
        category: category.to_string(),
    }
}
