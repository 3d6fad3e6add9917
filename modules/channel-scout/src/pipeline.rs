use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::file_config::DiscoveryConfig;
use crate::ledger::{CategoryOutcome, FailureStage, RecordOutcome, RunLedger};
use crate::traits::{CategorySearcher, ChannelDetailFetcher, PersistenceSink};
use crate::types::{ChannelId, ChannelRecord, WriteOutcome};

// ---------------------------------------------------------------------------
// Discoverer — search + detail lookup for one category
// ---------------------------------------------------------------------------

/// Channels discovered for one category, before persistence.
#[derive(Debug)]
pub struct Discovery {
    pub category: String,
    pub requested: Vec<ChannelId>,
    pub records: Vec<Result<ChannelRecord>>,
}

impl Discovery {
    /// Requested ids the detail lookup returned nothing for.
    pub fn missing(&self) -> Vec<&str> {
        let returned: HashSet<&str> = self
            .records
            .iter()
            .filter_map(|r| match r {
                Ok(record) => Some(record.channel_id.as_str()),
                Err(e) => e.channel_id(),
            })
            .collect();
        self.requested
            .iter()
            .map(String::as_str)
            .filter(|id| !returned.contains(id))
            .collect()
    }
}

pub struct Discoverer {
    searcher: Arc<dyn CategorySearcher>,
    fetcher: Arc<dyn ChannelDetailFetcher>,
    max_results: u32,
}

impl Discoverer {
    pub fn new(
        searcher: Arc<dyn CategorySearcher>,
        fetcher: Arc<dyn ChannelDetailFetcher>,
        max_results: u32,
    ) -> Self {
        Self {
            searcher,
            fetcher,
            max_results,
        }
    }

    pub async fn search(&self, category: &str) -> Result<Vec<ChannelId>> {
        self.searcher.search(category, self.max_results).await
    }

    pub async fn fetch(&self, category: &str, ids: &[ChannelId]) -> Result<Vec<Result<ChannelRecord>>> {
        self.fetcher.fetch_details(category, ids).await
    }

    /// Search then fetch. Either stage failing fails the category.
    pub async fn discover(&self, category: &str) -> Result<Discovery> {
        let requested = self.search(category).await?;
        let records = self.fetch(category, &requested).await?;
        Ok(Discovery {
            category: category.to_string(),
            requested,
            records,
        })
    }
}

// ---------------------------------------------------------------------------
// DiscoveryPipeline
// ---------------------------------------------------------------------------

/// Drives a full run: every configured category through search, detail
/// lookup and persistence. Category failures and record failures are
/// recorded in the ledger and never stop the run.
pub struct DiscoveryPipeline {
    discoverer: Discoverer,
    sink: Arc<dyn PersistenceSink>,
    config: DiscoveryConfig,
}

impl DiscoveryPipeline {
    pub fn new(
        searcher: Arc<dyn CategorySearcher>,
        fetcher: Arc<dyn ChannelDetailFetcher>,
        sink: Arc<dyn PersistenceSink>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            discoverer: Discoverer::new(searcher, fetcher, config.max_results),
            sink,
            config,
        }
    }

    /// Run every category once. Fails only when the configuration itself is
    /// invalid, before any category is processed.
    pub async fn run_once(&self) -> Result<RunLedger> {
        self.config.validate()?;

        let mut ledger = RunLedger::new();
        info!(
            run_id = %ledger.run_id,
            categories = self.config.categories.len(),
            concurrency = self.config.max_concurrent_categories,
            "Discovery run starting"
        );

        // `buffered` keeps configured order while bounding in-flight categories.
        let outcomes: Vec<CategoryOutcome> = stream::iter(
            self.config
                .categories
                .iter()
                .map(|category| self.process_category(category)),
        )
        .buffered(self.config.max_concurrent_categories)
        .collect()
        .await;

        for outcome in outcomes {
            ledger.record(outcome);
        }
        ledger.finish();

        info!(run_id = %ledger.run_id, "{}", ledger.stats());
        Ok(ledger)
    }

    async fn process_category(&self, category: &str) -> CategoryOutcome {
        info!(category, "Collecting channels for category");

        let requested = match self.discoverer.search(category).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(category, error = %e, "Category search failed, skipping category");
                return CategoryOutcome::failed(category, FailureStage::Search, &e);
            }
        };
        if requested.is_empty() {
            info!(category, "No channels matched");
        }

        let records = match self.discoverer.fetch(category, &requested).await {
            Ok(records) => records,
            Err(e) => {
                warn!(category, error = %e, "Channel detail lookup failed, skipping category");
                return CategoryOutcome::failed(category, FailureStage::Detail, &e);
            }
        };

        let discovery = Discovery {
            category: category.to_string(),
            requested,
            records,
        };
        let mut outcomes = Vec::with_capacity(discovery.requested.len());

        for id in discovery.missing() {
            warn!(category, channel_id = id, "Channel missing from detail lookup");
            outcomes.push(RecordOutcome::missing(id));
        }

        for result in discovery.records {
            match result {
                Ok(record) => outcomes.push(self.persist(&record).await),
                Err(e) => {
                    warn!(category, channel_id = e.channel_id(), error = %e, "Skipping malformed channel");
                    outcomes.push(RecordOutcome::malformed(&e));
                }
            }
        }

        CategoryOutcome::completed(category, outcomes)
    }

    async fn persist(&self, record: &ChannelRecord) -> RecordOutcome {
        match self.sink.write(record).await {
            Ok(outcome) => {
                match outcome {
                    WriteOutcome::Inserted => info!(
                        category = %record.category,
                        channel_id = %record.channel_id,
                        title = %record.title,
                        "Channel stored"
                    ),
                    WriteOutcome::AlreadyExists => debug!(
                        category = %record.category,
                        channel_id = %record.channel_id,
                        "Channel already stored"
                    ),
                }
                RecordOutcome::written(record, outcome)
            }
            Err(e) => {
                warn!(
                    category = %record.category,
                    channel_id = %record.channel_id,
                    title = %record.title,
                    error = %e,
                    "Failed to store channel"
                );
                RecordOutcome::write_failed(record, &e)
            }
        }
    }
}
