pub mod config;
pub mod error;
pub mod fetcher;
pub mod file_config;
pub mod ledger;
pub mod pipeline;
pub mod searcher;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{Result, ScoutError};
pub use fetcher::YouTubeDetailFetcher;
pub use file_config::{DiscoveryConfig, FileConfig};
pub use ledger::{
    CategoryOutcome, CategoryStatus, FailureStage, RecordOutcome, RecordStatus, RunLedger, RunStats,
};
pub use pipeline::{Discoverer, Discovery, DiscoveryPipeline};
pub use searcher::YouTubeSearcher;
pub use store::PgChannelStore;
pub use traits::{CategorySearcher, ChannelDetailFetcher, PersistenceSink, YouTubeApi};
pub use types::{ChannelId, ChannelRecord, StoredChannel, WriteOutcome};
