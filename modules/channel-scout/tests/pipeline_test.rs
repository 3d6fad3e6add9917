//! Pipeline tests: real YouTubeSearcher / YouTubeDetailFetcher over
//! MockYouTubeApi, persisting into MemoryStore. No network, no database.

use std::sync::Arc;

use async_trait::async_trait;
use channel_scout::testing::{channel_item, MemoryStore, MockYouTubeApi};
use channel_scout::{
    CategorySearcher, CategoryStatus, ChannelId, Discoverer, DiscoveryConfig, DiscoveryPipeline,
    FailureStage, RecordStatus, ScoutError, YouTubeDetailFetcher, YouTubeSearcher,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn pipeline(api: Arc<MockYouTubeApi>, store: Arc<MemoryStore>, config: DiscoveryConfig) -> DiscoveryPipeline {
    let searcher = Arc::new(YouTubeSearcher::from_config(api.clone(), &config));
    let fetcher = Arc::new(YouTubeDetailFetcher::new(api).with_batch_size(config.detail_batch_size));
    DiscoveryPipeline::new(searcher, fetcher, store, config)
}

fn statuses(ledger: &channel_scout::RunLedger, category: &str) -> Vec<(String, RecordStatus)> {
    let mut out: Vec<_> = ledger
        .category(category)
        .unwrap_or_else(|| panic!("no ledger entry for {category}"))
        .records()
        .iter()
        .map(|r| (r.channel_id.clone(), r.status.clone()))
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn music_search_failure_leaves_gaming_persisted() {
    let api = Arc::new(
        MockYouTubeApi::new()
            .on_search("gaming", &["A", "B"])
            .fail_search("music")
            .on_channel(channel_item("A", "Alpha Plays", "1500", "120"))
            .on_channel(channel_item("B", "Beta Games", "90", "4")),
    );
    let store = Arc::new(MemoryStore::new());

    let ledger = pipeline(api, store.clone(), DiscoveryConfig::new(["gaming", "music"]))
        .run_once()
        .await
        .unwrap();

    assert_eq!(
        statuses(&ledger, "gaming"),
        vec![
            ("A".to_string(), RecordStatus::Inserted),
            ("B".to_string(), RecordStatus::Inserted),
        ]
    );
    match &ledger.category("music").unwrap().status {
        CategoryStatus::Failed { stage, error } => {
            assert_eq!(*stage, FailureStage::Search);
            assert!(error.contains("music"));
        }
        other => panic!("music should have failed, got {other:?}"),
    }
    assert_eq!(store.row_count(), 2);
}

#[tokio::test]
async fn first_seen_category_wins_across_runs() {
    let store = Arc::new(MemoryStore::new());

    let run1 = Arc::new(
        MockYouTubeApi::new()
            .on_search("gaming", &["A"])
            .on_channel(channel_item("A", "Alpha", "10", "1")),
    );
    pipeline(run1, store.clone(), DiscoveryConfig::new(["gaming"]))
        .run_once()
        .await
        .unwrap();

    let run2 = Arc::new(
        MockYouTubeApi::new()
            .on_search("beauty", &["A"])
            .on_channel(channel_item("A", "Alpha", "99", "7")),
    );
    let ledger = pipeline(run2, store.clone(), DiscoveryConfig::new(["beauty"]))
        .run_once()
        .await
        .unwrap();

    assert_eq!(
        statuses(&ledger, "beauty"),
        vec![("A".to_string(), RecordStatus::AlreadyExists)]
    );
    assert_eq!(store.row_count(), 1);
    let row = store.row("A").unwrap();
    assert_eq!(row.category, "gaming");
    assert_eq!(row.subscriber_count, 10);
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn zero_matches_yield_no_outcomes_and_no_error() {
    let api = Arc::new(MockYouTubeApi::new().on_search("obscure", &[]));
    let store = Arc::new(MemoryStore::new());

    let ledger = pipeline(api.clone(), store.clone(), DiscoveryConfig::new(["obscure"]))
        .run_once()
        .await
        .unwrap();

    let obscure = ledger.category("obscure").unwrap();
    assert!(!obscure.is_failed());
    assert!(obscure.records().is_empty());
    assert_eq!(api.lookup_calls(), 0, "empty id list must not reach the API");
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn malformed_item_does_not_block_siblings() {
    let api = Arc::new(
        MockYouTubeApi::new()
            .on_search("music", &["A", "BAD", "C"])
            .on_channel(channel_item("A", "Alpha", "1", "1"))
            .on_channel(channel_item("BAD", "Broken", "1", "n/a"))
            .on_channel(channel_item("C", "Gamma", "3", "3")),
    );
    let store = Arc::new(MemoryStore::new());

    let ledger = pipeline(api, store.clone(), DiscoveryConfig::new(["music"]))
        .run_once()
        .await
        .unwrap();

    let outcomes = statuses(&ledger, "music");
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0], ("A".to_string(), RecordStatus::Inserted));
    assert!(matches!(outcomes[1].1, RecordStatus::Malformed { .. }));
    assert_eq!(outcomes[1].0, "BAD");
    assert_eq!(outcomes[2], ("C".to_string(), RecordStatus::Inserted));
    assert_eq!(store.row_count(), 2);
    assert!(store.row("BAD").is_none());
}

#[tokio::test]
async fn write_failure_does_not_block_siblings() {
    let api = Arc::new(
        MockYouTubeApi::new()
            .on_search("gaming", &["A", "B", "C"])
            .on_channel(channel_item("A", "Alpha", "1", "1"))
            .on_channel(channel_item("B", "Beta", "2", "2"))
            .on_channel(channel_item("C", "Gamma", "3", "3")),
    );
    let store = Arc::new(MemoryStore::new().fail_on("B"));

    let ledger = pipeline(api, store.clone(), DiscoveryConfig::new(["gaming"]))
        .run_once()
        .await
        .unwrap();

    let gaming = ledger.category("gaming").unwrap();
    let failed = gaming
        .records()
        .iter()
        .find(|r| r.channel_id == "B")
        .unwrap();
    assert_eq!(failed.title.as_deref(), Some("Beta"));
    assert!(matches!(failed.status, RecordStatus::WriteFailed { .. }));
    assert_eq!(store.row_count(), 2);
    assert_eq!(store.write_count(), 3);
}

#[tokio::test]
async fn detail_failure_is_category_level() {
    let api = Arc::new(
        MockYouTubeApi::new()
            .on_search("gaming", &["A"])
            .fail_channels(),
    );
    let store = Arc::new(MemoryStore::new());

    let ledger = pipeline(api, store.clone(), DiscoveryConfig::new(["gaming"]))
        .run_once()
        .await
        .unwrap();

    assert!(matches!(
        ledger.category("gaming").unwrap().status,
        CategoryStatus::Failed { stage: FailureStage::Detail, .. }
    ));
    assert_eq!(store.write_count(), 0);
}

/// Returns the same ids for every category, past the search result cap.
struct FixedSearcher(Vec<String>);

#[async_trait]
impl CategorySearcher for FixedSearcher {
    async fn search(&self, _category: &str, _max_results: u32) -> channel_scout::Result<Vec<ChannelId>> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn later_chunk_failure_writes_nothing_for_the_category() {
    let ids: Vec<String> = (0..120).map(|i| format!("UC_{i:03}")).collect();
    let api = ids.iter().fold(MockYouTubeApi::new(), |api, id| {
        api.on_channel(channel_item(id, id, "1", "1"))
    });
    let api = Arc::new(api.fail_lookup_call(3));
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(YouTubeDetailFetcher::new(api.clone()).with_batch_size(50));

    let ledger = DiscoveryPipeline::new(
        Arc::new(FixedSearcher(ids)),
        fetcher,
        store.clone(),
        DiscoveryConfig::new(["gaming"]),
    )
    .run_once()
    .await
    .unwrap();

    match &ledger.category("gaming").unwrap().status {
        CategoryStatus::Failed { stage, error } => {
            assert_eq!(*stage, FailureStage::Detail);
            assert!(error.contains("20 ids"));
        }
        other => panic!("gaming should have failed, got {other:?}"),
    }
    assert_eq!(api.lookup_calls(), 3);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn ids_missing_from_lookup_are_reported() {
    let api = Arc::new(
        MockYouTubeApi::new()
            .on_search("music", &["A", "GONE"])
            .on_channel(channel_item("A", "Alpha", "1", "1")),
    );
    let store = Arc::new(MemoryStore::new());

    let ledger = pipeline(api, store.clone(), DiscoveryConfig::new(["music"]))
        .run_once()
        .await
        .unwrap();

    assert_eq!(
        statuses(&ledger, "music"),
        vec![
            ("A".to_string(), RecordStatus::Inserted),
            ("GONE".to_string(), RecordStatus::Missing),
        ]
    );
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_run_adds_no_rows() {
    let api = Arc::new(
        MockYouTubeApi::new()
            .on_search("gaming", &["A", "B"])
            .on_search("music", &["B", "C"])
            .on_channel(channel_item("A", "Alpha", "1", "1"))
            .on_channel(channel_item("B", "Beta", "2", "2"))
            .on_channel(channel_item("C", "Gamma", "3", "3")),
    );
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(api, store.clone(), DiscoveryConfig::new(["gaming", "music"]));

    let first = pipeline.run_once().await.unwrap();
    assert_eq!(store.row_count(), 3);
    let stats = first.stats();
    assert_eq!(stats.inserted, 3);
    // B is found under both categories in the same run
    assert_eq!(stats.already_exists, 1);
    assert_eq!(store.row("B").unwrap().category, "gaming");

    let second = pipeline.run_once().await.unwrap();
    assert_eq!(store.row_count(), 3);
    let stats = second.stats();
    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.already_exists, 4);
    assert_ne!(first.run_id, second.run_id);
}

// ---------------------------------------------------------------------------
// Configuration and concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_category_list_fails_before_any_call() {
    let api = Arc::new(MockYouTubeApi::new());
    let store = Arc::new(MemoryStore::new());

    let result = pipeline(api.clone(), store, DiscoveryConfig::new(Vec::<String>::new()))
        .run_once()
        .await;

    assert!(matches!(result, Err(ScoutError::Config(_))));
    assert_eq!(api.search_calls(), 0);
}

#[tokio::test]
async fn concurrent_categories_keep_configured_order() {
    let categories = ["먹방", "음식", "여행", "게임", "음악", "뷰티"];
    let api = categories
        .iter()
        .enumerate()
        .fold(MockYouTubeApi::new(), |api, (i, category)| {
            let id = format!("UC_{i}");
            api.on_search(category, &[id.as_str()])
                .on_channel(channel_item(&id, category, "1", "1"))
        });
    let api = Arc::new(api.fail_search("여행"));
    let store = Arc::new(MemoryStore::new());
    let config = DiscoveryConfig::new(categories).with_max_concurrent_categories(3);

    let ledger = pipeline(api, store.clone(), config).run_once().await.unwrap();

    let order: Vec<&str> = ledger.categories.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(order, categories);
    assert!(ledger.category("여행").unwrap().is_failed());
    assert_eq!(store.row_count(), 5);
}

fn six_category_api(categories: &[&str]) -> MockYouTubeApi {
    categories
        .iter()
        .enumerate()
        .fold(MockYouTubeApi::new(), |api, (i, category)| {
            let id = format!("UC_{i}");
            api.on_search(category, &[id.as_str()])
                .on_channel(channel_item(&id, category, "1", "1"))
        })
}

#[tokio::test]
async fn concurrency_limit_bounds_upstream_calls_in_flight() {
    let categories = ["먹방", "음식", "여행", "게임", "음악", "뷰티"];
    let api = Arc::new(six_category_api(&categories));
    let config = DiscoveryConfig::new(categories).with_max_concurrent_categories(3);

    pipeline(api.clone(), Arc::new(MemoryStore::new()), config)
        .run_once()
        .await
        .unwrap();

    assert!(api.max_in_flight() <= 3, "saw {} calls in flight", api.max_in_flight());
    assert!(api.max_in_flight() > 1, "categories never overlapped");
}

#[tokio::test]
async fn default_config_keeps_one_upstream_call_in_flight() {
    let categories = ["먹방", "음식", "여행", "게임", "음악", "뷰티"];
    let api = Arc::new(six_category_api(&categories));
    let config = DiscoveryConfig::new(categories);
    assert_eq!(config.max_concurrent_categories, 1);

    let ledger = pipeline(api.clone(), Arc::new(MemoryStore::new()), config)
        .run_once()
        .await
        .unwrap();

    assert_eq!(ledger.stats().inserted, 6);
    assert_eq!(api.max_in_flight(), 1);
}

// ---------------------------------------------------------------------------
// Discoverer (preview path)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn discover_reports_records_and_missing_without_a_store() {
    let api = Arc::new(
        MockYouTubeApi::new()
            .on_search("여행", &["A", "GONE"])
            .on_channel(channel_item("A", "Alpha Travels", "42", "7")),
    );
    let discoverer = Discoverer::new(
        Arc::new(YouTubeSearcher::new(api.clone())),
        Arc::new(YouTubeDetailFetcher::new(api)),
        10,
    );

    let found = discoverer.discover("여행").await.unwrap();

    assert_eq!(found.category, "여행");
    assert_eq!(found.requested, vec!["A", "GONE"]);
    let alpha = found.records[0].as_ref().unwrap();
    assert_eq!(alpha.title, "Alpha Travels");
    assert_eq!(alpha.category, "여행");
    assert_eq!(found.missing(), vec!["GONE"]);
}
