//! Integration tests for PgChannelStore.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use std::sync::Arc;

use channel_scout::testing::{channel_item, channel_record, MockYouTubeApi};
use channel_scout::{
    DiscoveryConfig, DiscoveryPipeline, PersistenceSink, PgChannelStore, WriteOutcome,
    YouTubeDetailFetcher, YouTubeSearcher,
};
use sqlx::PgPool;

/// Get a migrated store, or skip if no test DB is available.
async fn test_store() -> Option<PgChannelStore> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    let store = PgChannelStore::new(pool);
    store.migrate().await.ok()?;
    Some(store)
}

/// Channel id unique to this test invocation, so tests can share a database.
fn unique_id(name: &str) -> String {
    format!("UC_{name}_{}", uuid::Uuid::new_v4().simple())
}

#[tokio::test]
async fn duplicate_write_reports_already_exists_and_keeps_row() {
    let Some(store) = test_store().await else {
        return;
    };

    let id = unique_id("dup");
    let first = channel_record(&id, "Original", "gaming");
    let mut later = channel_record(&id, "Renamed", "beauty");
    later.subscriber_count = 999_999;

    assert_eq!(store.write(&first).await.unwrap(), WriteOutcome::Inserted);
    assert_eq!(store.write(&later).await.unwrap(), WriteOutcome::AlreadyExists);

    let row = store.get(&id).await.unwrap().unwrap();
    assert_eq!(row.title, "Original");
    assert_eq!(row.category, "gaming");
    assert_eq!(row.subscriber_count, 100);
}

#[tokio::test]
async fn counts_beyond_bigint_are_persistence_errors() {
    let Some(store) = test_store().await else {
        return;
    };

    let id = unique_id("huge");
    let mut record = channel_record(&id, "Huge", "gaming");
    record.subscriber_count = u64::MAX;

    let err = store.write(&record).await.unwrap_err();
    assert!(err.to_string().contains("exceeds BIGINT"));
    assert!(store.get(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn rerunning_pipeline_adds_no_rows_and_saves_run_logs() {
    let Some(store) = test_store().await else {
        return;
    };
    let store = Arc::new(store);

    let (a, b, c) = (unique_id("a"), unique_id("b"), unique_id("c"));
    let api = Arc::new(
        MockYouTubeApi::new()
            .on_search("gaming", &[a.as_str(), b.as_str()])
            .on_search("music", &[c.as_str()])
            .on_channel(channel_item(&a, "Alpha", "1", "1"))
            .on_channel(channel_item(&b, "Beta", "2", "2"))
            .on_channel(channel_item(&c, "Gamma", "3", "3")),
    );
    let config = DiscoveryConfig::new(["gaming", "music"]);
    let pipeline = DiscoveryPipeline::new(
        Arc::new(YouTubeSearcher::from_config(api.clone(), &config)),
        Arc::new(YouTubeDetailFetcher::new(api)),
        store.clone(),
        config,
    );

    let before = store.count().await.unwrap();

    let first = pipeline.run_once().await.unwrap();
    store.save_run(&first).await.unwrap();
    assert_eq!(first.stats().inserted, 3);
    assert_eq!(store.get(&c).await.unwrap().unwrap().category, "music");

    let second = pipeline.run_once().await.unwrap();
    store.save_run(&second).await.unwrap();
    assert_eq!(second.stats().inserted, 0);
    assert_eq!(second.stats().already_exists, 3);
    assert!(store.count().await.unwrap() >= before + 3);

    let saved = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM discovery_runs WHERE run_id = $1 OR run_id = $2",
    )
    .bind(first.run_id)
    .bind(second.run_id)
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(saved, 2);
}
