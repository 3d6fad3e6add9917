// Postgres persistence for discovered channels and run ledgers.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::ScoutError;
use crate::ledger::RunLedger;
use crate::traits::PersistenceSink;
use crate::types::{ChannelRecord, StoredChannel, WriteOutcome};

pub struct PgChannelStore {
    pool: PgPool,
}

impl PgChannelStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "Connected to database");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn get(&self, channel_id: &str) -> Result<Option<StoredChannel>> {
        let row = sqlx::query_as::<_, StoredChannel>(
            r#"
            SELECT channel_id, title, description, subscriber_count, video_count, category, created_at
            FROM channels
            WHERE channel_id = $1
            "#,
        )
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM channels")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Persist the run ledger as a single `discovery_runs` row.
    pub async fn save_run(&self, ledger: &RunLedger) -> Result<()> {
        let stats_json = serde_json::to_value(ledger.stats())?;
        let categories_json = serde_json::to_value(&ledger.categories)?;

        sqlx::query(
            r#"
            INSERT INTO discovery_runs (run_id, started_at, finished_at, stats, categories)
            VALUES ($1, $2, COALESCE($3, now()), $4, $5)
            "#,
        )
        .bind(ledger.run_id)
        .bind(ledger.started_at)
        .bind(ledger.finished_at)
        .bind(&stats_json)
        .bind(&categories_json)
        .execute(&self.pool)
        .await?;

        info!(run_id = %ledger.run_id, categories = ledger.categories.len(), "Discovery run log saved to Postgres");
        Ok(())
    }
}

#[async_trait]
impl PersistenceSink for PgChannelStore {
    async fn write(&self, record: &ChannelRecord) -> crate::error::Result<WriteOutcome> {
        let persistence = |message: String| ScoutError::Persistence {
            channel_id: record.channel_id.clone(),
            title: record.title.clone(),
            message,
            source: None,
        };

        let subscriber_count = i64::try_from(record.subscriber_count)
            .map_err(|_| persistence(format!("subscriber count {} exceeds BIGINT", record.subscriber_count)))?;
        let video_count = i64::try_from(record.video_count)
            .map_err(|_| persistence(format!("video count {} exceeds BIGINT", record.video_count)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO channels (channel_id, title, description, subscriber_count, video_count, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (channel_id) DO NOTHING
            "#,
        )
        .bind(&record.channel_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(subscriber_count)
        .bind(video_count)
        .bind(&record.category)
        .execute(&self.pool)
        .await
        .map_err(|e| write_failed(record, e))?;

        Ok(if result.rows_affected() == 0 {
            WriteOutcome::AlreadyExists
        } else {
            WriteOutcome::Inserted
        })
    }
}

fn write_failed(record: &ChannelRecord, e: sqlx::Error) -> ScoutError {
    ScoutError::Persistence {
        channel_id: record.channel_id.clone(),
        title: record.title.clone(),
        message: e.to_string(),
        source: Some(e),
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;
    use crate::testing::channel_record;

    #[test]
    fn write_failures_keep_the_sqlx_source() {
        let record = channel_record("UC_a", "Alpha", "gaming");

        let err = write_failed(&record, sqlx::Error::PoolTimedOut);

        assert_eq!(err.channel_id(), Some("UC_a"));
        assert_eq!(err.title(), Some("Alpha"));
        let source = err.source().expect("sqlx error should be the source");
        assert!(source.downcast_ref::<sqlx::Error>().is_some());
        assert!(err.to_string().contains("pool timed out"));
    }
}
