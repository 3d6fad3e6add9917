use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform-assigned channel token, e.g. `UCxxxxxxxxxxxxxxxxxxxxxx`.
pub type ChannelId = String;

/// Canonical channel entity handed to the persistence sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub channel_id: ChannelId,
    pub title: String,
    pub description: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    /// Category the channel was discovered under. Not part of the upstream
    /// response; stamped by the fetcher from its caller's context.
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Inserted,
    AlreadyExists,
}

/// A row from the channels table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredChannel {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub subscriber_count: i64,
    pub video_count: i64,
    pub category: String,
    pub created_at: DateTime<Utc>,
}
