//! Outcome ledger of a discovery run.
//!
//! One entry per configured category, in configured order. A category either
//! failed as a whole (search or detail lookup) or completed with one outcome
//! per channel. Serialized into the `discovery_runs.categories` JSONB column.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScoutError;
use crate::types::{ChannelRecord, WriteOutcome};

// ---------------------------------------------------------------------------
// RunLedger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLedger {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub categories: Vec<CategoryOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryOutcome {
    pub category: String,
    #[serde(flatten)]
    pub status: CategoryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryStatus {
    Completed { records: Vec<RecordOutcome> },
    Failed { stage: FailureStage, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Search,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub channel_id: String,
    pub title: Option<String>,
    #[serde(flatten)]
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordStatus {
    Inserted,
    AlreadyExists,
    /// Upstream item could not be parsed into a record.
    Malformed { error: String },
    /// Requested id absent from the detail lookup response.
    Missing,
    WriteFailed { error: String },
}

impl RunLedger {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            categories: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: CategoryOutcome) {
        self.categories.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn category(&self, category: &str) -> Option<&CategoryOutcome> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats::default();
        for outcome in &self.categories {
            match &outcome.status {
                CategoryStatus::Failed { .. } => stats.categories_failed += 1,
                CategoryStatus::Completed { records } => {
                    stats.categories_completed += 1;
                    for record in records {
                        match record.status {
                            RecordStatus::Inserted => stats.inserted += 1,
                            RecordStatus::AlreadyExists => stats.already_exists += 1,
                            RecordStatus::Malformed { .. } => stats.malformed += 1,
                            RecordStatus::Missing => stats.missing += 1,
                            RecordStatus::WriteFailed { .. } => stats.write_failed += 1,
                        }
                    }
                }
            }
        }
        stats
    }
}

impl Default for RunLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryOutcome {
    pub fn completed(category: &str, records: Vec<RecordOutcome>) -> Self {
        Self {
            category: category.to_string(),
            status: CategoryStatus::Completed { records },
        }
    }

    pub fn failed(category: &str, stage: FailureStage, error: &ScoutError) -> Self {
        Self {
            category: category.to_string(),
            status: CategoryStatus::Failed {
                stage,
                error: error.to_string(),
            },
        }
    }

    /// Record outcomes, empty for a failed category.
    pub fn records(&self) -> &[RecordOutcome] {
        match &self.status {
            CategoryStatus::Completed { records } => records,
            CategoryStatus::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, CategoryStatus::Failed { .. })
    }
}

impl RecordOutcome {
    pub fn written(record: &ChannelRecord, outcome: WriteOutcome) -> Self {
        Self {
            channel_id: record.channel_id.clone(),
            title: Some(record.title.clone()),
            status: match outcome {
                WriteOutcome::Inserted => RecordStatus::Inserted,
                WriteOutcome::AlreadyExists => RecordStatus::AlreadyExists,
            },
        }
    }

    pub fn write_failed(record: &ChannelRecord, error: &ScoutError) -> Self {
        Self {
            channel_id: record.channel_id.clone(),
            title: Some(record.title.clone()),
            status: RecordStatus::WriteFailed {
                error: error.to_string(),
            },
        }
    }

    pub fn malformed(error: &ScoutError) -> Self {
        Self {
            channel_id: error.channel_id().unwrap_or_default().to_string(),
            title: error.title().map(String::from),
            status: RecordStatus::Malformed {
                error: error.to_string(),
            },
        }
    }

    pub fn missing(channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            title: None,
            status: RecordStatus::Missing,
        }
    }
}

// ---------------------------------------------------------------------------
// RunStats
// ---------------------------------------------------------------------------

/// Counts derived from a ledger.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub categories_completed: u32,
    pub categories_failed: u32,
    pub inserted: u32,
    pub already_exists: u32,
    pub malformed: u32,
    pub missing: u32,
    pub write_failed: u32,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Discovery Run Complete ===")?;
        writeln!(f, "Categories completed: {}", self.categories_completed)?;
        writeln!(f, "Categories failed:    {}", self.categories_failed)?;
        writeln!(f, "Channels inserted:    {}", self.inserted)?;
        writeln!(f, "Already stored:       {}", self.already_exists)?;
        if self.malformed + self.missing + self.write_failed > 0 {
            writeln!(f, "\nRecord failures:")?;
            writeln!(f, "  Malformed:    {}", self.malformed)?;
            writeln!(f, "  Missing:      {}", self.missing)?;
            writeln!(f, "  Write failed: {}", self.write_failed)?;
        }
        Ok(())
    }
}
