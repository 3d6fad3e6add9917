use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use youtube_client::{MAX_CHANNEL_IDS_PER_REQUEST, MAX_SEARCH_RESULTS};

use crate::error::ScoutError;

/// TOML-backed configuration loaded from disk.
/// Secrets (API key, DB URL) stay as env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub discovery: DiscoveryConfig,
}

/// Parameters of a discovery run.
///
/// An empty `region_code` or `relevance_language` disables that filter.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Search keywords, processed in this order.
    pub categories: Vec<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_region_code")]
    pub region_code: String,
    #[serde(default = "default_relevance_language")]
    pub relevance_language: String,
    #[serde(default = "default_detail_batch_size")]
    pub detail_batch_size: usize,
    #[serde(default = "default_max_concurrent_categories")]
    pub max_concurrent_categories: usize,
}

fn default_max_results() -> u32 {
    10
}

fn default_region_code() -> String {
    "KR".to_string()
}

fn default_relevance_language() -> String {
    "ko".to_string()
}

fn default_detail_batch_size() -> usize {
    MAX_CHANNEL_IDS_PER_REQUEST
}

fn default_max_concurrent_categories() -> usize {
    1
}

impl DiscoveryConfig {
    pub fn new<S: Into<String>>(categories: impl IntoIterator<Item = S>) -> Self {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            max_results: default_max_results(),
            region_code: default_region_code(),
            relevance_language: default_relevance_language(),
            detail_batch_size: default_detail_batch_size(),
            max_concurrent_categories: default_max_concurrent_categories(),
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_detail_batch_size(mut self, size: usize) -> Self {
        self.detail_batch_size = size;
        self
    }

    pub fn with_max_concurrent_categories(mut self, n: usize) -> Self {
        self.max_concurrent_categories = n;
        self
    }

    pub fn region_code(&self) -> Option<String> {
        non_empty(&self.region_code)
    }

    pub fn relevance_language(&self) -> Option<String> {
        non_empty(&self.relevance_language)
    }

    /// Pre-conditions checked once before a run touches the network.
    pub fn validate(&self) -> std::result::Result<(), ScoutError> {
        if self.categories.is_empty() {
            return Err(ScoutError::Config("category list is empty".to_string()));
        }
        if let Some(pos) = self.categories.iter().position(|c| c.trim().is_empty()) {
            return Err(ScoutError::Config(format!("category #{} is blank", pos + 1)));
        }
        if !(1..=MAX_SEARCH_RESULTS).contains(&self.max_results) {
            return Err(ScoutError::Config(format!(
                "max_results must be between 1 and {MAX_SEARCH_RESULTS}, got {}",
                self.max_results
            )));
        }
        if !(1..=MAX_CHANNEL_IDS_PER_REQUEST).contains(&self.detail_batch_size) {
            return Err(ScoutError::Config(format!(
                "detail_batch_size must be between 1 and {MAX_CHANNEL_IDS_PER_REQUEST}, got {}",
                self.detail_batch_size
            )));
        }
        if self.max_concurrent_categories == 0 {
            return Err(ScoutError::Config(
                "max_concurrent_categories must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}
