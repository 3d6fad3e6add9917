use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Contains only secrets and env-specific values; categories and search
/// parameters live in the TOML FileConfig.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // YouTube Data API
    pub youtube_api_key: String,
    pub youtube_api_base_url: Option<String>,

    // Database (not needed for preview runs)
    pub database_url: Option<String>,
    pub database_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            youtube_api_key: api_key(std::env::var("YOUTUBE_API_KEY").ok())
                .context("YOUTUBE_API_KEY environment variable is required and must not be blank")?,
            youtube_api_base_url: std::env::var("YOUTUBE_API_BASE_URL").ok(),
            database_url: std::env::var("DATABASE_URL").ok(),
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
        };

        config.log_keys();
        Ok(config)
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL environment variable is required to persist channels")
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  YOUTUBE_API_KEY: {}", preview(&self.youtube_api_key));
        tracing::info!(
            "  YOUTUBE_API_BASE_URL: {}",
            self.youtube_api_base_url.as_deref().unwrap_or("<default>")
        );
        tracing::info!(
            "  DATABASE_URL: {}",
            self.database_url.as_deref().map(preview).unwrap_or_else(|| "<not set>".to_string())
        );
    }
}

/// Trimmed key, or `None` when unset or blank.
fn api_key(raw: Option<String>) -> Option<String> {
    raw.map(|key| key.trim().to_string()).filter(|key| !key.is_empty())
}

fn preview(val: &str) -> String {
    let n: usize = val.chars().take(5).map(char::len_utf8).sum();
    format!("{}...({} chars)", &val[..n], val.chars().count())
}
