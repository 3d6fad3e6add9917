use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use channel_scout::file_config::load_config;
use channel_scout::{
    AppConfig, Discoverer, DiscoveryConfig, DiscoveryPipeline, PgChannelStore, YouTubeApi,
    YouTubeDetailFetcher, YouTubeSearcher,
};
use youtube_client::YouTubeClient;

#[derive(Parser)]
#[command(name = "channel-scout", about = "Discover YouTube channels by category and store them")]
struct Cli {
    /// Path to config TOML file
    #[arg(long, default_value = "./config/channel-scout.toml")]
    config: PathBuf,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run every category once and persist discovered channels (default)
    Run {
        /// Skip writing the run ledger to discovery_runs
        #[arg(long)]
        no_run_log: bool,
    },
    /// Print what each category would discover without touching the database
    Preview,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs)?;

    info!("Channel Scout starting...");

    let file_config = load_config(&cli.config)?;
    let discovery = file_config.discovery;
    discovery.validate()?;

    let config = AppConfig::from_env()?;
    let client = match config.youtube_api_base_url.as_deref() {
        Some(base_url) => YouTubeClient::with_base_url(config.youtube_api_key.clone(), base_url)?,
        None => YouTubeClient::new(config.youtube_api_key.clone())?,
    };
    let api: Arc<dyn YouTubeApi> = Arc::new(client);

    let searcher = Arc::new(YouTubeSearcher::from_config(api.clone(), &discovery));
    let fetcher =
        Arc::new(YouTubeDetailFetcher::new(api).with_batch_size(discovery.detail_batch_size));

    match cli.command.unwrap_or(Command::Run { no_run_log: false }) {
        Command::Run { no_run_log } => {
            run(&config, searcher, fetcher, discovery, !no_run_log).await
        }
        Command::Preview => {
            let discoverer = Discoverer::new(searcher, fetcher, discovery.max_results);
            preview(&discoverer, &discovery).await;
            Ok(())
        }
    }
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("channel_scout=info,youtube_client=info"))?;
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

async fn run(
    config: &AppConfig,
    searcher: Arc<YouTubeSearcher>,
    fetcher: Arc<YouTubeDetailFetcher>,
    discovery: DiscoveryConfig,
    save_run_log: bool,
) -> Result<()> {
    let database_url = config.require_database_url()?;
    let store = Arc::new(
        PgChannelStore::connect(database_url, config.database_max_connections)
            .await
            .context("Failed to connect to database")?,
    );
    store.migrate().await.context("Failed to run migrations")?;
    info!("Migrations complete");

    let pipeline = DiscoveryPipeline::new(searcher, fetcher, store.clone(), discovery);
    let ledger = pipeline.run_once().await?;

    if save_run_log {
        if let Err(e) = store.save_run(&ledger).await {
            warn!(run_id = %ledger.run_id, error = %e, "Failed to save run log");
        }
    }

    Ok(())
}

/// Print discovered channels per category. Category failures are printed and
/// the preview moves on.
async fn preview(discoverer: &Discoverer, discovery: &DiscoveryConfig) {
    for category in &discovery.categories {
        println!("Category: {category}");
        let found = match discoverer.discover(category).await {
            Ok(found) => found,
            Err(e) => {
                println!("  ! {e}\n");
                continue;
            }
        };

        for result in &found.records {
            match result {
                Ok(channel) => {
                    println!("- {}", channel.title);
                    println!("  Subscribers: {}", channel.subscriber_count);
                    println!("  Videos:      {}", channel.video_count);
                    println!("  Description: {}", channel.description);
                }
                Err(e) => println!("- ! {e}"),
            }
        }
        for id in found.missing() {
            println!("- ! {id} not returned by detail lookup");
        }
        println!();
    }
}
