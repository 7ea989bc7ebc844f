//! Shikimori aggregator CLI application.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::Config;
use shiki_aggregator::{AggregationService, CallContext, Credentials, ShikimoriClient};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Abort the upstream call after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search anime by name
    Search {
        /// Search term (defaults to "bakemono" when empty)
        #[arg(default_value = "")]
        query: String,

        #[arg(short, long, default_value_t = 10, allow_negative_numbers = true)]
        limit: i64,
    },

    /// List top ranked anime
    Top {
        #[arg(short, long, default_value_t = 30, allow_negative_numbers = true)]
        limit: i64,

        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,

        /// Genre id filter
        #[arg(short, long)]
        genre: Option<String>,
    },

    /// Show a single anime by id
    Show { id: String },

    /// Fetch several anime by id
    Batch {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List ongoing anime of the current season
    NewReleases {
        #[arg(short, long, default_value_t = 10, allow_negative_numbers = true)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = shared::LogConfig::from(&config.logging);
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "Loaded configuration");

    // Credentials are resolved once here and handed to the client
    let token = config.resolve_token();
    if token.is_none() {
        warn!(
            token_env = %config.upstream.token_env,
            "No upstream token configured, requests will be sent with an empty bearer credential"
        );
    }
    let client = ShikimoriClient::from_config(&config.upstream, Credentials::from_token(token))
        .context("Failed to create Shikimori client")?;
    info!(endpoint = %client.endpoint(), "Shikimori client ready");

    let service = AggregationService::new(client);

    // Ctrl-C cancels the in-flight call
    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let mut ctx = CallContext::child_of(&shutdown);
    if let Some(secs) = args.timeout_secs {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }

    let output = match args.command {
        Command::Search { query, limit } => {
            serde_json::to_string_pretty(&service.search_anime(&ctx, &query, limit).await?)
        }
        Command::Top { limit, page, genre } => serde_json::to_string_pretty(
            &service
                .get_top_anime(&ctx, limit, page, genre.as_deref())
                .await?,
        ),
        Command::Show { id } => {
            serde_json::to_string_pretty(&service.get_anime_by_id(&ctx, &id).await?)
        }
        Command::Batch { ids } => {
            serde_json::to_string_pretty(&service.get_animes_by_ids(&ctx, &ids).await?)
        }
        Command::NewReleases { limit } => {
            serde_json::to_string_pretty(&service.get_new_releases(&ctx, limit).await?)
        }
    }
    .context("Failed to serialize results")?;

    println!("{}", output);

    Ok(())
}
