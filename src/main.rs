use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use feedmill::config::{Config, FeedSource};
use feedmill::feed::{fetcher, JsonFeed};
use feedmill::render;

/// Get the default config file path (~/.config/feedmill/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("feedmill")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "feedmill",
    about = "Fetch Atom, RSS and JSON feeds and list their articles"
)]
struct Args {
    /// Config file (defaults to ~/.config/feedmill/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write output to FILE instead of the configured output or stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the normalized feeds as a JSON array instead of HTML
    #[arg(long)]
    json: bool,

    /// Maximum number of articles in the HTML listing
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Feed URLs to fetch (replace the configured feeds)
    #[arg(value_name = "URL")]
    urls: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the rendered output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let sources: Vec<FeedSource> = if args.urls.is_empty() {
        config.feeds.clone()
    } else {
        let sources: Vec<FeedSource> = args.urls.iter().map(FeedSource::new).collect();
        for source in &sources {
            source.validate()?;
        }
        sources
    };

    if sources.is_empty() {
        anyhow::bail!(
            "No feeds to fetch: pass URLs on the command line or list them under `feeds` in {}",
            config_path.display()
        );
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("feedmill/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    tracing::info!(feeds = sources.len(), concurrency = config.concurrency, "Fetching feeds");
    let results = fetcher::fetch_all(&client, &sources, config.concurrency).await;

    let mut feeds: Vec<JsonFeed> = Vec::with_capacity(results.len());
    for outcome in results {
        match outcome.result {
            Ok(feed) => feeds.push(feed),
            Err(e) => {
                tracing::warn!(feed = %outcome.source.resource, error = %e, "Skipping feed");
            }
        }
    }

    if feeds.is_empty() {
        anyhow::bail!("All {} feeds failed", sources.len());
    }

    let rendered = if args.json {
        serde_json::to_string_pretty(&feeds).context("Failed to serialize feeds")?
    } else {
        let limit = args.limit.unwrap_or(config.max_items);
        render::render_html(&render::collect_articles(&feeds, limit))
    };

    match args.output.or(config.output) {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            tracing::info!(path = %path.display(), feeds = feeds.len(), "Wrote output");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
