use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use club_stats::api::PageFetcher;
use club_stats::cache::{LiveSource, ScraperCache};
use club_stats::clock::{Clock, SystemClock};
use club_stats::config::Config;
use club_stats::db::{self, CacheRepository};
use club_stats::models::Category;
use club_stats::service::FootballDataService;
use club_stats::workers::{RefreshCoordinator, TaskExecutor};

const USAGE: &str = "usage: scrape [roster|fixtures|standing|all] [--load]";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scrape=info,club_stats=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse arguments
    let args: Vec<String> = env::args().skip(1).collect();
    let load = args.iter().any(|a| a == "--load" || a == "-l");
    let target = parse_target(&args)?;

    let config = Config::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let fetcher = PageFetcher::new(
        &config.target_url,
        config.proxies.clone(),
        Duration::from_secs(config.fetch_timeout),
    )?;
    let scraper = Arc::new(ScraperCache::new(
        Arc::new(fetcher),
        config.club.clone(),
        Arc::clone(&clock),
    ));

    if !load {
        info!("Scraping {} from {}", target_label(target), config.target_url);

        let output = match target {
            Some(category) => serde_json::to_string_pretty(&scraper.fetch(category).await)?,
            None => serde_json::to_string_pretty(&scraper.fetch_all().await)?,
        };
        println!("{}", output);
        return Ok(());
    }

    // Load into the configured store
    let store = db::open_store(&config.database_url).await?;
    let coordinator = Arc::new(RefreshCoordinator::new(
        scraper,
        CacheRepository::new(store),
        Arc::clone(&clock),
    ));
    let executor = TaskExecutor::new();
    let service = FootballDataService::new(coordinator, executor.clone(), clock);

    info!("Loading {} into {}", target_label(target), config.database_url);

    let output = match target {
        Some(category) => serde_json::to_string_pretty(&service.manual_load(category).await)?,
        None => serde_json::to_string_pretty(&service.populate_all().await?)?,
    };
    println!("{}", output);

    executor.shutdown().await;
    Ok(())
}

/// First positional argument; `all` or nothing means every category
fn parse_target(args: &[String]) -> Result<Option<Category>> {
    match args.iter().find(|a| !a.starts_with('-')) {
        None => Ok(None),
        Some(arg) if arg.eq_ignore_ascii_case("all") => Ok(None),
        Some(arg) => arg
            .parse()
            .map(Some)
            .with_context(|| USAGE.to_string()),
    }
}

fn target_label(target: Option<Category>) -> &'static str {
    target.map_or("all categories", |c| c.as_str())
}
