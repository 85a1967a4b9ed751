use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use club_stats::api::PageFetcher;
use club_stats::cache::ScraperCache;
use club_stats::clock::{Clock, SystemClock};
use club_stats::config::Config;
use club_stats::db::{self, CacheRepository};
use club_stats::service::FootballDataService;
use club_stats::workers::{CacheWarmerWorker, RefreshCoordinator, TaskExecutor};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "club_stats=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting club-stats");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: {} ({} routes)",
        config.club.name,
        config.proxies.len()
    );

    // Initialize database
    let store = db::open_store(&config.database_url).await?;
    let repository = CacheRepository::new(store);
    match repository.reset_updating_flags().await {
        Ok(0) => {}
        Ok(n) => info!("Reset {} stale updating flags", n),
        Err(e) => warn!("Failed to reset updating flags: {}", e),
    }
    info!("Database initialized");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Scraping pipeline
    let fetcher = PageFetcher::new(
        &config.target_url,
        config.proxies.clone(),
        Duration::from_secs(config.fetch_timeout),
    )?;
    info!("Fetcher ready for {}", fetcher.target_url());

    let scraper = Arc::new(ScraperCache::new(
        Arc::new(fetcher),
        config.club.clone(),
        Arc::clone(&clock),
    ));

    let coordinator = Arc::new(RefreshCoordinator::new(
        scraper,
        repository,
        Arc::clone(&clock),
    ));
    let executor = TaskExecutor::new();
    let service = FootballDataService::new(coordinator, executor.clone(), Arc::clone(&clock));

    // Create workers
    let cache_warmer = CacheWarmerWorker::new(service, config.cache_warm_interval);

    let warmer_handle = tokio::spawn(async move {
        cache_warmer.run().await;
    });

    info!("Cache warmer started");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = warmer_handle => {
            error!("Cache warmer exited unexpectedly: {:?}", result);
        }
    }

    executor.shutdown().await;

    info!("Shutting down club-stats");
    Ok(())
}
