use std::time::Duration;

use tokio::time;
use tracing::{info, warn};

use crate::service::FootballDataService;

/// Worker that periodically reads every category so stale caches refresh
/// even without traffic
pub struct CacheWarmerWorker {
    service: FootballDataService,
    warm_interval: Duration,
}

impl CacheWarmerWorker {
    pub fn new(service: FootballDataService, warm_interval_secs: u64) -> Self {
        Self {
            service,
            warm_interval: Duration::from_secs(warm_interval_secs.max(1)),
        }
    }

    /// Run the worker loop
    pub async fn run(&self) {
        info!("Cache warmer started (interval: {:?})", self.warm_interval);

        // The first tick completes immediately
        let mut interval = time::interval(self.warm_interval);

        loop {
            interval.tick().await;
            self.sweep().await;
        }
    }

    /// Perform a single sweep
    pub async fn sweep(&self) -> usize {
        let triggered = self.service.warm().await;

        if triggered > 0 {
            info!("Cache warmer triggered {} refreshes", triggered);
        } else {
            info!("No refreshes started");
        }

        let failing: Vec<_> = self
            .service
            .get_status()
            .await
            .into_iter()
            .filter_map(|s| s.error_message.map(|e| format!("{}: {}", s.category, e)))
            .collect();
        if !failing.is_empty() {
            warn!("Last refresh failed for {}", failing.join(", "));
        }

        triggered
    }
}
