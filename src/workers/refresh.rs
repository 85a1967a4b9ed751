use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::LiveSource;
use crate::clock::Clock;
use crate::db::{CacheRepository, ReplaceSummary, StoreError};
use crate::models::standing::games_played;
use crate::models::{CacheStatus, Category, Dataset, PerCategory, Provenance, StatusUpdate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshState {
    #[default]
    Idle,
    Updating,
}

/// Why a batch was rejected before touching stored records
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No {0} records to load")]
    Empty(Category),

    #[error("Malformed {category} record: {reason}")]
    Malformed { category: Category, reason: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Refresh already in progress for {0}")]
    InProgress(Category),

    /// The scraper could only offer its built-in dataset
    #[error("Live data unavailable ({0})")]
    NotLive(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Refresh panicked: {0}")]
    Panicked(String),
}

/// Result of a completed manual load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub category: Category,
    pub records: usize,
    pub skipped: usize,
}

/// Exclusive right to refresh one category
#[derive(Debug)]
pub struct RefreshGuard {
    states: Arc<Mutex<PerCategory<RefreshState>>>,
    category: Category,
}

impl RefreshGuard {
    pub fn category(&self) -> Category {
        self.category
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        *states.get_mut(self.category) = RefreshState::Idle;
        debug!("Released refresh lock for {}", self.category);
    }
}

/// True when the category has never been scraped, its timestamp is
/// unreadable, or its TTL has passed
pub fn should_update(category: Category, status: Option<&CacheStatus>, now: DateTime<Utc>) -> bool {
    match status.and_then(|s| s.last_scraped) {
        Some(last_scraped) => now > last_scraped + category.ttl(),
        None => true,
    }
}

/// Reject batches that must not replace stored records
pub fn validate(dataset: &Dataset) -> Result<(), ValidationError> {
    let category = dataset.category();
    if dataset.is_empty() {
        return Err(ValidationError::Empty(category));
    }

    let malformed = |reason: String| ValidationError::Malformed { category, reason };

    match dataset {
        Dataset::Roster(players) => {
            for (i, player) in players.iter().enumerate() {
                if player.name.trim().is_empty() {
                    return Err(malformed(format!("player {} has no name", i + 1)));
                }
                if player.matches == 0 {
                    return Err(malformed(format!("{} has no appearances", player.name)));
                }
            }
        }
        Dataset::Fixtures(fixtures) => {
            for fixture in fixtures {
                if fixture.home_team.trim().is_empty() || fixture.away_team.trim().is_empty() {
                    return Err(malformed(format!("fixture on {} is missing a team", fixture.date)));
                }
            }
        }
        Dataset::Standing(Some(standing)) => {
            if standing.position == 0 {
                return Err(malformed("position must be positive".to_string()));
            }
            let record = (standing.won, standing.drawn, standing.lost);
            if games_played(record) != Some(standing.played) {
                return Err(malformed(format!(
                    "played {} does not match record {}-{}-{}",
                    standing.played, standing.won, standing.drawn, standing.lost
                )));
            }
        }
        Dataset::Standing(None) => {}
    }

    Ok(())
}

/// Owns the per-category refresh state and runs refreshes.
///
/// At most one refresh per category runs at a time. The slot is held by a
/// [`RefreshGuard`] and freed when the guard drops.
pub struct RefreshCoordinator {
    source: Arc<dyn LiveSource>,
    repository: CacheRepository,
    clock: Arc<dyn Clock>,
    states: Arc<Mutex<PerCategory<RefreshState>>>,
}

impl RefreshCoordinator {
    pub fn new(
        source: Arc<dyn LiveSource>,
        repository: CacheRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            repository,
            clock,
            states: Arc::new(Mutex::new(PerCategory::default())),
        }
    }

    pub fn repository(&self) -> &CacheRepository {
        &self.repository
    }

    pub fn state(&self, category: Category) -> RefreshState {
        *self
            .states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(category)
    }

    pub fn is_updating(&self, category: Category) -> bool {
        self.state(category) == RefreshState::Updating
    }

    /// Move the category from Idle to Updating, or `None` if already Updating
    pub fn try_begin(&self, category: Category) -> Option<RefreshGuard> {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        let state = states.get_mut(category);

        if *state == RefreshState::Updating {
            info!("Refresh already running for {}, skipping", category);
            return None;
        }

        *state = RefreshState::Updating;
        Some(RefreshGuard {
            states: Arc::clone(&self.states),
            category,
        })
    }

    /// Refresh a category now, unless one is already running
    pub async fn refresh(&self, category: Category) -> Result<ReplaceSummary, LoadError> {
        let guard = self
            .try_begin(category)
            .ok_or(LoadError::InProgress(category))?;
        self.run_refresh(guard).await
    }

    /// Awaited load of one category, reporting how many records were written
    pub async fn manual_load(&self, category: Category) -> Result<LoadReport, LoadError> {
        info!("Manual load requested for {}", category);
        let summary = self.refresh(category).await?;

        Ok(LoadReport {
            category,
            records: summary.inserted,
            skipped: summary.skipped,
        })
    }

    /// Run a refresh for the category the guard holds, releasing it at the end
    pub async fn run_refresh(&self, guard: RefreshGuard) -> Result<ReplaceSummary, LoadError> {
        let category = guard.category();
        info!("Starting refresh for {}", category);

        self.mark(category, StatusUpdate::started()).await;

        let result = match AssertUnwindSafe(self.scrape_and_replace(category))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => Err(LoadError::Panicked(panic_message(payload))),
        };

        match &result {
            Ok(summary) => {
                self.mark(category, StatusUpdate::succeeded(self.clock.now()))
                    .await;
                info!(
                    "Refresh for {} complete: {} records ({} skipped)",
                    category, summary.inserted, summary.skipped
                );
            }
            Err(e) => {
                self.mark(category, StatusUpdate::failed(e.to_string())).await;
                error!("Refresh for {} failed: {}", category, e);
            }
        }

        drop(guard);
        result
    }

    async fn scrape_and_replace(&self, category: Category) -> Result<ReplaceSummary, LoadError> {
        let scraped = self.source.fetch(category).await;
        debug!(
            "Scraped {} {} records from {}",
            scraped.data.len(),
            category,
            scraped.source
        );

        if scraped.provenance == Provenance::Fallback {
            return Err(LoadError::NotLive(scraped.source));
        }

        if scraped.data.category() != category {
            return Err(ValidationError::Malformed {
                category,
                reason: format!("received {} data", scraped.data.category()),
            }
            .into());
        }

        validate(&scraped.data)?;
        Ok(self.repository.replace(&scraped.data).await?)
    }

    async fn mark(&self, category: Category, update: StatusUpdate) {
        if let Err(e) = self.repository.apply_status(category, &update).await {
            warn!("Failed to update cache status for {}: {}", category, e);
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
