use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::db::{CacheRepository, StoreError};
use crate::models::{CacheStatus, Category, Dataset};
use crate::workers::refresh::should_update;
use crate::workers::{LoadError, RefreshCoordinator, TaskExecutor};

/// Persisted records for one category plus freshness details
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub records: Dataset,

    /// True when the stored data is within its TTL
    pub is_live: bool,

    pub last_updated: Option<DateTime<Utc>>,

    pub source: String,

    /// Always true: reads never wait for a scrape
    pub from_cache: bool,

    pub needs_update: bool,

    /// A refresh for the category is running
    pub updating: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatus {
    pub category: Category,
    pub last_scraped: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub is_updating: bool,
    pub needs_update: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshAck {
    pub success: bool,
    pub message: String,
    /// Categories whose refresh was started; running ones are left alone
    pub initiated: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub success: bool,
    pub message: String,
    pub data_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulateReport {
    pub players_count: usize,
    pub fixtures_count: usize,
    pub standings_populated: bool,
}

/// Football data read path.
///
/// Reads answer from the store immediately and leave any refresh to the
/// background executor.
#[derive(Clone)]
pub struct FootballDataService {
    coordinator: Arc<RefreshCoordinator>,
    executor: TaskExecutor,
    clock: Arc<dyn Clock>,
}

impl FootballDataService {
    pub fn new(
        coordinator: Arc<RefreshCoordinator>,
        executor: TaskExecutor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            coordinator,
            executor,
            clock,
        }
    }

    fn repository(&self) -> &CacheRepository {
        self.coordinator.repository()
    }

    pub async fn get_roster_data(&self, force_update: bool) -> CategoryResponse {
        self.read(Category::Roster, force_update).await
    }

    pub async fn get_fixtures_data(&self, force_update: bool) -> CategoryResponse {
        self.read(Category::Fixtures, force_update).await
    }

    pub async fn get_standing_data(&self, force_update: bool) -> CategoryResponse {
        self.read(Category::Standing, force_update).await
    }

    /// Stored records for a category, starting a background refresh when
    /// they are stale or `force_update` is set
    pub async fn read(&self, category: Category, force_update: bool) -> CategoryResponse {
        self.read_and_refresh(category, force_update).await.0
    }

    /// Read path that also reports whether this call started a refresh
    async fn read_and_refresh(
        &self,
        category: Category,
        force_update: bool,
    ) -> (CategoryResponse, bool) {
        let records = match self.repository().records(category).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to read {} from store, using empty data: {}", category, e);
                empty(category)
            }
        };

        let status = self.status_or_none(category).await;
        let needs_update =
            force_update || should_update(category, status.as_ref(), self.clock.now());

        let started = needs_update && self.spawn_refresh(category);

        info!("Retrieved {} {} records from store", records.len(), category);

        let last_scraped = status
            .as_ref()
            .and_then(|s| s.last_scraped)
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string());

        let response = CategoryResponse {
            records,
            is_live: !needs_update,
            last_updated: status.as_ref().and_then(|s| s.last_updated),
            source: format!("Database (last scraped: {})", last_scraped),
            from_cache: true,
            needs_update,
            updating: self.coordinator.is_updating(category),
        };

        (response, started)
    }

    /// Cache status for every category
    pub async fn get_status(&self) -> Vec<CategoryStatus> {
        let now = self.clock.now();
        let mut report = Vec::with_capacity(Category::ALL.len());

        for category in Category::ALL {
            let status = self.status_or_none(category).await;
            let in_flight = self.coordinator.is_updating(category);

            report.push(match status {
                Some(status) => CategoryStatus {
                    category,
                    last_scraped: status.last_scraped,
                    last_updated: status.last_updated,
                    is_updating: status.is_updating || in_flight,
                    needs_update: should_update(category, Some(&status), now),
                    error_message: status.error_message,
                },
                None => CategoryStatus {
                    category,
                    last_scraped: None,
                    last_updated: None,
                    is_updating: in_flight,
                    needs_update: true,
                    error_message: None,
                },
            });
        }

        report
    }

    /// Start background refreshes for every category without waiting
    pub fn force_refresh_all(&self) -> RefreshAck {
        info!("Starting force refresh of all categories");

        let initiated: Vec<Category> = Category::ALL
            .into_iter()
            .filter(|category| self.spawn_refresh(*category))
            .collect();

        RefreshAck {
            success: true,
            message: "All data refresh initiated".to_string(),
            initiated,
        }
    }

    /// Awaited fetch, validate and replace for one category
    pub async fn manual_load(&self, category: Category) -> LoadResponse {
        match self.coordinator.manual_load(category).await {
            Ok(report) => LoadResponse {
                success: true,
                message: format!("Loaded {} {} records", report.records, category),
                data_count: report.records,
            },
            Err(e) => {
                warn!("Manual load of {} failed: {}", category, e);
                LoadResponse {
                    success: false,
                    message: e.to_string(),
                    data_count: 0,
                }
            }
        }
    }

    /// Refresh all three categories in turn, waiting for each, then count
    /// what the store holds
    pub async fn populate_all(&self) -> Result<PopulateReport, StoreError> {
        for category in Category::ALL {
            match self.coordinator.refresh(category).await {
                Ok(summary) => info!("Populated {} with {} records", category, summary.inserted),
                Err(LoadError::InProgress(_)) => {
                    info!("Refresh for {} already running, counting current data", category)
                }
                Err(e) => warn!("Populating {} failed: {}", category, e),
            }
        }

        let report = PopulateReport {
            players_count: self.repository().players().await?.len(),
            fixtures_count: self.repository().fixtures().await?.len(),
            standings_populated: self.repository().standing().await?.is_some(),
        };

        info!("Populate completed: {:?}", report);
        Ok(report)
    }

    /// Read every category once so stale ones start refreshing. Returns the
    /// number of refreshes started; categories already refreshing are not counted.
    pub async fn warm(&self) -> usize {
        let mut started = 0;
        for category in Category::ALL {
            if self.read_and_refresh(category, false).await.1 {
                started += 1;
            }
        }
        started
    }

    /// Hand a refresh to the executor. Returns false if one is already
    /// running or the executor is shut down.
    fn spawn_refresh(&self, category: Category) -> bool {
        let Some(guard) = self.coordinator.try_begin(category) else {
            return false;
        };

        let coordinator = Arc::clone(&self.coordinator);
        self.executor.spawn(category.as_str(), async move {
            // Outcome is recorded in the cache status
            let _ = coordinator.run_refresh(guard).await;
        })
    }

    async fn status_or_none(&self, category: Category) -> Option<CacheStatus> {
        match self.repository().cache_status(category).await {
            Ok(status) => status,
            Err(e) => {
                warn!("Failed to read cache status for {}: {}", category, e);
                None
            }
        }
    }
}

fn empty(category: Category) -> Dataset {
    match category {
        Category::Roster => Dataset::Roster(Vec::new()),
        Category::Fixtures => Dataset::Fixtures(Vec::new()),
        Category::Standing => Dataset::Standing(None),
    }
}
