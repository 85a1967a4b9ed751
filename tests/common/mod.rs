#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use club_stats::cache::{fallback, LiveSource};
use club_stats::clock::{Clock, ManualClock};
use club_stats::db::{CacheRepository, MemoryStore, RecordStore};
use club_stats::models::{
    Category, Dataset, FixtureRecord, PerCategory, Provenance, RosterEntry, Scraped,
    StandingSnapshot,
};
use club_stats::service::FootballDataService;
use club_stats::workers::{RefreshCoordinator, TaskExecutor};

/// Live source that returns whatever the test scripted for each category
#[derive(Default)]
pub struct ScriptedSource {
    results: Mutex<PerCategory<Option<Scraped<Dataset>>>>,
    calls: Mutex<PerCategory<usize>>,
    gate: Mutex<Option<Arc<Notify>>>,
    panic_on: Mutex<Option<Category>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serve `dataset` as freshly scraped
    pub fn live(&self, dataset: Dataset) {
        self.script(dataset, Provenance::Live);
    }

    /// Serve `dataset` as the built-in fallback
    pub fn fallback(&self, dataset: Dataset) {
        self.script(dataset, Provenance::Fallback);
    }

    fn script(&self, dataset: Dataset, provenance: Provenance) {
        let category = dataset.category();
        let scraped = Scraped::new(dataset, provenance, 0, category.as_str());
        *self.results.lock().unwrap().get_mut(category) = Some(scraped);
    }

    /// Make every following fetch wait until the returned gate is notified
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn release_hold(&self) {
        *self.gate.lock().unwrap() = None;
    }

    pub fn panic_on(&self, category: Category) {
        *self.panic_on.lock().unwrap() = Some(category);
    }

    pub fn calls(&self, category: Category) -> usize {
        *self.calls.lock().unwrap().get(category)
    }

    /// Wait until `category` has been fetched `count` times
    pub async fn wait_for_calls(&self, category: Category, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls(category) < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("fetch was never called");
    }
}

#[async_trait]
impl LiveSource for ScriptedSource {
    async fn fetch(&self, category: Category) -> Scraped<Dataset> {
        *self.calls.lock().unwrap().get_mut(category) += 1;

        if *self.panic_on.lock().unwrap() == Some(category) {
            panic!("scraper exploded");
        }

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let scripted = self.results.lock().unwrap().get(category).clone();
        scripted.unwrap_or_else(|| {
            let empty = match category {
                Category::Roster => Dataset::Roster(Vec::new()),
                Category::Fixtures => Dataset::Fixtures(Vec::new()),
                Category::Standing => Dataset::Standing(None),
            };
            Scraped::new(empty, Provenance::Fallback, 0, category.as_str())
        })
    }
}

pub struct Harness {
    pub source: Arc<ScriptedSource>,
    pub clock: Arc<ManualClock>,
    pub repository: CacheRepository,
    pub coordinator: Arc<RefreshCoordinator>,
    pub executor: TaskExecutor,
    pub service: FootballDataService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn RecordStore>) -> Self {
        let source = ScriptedSource::new();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap(),
        ));
        let repository = CacheRepository::new(store);
        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::clone(&source) as Arc<dyn LiveSource>,
            repository.clone(),
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        let executor = TaskExecutor::new();
        let service = FootballDataService::new(
            Arc::clone(&coordinator),
            executor.clone(),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );

        Self {
            source,
            clock,
            repository,
            coordinator,
            executor,
            service,
        }
    }
}

/// `n` players who have all featured this season
pub fn roster(n: usize) -> Vec<RosterEntry> {
    fallback::squad()
        .into_iter()
        .take(n)
        .map(|mut player| {
            player.matches = 10;
            player
        })
        .collect()
}

pub fn fixtures() -> Vec<FixtureRecord> {
    fallback::past_fixtures()
}

pub fn standing() -> StandingSnapshot {
    StandingSnapshot::new(3, 69, (19, 12, 11), 14, "2024-25")
}
