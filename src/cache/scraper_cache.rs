use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use scraper::Html;
use tracing::{debug, info, warn};

use super::fallback;
use crate::api::PageSource;
use crate::clock::Clock;
use crate::config::ClubProfile;
use crate::models::{
    Category, ClubSnapshot, Dataset, FixtureRecord, PerCategory, Provenance, RosterEntry, Scraped,
    StandingSnapshot,
};
use crate::scrape::{self, extract_fixtures, extract_roster, extract_standing};

/// How long a full-page snapshot stays cached
const FULL_CACHE_MINUTES: i64 = 5;

/// Anything that can produce one category of scraped data
#[async_trait]
pub trait LiveSource: Send + Sync {
    /// Never fails: unusable results come back as fallback data
    async fn fetch(&self, category: Category) -> Scraped<Dataset>;
}

/// Last successful extraction and its fetch time in epoch milliseconds
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    fetched_at: i64,
}

/// Per-category in-process cache in front of the page fetcher
pub struct ScraperCache {
    source: Arc<dyn PageSource>,
    club: ClubProfile,
    clock: Arc<dyn Clock>,
    entries: Mutex<PerCategory<Option<CacheEntry<Dataset>>>>,
    full: Mutex<Option<CacheEntry<ClubSnapshot>>>,
}

impl ScraperCache {
    pub fn new(source: Arc<dyn PageSource>, club: ClubProfile, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            club,
            clock,
            entries: Mutex::new(PerCategory::default()),
            full: Mutex::new(None),
        }
    }

    /// True while the category holds data fetched less than its TTL ago
    pub fn is_cache_valid(&self, category: Category) -> bool {
        self.cached(category).is_some()
    }

    pub fn is_full_cache_valid(&self) -> bool {
        self.cached_full().is_some()
    }

    pub async fn fetch_roster(&self) -> Scraped<Vec<RosterEntry>> {
        self.fetch_category(Category::Roster).await.map(|data| match data {
            Dataset::Roster(players) => players,
            _ => Vec::new(),
        })
    }

    pub async fn fetch_fixtures(&self) -> Scraped<Vec<FixtureRecord>> {
        self.fetch_category(Category::Fixtures).await.map(|data| match data {
            Dataset::Fixtures(fixtures) => fixtures,
            _ => Vec::new(),
        })
    }

    pub async fn fetch_standing(&self) -> Scraped<Option<StandingSnapshot>> {
        self.fetch_category(Category::Standing).await.map(|data| match data {
            Dataset::Standing(standing) => standing,
            _ => None,
        })
    }

    /// All three categories from one page fetch, with its own cache
    pub async fn fetch_all(&self) -> Scraped<ClubSnapshot> {
        if let Some(hit) = self.cached_full() {
            info!("Using cached full snapshot");
            return Scraped::new(hit.data, Provenance::Cached, hit.fetched_at, "full");
        }

        info!("Fetching fresh full snapshot");
        let Some(html) = self.source.fetch_page().await else {
            warn!("Page unavailable, using fallback snapshot");
            return Scraped::new(
                fallback::snapshot(),
                Provenance::Fallback,
                self.clock.now_millis(),
                "full",
            );
        };

        let snapshot = scrape::extract_all(&html, &self.club, self.clock.now());
        if snapshot.squad.is_empty()
            && snapshot.past_fixtures.is_empty()
            && snapshot.league_position.is_none()
        {
            warn!("Page yielded no data, using fallback snapshot");
            return Scraped::new(
                fallback::snapshot(),
                Provenance::Fallback,
                self.clock.now_millis(),
                "full",
            );
        }

        let fetched_at = self.clock.now_millis();
        *self.full.lock().unwrap_or_else(|e| e.into_inner()) = Some(CacheEntry {
            data: snapshot.clone(),
            fetched_at,
        });

        Scraped::new(snapshot, Provenance::Live, fetched_at, "full")
    }

    async fn fetch_category(&self, category: Category) -> Scraped<Dataset> {
        let label = label(category);

        if let Some(hit) = self.cached(category) {
            info!("Using cached {} data", label);
            return Scraped::new(hit.data, Provenance::Cached, hit.fetched_at, label);
        }

        info!("Fetching fresh {} data", label);
        let Some(html) = self.source.fetch_page().await else {
            warn!("Page unavailable, using fallback {} data", label);
            return self.fallback(category);
        };

        let dataset = self.extract(category, &html);
        if dataset.is_empty() {
            warn!("No {} extracted from page, using fallback data", label);
            return self.fallback(category);
        }

        let fetched_at = self.clock.now_millis();
        *self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(category) = Some(CacheEntry {
            data: dataset.clone(),
            fetched_at,
        });

        info!("Cached {} {} records", dataset.len(), label);
        Scraped::new(dataset, Provenance::Live, fetched_at, label)
    }

    fn extract(&self, category: Category, html: &str) -> Dataset {
        let document = Html::parse_document(html);
        debug!("Parsed {} bytes for {}", html.len(), category);

        match category {
            Category::Roster => Dataset::Roster(extract_roster(&document, &self.club)),
            Category::Fixtures => {
                Dataset::Fixtures(extract_fixtures(&document, &self.club, self.clock.now()))
            }
            Category::Standing => Dataset::Standing(extract_standing(&document, &self.club)),
        }
    }

    fn fallback(&self, category: Category) -> Scraped<Dataset> {
        let data = match category {
            Category::Roster => Dataset::Roster(fallback::squad()),
            Category::Fixtures => Dataset::Fixtures(fallback::past_fixtures()),
            Category::Standing => Dataset::Standing(Some(fallback::league_position())),
        };

        Scraped::new(data, Provenance::Fallback, self.clock.now_millis(), label(category))
    }

    fn cached(&self, category: Category) -> Option<CacheEntry<Dataset>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(category)
            .as_ref()
            .filter(|entry| self.is_fresh(entry.fetched_at, category.ttl()))
            .cloned()
    }

    fn cached_full(&self) -> Option<CacheEntry<ClubSnapshot>> {
        let full = self.full.lock().unwrap_or_else(|e| e.into_inner());
        full.as_ref()
            .filter(|entry| self.is_fresh(entry.fetched_at, Duration::minutes(FULL_CACHE_MINUTES)))
            .cloned()
    }

    fn is_fresh(&self, fetched_at: i64, ttl: Duration) -> bool {
        self.clock.now_millis() - fetched_at < ttl.num_milliseconds()
    }
}

#[async_trait]
impl LiveSource for ScraperCache {
    async fn fetch(&self, category: Category) -> Scraped<Dataset> {
        self.fetch_category(category).await
    }
}

fn label(category: Category) -> &'static str {
    match category {
        Category::Roster => "squad",
        Category::Fixtures => "fixtures",
        Category::Standing => "standings",
    }
}
