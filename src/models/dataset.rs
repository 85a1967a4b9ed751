use serde::Serialize;

use super::{Category, FixtureRecord, RosterEntry, StandingSnapshot};

/// One category's worth of extracted records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Dataset {
    Roster(Vec<RosterEntry>),
    Fixtures(Vec<FixtureRecord>),
    Standing(Option<StandingSnapshot>),
}

impl Dataset {
    pub fn category(&self) -> Category {
        match self {
            Dataset::Roster(_) => Category::Roster,
            Dataset::Fixtures(_) => Category::Fixtures,
            Dataset::Standing(_) => Category::Standing,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dataset::Roster(players) => players.len(),
            Dataset::Fixtures(fixtures) => fixtures.len(),
            Dataset::Standing(standing) => usize::from(standing.is_some()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where a scraped result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Fetched and extracted just now
    Live,
    /// Served from a still-valid in-process cache
    Cached,
    /// Built-in dataset used because fetch or extraction failed
    Fallback,
}

/// A scraper result annotated with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scraped<T> {
    pub data: T,

    #[serde(skip)]
    pub provenance: Provenance,

    pub is_live: bool,

    /// Epoch milliseconds of the fetch that produced `data`
    pub last_updated: i64,

    pub source: String,
}

impl<T> Scraped<T> {
    pub fn new(data: T, provenance: Provenance, last_updated: i64, label: &str) -> Self {
        let kind = match provenance {
            Provenance::Live => "live",
            Provenance::Cached => "cached",
            Provenance::Fallback => "fallback",
        };

        Self {
            data,
            provenance,
            is_live: provenance != Provenance::Fallback,
            last_updated,
            source: format!("FBref.com ({} {})", label, kind),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Scraped<U> {
        Scraped {
            data: f(self.data),
            provenance: self.provenance,
            is_live: self.is_live,
            last_updated: self.last_updated,
            source: self.source,
        }
    }
}

/// All three categories from a single page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSnapshot {
    pub squad: Vec<RosterEntry>,
    pub past_fixtures: Vec<FixtureRecord>,
    pub league_position: Option<StandingSnapshot>,
}
