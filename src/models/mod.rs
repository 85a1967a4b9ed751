pub mod cache_status;
pub mod category;
pub mod dataset;
pub mod fixture;
pub mod player;
pub mod standing;

pub use cache_status::{CacheStatus, StatusUpdate};
pub use category::{Category, PerCategory};
pub use dataset::{ClubSnapshot, Dataset, Provenance, Scraped};
pub use fixture::{FixtureRecord, MatchResult};
pub use player::{Position, RosterEntry};
pub use standing::StandingSnapshot;
