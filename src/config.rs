use std::env;

use anyhow::{Context, Result};

use crate::api::AccessRoute;

const DEFAULT_TARGET_URL: &str = "https://fbref.com/en/squads/dee3bbc8/Racing-Santander-Stats";

const DEFAULT_PROXIES: &str = "https://api.allorigins.win/raw?url=,\
raw:https://cors-anywhere.herokuapp.com/,\
https://thingproxy.freeboard.io/fetch/";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Page holding the tracked club's squad, match log and standing
    pub target_url: String,

    /// Ordered access routes tried by the fetcher
    pub proxies: Vec<AccessRoute>,

    /// Per-attempt network timeout in seconds
    pub fetch_timeout: u64,

    /// Interval in seconds between cache warmer sweeps
    pub cache_warm_interval: u64,

    /// SQLite database URL, or `memory` for the in-process store
    pub database_url: String,

    /// Club and league details used during extraction
    pub club: ClubProfile,
}

/// Identity of the tracked club and the league it plays in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubProfile {
    /// Display name used for the club's side of each fixture
    pub name: String,

    /// Team identifier used to build the club's crest URL
    pub team_id: String,

    /// Venue label for home fixtures
    pub home_venue: String,

    /// League label, used as the default competition and in the standing phrase
    pub league: String,

    /// Season label stamped on standing snapshots
    pub season: String,

    /// Nationality used when a roster row has none
    pub default_nationality: String,
}

impl Default for ClubProfile {
    fn default() -> Self {
        Self {
            name: "Racing de Santander".to_string(),
            team_id: "dee3bbc8".to_string(),
            home_venue: "El Sardinero".to_string(),
            league: "Segunda División".to_string(),
            season: "2024-25".to_string(),
            default_nationality: "Spain".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = ClubProfile::default();

        Ok(Config {
            target_url: env::var("SCRAPE_TARGET_URL")
                .unwrap_or_else(|_| DEFAULT_TARGET_URL.to_string()),

            proxies: parse_routes(
                &env::var("SCRAPE_PROXIES").unwrap_or_else(|_| DEFAULT_PROXIES.to_string()),
            ),

            fetch_timeout: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("FETCH_TIMEOUT_SECS must be a valid number")?,

            cache_warm_interval: env::var("CACHE_WARM_INTERVAL")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("CACHE_WARM_INTERVAL must be a valid number")?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/football.db".to_string()),

            club: ClubProfile {
                name: env::var("CLUB_NAME").unwrap_or(defaults.name),
                team_id: env::var("CLUB_TEAM_ID").unwrap_or(defaults.team_id),
                home_venue: env::var("CLUB_VENUE").unwrap_or(defaults.home_venue),
                league: env::var("LEAGUE_NAME").unwrap_or(defaults.league),
                season: env::var("SEASON").unwrap_or(defaults.season),
                default_nationality: env::var("DEFAULT_NATIONALITY")
                    .unwrap_or(defaults.default_nationality),
            },
        })
    }
}

/// Parse a comma separated route list. A `raw:` prefix marks a route that
/// takes the target URL without percent-encoding.
pub fn parse_routes(value: &str) -> Vec<AccessRoute> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.strip_prefix("raw:") {
            Some(base) => AccessRoute::raw(base),
            None => AccessRoute::encoded(entry),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routes_keep_order_and_encoding() {
        let routes = parse_routes(DEFAULT_PROXIES);

        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].base, "https://api.allorigins.win/raw?url=");
        assert!(routes[0].encode_target);
        assert_eq!(routes[1].base, "https://cors-anywhere.herokuapp.com/");
        assert!(!routes[1].encode_target);
        assert!(routes[2].encode_target);
    }

    #[test]
    fn test_blank_entries_are_ignored() {
        let routes = parse_routes(" , https://a.example/?u= ,");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].base, "https://a.example/?u=");
    }
}
