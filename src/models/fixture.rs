use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed match involving the tracked club
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureRecord {
    #[serde(default)]
    pub id: i64,

    /// Kick-off date
    pub date: DateTime<Utc>,

    pub home_team: String,

    pub away_team: String,

    /// Crest URL or local placeholder path
    pub home_logo: String,

    pub away_logo: String,

    pub competition: String,

    /// Round or stage label
    pub round: String,

    /// Home venue name, or "Away"
    pub venue: String,

    pub home_score: u32,

    pub away_score: u32,

    /// Result from the tracked club's perspective
    pub result: MatchResult,

    #[serde(default)]
    pub attendance: String,

    #[serde(default)]
    pub referee: String,
}

/// Match outcome for the tracked club
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl MatchResult {
    /// Derive the outcome from the final score and which side the club was on
    pub fn from_scores(home_score: u32, away_score: u32, club_is_home: bool) -> Self {
        let (club, opponent) = if club_is_home {
            (home_score, away_score)
        } else {
            (away_score, home_score)
        };

        if club > opponent {
            MatchResult::Win
        } else if club < opponent {
            MatchResult::Loss
        } else {
            MatchResult::Draw
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MatchResult::Win => "W",
            MatchResult::Draw => "D",
            MatchResult::Loss => "L",
        }
    }
}
