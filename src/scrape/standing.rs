use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use tracing::{debug, warn};

use crate::config::ClubProfile;
use crate::models::standing::games_played;
use crate::models::StandingSnapshot;

const DEFAULT_POSITION: u32 = 5;
const DEFAULT_POINTS: u32 = 2;
const DEFAULT_RECORD: (u32, u32, u32) = (20, 11, 11);
const DEFAULT_GOAL_DIFFERENCE: i32 = 14;

static POINTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+points").expect("valid regex"));
// Also matches ISO dates; the first hit on the page wins
static RECORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)-(\d+)-(\d+)").expect("valid regex"));
static GOAL_DIFFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Diff:\s*([+-]?\d+)").expect("valid regex"));

/// League standing from the page's free text
pub fn extract_standing(document: &Html, club: &ClubProfile) -> Option<StandingSnapshot> {
    let text: String = document.root_element().text().collect();
    standing_from_text(&text, club)
}

/// Pattern-match the standing summary; every missing field takes its default.
///
/// Returns `None` only when the league phrase cannot be turned into a pattern.
pub fn standing_from_text(text: &str, club: &ClubProfile) -> Option<StandingSnapshot> {
    let position_pattern = match position_regex(&club.league) {
        Ok(re) => re,
        Err(e) => {
            warn!("Could not build position pattern for {}: {}", club.league, e);
            return None;
        }
    };

    let position = first_number(&position_pattern, text).unwrap_or(DEFAULT_POSITION);
    let points = first_number(&POINTS, text).unwrap_or(DEFAULT_POINTS);

    let record = RECORD
        .captures(text)
        .and_then(|caps| {
            let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
            Some((part(1)?, part(2)?, part(3)?))
        })
        .filter(|record| games_played(*record).is_some())
        .unwrap_or(DEFAULT_RECORD);

    let goal_difference = GOAL_DIFFERENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(DEFAULT_GOAL_DIFFERENCE);

    let standing = StandingSnapshot::new(position, points, record, goal_difference, &club.season);
    debug!(
        "Standing: {} place, {} points, {}-{}-{}, GD {}",
        standing.position,
        standing.points,
        standing.won,
        standing.drawn,
        standing.lost,
        standing.goal_difference
    );

    Some(standing)
}

/// `"5th in Segunda División"` style phrase, tolerant of spacing
fn position_regex(league: &str) -> Result<Regex, regex::Error> {
    let league = league
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    Regex::new(&format!(r"(\d+)(?:st|nd|rd|th)\s+in\s+{}", league))
}

fn first_number(pattern: &Regex, text: &str) -> Option<u32> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_patterns_gives_defaults() {
        let standing = standing_from_text("nothing useful here", &ClubProfile::default()).unwrap();

        assert_eq!(standing.position, 5);
        assert_eq!(standing.points, 2);
        assert_eq!((standing.won, standing.drawn, standing.lost), (20, 11, 11));
        assert_eq!(standing.played, 42);
        assert_eq!(standing.goal_difference, 14);
        assert_eq!(standing.season, "2024-25");
    }

    #[test]
    fn test_full_summary() {
        let text = "Record: 19-12-11, 69 points (1.64 per game), 3rd in Segunda División \
                    Goals: 58 (1.38 per game), Goals Against: 44, Goal Diff: +14";
        let standing = standing_from_text(text, &ClubProfile::default()).unwrap();

        assert_eq!(standing.position, 3);
        assert_eq!(standing.points, 69);
        assert_eq!((standing.won, standing.drawn, standing.lost), (19, 12, 11));
        assert_eq!(standing.played, 42);
        assert_eq!(standing.goal_difference, 14);
    }

    #[test]
    fn test_negative_goal_difference_and_spacing() {
        let text = "21st   in  Segunda   División, Diff: -9";
        let standing = standing_from_text(text, &ClubProfile::default()).unwrap();

        assert_eq!(standing.position, 21);
        assert_eq!(standing.goal_difference, -9);
    }

    #[test]
    fn test_overflowing_record_uses_default() {
        let text = "Record: 4000000000-4000000000-4000000000, 5 points";
        let standing = standing_from_text(text, &ClubProfile::default()).unwrap();

        assert_eq!((standing.won, standing.drawn, standing.lost), (20, 11, 11));
        assert_eq!(standing.played, 42);
        assert_eq!(standing.points, 5);
    }

    #[test]
    fn test_position_requires_configured_league() {
        let text = "1st in Premier League";
        let standing = standing_from_text(text, &ClubProfile::default()).unwrap();
        assert_eq!(standing.position, 5);
    }

    #[test]
    fn test_extract_from_document() {
        let document = Html::parse_document(
            "<html><body><p><strong>Record:</strong> 10-5-3, 35 points</p>\
             <p>2nd in Segunda División</p></body></html>",
        );
        let standing = extract_standing(&document, &ClubProfile::default()).unwrap();

        assert_eq!(standing.position, 2);
        assert_eq!(standing.points, 35);
        assert_eq!(standing.played, 18);
    }
}
