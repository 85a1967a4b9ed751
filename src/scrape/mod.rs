pub mod fixtures;
pub mod roster;
pub mod standing;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::config::ClubProfile;
use crate::models::ClubSnapshot;

pub use fixtures::extract_fixtures;
pub use roster::extract_roster;
pub use standing::{extract_standing, standing_from_text};

/// Parse the page once and run all three extractions.
///
/// Never fails: missing anchors give empty results and unparseable fields
/// take fixed defaults.
pub fn extract_all(html: &str, club: &ClubProfile, now: DateTime<Utc>) -> ClubSnapshot {
    let document = Html::parse_document(html);

    let tables = document.select(&selector("table")).count();
    debug!("Parsed page: {} bytes, {} tables", html.len(), tables);

    let snapshot = ClubSnapshot {
        squad: extract_roster(&document, club),
        past_fixtures: extract_fixtures(&document, club, now),
        league_position: extract_standing(&document, club),
    };

    info!(
        "Extracted {} players, {} fixtures, standing {}",
        snapshot.squad.len(),
        snapshot.past_fixtures.len(),
        if snapshot.league_position.is_some() {
            "found"
        } else {
            "missing"
        }
    );

    snapshot
}

/// Build a selector from a literal known to be valid
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

/// Text content of an element with surrounding whitespace removed
pub(crate) fn cell_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First descendant matching any of the selectors, tried in order
pub(crate) fn find_cell<'a>(row: ElementRef<'a>, selectors: &[&Selector]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|selector| row.select(selector).next())
}

/// Integer content of a cell, `None` when absent or not a number
pub(crate) fn cell_number(cell: Option<ElementRef<'_>>) -> Option<u32> {
    cell.and_then(|c| cell_text(c).parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_all_on_empty_page_keeps_standing_defaults() {
        let snapshot = extract_all("<html><body></body></html>", &ClubProfile::default(), Utc::now());

        assert!(snapshot.squad.is_empty());
        assert!(snapshot.past_fixtures.is_empty());
        let standing = snapshot.league_position.unwrap();
        assert_eq!(standing.position, 5);
        assert_eq!(standing.played, 42);
    }

    #[test]
    fn test_cell_text_trims() {
        let document = Html::parse_fragment("<table><tr><td> 12 </td></tr></table>");
        let td = selector("td");
        let cell = document.select(&td).next();

        assert_eq!(cell.map(cell_text).as_deref(), Some("12"));
        assert_eq!(cell_number(cell), Some(12));
    }
}
