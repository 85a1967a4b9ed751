use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use super::{cell_number, cell_text, find_cell, selector};
use crate::config::ClubProfile;
use crate::models::{FixtureRecord, MatchResult};

/// Number of completed matches kept
pub const RECENT_FIXTURES: usize = 3;

const CREST_BASE: &str = "https://cdn.ssref.net/req/202507211/tlogo/fb";

/// Probed in order when the primary match log table is missing
const ALTERNATIVE_TABLES: [&str; 4] = [
    r#"table[id*="matchlogs"]"#,
    r#"table[id*="results"]"#,
    r#"table[id*="fixtures"]"#,
    r#"table[id*="scores"]"#,
];

static MATCH_LOG: LazyLock<Selector> = LazyLock::new(|| selector("table#matchlogs_for"));
static ALTERNATIVES: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    ALTERNATIVE_TABLES
        .iter()
        .map(|css| (*css, selector(css)))
        .collect()
});
static TBODY: LazyLock<Selector> = LazyLock::new(|| selector("tbody"));
static DATA_ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr[data-row]"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a"));

static DATE_TH: LazyLock<Selector> = LazyLock::new(|| selector(r#"th[data-stat="date"]"#));
static DATE_TD: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="date"]"#));
static COMP: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="comp"]"#));
static ROUND: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="round"]"#));
static VENUE: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="venue"]"#));
static GOALS_FOR: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"td[data-stat="goals_for"]"#));
static GF: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="gf"]"#));
static GOALS_AGAINST: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"td[data-stat="goals_against"]"#));
static GA: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="ga"]"#));
static OPPONENT: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="opponent"]"#));
static TEAM: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="team"]"#));
static ATTENDANCE: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"td[data-stat="attendance"]"#));
static REFEREE: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="referee"]"#));

static SQUAD_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/en/squads/([a-f0-9]+)/").expect("valid regex"));

/// Extract the most recent completed matches from the match log, newest first
pub fn extract_fixtures(document: &Html, club: &ClubProfile, now: DateTime<Utc>) -> Vec<FixtureRecord> {
    let Some(table) = find_match_log(document) else {
        warn!("No fixtures table found with any selector");
        return Vec::new();
    };

    let Some(tbody) = table.select(&TBODY).next() else {
        warn!("No tbody found in fixtures table");
        return Vec::new();
    };

    let mut rows: Vec<ElementRef<'_>> = tbody.select(&DATA_ROW).collect();
    if rows.is_empty() {
        debug!("No rows with data-row attribute, using all rows");
        rows = tbody.select(&ROW).collect();
    }
    debug!("Found {} rows in fixtures table", rows.len());

    let mut fixtures = Vec::with_capacity(RECENT_FIXTURES);

    for row in rows.into_iter().rev() {
        if fixtures.len() >= RECENT_FIXTURES {
            break;
        }

        if row.value().classes().any(|class| class == "thead") {
            continue;
        }

        if let Some(fixture) = parse_row(row, club, now, fixtures.len() as i64 + 1) {
            fixtures.push(fixture);
        }
    }

    info!("Extracted {} fixtures from match log", fixtures.len());
    for fixture in &fixtures {
        debug!(
            "  {} {}-{} {} ({})",
            fixture.home_team,
            fixture.home_score,
            fixture.away_score,
            fixture.away_team,
            fixture.result.code()
        );
    }

    fixtures
}

fn find_match_log(document: &Html) -> Option<ElementRef<'_>> {
    if let Some(table) = document.select(&MATCH_LOG).next() {
        return Some(table);
    }

    warn!("Fixtures table not found with id matchlogs_for");
    ALTERNATIVES.iter().find_map(|(css, sel)| {
        let table = document.select(sel).next()?;
        info!("Found alternative fixtures table with selector: {}", css);
        Some(table)
    })
}

/// Build a fixture from a match log row. `None` for rows missing a required
/// cell or without a final score on both sides.
fn parse_row(
    row: ElementRef<'_>,
    club: &ClubProfile,
    now: DateTime<Utc>,
    id: i64,
) -> Option<FixtureRecord> {
    let date_cell = find_cell(row, &[&*DATE_TH, &*DATE_TD])?;
    let opponent_cell = find_cell(row, &[&*OPPONENT, &*TEAM])?;
    let goals_for_cell = find_cell(row, &[&*GOALS_FOR, &*GF])?;
    let goals_against_cell = find_cell(row, &[&*GOALS_AGAINST, &*GA])?;

    let goals_for = cell_number(Some(goals_for_cell))?;
    let goals_against = cell_number(Some(goals_against_cell))?;

    let (opponent, opponent_id) = match opponent_cell.select(&LINK).next() {
        Some(link) => (
            cell_text(link),
            link.value()
                .attr("href")
                .and_then(|href| SQUAD_ID.captures(href))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
        ),
        None => (cell_text(opponent_cell), None),
    };

    let club_is_home = text_of(row, &VENUE).eq_ignore_ascii_case("home");

    let club_logo = crest_url(&club.team_id);
    let opponent_logo = match opponent_id {
        Some(id) => crest_url(&id),
        None => placeholder_crest(&opponent),
    };

    let (home_team, away_team, home_score, away_score, home_logo, away_logo) = if club_is_home {
        (club.name.clone(), opponent, goals_for, goals_against, club_logo, opponent_logo)
    } else {
        (opponent, club.name.clone(), goals_against, goals_for, opponent_logo, club_logo)
    };

    let competition = row
        .select(&COMP)
        .next()
        .map(cell_text)
        .unwrap_or_else(|| club.league.clone());

    Some(FixtureRecord {
        id,
        date: parse_date(&cell_text(date_cell)).unwrap_or(now),
        home_team,
        away_team,
        home_logo,
        away_logo,
        competition,
        round: text_of(row, &ROUND),
        venue: if club_is_home {
            club.home_venue.clone()
        } else {
            "Away".to_string()
        },
        home_score,
        away_score,
        result: MatchResult::from_scores(home_score, away_score, club_is_home),
        attendance: text_of(row, &ATTENDANCE),
        referee: text_of(row, &REFEREE),
    })
}

fn text_of(row: ElementRef<'_>, cell: &Selector) -> String {
    row.select(cell).next().map(cell_text).unwrap_or_default()
}

/// Match log dates are plain `YYYY-MM-DD`
fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

pub fn crest_url(team_id: &str) -> String {
    format!("{}/{}.png", CREST_BASE, team_id)
}

/// Local crest path for a team whose identifier is unknown
pub fn placeholder_crest(team: &str) -> String {
    let slug = team
        .to_lowercase()
        .replace(' ', "")
        .replace("de", "")
        .replace('ñ', "n");
    format!("/images/{}.png", slug)
}
