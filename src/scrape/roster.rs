use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use super::{cell_number, cell_text, selector};
use crate::config::ClubProfile;
use crate::models::{Position, RosterEntry};

const DEFAULT_AGE: u32 = 25;

const HEADSHOT_BASE: &str = "https://fbref.com/req/202302030/images/headshots";

/// Aggregate rows at the foot of the stats table
const AGGREGATE_ROWS: [&str; 2] = ["Squad Total", "Opponent Total"];

/// Shirt numbers, which the stats table does not carry
const SHIRT_NUMBERS: &[(&str, &str)] = &[
    ("Joakin Ezkieta", "1"),
    ("Andrés Martín", "10"),
    ("Iñigo Vicente", "11"),
    ("Aldasoro", "8"),
    ("Unai Vencedor Paris", "6"),
    ("Javier Castro", "3"),
    ("Pablo Rodríguez", "7"),
    ("Sory Kaba", "9"),
    ("Jorge Pombo", "14"),
    ("Álvaro Jiménez", "13"),
    ("Jorge Sáenz", "5"),
    ("Mikel González", "4"),
];

static STATS_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table#stats_standard_17"));
static TBODY: LazyLock<Selector> = LazyLock::new(|| selector("tbody"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static PLAYER_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"th[data-stat="player"] a"#));
static NATIONALITY: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"td[data-stat="nationality"]"#));
static POSITION: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="position"]"#));
static AGE: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="age"]"#));
static GAMES: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="games"]"#));
static GOALS: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="goals"]"#));
static ASSISTS: LazyLock<Selector> = LazyLock::new(|| selector(r#"td[data-stat="assists"]"#));

static PLAYER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/en/players/([a-f0-9]+)/").expect("valid regex"));
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Extract players with at least one appearance from the standard stats table
pub fn extract_roster(document: &Html, club: &ClubProfile) -> Vec<RosterEntry> {
    let Some(table) = document.select(&STATS_TABLE).next() else {
        warn!("No stats table found with id stats_standard_17");
        return Vec::new();
    };

    let Some(tbody) = table.select(&TBODY).next() else {
        warn!("No tbody found in stats table");
        return Vec::new();
    };

    let rows: Vec<ElementRef<'_>> = tbody.select(&ROW).collect();
    debug!("Found {} rows in stats table", rows.len());

    let mut players = Vec::new();

    for row in rows {
        let Some(link) = row.select(&PLAYER_LINK).next() else {
            continue;
        };

        let name = cell_text(link);
        if name.is_empty() || AGGREGATE_ROWS.contains(&name.as_str()) {
            continue;
        }

        let matches = count(row, &GAMES);
        if matches == 0 {
            continue;
        }

        players.push(RosterEntry {
            id: players.len() as i64 + 1,
            position: row
                .select(&POSITION)
                .next()
                .map(|cell| Position::from_code(&cell_text(cell)))
                .unwrap_or(Position::Unknown),
            age: row
                .select(&AGE)
                .next()
                .and_then(|cell| parse_age(&cell_text(cell)))
                .unwrap_or(DEFAULT_AGE),
            nationality: row
                .select(&NATIONALITY)
                .next()
                .and_then(|cell| cell_text(cell).split_whitespace().last().map(str::to_string))
                .unwrap_or_else(|| club.default_nationality.clone()),
            photo: photo_for(&name, link.value().attr("href")),
            number: shirt_number(&name).to_string(),
            matches,
            goals: count(row, &GOALS),
            assists: count(row, &ASSISTS),
            name,
        });
    }

    info!("Extracted {} players from stats table", players.len());
    for player in players.iter().take(5) {
        debug!(
            "  {} ({}) - {} goals, {} assists",
            player.name,
            player.position.label(),
            player.goals,
            player.assists
        );
    }

    players
}

fn count(row: ElementRef<'_>, cell: &Selector) -> u32 {
    cell_number(row.select(cell).next()).unwrap_or(0)
}

/// First run of digits in an age cell such as "28-123"
fn parse_age(text: &str) -> Option<u32> {
    DIGITS.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Headshot URL from the player link, or a local placeholder derived from the name
pub fn photo_for(name: &str, href: Option<&str>) -> String {
    if let Some(id) = href
        .and_then(|h| PLAYER_ID.captures(h))
        .and_then(|caps| caps.get(1))
    {
        return format!("{}/{}_2022.jpg", HEADSHOT_BASE, id.as_str());
    }

    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .replace(' ', "_");

    format!("/images/players/{}.jpg", cleaned)
}

pub fn shirt_number(name: &str) -> &'static str {
    SHIRT_NUMBERS
        .iter()
        .find(|(player, _)| *player == name)
        .map(|(_, number)| *number)
        .unwrap_or("N/A")
}
