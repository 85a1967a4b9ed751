use chrono::{DateTime, TimeZone, Utc};

use crate::models::{
    ClubSnapshot, FixtureRecord, MatchResult, Position, RosterEntry, StandingSnapshot,
};
use crate::scrape::fixtures::crest_url;

const SEASON: &str = "2024-25";

const RACING: &str = "dee3bbc8";
const MIRANDES: &str = "3640715c";
const GRANADA: &str = "a0435291";

/// (name, position, age, nationality, photo slug, shirt number)
const SQUAD: &[(&str, Position, u32, &str, &str, &str)] = &[
    ("Joakin Ezkieta", Position::Goalkeeper, 28, "Spain", "ezkieta", "1"),
    ("Andrés Martín", Position::Midfielder, 25, "Spain", "martin", "10"),
    ("Iñigo Vicente", Position::Midfielder, 27, "Spain", "vicente", "11"),
    ("Aldasoro", Position::Midfielder, 26, "Spain", "aldasoro", "8"),
    ("Unai Vencedor Paris", Position::Midfielder, 24, "Spain", "vencedor", "6"),
    ("Javier Castro", Position::Defender, 24, "Spain", "castro", "3"),
    ("Pablo Rodríguez", Position::Midfielder, 23, "Spain", "rodriguez", "7"),
    ("Sory Kaba", Position::Forward, 28, "Guinea", "kaba", "9"),
    ("Jorge Pombo", Position::Forward, 30, "Spain", "pombo", "14"),
    ("Álvaro Jiménez", Position::Goalkeeper, 24, "Spain", "jimenez", "13"),
    ("Jorge Sáenz", Position::Defender, 26, "Spain", "saenz", "5"),
    ("Mikel González", Position::Defender, 25, "Spain", "gonzalez", "4"),
];

pub fn squad() -> Vec<RosterEntry> {
    SQUAD
        .iter()
        .enumerate()
        .map(|(i, (name, position, age, nationality, slug, number))| RosterEntry {
            id: i as i64 + 1,
            name: name.to_string(),
            position: position.clone(),
            age: *age,
            nationality: nationality.to_string(),
            photo: format!("/images/players/{}.jpg", slug),
            number: number.to_string(),
            matches: 0,
            goals: 0,
            assists: 0,
        })
        .collect()
}

pub fn past_fixtures() -> Vec<FixtureRecord> {
    vec![
        fixture(
            1,
            kickoff(2025, 6, 12, 20, 0),
            ("CD Mirandés", MIRANDES),
            ("Racing de Santander", RACING),
            "Promotion play-offs — Semi-finals",
            "Away",
            (4, 1),
            "5,345",
            "José Guzmán",
        ),
        fixture(
            2,
            kickoff(2025, 6, 8, 18, 30),
            ("Racing de Santander", RACING),
            ("CD Mirandés", MIRANDES),
            "Promotion play-offs — Semi-finals",
            "El Sardinero",
            (3, 3),
            "22,394",
            "Rafael Sánchez",
        ),
        fixture(
            3,
            kickoff(2025, 6, 1, 18, 30),
            ("Racing de Santander", RACING),
            ("Granada", GRANADA),
            "Matchweek 42",
            "El Sardinero",
            (2, 1),
            "22,298",
            "Dámaso Arcediano",
        ),
    ]
}

pub fn league_position() -> StandingSnapshot {
    StandingSnapshot::new(5, 2, (20, 11, 11), 14, SEASON)
}

pub fn snapshot() -> ClubSnapshot {
    ClubSnapshot {
        squad: squad(),
        past_fixtures: past_fixtures(),
        league_position: Some(league_position()),
    }
}

#[allow(clippy::too_many_arguments)]
fn fixture(
    id: i64,
    date: DateTime<Utc>,
    (home_team, home_id): (&str, &str),
    (away_team, away_id): (&str, &str),
    round: &str,
    venue: &str,
    (home_score, away_score): (u32, u32),
    attendance: &str,
    referee: &str,
) -> FixtureRecord {
    let club_is_home = home_id == RACING;

    FixtureRecord {
        id,
        date,
        home_team: home_team.to_string(),
        away_team: away_team.to_string(),
        home_logo: crest_url(home_id),
        away_logo: crest_url(away_id),
        competition: "La Liga 2".to_string(),
        round: round.to_string(),
        venue: venue.to_string(),
        home_score,
        away_score,
        result: MatchResult::from_scores(home_score, away_score, club_is_home),
        attendance: attendance.to_string(),
        referee: referee.to_string(),
    }
}

fn kickoff(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}
