use serde::{Deserialize, Serialize};

/// The tracked club's league position for a season
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingSnapshot {
    /// League rank, 1-based
    pub position: u32,

    pub points: u32,

    /// Always won + drawn + lost
    pub played: u32,

    pub won: u32,

    pub drawn: u32,

    pub lost: u32,

    pub goal_difference: i32,

    pub season: String,
}

/// Total games for a won-drawn-lost record, `None` if it overflows
pub fn games_played((won, drawn, lost): (u32, u32, u32)) -> Option<u32> {
    won.checked_add(drawn)?.checked_add(lost)
}

impl StandingSnapshot {
    /// Build a snapshot, deriving `played` from the record.
    ///
    /// Callers holding untrusted counts should check them with [`games_played`]
    /// first; here the sum saturates.
    pub fn new(
        position: u32,
        points: u32,
        (won, drawn, lost): (u32, u32, u32),
        goal_difference: i32,
        season: &str,
    ) -> Self {
        Self {
            position,
            points,
            played: won.saturating_add(drawn).saturating_add(lost),
            won,
            drawn,
            lost,
            goal_difference,
            season: season.to_string(),
        }
    }
}
