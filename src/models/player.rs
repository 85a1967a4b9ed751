use serde::{Deserialize, Serialize};

/// A squad member who has featured this season
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    /// Sequential row identity from extraction, or the store id once persisted
    #[serde(default)]
    pub id: i64,

    pub name: String,

    pub position: Position,

    pub age: u32,

    /// Nationality code or name
    pub nationality: String,

    /// Headshot URL or local placeholder path
    pub photo: String,

    /// Shirt number, "N/A" when unknown
    pub number: String,

    #[serde(default)]
    pub matches: u32,

    #[serde(default)]
    pub goals: u32,

    #[serde(default)]
    pub assists: u32,
}

/// Playing position. Codes outside the known table are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
    Unknown,
    Other(String),
}

impl Position {
    /// Map a short position code to a position
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "GK" => Position::Goalkeeper,
            "DF" => Position::Defender,
            "MF" => Position::Midfielder,
            "FW" | "F" => Position::Forward,
            "" => Position::Unknown,
            other => Position::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Position::Goalkeeper => "Goalkeeper",
            Position::Defender => "Defender",
            Position::Midfielder => "Midfielder",
            Position::Forward => "Forward",
            Position::Unknown => "Unknown",
            Position::Other(code) => code,
        }
    }
}

impl From<String> for Position {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Goalkeeper" => Position::Goalkeeper,
            "Defender" => Position::Defender,
            "Midfielder" => Position::Midfielder,
            "Forward" => Position::Forward,
            "Unknown" | "" => Position::Unknown,
            _ => Position::Other(label),
        }
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        match position {
            Position::Other(code) => code,
            known => known.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_codes() {
        assert_eq!(Position::from_code("GK"), Position::Goalkeeper);
        assert_eq!(Position::from_code("F"), Position::Forward);
        assert_eq!(Position::from_code(""), Position::Unknown);
        assert_eq!(
            Position::from_code("DF,MF"),
            Position::Other("DF,MF".to_string())
        );
    }

    #[test]
    fn test_position_serializes_as_label() {
        let json = serde_json::to_string(&Position::Midfielder).unwrap();
        assert_eq!(json, "\"Midfielder\"");

        let other: Position = serde_json::from_str("\"MF,FW\"").unwrap();
        assert_eq!(other.label(), "MF,FW");
    }
}
