use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// An independently cached, independently refreshed data domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Squad list with season stats
    Roster,
    /// Most recent completed matches
    Fixtures,
    /// League standing snapshot
    Standing,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Roster, Category::Fixtures, Category::Standing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Roster => "roster",
            Category::Fixtures => "fixtures",
            Category::Standing => "standing",
        }
    }

    /// Store table holding the category's records. Also used as the
    /// `data_type` key of its cache status record.
    pub fn table(&self) -> &'static str {
        match self {
            Category::Roster => "players",
            Category::Fixtures => "fixtures",
            Category::Standing => "standings",
        }
    }

    /// How long a scrape stays fresh, both in-process and in the store
    pub fn ttl(&self) -> Duration {
        match self {
            Category::Roster => Duration::minutes(15),
            Category::Fixtures => Duration::minutes(5),
            Category::Standing => Duration::minutes(10),
        }
    }

    /// Number of persisted records returned by a read
    pub fn page_size(&self) -> usize {
        match self {
            Category::Roster => 100,
            Category::Fixtures => 20,
            Category::Standing => 1,
        }
    }

    fn index(&self) -> usize {
        match self {
            Category::Roster => 0,
            Category::Fixtures => 1,
            Category::Standing => 2,
        }
    }
}

/// Fixed-size per-category storage, indexed without hashing
#[derive(Debug, Default, Clone)]
pub struct PerCategory<T> {
    slots: [T; 3],
}

impl<T> PerCategory<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self {
            slots: Category::ALL.map(&mut f),
        }
    }

    pub fn get(&self, category: Category) -> &T {
        &self.slots[category.index()]
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        &mut self.slots[category.index()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "roster" | "squad" | "players" => Ok(Category::Roster),
            "fixtures" | "matches" => Ok(Category::Fixtures),
            "standing" | "standings" => Ok(Category::Standing),
            other => anyhow::bail!("Unknown category: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttls() {
        assert_eq!(Category::Roster.ttl(), Duration::minutes(15));
        assert_eq!(Category::Fixtures.ttl(), Duration::minutes(5));
        assert_eq!(Category::Standing.ttl(), Duration::minutes(10));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Squad".parse::<Category>().unwrap(), Category::Roster);
        assert_eq!("standings".parse::<Category>().unwrap(), Category::Standing);
        assert!("weather".parse::<Category>().is_err());
    }

    #[test]
    fn test_per_category_slots_are_independent() {
        let mut counts = PerCategory::from_fn(|_| 0);
        *counts.get_mut(Category::Fixtures) += 2;

        assert_eq!(*counts.get(Category::Roster), 0);
        assert_eq!(*counts.get(Category::Fixtures), 2);
        assert_eq!(*counts.get(Category::Standing), 0);
    }
}
