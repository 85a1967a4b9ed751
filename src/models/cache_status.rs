use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Category;

/// Persisted refresh bookkeeping for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    /// Store id of the status record
    pub id: i64,

    pub category: Category,

    /// When extraction last succeeded. `None` if never, or if the stored
    /// value could not be parsed.
    pub last_scraped: Option<DateTime<Utc>>,

    /// When the category's records were last written
    pub last_updated: Option<DateTime<Utc>>,

    /// True only while a refresh is running
    pub is_updating: bool,

    /// Error from the last failed refresh, cleared on success
    pub error_message: Option<String>,
}

/// Partial change to a status record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    pub is_updating: Option<bool>,
    pub scraped_at: Option<DateTime<Utc>>,
    /// `Some(None)` clears the stored message
    pub error_message: Option<Option<String>>,
}

impl StatusUpdate {
    pub fn started() -> Self {
        Self {
            is_updating: Some(true),
            ..Default::default()
        }
    }

    /// Scrape and write finished at `at`; clears any previous error
    pub fn succeeded(at: DateTime<Utc>) -> Self {
        Self {
            is_updating: Some(false),
            scraped_at: Some(at),
            error_message: Some(None),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            is_updating: Some(false),
            scraped_at: None,
            error_message: Some(Some(message.into())),
        }
    }
}
