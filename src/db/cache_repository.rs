use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{Filter, RecordStore, Row, StoreError};
use crate::models::{
    CacheStatus, Category, Dataset, FixtureRecord, RosterEntry, StandingSnapshot, StatusUpdate,
};

pub const STATUS_TABLE: &str = "cache_status";

/// Rows read per pass when clearing a category
const CLEAR_BATCH: usize = 1000;

/// Outcome of replacing a category's records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub cleared: u64,
    pub inserted: usize,
    pub skipped: usize,
}

/// Typed records and cache status on top of a [`RecordStore`]
#[derive(Clone)]
pub struct CacheRepository {
    store: Arc<dyn RecordStore>,
}

impl CacheRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn players(&self) -> Result<Vec<RosterEntry>, StoreError> {
        self.read_typed(Category::Roster).await
    }

    pub async fn fixtures(&self) -> Result<Vec<FixtureRecord>, StoreError> {
        self.read_typed(Category::Fixtures).await
    }

    pub async fn standing(&self) -> Result<Option<StandingSnapshot>, StoreError> {
        Ok(self.read_typed(Category::Standing).await?.into_iter().next())
    }

    /// One page of a category's persisted records
    pub async fn records(&self, category: Category) -> Result<Dataset, StoreError> {
        Ok(match category {
            Category::Roster => Dataset::Roster(self.players().await?),
            Category::Fixtures => Dataset::Fixtures(self.fixtures().await?),
            Category::Standing => Dataset::Standing(self.standing().await?),
        })
    }

    /// Clear the dataset's category and insert its records one by one.
    ///
    /// Records that fail to insert are logged and skipped.
    pub async fn replace(&self, dataset: &Dataset) -> Result<ReplaceSummary, StoreError> {
        let category = dataset.category();
        let table = category.table();

        let rows = match dataset {
            Dataset::Roster(players) => to_rows(players)?,
            Dataset::Fixtures(fixtures) => to_rows(fixtures)?,
            Dataset::Standing(standing) => to_rows(standing.iter())?,
        };

        let cleared = self.clear(category).await?;
        let mut summary = ReplaceSummary {
            cleared,
            ..Default::default()
        };

        for row in rows {
            match self.store.create(table, row).await {
                Ok(_) => summary.inserted += 1,
                Err(e) => {
                    warn!("Skipping {} record that failed to insert: {}", category, e);
                    summary.skipped += 1;
                }
            }
        }

        info!(
            "Replaced {}: cleared {}, inserted {}, skipped {}",
            table, summary.cleared, summary.inserted, summary.skipped
        );
        Ok(summary)
    }

    /// Delete up to one batch of the category's records
    pub async fn clear(&self, category: Category) -> Result<u64, StoreError> {
        let table = category.table();
        let rows = self.store.get_many(table, &[], 0, CLEAR_BATCH).await?;

        let mut deleted = 0;
        for row in rows {
            if let Some(id) = row.get("id").and_then(Value::as_i64) {
                deleted += self.store.delete(table, id).await?;
            }
        }

        debug!("Cleared {} records from {}", deleted, table);
        Ok(deleted)
    }

    pub async fn cache_status(&self, category: Category) -> Result<Option<CacheStatus>, StoreError> {
        Ok(self
            .status_row(category)
            .await?
            .map(|row| status_from_row(category, &row)))
    }

    /// Apply a partial status change, creating the record if absent
    pub async fn apply_status(
        &self,
        category: Category,
        update: &StatusUpdate,
    ) -> Result<CacheStatus, StoreError> {
        let mut fields = Map::new();

        if let Some(is_updating) = update.is_updating {
            fields.insert("is_updating".to_string(), Value::Bool(is_updating));
        }
        if let Some(at) = update.scraped_at {
            fields.insert("last_scraped".to_string(), Value::from(at.to_rfc3339()));
            fields.insert("last_updated".to_string(), Value::from(at.to_rfc3339()));
        }
        if let Some(message) = &update.error_message {
            fields.insert("error_message".to_string(), Value::from(message.clone()));
        }

        let row = match self.status_row(category).await? {
            Some(existing) => {
                let id = existing.get("id").and_then(Value::as_i64).unwrap_or_default();
                self.store.update(STATUS_TABLE, id, fields).await?
            }
            None => {
                info!("Creating cache status record for {}", category);
                let mut record = Map::new();
                record.insert("data_type".to_string(), Value::from(category.table()));
                record.insert("is_updating".to_string(), Value::Bool(false));
                record.insert("last_scraped".to_string(), Value::Null);
                record.insert("last_updated".to_string(), Value::Null);
                record.insert("error_message".to_string(), Value::Null);
                record.extend(fields);
                self.store.create(STATUS_TABLE, record).await?
            }
        };

        Ok(status_from_row(category, &row))
    }

    /// Clear `is_updating` flags left behind by a process that stopped
    /// mid-refresh. Returns how many were reset.
    pub async fn reset_updating_flags(&self) -> Result<usize, StoreError> {
        let mut reset = 0;
        for category in Category::ALL {
            let Some(status) = self.cache_status(category).await? else {
                continue;
            };
            if status.is_updating {
                warn!("Resetting stale updating flag for {}", category);
                self.apply_status(
                    category,
                    &StatusUpdate {
                        is_updating: Some(false),
                        ..Default::default()
                    },
                )
                .await?;
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn status_row(&self, category: Category) -> Result<Option<Row>, StoreError> {
        let rows = self
            .store
            .get_many(
                STATUS_TABLE,
                &[Filter::eq("data_type", category.table())],
                0,
                1,
            )
            .await?;

        Ok(rows.into_iter().next())
    }

    async fn read_typed<T: DeserializeOwned>(&self, category: Category) -> Result<Vec<T>, StoreError> {
        let rows = self
            .store
            .get_many(category.table(), &[], 0, category.page_size())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(Value::Object(row)) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping unreadable {} record: {}", category, e);
                    None
                }
            })
            .collect())
    }
}

fn to_rows<'a, T: Serialize + 'a>(
    records: impl IntoIterator<Item = &'a T>,
) -> Result<Vec<Row>, StoreError> {
    records
        .into_iter()
        .map(|record| -> Result<Row, StoreError> {
            match serde_json::to_value(record)? {
                Value::Object(row) => Ok(row),
                other => {
                    let mut row = Map::new();
                    row.insert("value".to_string(), other);
                    Ok(row)
                }
            }
        })
        .collect()
}

fn status_from_row(category: Category, row: &Row) -> CacheStatus {
    CacheStatus {
        id: row.get("id").and_then(Value::as_i64).unwrap_or_default(),
        category,
        last_scraped: row.get("last_scraped").and_then(parse_timestamp),
        last_updated: row.get("last_updated").and_then(parse_timestamp),
        is_updating: match row.get("is_updating") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(n)) => n.as_i64().unwrap_or_default() != 0,
            _ => false,
        },
        error_message: row
            .get("error_message")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// RFC 3339, or a naive ISO timestamp taken as UTC; anything else is `None`
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;

    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
