use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::Filter;

/// A stored record as loosely typed fields
pub type Row = Map<String, Value>;

/// Fields maintained by the store itself
pub const RESERVED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: record {id} in {table}")]
    NotFound { table: String, id: i64 },

    /// Filter or record field that cannot be used as a column path
    #[error("Invalid field name: {0:?}")]
    InvalidField(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// CRUD access to records grouped by table name.
///
/// The store assigns `id`, `created_at` and `updated_at` and returns them
/// with every row.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record and return it with its assigned id and timestamps
    async fn create(&self, table: &str, record: Row) -> Result<Row, StoreError>;

    /// Records matching every filter, in insertion order
    async fn get_many(
        &self,
        table: &str,
        filters: &[Filter],
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError>;

    /// Merge `fields` into an existing record.
    ///
    /// Returns `Err(StoreError::NotFound)` if the record doesn't exist.
    async fn update(&self, table: &str, id: i64, fields: Row) -> Result<Row, StoreError>;

    /// Delete a record, returning the number of rows removed
    async fn delete(&self, table: &str, id: i64) -> Result<u64, StoreError>;
}

/// Field names usable in filters: ASCII letters, digits and underscores
pub fn is_valid_field(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Drop store-maintained fields from a record about to be written
pub fn strip_reserved(mut record: Row) -> Row {
    for field in RESERVED_FIELDS {
        record.remove(field);
    }
    record
}
