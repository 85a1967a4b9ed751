use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, QueryBuilder, Sqlite,
};
use tracing::{debug, info};

use super::store::{is_valid_field, strip_reserved, RESERVED_FIELDS};
use super::{Filter, FilterOp, RecordStore, Row, StoreError};

/// SQLite store keeping every table's records as JSON documents
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (or create) the database and initialize the schema
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        // Create data directory if needed
        if !in_memory {
            if let Some(path) = database_url.strip_prefix("sqlite:") {
                let path = path.trim_start_matches("//");
                let path = path.split('?').next().unwrap_or(path);
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)
                            .context("Failed to create database directory")?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true);

        // Each connection to an in-memory database is its own database
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        }
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("Record store initialized at {}", database_url);
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                table_name TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create records table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_records_table
            ON records (table_name, id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_one(&self, table: &str, id: i64) -> Result<Option<RecordRow>, StoreError> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT id, data, created_at, updated_at FROM records
            WHERE table_name = ? AND id = ?
            "#,
        )
        .bind(table)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn create(&self, table: &str, record: Row) -> Result<Row, StoreError> {
        let data = strip_reserved(record);
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO records (table_name, data, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(table)
        .bind(serde_json::to_string(&data)?)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!("Inserted record {} into {}", result.last_insert_rowid(), table);

        RecordRow {
            id: result.last_insert_rowid(),
            data: serde_json::to_string(&data)?,
            created_at: now.clone(),
            updated_at: now,
        }
        .into_row()
    }

    async fn get_many(
        &self,
        table: &str,
        filters: &[Filter],
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, data, created_at, updated_at FROM records WHERE table_name = ",
        );
        query.push_bind(table);

        for filter in filters {
            if !is_valid_field(&filter.field) {
                return Err(StoreError::InvalidField(filter.field.clone()));
            }

            query.push(" AND ");
            push_predicate(&mut query, filter);
        }

        query.push(" ORDER BY id ASC LIMIT ");
        query.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        query.push(" OFFSET ");
        query.push_bind(i64::try_from(skip).unwrap_or(i64::MAX));

        let rows = query
            .build_query_as::<RecordRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(RecordRow::into_row).collect()
    }

    async fn update(&self, table: &str, id: i64, fields: Row) -> Result<Row, StoreError> {
        let existing = self
            .fetch_one(table, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id,
            })?;

        let mut data: Row = serde_json::from_str(&existing.data)?;
        data.extend(strip_reserved(fields));
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            UPDATE records SET data = ?, updated_at = ?
            WHERE table_name = ? AND id = ?
            "#,
        )
        .bind(serde_json::to_string(&data)?)
        .bind(&now)
        .bind(table)
        .bind(id)
        .execute(&self.pool)
        .await?;

        RecordRow {
            id,
            data: serde_json::to_string(&data)?,
            created_at: existing.created_at,
            updated_at: now,
        }
        .into_row()
    }

    async fn delete(&self, table: &str, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE table_name = ? AND id = ?")
            .bind(table)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Append `<column> <op> <value>` for one filter
fn push_predicate(query: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    let column = if RESERVED_FIELDS.contains(&filter.field.as_str()) {
        filter.field.clone()
    } else {
        format!("json_extract(data, '$.{}')", filter.field)
    };

    match (&filter.value, filter.op) {
        (Value::Null, FilterOp::Eq) => {
            query.push(format!("{} IS NULL", column));
        }
        (Value::Null, FilterOp::Neq) => {
            query.push(format!("{} IS NOT NULL", column));
        }
        (value, FilterOp::ILike) => {
            query.push(format!("lower({}) LIKE lower(", column));
            push_value(query, value);
            query.push(")");
        }
        (value, op) => {
            query.push(format!("{} {} ", column, op.sql()));
            push_value(query, value);
        }
    }
}

/// Bind a JSON value the way `json_extract` reports it
fn push_value(query: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Null => {
            query.push("NULL");
        }
        Value::Bool(flag) => {
            query.push_bind(i64::from(*flag));
        }
        Value::Number(number) => match number.as_i64() {
            Some(int) => {
                query.push_bind(int);
            }
            None => {
                query.push_bind(number.as_f64().unwrap_or_default());
            }
        },
        Value::String(text) => {
            query.push_bind(text.clone());
        }
        other => {
            query.push_bind(other.to_string());
        }
    }
}

/// Database row representation
#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    data: String,
    created_at: String,
    updated_at: String,
}

impl RecordRow {
    fn into_row(self) -> Result<Row, StoreError> {
        let mut row: Row = serde_json::from_str(&self.data)?;
        row.insert("id".to_string(), Value::from(self.id));
        row.insert("created_at".to_string(), Value::from(self.created_at));
        row.insert("updated_at".to_string(), Value::from(self.updated_at));
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    async fn memory_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let store = memory_store().await;

        let created = store
            .create("players", record(json!({"id": 99, "name": "Sory Kaba"})))
            .await
            .unwrap();

        assert_eq!(created["id"], json!(1));
        assert_eq!(created["name"], json!("Sory Kaba"));
        assert!(created["created_at"].is_string());
        assert_eq!(created["created_at"], created["updated_at"]);
    }

    #[tokio::test]
    async fn test_tables_are_separate_namespaces() {
        let store = memory_store().await;
        store.create("players", record(json!({"name": "A"}))).await.unwrap();
        store.create("fixtures", record(json!({"name": "B"}))).await.unwrap();

        let players = store.get_many("players", &[], 0, 100).await.unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0]["name"], json!("A"));
    }

    #[tokio::test]
    async fn test_filters_skip_and_limit() {
        let store = memory_store().await;
        for (name, goals, fit) in [("Kaba", 9, true), ("Pombo", 4, false), ("Vicente", 7, true)] {
            store
                .create("players", record(json!({"name": name, "goals": goals, "fit": fit})))
                .await
                .unwrap();
        }

        let scorers = store
            .get_many("players", &[Filter::new("goals", FilterOp::Gte, 5)], 0, 10)
            .await
            .unwrap();
        assert_eq!(scorers.len(), 2);

        let fit = store
            .get_many("players", &[Filter::eq("fit", true)], 1, 10)
            .await
            .unwrap();
        assert_eq!(fit.len(), 1);
        assert_eq!(fit[0]["name"], json!("Vicente"));

        let named = store
            .get_many("players", &[Filter::new("name", FilterOp::ILike, "%OMB%")], 0, 10)
            .await
            .unwrap();
        assert_eq!(named[0]["name"], json!("Pombo"));

        let first = store.get_many("players", &[], 0, 1).await.unwrap();
        assert_eq!(first[0]["name"], json!("Kaba"));
    }

    #[tokio::test]
    async fn test_null_filter() {
        let store = memory_store().await;
        store
            .create("cache_status", record(json!({"data_type": "players", "error_message": null})))
            .await
            .unwrap();

        let clean = store
            .get_many("cache_status", &[Filter::eq("error_message", Value::Null)], 0, 10)
            .await
            .unwrap();
        assert_eq!(clean.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_field_is_rejected() {
        let store = memory_store().await;

        let result = store
            .get_many("players", &[Filter::eq("name') OR 1=1 --", "x")], 0, 10)
            .await;

        assert!(matches!(result, Err(StoreError::InvalidField(_))));
    }

    #[tokio::test]
    async fn test_update_merges_and_delete_counts() {
        let store = memory_store().await;
        let created = store
            .create("cache_status", record(json!({"data_type": "players", "is_updating": false})))
            .await
            .unwrap();
        let id = created["id"].as_i64().unwrap();

        let updated = store
            .update("cache_status", id, record(json!({"is_updating": true})))
            .await
            .unwrap();
        assert_eq!(updated["data_type"], json!("players"));
        assert_eq!(updated["is_updating"], json!(true));

        let missing = store.update("cache_status", id + 1, Row::new()).await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));

        assert_eq!(store.delete("cache_status", id).await.unwrap(), 1);
        assert_eq!(store.delete("cache_status", id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("football.db").display());

        {
            let store = SqliteStore::new(&url).await.unwrap();
            store.create("standings", record(json!({"position": 5}))).await.unwrap();
            store.pool.close().await;
        }

        let reopened = SqliteStore::new(&url).await.unwrap();
        let rows = reopened.get_many("standings", &[], 0, 1).await.unwrap();
        assert_eq!(rows[0]["position"], json!(5));
    }
}
