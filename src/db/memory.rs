use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::store::{is_valid_field, strip_reserved};
use super::{Filter, RecordStore, Row, StoreError};

#[derive(Default)]
struct Tables {
    next_id: i64,
    rows: HashMap<String, BTreeMap<i64, Row>>,
}

/// In-process record store; contents are lost on exit
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held in `table`
    pub async fn count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .rows
            .get(table)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, table: &str, record: Row) -> Result<Row, StoreError> {
        let mut tables = self.tables.write().await;
        tables.next_id += 1;
        let id = tables.next_id;

        let now = Value::from(Utc::now().to_rfc3339());
        let mut row = strip_reserved(record);
        row.insert("id".to_string(), Value::from(id));
        row.insert("created_at".to_string(), now.clone());
        row.insert("updated_at".to_string(), now);

        tables
            .rows
            .entry(table.to_string())
            .or_default()
            .insert(id, row.clone());

        Ok(row)
    }

    async fn get_many(
        &self,
        table: &str,
        filters: &[Filter],
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError> {
        if let Some(bad) = filters.iter().find(|f| !is_valid_field(&f.field)) {
            return Err(StoreError::InvalidField(bad.field.clone()));
        }

        let tables = self.tables.read().await;
        let Some(rows) = tables.rows.get(table) else {
            return Ok(Vec::new());
        };

        Ok(rows
            .values()
            .filter(|row| filters.iter().all(|f| f.matches(row)))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update(&self, table: &str, id: i64, fields: Row) -> Result<Row, StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .rows
            .get_mut(table)
            .and_then(|rows| rows.get_mut(&id))
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id,
            })?;

        row.extend(strip_reserved(fields));
        row.insert(
            "updated_at".to_string(),
            Value::from(Utc::now().to_rfc3339()),
        );

        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: i64) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .rows
            .get_mut(table)
            .and_then(|rows| rows.remove(&id))
            .is_some();

        Ok(u64::from(removed))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::db::FilterOp;

    fn record(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_crud() {
        let store = MemoryStore::new();

        let a = store.create("players", record(json!({"name": "Kaba", "goals": 9}))).await.unwrap();
        store.create("players", record(json!({"name": "Pombo", "goals": 4}))).await.unwrap();
        store.create("fixtures", record(json!({"venue": "Away"}))).await.unwrap();
        assert_eq!(store.count("players").await, 2);

        let id = a["id"].as_i64().unwrap();
        let updated = store
            .update("players", id, record(json!({"goals": 10, "id": 500})))
            .await
            .unwrap();
        assert_eq!(updated["goals"], json!(10));
        assert_eq!(updated["id"], json!(id));

        let scorers = store
            .get_many("players", &[Filter::new("goals", FilterOp::Gt, 5)], 0, 10)
            .await
            .unwrap();
        assert_eq!(scorers.len(), 1);

        assert_eq!(store.delete("players", id).await.unwrap(), 1);
        assert_eq!(store.delete("players", id).await.unwrap(), 0);
        assert_eq!(store.count("players").await, 1);
        assert!(store.get_many("standings", &[], 0, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = MemoryStore::new();
        let result = store.update("players", 7, Row::new()).await;
        assert!(matches!(result, Err(StoreError::NotFound { id: 7, .. })));
    }
}
