pub mod cache_repository;
pub mod filter;
pub mod memory;
pub mod sqlite;
pub mod store;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

pub use cache_repository::{CacheRepository, ReplaceSummary, STATUS_TABLE};
pub use filter::{Filter, FilterOp};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{RecordStore, Row, StoreError};

/// Open the store named by a database URL; `memory` selects the in-process store
pub async fn open_store(database_url: &str) -> Result<Arc<dyn RecordStore>> {
    if database_url.eq_ignore_ascii_case("memory") {
        info!("Using in-memory record store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    Ok(Arc::new(SqliteStore::new(database_url).await?))
}
