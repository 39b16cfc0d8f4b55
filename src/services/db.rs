pub mod connect_db;
pub mod memory_store;
pub mod project_store;

use crate::config::{Config, StoreKind};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use memory_store::MemoryProjectStore;
use project_store::{MongoProjectStore, ProjectStore};

/**
 * pick the project store named by PROJECT_STORE
 */
pub async fn connect_store(config: &Config) -> Result<Arc<dyn ProjectStore>> {
    match config.store {
        StoreKind::Mongo => {
            let db = connect_db::connect_db(config).await?;
            let store: Arc<dyn ProjectStore> = Arc::new(MongoProjectStore::new(&db));
            Ok(store)
        }
        StoreKind::Memory => {
            info!("Using in-memory project store, records are lost on restart");
            let store: Arc<dyn ProjectStore> = Arc::new(MemoryProjectStore::new());
            Ok(store)
        }
    }
}
