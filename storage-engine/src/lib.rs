use shared::Result;
use shared::config::StoreBackend;
use std::sync::Arc;
use vantage::ports::KeyValueStore;

pub mod memory_store;
pub mod sled_store;

pub use memory_store::MemoryStore;
pub use sled_store::SledStore;

/// Open the key/value store selected by configuration
pub fn open_store(backend: &StoreBackend) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match backend {
        StoreBackend::Memory(Some(quota)) => Arc::new(MemoryStore::with_quota(*quota)),
        StoreBackend::Memory(None) => Arc::new(MemoryStore::new()),
        StoreBackend::Sled(path) => Arc::new(SledStore::open(path)?),
    };

    tracing::info!("Opened {} key/value store", store.name());
    Ok(store)
}
