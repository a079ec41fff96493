use crate::domain::cart::CartEntry;
use crate::domain::ports::CartStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory cart store.
///
/// Uses `Arc<RwLock<HashMap<String, Vec<CartEntry>>>>` so clones share state.
/// Nothing survives the process; useful for tests and one-off pricing runs.
#[derive(Default, Clone)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<String, Vec<CartEntry>>>>,
}

impl InMemoryCartStore {
    /// Creates a new, empty in-memory cart store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self, key: &str) -> Result<Vec<CartEntry>> {
        let carts = self.carts.read().await;
        Ok(carts.get(key).cloned().unwrap_or_default())
    }

    async fn save(&self, key: &str, entries: Vec<CartEntry>) -> Result<()> {
        let mut carts = self.carts.write().await;
        carts.insert(key.to_string(), entries);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut carts = self.carts.write().await;
        carts.remove(key);
        Ok(())
    }
}
