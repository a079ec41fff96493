use super::cart::CartEntry;
use crate::error::Result;
use async_trait::async_trait;

/// Local key-value persistence for carts.
///
/// A cart is always replaced wholesale: callers load the full entry list,
/// mutate it, and save the full list back.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the stored entries, or an empty list when nothing is stored.
    async fn load(&self, key: &str) -> Result<Vec<CartEntry>>;
    async fn save(&self, key: &str, entries: Vec<CartEntry>) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

pub type CartStoreBox = Box<dyn CartStore>;
