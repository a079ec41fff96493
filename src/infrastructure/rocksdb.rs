use crate::domain::cart::{self, CartEntry};
use crate::domain::ports::CartStore;
use crate::error::{CartError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding carts, keyed by cart key.
pub const CF_CARTS: &str = "carts";

/// A persistent cart store backed by RocksDB.
///
/// Values are the JSON-encoded entry list, the same format the JSON file store
/// writes. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbCartStore {
    db: Arc<DB>,
}

impl RocksDbCartStore {
    /// Opens or creates a RocksDB instance at the specified path, creating the
    /// `carts` column family if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_carts = ColumnFamilyDescriptor::new(CF_CARTS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_carts])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn carts_cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(CF_CARTS).ok_or_else(|| {
            CartError::InternalError(Box::new(std::io::Error::other(
                "Carts column family not found",
            )))
        })
    }
}

#[async_trait]
impl CartStore for RocksDbCartStore {
    async fn load(&self, key: &str) -> Result<Vec<CartEntry>> {
        let cf = self.carts_cf()?;
        let Some(bytes) = self.db.get_cf(cf, key.as_bytes())? else {
            return Ok(Vec::new());
        };

        let decoded = std::str::from_utf8(&bytes)
            .map_err(|e| CartError::InternalError(Box::new(e)))
            .and_then(cart::parse_entries);
        match decoded {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable cart");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, key: &str, entries: Vec<CartEntry>) -> Result<()> {
        let cf = self.carts_cf()?;
        let value = cart::encode_entries(&entries)?;
        self.db.put_cf(cf, key.as_bytes(), value)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let cf = self.carts_cf()?;
        self.db.delete_cf(cf, key.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDbCartStore::open(dir.path()).expect("Failed to open RocksDB");
        assert!(store.db.cf_handle(CF_CARTS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_cart_store() {
        let dir = tempdir().unwrap();
        let store = RocksDbCartStore::open(dir.path()).unwrap();

        let entries = vec![CartEntry::new("womens_health"), CartEntry::new("vitamin_d")];
        store.save("wf_cart_v3", entries.clone()).await.unwrap();
        assert_eq!(store.load("wf_cart_v3").await.unwrap(), entries);
        assert!(store.load("other").await.unwrap().is_empty());

        store.remove("wf_cart_v3").await.unwrap();
        assert!(store.load("wf_cart_v3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rocksdb_persists_across_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDbCartStore::open(dir.path()).unwrap();
            store
                .save("wf_cart_v3", vec![CartEntry::new("heart_health")])
                .await
                .unwrap();
        }
        let store = RocksDbCartStore::open(dir.path()).unwrap();
        assert_eq!(
            store.load("wf_cart_v3").await.unwrap(),
            vec![CartEntry::new("heart_health")]
        );
    }
}
