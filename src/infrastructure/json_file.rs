use crate::domain::cart::{self, CartEntry};
use crate::domain::ports::CartStore;
use crate::error::{CartError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores each cart as `<dir>/<key>.json`, in the storefront's JSON format.
///
/// A missing file is an empty cart. A file that cannot be decoded is logged
/// and also read as an empty cart, so a corrupted cart never blocks pricing.
#[derive(Debug, Clone)]
pub struct JsonFileCartStore {
    dir: PathBuf,
}

impl JsonFileCartStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(CartError::ConfigError(format!("invalid cart key {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl CartStore for JsonFileCartStore {
    async fn load(&self, key: &str) -> Result<Vec<CartEntry>> {
        let path = self.path_for(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let decoded = std::str::from_utf8(&bytes)
            .map_err(|e| CartError::InternalError(Box::new(e)))
            .and_then(cart::parse_entries);
        match decoded {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable cart");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, key: &str, entries: Vec<CartEntry>) -> Result<()> {
        let path = self.path_for(key)?;
        let bytes = cart::encode_entries(&entries)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(path = %path.display(), entries = entries.len(), "saved cart");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
