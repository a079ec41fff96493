use crate::error::{CartError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Storefront cart key in local storage.
pub const DEFAULT_CART_KEY: &str = "wf_cart_v3";

/// Settings read from an optional TOML file; CLI flags override them.
///
/// ```toml
/// cart_key = "wf_cart_v3"
/// catalog = "catalog.toml"
/// store_dir = ".cart"
/// log_filter = "biomarker_cart=debug"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cart_key: String,
    /// Catalog file; the compiled-in catalog is used when unset.
    pub catalog: Option<PathBuf>,
    /// Directory for the JSON file cart store.
    pub store_dir: Option<PathBuf>,
    /// RocksDB path; needs the `storage-rocksdb` feature.
    pub db_path: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cart_key: DEFAULT_CART_KEY.to_string(),
            catalog: None,
            store_dir: None,
            db_path: None,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| CartError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Loads the file when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.cart_key.trim().is_empty() {
            return Err(CartError::ConfigError("cart_key must not be empty".into()));
        }
        Ok(())
    }
}
