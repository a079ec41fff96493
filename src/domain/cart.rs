use crate::error::{CartError, Result};
use serde::{Deserialize, Serialize};

/// One selected package, as persisted by the storefront (`wf_cart_v3`).
///
/// The SKU is optional on the wire so that corrupted persisted state still
/// decodes; an entry without a usable SKU is priced as if it were absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Cached display image captured when the package was added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Epoch milliseconds.
    #[serde(default, alias = "added_at", skip_serializing_if = "Option::is_none")]
    pub added_at: Option<i64>,
}

impl CartEntry {
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            sku: Some(sku.into()),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_added_at(mut self, added_at: i64) -> Self {
        self.added_at = Some(added_at);
        self
    }

    /// The SKU, or `None` when it is missing or empty.
    ///
    /// The value is used as an exact catalog key; surrounding whitespace is
    /// kept and makes the entry unresolvable.
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref().filter(|s| !s.is_empty())
    }
}

/// Decodes a persisted cart.
///
/// The document must be a JSON array; elements that are not valid entries
/// become SKU-less entries instead of failing the whole cart.
pub fn parse_entries(json: &str) -> Result<Vec<CartEntry>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(position, value)| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(position, error = %e, "malformed cart entry");
                CartEntry::default()
            })
        })
        .collect())
}

pub fn encode_entries(entries: &[CartEntry]) -> Result<Vec<u8>> {
    serde_json::to_vec(entries).map_err(CartError::from)
}

/// The ordered list of selected packages, at most one entry per SKU.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<CartEntry>) -> Self {
        Self { entries }
    }

    /// Appends the entry unless its SKU is already in the cart.
    pub fn add(&mut self, entry: CartEntry) -> bool {
        match entry.sku() {
            Some(sku) if !self.contains(sku) => {
                self.entries.push(entry);
                true
            }
            _ => false,
        }
    }

    /// Removes every entry with this SKU.
    pub fn remove(&mut self, sku: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.sku() != Some(sku));
        self.entries.len() != before
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.entries.iter().any(|e| e.sku() == Some(sku))
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<CartEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
