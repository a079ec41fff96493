use super::money::Cents;
use crate::error::{CartError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const REFERENCE_CATALOG: &str = include_str!("../../data/reference_catalog.toml");

/// Highest base or biomarker price a catalog may declare (10 million EUR).
///
/// Keeps every cart total far inside `i64`, so pricing never overflows.
pub const MAX_PRICE: Cents = Cents(1_000_000_000);

/// A single lab measurement that can be part of several packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Biomarker {
    /// Catalog-wide identity, e.g. `ferritin`.
    pub key: String,
    pub name: String,
    /// Value deducted from a later package that repeats this biomarker.
    pub price: Cents,
}

/// A purchasable bundle of biomarkers.
///
/// `base_price` is an independently set retail price; it is not required to
/// equal the sum of the biomarker prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub sku: String,
    pub name: String,
    pub base_price: Cents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Storefront page slug, e.g. `package-vitamin-d`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u32>,
    /// Biomarkers in declared order.
    #[serde(default)]
    pub biomarkers: Vec<Biomarker>,
}

impl Package {
    pub fn biomarker(&self, key: &str) -> Option<&Biomarker> {
        self.biomarkers.iter().find(|b| b.key == key)
    }

    pub fn biomarker_count(&self) -> usize {
        self.biomarkers.len()
    }

    /// Sum of the individual biomarker prices.
    pub fn biomarker_total(&self) -> Cents {
        self.biomarkers.iter().map(|b| b.price).sum()
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    packages: Vec<Package>,
}

/// Immutable registry of packages keyed by SKU.
///
/// Packages keep the order they were declared in; lookups go through an index.
/// The catalog is built once and handed to whoever needs it, usually behind an
/// `Arc`.
#[derive(Debug, Clone)]
pub struct Catalog {
    packages: Vec<Package>,
    by_sku: HashMap<String, usize>,
    by_slug: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, rejecting data the pricing engine cannot price
    /// unambiguously.
    pub fn new(packages: Vec<Package>) -> Result<Self> {
        let mut by_sku = HashMap::with_capacity(packages.len());
        let mut by_slug = HashMap::new();
        let mut catalog_total = Cents::ZERO;

        for (idx, package) in packages.iter().enumerate() {
            if package.sku.trim().is_empty() {
                return Err(CartError::CatalogError(format!(
                    "package #{idx} has an empty SKU"
                )));
            }
            if package.base_price.is_negative() {
                return Err(CartError::CatalogError(format!(
                    "package {} has a negative base price",
                    package.sku
                )));
            }
            if package.base_price > MAX_PRICE {
                return Err(CartError::CatalogError(format!(
                    "package {} has a base price above the maximum of {MAX_PRICE} EUR",
                    package.sku
                )));
            }
            catalog_total = catalog_total
                .value()
                .checked_add(package.base_price.value())
                .map(Cents::new)
                .ok_or_else(|| {
                    CartError::CatalogError("sum of base prices overflows".to_string())
                })?;
            if by_sku.insert(package.sku.clone(), idx).is_some() {
                return Err(CartError::CatalogError(format!(
                    "duplicate SKU {}",
                    package.sku
                )));
            }
            if let Some(slug) = &package.slug
                && by_slug.insert(slug.clone(), idx).is_some()
            {
                return Err(CartError::CatalogError(format!("duplicate slug {slug}")));
            }

            let mut seen = HashSet::with_capacity(package.biomarkers.len());
            for biomarker in &package.biomarkers {
                if !seen.insert(biomarker.key.as_str()) {
                    return Err(CartError::CatalogError(format!(
                        "package {} lists biomarker {} twice",
                        package.sku, biomarker.key
                    )));
                }
                if biomarker.price.is_negative() {
                    return Err(CartError::CatalogError(format!(
                        "biomarker {} in package {} has a negative price",
                        biomarker.key, package.sku
                    )));
                }
                if biomarker.price > MAX_PRICE {
                    return Err(CartError::CatalogError(format!(
                        "biomarker {} in package {} has a price above the maximum of {MAX_PRICE} EUR",
                        biomarker.key, package.sku
                    )));
                }
            }
        }
        warn_on_price_mismatches(&packages);

        Ok(Self {
            packages,
            by_sku,
            by_slug,
        })
    }

    /// Parses a TOML document made of `[[packages]]` tables.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.packages)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_toml_str(&content)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            packages = catalog.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// The storefront catalog compiled into the binary.
    pub fn reference() -> Result<Self> {
        Self::from_toml_str(REFERENCE_CATALOG)
    }

    pub fn get_package(&self, sku: &str) -> Option<&Package> {
        self.by_sku.get(sku).map(|&idx| &self.packages[idx])
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.by_sku.contains_key(sku)
    }

    /// Packages in declared order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    pub fn sku_for_slug(&self, slug: &str) -> Option<&str> {
        self.by_slug
            .get(slug)
            .map(|&idx| self.packages[idx].sku.as_str())
    }

    /// Resolves a SKU or a storefront page path (`/package-vitamin-d/`).
    pub fn resolve(&self, reference: &str) -> Option<&Package> {
        let reference = reference.trim();
        if let Some(package) = self.get_package(reference) {
            return Some(package);
        }
        let slug = reference.trim_end_matches('/').rsplit('/').next()?;
        self.by_slug.get(slug).map(|&idx| &self.packages[idx])
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Deductions are taken at the repeating package's price, so a biomarker
/// priced differently in two packages makes the discount depend on cart order.
fn warn_on_price_mismatches(packages: &[Package]) {
    let mut canonical: HashMap<&str, (Cents, &str)> = HashMap::new();
    for package in packages {
        for biomarker in &package.biomarkers {
            match canonical.get(biomarker.key.as_str()) {
                Some((price, first_sku)) if *price != biomarker.price => {
                    tracing::warn!(
                        biomarker = %biomarker.key,
                        first_sku = %first_sku,
                        first_price = price.value(),
                        sku = %package.sku,
                        price = biomarker.price.value(),
                        "biomarker priced differently across packages"
                    );
                }
                Some(_) => {}
                None => {
                    canonical.insert(&biomarker.key, (biomarker.price, &package.sku));
                }
            }
        }
    }
}
