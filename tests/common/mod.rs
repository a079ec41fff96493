#![allow(dead_code)]

use biomarker_cart::domain::cart::CartEntry;
use biomarker_cart::domain::catalog::Catalog;
use biomarker_cart::domain::pricing::PricingEngine;
use std::io::{Error, Write};
use std::sync::Arc;
use tempfile::NamedTempFile;

pub fn reference_engine() -> PricingEngine {
    PricingEngine::new(Arc::new(
        Catalog::reference().expect("reference catalog must load"),
    ))
}

pub fn entries(skus: &[&str]) -> Vec<CartEntry> {
    skus.iter().map(|sku| CartEntry::new(*sku)).collect()
}

/// Writes a `sku` CSV cart with one row per SKU.
pub fn cart_csv(skus: &[&str]) -> Result<NamedTempFile, Error> {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
    writeln!(file, "sku,image,added_at")?;
    for (i, sku) in skus.iter().enumerate() {
        writeln!(file, "{sku},,{}", 1_700_000_000_000u64 + i as u64)?;
    }
    file.flush()?;
    Ok(file)
}
