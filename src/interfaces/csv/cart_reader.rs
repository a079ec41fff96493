use crate::domain::cart::CartEntry;
use crate::error::{CartError, Result};
use std::io::Read;

/// Reads cart entries from a CSV source with a `sku,image,added_at` header.
///
/// Whitespace is trimmed and rows may omit trailing columns. Empty cells read
/// as missing values, so a row without a SKU becomes a malformed entry rather
/// than an error.
pub struct CartReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CartReader<R> {
    /// Wraps a CSV export of a cart; the first line must be the header.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields one result per data row, in file order.
    pub fn entries(self) -> impl Iterator<Item = Result<CartEntry>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(CartError::from))
    }
}
