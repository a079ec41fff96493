use crate::domain::pricing::CartCalculation;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct PriceRow<'a> {
    sku: &'a str,
    name: &'a str,
    original: i64,
    #[serde(rename = "final")]
    final_price: i64,
}

/// Writes the per-line breakdown of a calculation as `sku,name,original,final`.
pub struct PriceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PriceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_calculation(&mut self, calculation: &CartCalculation) -> Result<()> {
        if calculation.prices.is_empty() {
            self.writer
                .write_record(["sku", "name", "original", "final"])?;
        }
        for line in &calculation.prices {
            self.writer.serialize(PriceRow {
                sku: &line.sku,
                name: &line.name,
                original: line.original.value(),
                final_price: line.final_price.value(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
