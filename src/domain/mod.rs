//! Domain layer: the package catalog, cart entries and the pricing engine.
//!
//! Nothing in here performs I/O except through the `ports` traits.

pub mod cart;
pub mod catalog;
pub mod money;
pub mod ports;
pub mod pricing;
