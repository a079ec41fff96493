//! CSV adapters: cart input and price breakdown output.

pub mod cart_reader;
pub mod price_writer;
