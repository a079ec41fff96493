//! Application layer orchestrating cart changes and pricing.
//!
//! `CartService` mirrors the storefront's flow: a user action mutates the
//! stored cart, then the pricing engine is run over the fresh snapshot.

pub mod cart_service;
