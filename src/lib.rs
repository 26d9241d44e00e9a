//! Firecart
//!
//! Cart pricing and promotion engine for a fireworks storefront. Products come from a
//! remote catalog, customers build a cart of quantities, and totals are derived from
//! per-product markdowns plus an optional promotion code.

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod debounce;
pub mod fixtures;
pub mod observability;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod promotions;
pub mod receipt;
pub mod refresh;
pub mod storefront;
