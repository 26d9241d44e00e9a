//! Cart

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::Product;

pub mod store;

/// Errors related to cart mutation.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// The product is missing or carries no serial number.
    #[error("product has no serial number and cannot be added to the cart")]
    MissingSerialNumber,

    /// The serial number is not part of the current catalog.
    #[error("product {0} is not available")]
    UnknownProduct(String),
}

/// Selected product quantities keyed by serial number.
///
/// Quantities are always positive; an entry is removed as soon as it would reach zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: FxHashMap<String, u32>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from stored entries, discarding zero quantities and blank keys.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, u32)>) -> Self {
        Cart {
            entries: entries
                .into_iter()
                .filter(|(serial, quantity)| *quantity > 0 && !serial.trim().is_empty())
                .collect(),
        }
    }

    /// Add one unit of `product`, returning the new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MissingSerialNumber`] if the product has a blank serial number;
    /// the cart is left untouched.
    pub fn add(&mut self, product: &Product) -> Result<u32, CartError> {
        self.increment(&product.serial_number)
    }

    /// Remove one unit of `product`, returning the remaining quantity.
    ///
    /// Removing the last unit deletes the entry. Removing a product that is not in the
    /// cart is a no-op returning zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MissingSerialNumber`] if the product has a blank serial number.
    pub fn remove(&mut self, product: &Product) -> Result<u32, CartError> {
        self.decrement(&product.serial_number)
    }

    /// Add one unit by serial number.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MissingSerialNumber`] if `serial_number` is blank.
    pub fn increment(&mut self, serial_number: &str) -> Result<u32, CartError> {
        let serial = checked_serial(serial_number)?;
        let quantity = self.entries.entry(serial.to_string()).or_insert(0);

        *quantity = quantity.saturating_add(1);

        Ok(*quantity)
    }

    /// Remove one unit by serial number.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MissingSerialNumber`] if `serial_number` is blank.
    pub fn decrement(&mut self, serial_number: &str) -> Result<u32, CartError> {
        let serial = checked_serial(serial_number)?;

        let Some(quantity) = self.entries.get_mut(serial) else {
            return Ok(0);
        };

        if *quantity <= 1 {
            self.entries.remove(serial);
            return Ok(0);
        }

        *quantity -= 1;

        Ok(*quantity)
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Quantity selected for a serial number.
    pub fn quantity(&self, serial_number: &str) -> u32 {
        self.entries.get(serial_number).copied().unwrap_or(0)
    }

    /// Iterate over `(serial number, quantity)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries
            .iter()
            .map(|(serial, quantity)| (serial.as_str(), *quantity))
    }

    /// Total number of units across all entries.
    pub fn units(&self) -> u64 {
        self.entries.values().map(|&q| u64::from(q)).sum()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn checked_serial(serial_number: &str) -> Result<&str, CartError> {
    let serial = serial_number.trim();

    if serial.is_empty() {
        Err(CartError::MissingSerialNumber)
    } else {
        Ok(serial)
    }
}
