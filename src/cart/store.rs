//! Durable cart storage.
//!
//! The cart is the only state the storefront owns. It is written through to a store on
//! every mutation and rehydrated when a session starts.

use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::cart::Cart;

/// Errors raised while loading or saving a cart.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// Reading or writing the backing file failed.
    #[error("cart storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The stored record is not a `{serial: quantity}` object.
    #[error("stored cart is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Keyed storage for a single cart record.
pub trait CartStore {
    /// Read the stored cart, or an empty cart if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] if the record exists but cannot be read.
    fn load(&mut self) -> Result<Cart, CartStoreError>;

    /// Replace the stored cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] if the record cannot be written.
    fn save(&mut self, cart: &Cart) -> Result<(), CartStoreError>;
}

/// Cart stored as a JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileCartStore {
    path: PathBuf,
}

impl JsonFileCartStore {
    /// Store the cart at `path`; parent directories are created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStore for JsonFileCartStore {
    fn load(&mut self) -> Result<Cart, CartStoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Cart::new()),
            Err(error) => return Err(error.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Cart::new());
        }

        let stored: FxHashMap<String, i64> = serde_json::from_str(&contents)?;

        Ok(Cart::from_entries(stored.into_iter().filter_map(
            |(serial, quantity)| u32::try_from(quantity).ok().map(|q| (serial, q)),
        )))
    }

    fn save(&mut self, cart: &Cart) -> Result<(), CartStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string(cart)?;

        // Stage then rename; the record is replaced atomically.
        let staging = self.path.with_extension("json.tmp");

        fs::write(&staging, contents)?;
        fs::rename(&staging, &self.path)?;

        Ok(())
    }
}

/// In-memory cart store for ephemeral sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStore {
    cart: Option<Cart>,
    saves: usize,
}

impl MemoryCartStore {
    /// Create a store pre-populated with `cart`.
    pub fn with_cart(cart: Cart) -> Self {
        Self {
            cart: Some(cart),
            saves: 0,
        }
    }

    /// The most recently saved cart.
    pub fn stored(&self) -> Option<&Cart> {
        self.cart.as_ref()
    }

    /// Number of saves performed.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl CartStore for MemoryCartStore {
    fn load(&mut self) -> Result<Cart, CartStoreError> {
        Ok(self.cart.clone().unwrap_or_default())
    }

    fn save(&mut self, cart: &Cart) -> Result<(), CartStoreError> {
        self.cart = Some(cart.clone());
        self.saves += 1;

        Ok(())
    }
}
