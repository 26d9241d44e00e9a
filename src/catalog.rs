//! Catalog
//!
//! A catalog is an immutable snapshot of the products the storefront may sell. It is
//! rebuilt wholesale from each catalog fetch and swapped in as a unit, so pricing always
//! reads a fully-loaded snapshot.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::{
    api::{ProductRecord, StorefrontApi},
    products::Product,
};

/// Eligible products keyed by serial number.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: FxHashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from already-converted products.
    ///
    /// Ineligible products (status `off`, dealer gift boxes) are skipped and only the
    /// first product seen for each serial number is kept.
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalog = Catalog::default();

        for product in products {
            if !product.is_eligible() {
                continue;
            }

            if catalog.index.contains_key(&product.serial_number) {
                debug!(serial = %product.serial_number, "dropping duplicate product");
                continue;
            }

            catalog
                .index
                .insert(product.serial_number.clone(), catalog.products.len());

            catalog.products.push(product);
        }

        catalog
    }

    /// Build a catalog from wire records, dropping malformed records with a warning.
    pub fn from_records(records: impl IntoIterator<Item = ProductRecord>) -> Self {
        Self::new(
            records
                .into_iter()
                .filter_map(|record| match Product::try_from(record) {
                    Ok(product) => Some(product),
                    Err(error) => {
                        warn!(%error, "skipping malformed product record");
                        None
                    }
                }),
        )
    }

    /// Fetch the catalog from the backend.
    ///
    /// A failed fetch is logged and yields an empty catalog.
    pub async fn fetch(api: &dyn StorefrontApi) -> Self {
        match api.products().await {
            Ok(records) => Self::from_records(records),
            Err(error) => {
                warn!(%error, "failed to fetch catalog, falling back to empty catalog");
                Self::default()
            }
        }
    }

    /// Look up a product by serial number.
    pub fn get(&self, serial_number: &str) -> Option<&Product> {
        self.index
            .get(serial_number)
            .and_then(|&position| self.products.get(position))
    }

    /// Whether a serial number is part of this catalog.
    pub fn contains(&self, serial_number: &str) -> bool {
        self.index.contains_key(serial_number)
    }

    /// Iterate over products in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Group products by product type, in order of first appearance.
    pub fn sections(&self) -> Vec<(&str, Vec<&Product>)> {
        let mut sections: Vec<(&str, Vec<&Product>)> = Vec::new();
        let mut seen: FxHashMap<&str, usize> = FxHashMap::default();

        for product in &self.products {
            let key = product.product_type.as_str();

            if let Some(section) = seen.get(key).and_then(|&i| sections.get_mut(i)) {
                section.1.push(product);
            } else {
                seen.insert(key, sections.len());
                sections.push((key, vec![product]));
            }
        }

        sections
    }

    /// Distinct product types present in the catalog.
    pub fn product_types(&self) -> FxHashSet<&str> {
        self.products
            .iter()
            .map(|product| product.product_type.as_str())
            .collect()
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
