//! Products

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::records::ProductRecord;

/// Product type reserved for dealer gift boxes, never listed to customers.
pub const DEALER_GIFT_BOX_TYPE: &str = "gift_box_dealers";

/// Reasons a product record cannot become a [`Product`].
#[derive(Debug, Error, PartialEq)]
pub enum ProductError {
    /// The record has no serial number.
    #[error("product {0:?} has no serial number")]
    MissingSerialNumber(String),

    /// The record carries no unit price.
    #[error("product {0} has no unit price")]
    MissingPrice(String),

    /// The record carries no listing status.
    #[error("product {0} has no status")]
    MissingStatus(String),

    /// The unit price is below zero.
    #[error("product {0} has a negative unit price")]
    NegativePrice(String),

    /// The standing discount is outside `0..=100`.
    #[error("product {0} has discount {1} outside 0..=100")]
    DiscountOutOfRange(String, Decimal),
}

/// Listing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Listed and sellable.
    On,

    /// Hidden from the storefront.
    Off,
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Catalog-unique serial number, used as the cart key
    pub serial_number: String,

    /// Display name
    pub name: String,

    /// Price per unit
    pub unit_price: Decimal,

    /// Standing markdown in percent points (`0..=100`)
    pub discount_percent: Decimal,

    /// Unit label, e.g. "box" or "piece"
    pub per: String,

    /// Category tag
    pub product_type: String,

    /// Listing status
    pub status: ProductStatus,
}

impl Product {
    /// Whether this product may be listed and added to a cart.
    pub fn is_eligible(&self) -> bool {
        self.status == ProductStatus::On && self.product_type != DEALER_GIFT_BOX_TYPE
    }

    /// Unit price after the standing markdown.
    ///
    /// Falls back to the list price when the markdown cannot be represented.
    pub fn discounted_unit_price(&self) -> Decimal {
        (self.discount_percent / Decimal::ONE_HUNDRED)
            .checked_mul(self.unit_price)
            .and_then(|markdown| self.unit_price.checked_sub(markdown))
            .unwrap_or(self.unit_price)
    }
}

impl TryFrom<ProductRecord> for Product {
    type Error = ProductError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        let serial_number = record.serial_number.trim().to_string();

        if serial_number.is_empty() {
            return Err(ProductError::MissingSerialNumber(record.name));
        }

        let Some(unit_price) = record.unit_price else {
            return Err(ProductError::MissingPrice(serial_number));
        };

        if unit_price < Decimal::ZERO {
            return Err(ProductError::NegativePrice(serial_number));
        }

        let Some(status) = record.status else {
            return Err(ProductError::MissingStatus(serial_number));
        };

        let discount_percent = record.discount_percent.unwrap_or(Decimal::ZERO);

        if discount_percent < Decimal::ZERO || discount_percent > Decimal::ONE_HUNDRED {
            return Err(ProductError::DiscountOutOfRange(
                serial_number,
                discount_percent,
            ));
        }

        Ok(Product {
            serial_number,
            name: record.name,
            unit_price,
            discount_percent,
            per: record.per,
            product_type: record.product_type,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use testresult::TestResult;

    use super::*;

    fn record(serial: &str, price: Decimal, discount: Option<Decimal>) -> ProductRecord {
        ProductRecord {
            serial_number: serial.to_string(),
            name: "Flower Pots".to_string(),
            unit_price: Some(price),
            discount_percent: discount,
            per: "box".to_string(),
            product_type: "ground_chakkar".to_string(),
            status: Some(ProductStatus::On),
        }
    }

    #[test]
    fn record_converts_with_default_discount() -> TestResult {
        let product = Product::try_from(record(" FP-01 ", dec!(120), None))?;

        assert_eq!(product.serial_number, "FP-01");
        assert_eq!(product.discount_percent, Decimal::ZERO);
        assert!(product.is_eligible());

        Ok(())
    }

    #[test]
    fn record_without_serial_is_rejected() {
        let result = Product::try_from(record("  ", dec!(120), None));

        assert!(matches!(result, Err(ProductError::MissingSerialNumber(_))));
    }

    #[test]
    fn negative_price_is_rejected() {
        let result = Product::try_from(record("FP-01", dec!(-1), None));

        assert_eq!(result, Err(ProductError::NegativePrice("FP-01".to_string())));
    }

    #[test]
    fn record_without_price_or_status_is_rejected() {
        let mut unpriced = record("FP-01", dec!(10), None);
        unpriced.unit_price = None;

        let mut unlisted = record("FP-02", dec!(10), None);
        unlisted.status = None;

        assert_eq!(
            Product::try_from(unpriced),
            Err(ProductError::MissingPrice("FP-01".to_string()))
        );
        assert_eq!(
            Product::try_from(unlisted),
            Err(ProductError::MissingStatus("FP-02".to_string()))
        );
    }

    #[test]
    fn discounted_unit_price_of_huge_price_does_not_overflow() -> TestResult {
        let product = Product::try_from(record("FP-01", Decimal::MAX, Some(dec!(10))))?;

        assert!(product.discounted_unit_price() < Decimal::MAX);

        Ok(())
    }

    #[test]
    fn discount_above_one_hundred_is_rejected() {
        let result = Product::try_from(record("FP-01", dec!(10), Some(dec!(100.5))));

        assert!(matches!(result, Err(ProductError::DiscountOutOfRange(_, _))));
    }

    #[test]
    fn dealer_gift_boxes_are_not_eligible() -> TestResult {
        let mut product = Product::try_from(record("GB-01", dec!(900), None))?;
        product.product_type = DEALER_GIFT_BOX_TYPE.to_string();

        assert!(!product.is_eligible());

        Ok(())
    }

    #[test]
    fn discounted_unit_price_applies_markdown() -> TestResult {
        let product = Product::try_from(record("FP-01", dec!(100), Some(dec!(10))))?;

        assert_eq!(product.discounted_unit_price(), dec!(90));

        Ok(())
    }
}
