//! Promotion acceptance checks.

use jiff::Zoned;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    cart::Cart,
    catalog::Catalog,
    promotions::{Promotion, PromotionDirectory},
};

/// Reasons a promotion code is refused. Each maps to a distinct customer-facing message.
#[derive(Debug, Error, PartialEq)]
pub enum PromotionError {
    /// No promotion has this code.
    #[error("invalid code")]
    InvalidCode(String),

    /// The cart total is below the promotion's minimum.
    #[error("this code needs a minimum order of {minimum:.2}; your current total is {current:.2}")]
    BelowMinimum {
        /// Minimum qualifying total
        minimum: Decimal,
        /// Cart total without the promotion
        current: Decimal,
    },

    /// The promotion's last valid day has passed.
    #[error("expired")]
    Expired(String),

    /// No cart line has the product type the promotion is restricted to.
    #[error("this code applies only to {0} products")]
    IneligibleProductType(String),
}

/// Run the acceptance checks for `code`, returning the matching promotion.
///
/// The checks run in order and the first failure wins: the code must exist, the
/// `current_total` (computed without any promotion) must reach the minimum amount, the
/// promotion must not have expired before `now`'s date, and a product-type restriction
/// must match at least one cart line.
///
/// # Errors
///
/// Returns the [`PromotionError`] of the first failing check.
pub fn validate_promotion<'d>(
    code: &str,
    directory: &'d PromotionDirectory,
    catalog: &Catalog,
    cart: &Cart,
    current_total: Decimal,
    now: &Zoned,
) -> Result<&'d Promotion, PromotionError> {
    let promotion = directory
        .lookup(code)
        .ok_or_else(|| PromotionError::InvalidCode(code.trim().to_string()))?;

    check_promotion(promotion, catalog, cart, current_total, now)?;

    Ok(promotion)
}

/// Run every check except the code lookup against an already-resolved promotion.
///
/// # Errors
///
/// Returns the [`PromotionError`] of the first failing check.
pub fn check_promotion(
    promotion: &Promotion,
    catalog: &Catalog,
    cart: &Cart,
    current_total: Decimal,
    now: &Zoned,
) -> Result<(), PromotionError> {
    if let Some(minimum) = promotion.min_amount.filter(|&min| current_total < min) {
        return Err(PromotionError::BelowMinimum {
            minimum,
            current: current_total,
        });
    }

    if promotion.expiry.is_some_and(|expiry| expiry < now.date()) {
        return Err(PromotionError::Expired(promotion.code.clone()));
    }

    if let Some(required) = promotion.product_type.as_deref() {
        let matched = cart
            .iter()
            .filter_map(|(serial, _)| catalog.get(serial))
            .any(|product| product.product_type == required);

        if !matched {
            return Err(PromotionError::IneligibleProductType(required.to_string()));
        }
    }

    Ok(())
}
