//! Promotions

use decimal_percentage::Percentage;
use jiff::civil::Date;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{PromotionRecord, StorefrontApi};

pub mod validation;

pub use validation::{PromotionError, validate_promotion};

/// Reasons a promotion record cannot become a [`Promotion`].
#[derive(Debug, Error, PartialEq)]
pub enum PromotionRecordError {
    /// The record has a blank code.
    #[error("promotion has no code")]
    MissingCode,

    /// The record carries no discount.
    #[error("promotion {0} has no discount")]
    MissingDiscount(String),

    /// The discount is outside `0..=100`.
    #[error("promotion {0} has discount {1} outside 0..=100")]
    DiscountOutOfRange(String, Decimal),

    /// The minimum amount is negative.
    #[error("promotion {0} has a negative minimum amount")]
    NegativeMinimum(String),
}

/// A discount rule identified by a code.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    /// Code as published; matched case-insensitively
    pub code: String,

    /// Discount in percent points (`0..=100`)
    pub discount_percent: Decimal,

    /// Minimum qualifying total (after product discounts)
    pub min_amount: Option<Decimal>,

    /// Only cart lines of this product type are discounted
    pub product_type: Option<String>,

    /// Last day the code may be applied
    pub expiry: Option<Date>,
}

impl Promotion {
    /// Create an unrestricted promotion.
    pub fn new(code: impl Into<String>, discount_percent: Decimal) -> Self {
        Self {
            code: code.into(),
            discount_percent,
            min_amount: None,
            product_type: None,
            expiry: None,
        }
    }

    /// Require a minimum qualifying total.
    #[must_use]
    pub fn with_min_amount(mut self, min_amount: Decimal) -> Self {
        self.min_amount = Some(min_amount);
        self
    }

    /// Restrict the promotion to one product type.
    #[must_use]
    pub fn with_product_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = Some(product_type.into());
        self
    }

    /// Set the last valid day.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Date) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// The discount as a fraction.
    pub fn discount(&self) -> Percentage {
        Percentage::from(self.discount_percent / Decimal::ONE_HUNDRED)
    }

    /// Whether a cart line of `product_type` is discounted by this promotion.
    pub fn covers(&self, product_type: &str) -> bool {
        self.product_type
            .as_deref()
            .is_none_or(|required| required == product_type)
    }

    /// Whether `code` names this promotion.
    pub fn matches(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }
}

impl TryFrom<PromotionRecord> for Promotion {
    type Error = PromotionRecordError;

    fn try_from(record: PromotionRecord) -> Result<Self, Self::Error> {
        let code = record.code.trim().to_string();

        if code.is_empty() {
            return Err(PromotionRecordError::MissingCode);
        }

        let Some(discount_percent) = record.discount_percent else {
            return Err(PromotionRecordError::MissingDiscount(code));
        };

        if discount_percent < Decimal::ZERO || discount_percent > Decimal::ONE_HUNDRED {
            return Err(PromotionRecordError::DiscountOutOfRange(
                code,
                discount_percent,
            ));
        }

        if record.min_amount.is_some_and(|min| min < Decimal::ZERO) {
            return Err(PromotionRecordError::NegativeMinimum(code));
        }

        Ok(Promotion {
            code,
            discount_percent,
            min_amount: record.min_amount,
            product_type: record
                .product_type
                .map(|kind| kind.trim().to_string())
                .filter(|kind| !kind.is_empty()),
            expiry: record.expiry,
        })
    }
}

/// Promotions indexed by case-folded code.
#[derive(Debug, Clone, Default)]
pub struct PromotionDirectory {
    promotions: FxHashMap<String, Promotion>,
}

impl PromotionDirectory {
    /// Build a directory; for duplicate codes the first promotion wins.
    pub fn new(promotions: impl IntoIterator<Item = Promotion>) -> Self {
        let mut directory = PromotionDirectory::default();

        for promotion in promotions {
            let key = fold(&promotion.code);

            if directory.promotions.contains_key(&key) {
                debug!(code = %promotion.code, "dropping duplicate promotion code");
                continue;
            }

            directory.promotions.insert(key, promotion);
        }

        directory
    }

    /// Build a directory from wire records, dropping malformed records with a warning.
    pub fn from_records(records: impl IntoIterator<Item = PromotionRecord>) -> Self {
        Self::new(
            records
                .into_iter()
                .filter_map(|record| match Promotion::try_from(record) {
                    Ok(promotion) => Some(promotion),
                    Err(error) => {
                        warn!(%error, "skipping malformed promotion record");
                        None
                    }
                }),
        )
    }

    /// Fetch the directory from the backend.
    ///
    /// A failed fetch is logged and yields an empty directory.
    pub async fn fetch(api: &dyn StorefrontApi) -> Self {
        match api.promotions().await {
            Ok(records) => Self::from_records(records),
            Err(error) => {
                warn!(%error, "failed to fetch promotions, falling back to empty directory");
                Self::default()
            }
        }
    }

    /// Find a promotion by code, ignoring case and surrounding whitespace.
    pub fn lookup(&self, code: &str) -> Option<&Promotion> {
        self.promotions.get(&fold(code))
    }

    /// Iterate over all promotions.
    pub fn iter(&self) -> impl Iterator<Item = &Promotion> {
        self.promotions.values()
    }

    /// Number of promotions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }
}

fn fold(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}
