//! Pricing
//!
//! Totals are a pure function of the catalog snapshot, the cart and the applied
//! promotion. Every figure is kept unrounded; rounding to two decimal places happens
//! only when a value is displayed or sent to the backend.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Serialize;
use tracing::warn;

use crate::{cart::Cart, catalog::Catalog, products::Product, promotions::Promotion};

/// Currency the storefront sells in.
pub const CURRENCY: &Currency = iso::INR;

/// Derived order summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    /// Sum of `unit price * quantity`, before any discount
    pub net: Decimal,

    /// Standing per-product markdowns
    pub product_discount: Decimal,

    /// Discount granted by the applied promotion
    pub promo_discount: Decimal,

    /// Amount payable
    pub total: Decimal,

    /// Everything discounted (`product_discount + promo_discount`)
    pub save: Decimal,
}

impl PricingResult {
    /// Totals of an empty cart.
    pub const ZERO: PricingResult = PricingResult {
        net: Decimal::ZERO,
        product_discount: Decimal::ZERO,
        promo_discount: Decimal::ZERO,
        total: Decimal::ZERO,
        save: Decimal::ZERO,
    };

    /// These totals with `line` added, or `None` if a sum leaves the decimal range.
    fn with_line(&self, line: &PricedLine<'_>) -> Option<PricingResult> {
        let net = self.net.checked_add(line.net)?;
        let product_discount = self.product_discount.checked_add(line.product_discount)?;
        let promo_discount = self.promo_discount.checked_add(line.promo_discount)?;
        let save = product_discount.checked_add(promo_discount)?;

        Some(PricingResult {
            net,
            product_discount,
            promo_discount,
            total: net.checked_sub(save)?,
            save,
        })
    }

    /// Every figure rounded to two decimal places.
    #[must_use]
    pub fn rounded(&self) -> PricingResult {
        PricingResult {
            net: round_amount(self.net),
            product_discount: round_amount(self.product_discount),
            promo_discount: round_amount(self.promo_discount),
            total: round_amount(self.total),
            save: round_amount(self.save),
        }
    }
}

/// One cart entry joined with its catalog product.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine<'c> {
    /// Catalog product
    pub product: &'c Product,

    /// Selected quantity
    pub quantity: u32,

    /// `unit price * quantity`
    pub net: Decimal,

    /// Standing markdown on this line
    pub product_discount: Decimal,

    /// Promotion discount on this line (zero when not covered)
    pub promo_discount: Decimal,

    /// Line amount payable
    pub total: Decimal,
}

impl<'c> PricedLine<'c> {
    /// Price one line, or `None` if an amount leaves the decimal range.
    fn new(product: &'c Product, quantity: u32, promotion: Option<&Promotion>) -> Option<Self> {
        let net = product.unit_price.checked_mul(Decimal::from(quantity))?;
        let product_discount = percent_of(markdown(product), net)?;
        let after_markdown = net.checked_sub(product_discount)?;

        let covering = promotion.filter(|promotion| promotion.covers(&product.product_type));

        let promo_discount = match covering {
            Some(promotion) => percent_of(promotion.discount(), after_markdown)?,
            None => Decimal::ZERO,
        };

        Some(PricedLine {
            product,
            quantity,
            net,
            product_discount,
            promo_discount,
            total: after_markdown.checked_sub(promo_discount)?,
        })
    }
}

/// Join the cart with the catalog, in catalog order.
///
/// Cart entries whose product is no longer in the catalog are skipped, as are lines
/// whose amounts cannot be represented.
pub fn price_lines<'c>(
    catalog: &'c Catalog,
    cart: &Cart,
    promotion: Option<&Promotion>,
) -> Vec<PricedLine<'c>> {
    if cart.is_empty() {
        return Vec::new();
    }

    catalog
        .iter()
        .filter_map(|product| {
            let quantity = cart.quantity(&product.serial_number);

            if quantity == 0 {
                return None;
            }

            let line = PricedLine::new(product, quantity, promotion);

            if line.is_none() {
                warn!(serial = %product.serial_number, quantity, "line amount overflowed");
            }

            line
        })
        .collect()
}

/// Compute the order summary for a cart.
pub fn compute_totals(
    catalog: &Catalog,
    cart: &Cart,
    promotion: Option<&Promotion>,
) -> PricingResult {
    price_lines(catalog, cart, promotion)
        .iter()
        .fold(PricingResult::ZERO, |totals, line| {
            totals.with_line(line).unwrap_or_else(|| {
                warn!(serial = %line.product.serial_number, "order total overflowed");
                totals
            })
        })
}

/// Round a currency amount to two decimal places, half away from zero.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount with exactly two decimal places.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_amount(amount))
}

/// Format an amount, dropping the fraction when it rounds to a whole number.
pub fn format_compact(amount: Decimal) -> String {
    let rounded = round_amount(amount);

    if rounded.fract().is_zero() {
        format!("{:.0}", rounded.trunc())
    } else {
        format!("{rounded:.2}")
    }
}

/// Wrap an amount as money in the storefront currency, rounded for display.
pub fn to_money(amount: Decimal) -> Money<'static, Currency> {
    Money::from_decimal(round_amount(amount), CURRENCY)
}

fn markdown(product: &Product) -> Percentage {
    Percentage::from(product.discount_percent / Decimal::ONE_HUNDRED)
}

fn percent_of(percent: Percentage, amount: Decimal) -> Option<Decimal> {
    (percent * Decimal::ONE).checked_mul(amount)
}
