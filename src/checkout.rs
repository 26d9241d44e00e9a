//! Checkout
//!
//! Turns the current cart into a booking. The customer's details are validated before
//! anything is sent, and the order is only submitted when its payable total reaches the
//! minimum order amount.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, dec};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    api::{ApiError, OrderId, StorefrontApi},
    cart::store::CartStore,
    pricing::{PricedLine, round_amount},
    storefront::Storefront,
};

/// Minimum payable total accepted at checkout unless configured otherwise.
pub const DEFAULT_MIN_ORDER_AMOUNT: Decimal = dec!(3000);

#[expect(clippy::expect_used, reason = "Literal pattern is known to compile")]
static MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").expect("valid mobile pattern"));

#[expect(clippy::expect_used, reason = "Literal pattern is known to compile")]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email pattern")
});

/// Errors raised while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// There is nothing in the cart that can be ordered.
    #[error("your cart is empty")]
    EmptyCart,

    /// A required customer field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The mobile number is not a valid 10-digit number.
    #[error("{0} is not a valid mobile number")]
    InvalidMobile(String),

    /// The email address is malformed.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// The payable total is below the minimum order amount.
    #[error("minimum order amount is {minimum:.2}; your total is {total:.2}")]
    BelowMinimumOrder {
        /// Configured minimum
        minimum: Decimal,
        /// Payable total of the cart
        total: Decimal,
    },

    /// The backend could not take the booking.
    #[error(transparent)]
    Booking(#[from] ApiError),
}

/// Delivery and contact details entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    /// Full name
    pub name: String,

    /// Mobile number
    pub mobile: String,

    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Street address
    pub address: String,

    /// State
    pub state: String,

    /// District
    pub district: String,

    /// Postal code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
}

impl CustomerDetails {
    /// Check required fields and contact formats, returning normalised details.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as a [`CheckoutError`].
    pub fn validated(&self) -> Result<CustomerDetails, CheckoutError> {
        let name = required("name", &self.name)?;
        let mobile = required("mobile", &self.mobile)?;
        let address = required("address", &self.address)?;
        let state = required("state", &self.state)?;
        let district = required("district", &self.district)?;

        let mobile = normalize_mobile(mobile)
            .ok_or_else(|| CheckoutError::InvalidMobile(mobile.to_string()))?;

        let email = self
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(|email| {
                if EMAIL.is_match(email) {
                    Ok(email.to_string())
                } else {
                    Err(CheckoutError::InvalidEmail(email.to_string()))
                }
            })
            .transpose()?;

        let pincode = self
            .pincode
            .as_deref()
            .map(str::trim)
            .filter(|pincode| !pincode.is_empty())
            .map(str::to_string);

        Ok(CustomerDetails {
            name: name.to_string(),
            mobile,
            email,
            address: address.to_string(),
            state: state.to_string(),
            district: district.to_string(),
            pincode,
        })
    }
}

/// Snapshot of one ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Serial number
    pub serial_number: String,

    /// Display name
    pub name: String,

    /// Price per unit
    pub unit_price: Decimal,

    /// Standing markdown in percent points
    pub discount_percent: Decimal,

    /// Unit label
    pub per: String,

    /// Category tag
    pub product_type: String,

    /// Ordered quantity
    pub quantity: u32,

    /// Line amount payable, rounded
    pub total: Decimal,
}

impl From<&PricedLine<'_>> for OrderLine {
    fn from(line: &PricedLine<'_>) -> Self {
        OrderLine {
            serial_number: line.product.serial_number.clone(),
            name: line.product.name.clone(),
            unit_price: line.product.unit_price,
            discount_percent: line.product.discount_percent,
            per: line.product.per.clone(),
            product_type: line.product.product_type.clone(),
            quantity: line.quantity,
            total: round_amount(line.total),
        }
    }
}

/// Booking submitted to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    /// Ordered products in catalog order
    pub lines: Vec<OrderLine>,

    /// Sum of `unit price * quantity`
    pub net: Decimal,

    /// Standing markdowns
    pub product_discount: Decimal,

    /// Promotion discount
    pub promo_discount: Decimal,

    /// Everything discounted
    pub save: Decimal,

    /// Amount payable
    pub total: Decimal,

    /// Customer details
    pub customer: CustomerDetails,

    /// Applied promotion code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
}

/// Build the booking for the storefront's current cart.
///
/// # Errors
///
/// Returns a [`CheckoutError`] if the cart is empty, the customer details are invalid or
/// the payable total is below `minimum`, checked in that order.
pub fn prepare_order<S: CartStore>(
    storefront: &Storefront<S>,
    customer: &CustomerDetails,
    minimum: Decimal,
) -> Result<OrderPayload, CheckoutError> {
    let lines = storefront.lines();

    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let customer = customer.validated()?;

    let totals = storefront.totals().rounded();

    if totals.total < minimum {
        return Err(CheckoutError::BelowMinimumOrder {
            minimum,
            total: totals.total,
        });
    }

    Ok(OrderPayload {
        lines: lines.iter().map(OrderLine::from).collect(),
        net: totals.net,
        product_discount: totals.product_discount,
        promo_discount: totals.promo_discount,
        save: totals.save,
        total: totals.total,
        customer,
        promo_code: storefront
            .applied_promotion()
            .map(|promotion| promotion.code.clone()),
    })
}

impl<S: CartStore> Storefront<S> {
    /// Validate and submit the cart as a booking, clearing the cart once it is accepted.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if validation fails or the backend rejects the booking.
    /// The cart is left untouched on error.
    #[tracing::instrument(name = "storefront.checkout", skip(self, api, customer), err)]
    pub async fn checkout(
        &mut self,
        api: &dyn StorefrontApi,
        customer: &CustomerDetails,
        minimum: Decimal,
    ) -> Result<OrderId, CheckoutError> {
        let order = prepare_order(self, customer, minimum)?;

        let order_id = api.submit_booking(&order).await?;

        info!(%order_id, total = %order.total, "order placed");

        self.clear_cart();

        Ok(order_id)
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, CheckoutError> {
    let value = value.trim();

    if value.is_empty() {
        Err(CheckoutError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// Reduce a mobile number to its 10 significant digits.
fn normalize_mobile(mobile: &str) -> Option<String> {
    let compact: String = mobile
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();

    let digits = compact
        .strip_prefix("+91")
        .or_else(|| compact.strip_prefix('0'))
        .unwrap_or(&compact);

    MOBILE.is_match(digits).then(|| digits.to_string())
}
