//! Storefront backend collaborators.
//!
//! Inventory, pricing, promotion codes, bookings, invoices and location data all live
//! behind the remote storefront API. Everything in this crate talks to it through
//! [`StorefrontApi`], so the HTTP client, offline fixtures and test mocks are
//! interchangeable.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::checkout::OrderPayload;

pub mod http;
pub mod records;

pub use records::{
    BookingRecord, BookingResponse, OrderId, ProductRecord, PromotionRecord,
};

/// Errors raised while talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status or an unexpected body.
    #[error("unexpected response from storefront API: {0}")]
    UnexpectedResponse(String),

    /// No booking exists for the order identifier.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// The backend refused the booking.
    #[error("booking rejected: {0}")]
    BookingRejected(String),
}

/// Contract of the remote storefront API.
#[automock]
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// Fetch the full product catalog, including hidden and dealer-only products.
    async fn products(&self) -> Result<Vec<ProductRecord>, ApiError>;

    /// Fetch the promotion directory.
    async fn promotions(&self) -> Result<Vec<PromotionRecord>, ApiError>;

    /// List the states available for delivery addresses.
    async fn states(&self) -> Result<Vec<String>, ApiError>;

    /// List the districts of a state.
    async fn districts(&self, state: &str) -> Result<Vec<String>, ApiError>;

    /// Submit an order and return the generated order identifier.
    async fn submit_booking(&self, order: &OrderPayload) -> Result<OrderId, ApiError>;

    /// Look up the status of a submitted order.
    async fn booking(&self, order: &OrderId) -> Result<BookingRecord, ApiError>;

    /// Download the invoice document of an order.
    async fn invoice(&self, order: &OrderId) -> Result<Vec<u8>, ApiError>;
}
