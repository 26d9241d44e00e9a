//! HTTP client for the storefront backend.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    api::{
        ApiError, StorefrontApi,
        records::{
            BookingRecord, BookingResponse, OrderId, ProductRecord, PromotionRecord, decode_records,
        },
    },
    checkout::OrderPayload,
};

/// `reqwest` implementation of [`StorefrontApi`].
#[derive(Debug, Clone)]
pub struct HttpStorefrontApi {
    base_url: String,
    http: Client,
}

impl HttpStorefrontApi {
    /// Create a client for the API rooted at `base_url`, e.g. `"https://api.example.com"`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client reusing an existing `reqwest` client.
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self { base_url, http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.http.get(self.url(path)).send().await?;

        Ok(ensure_success(response, path).await?.json().await?)
    }

    /// Fetch a JSON array, keeping every element that decodes as `T`.
    async fn get_records<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let values: Vec<serde_json::Value> = self.get_json(path).await?;

        Ok(decode_records(path, values))
    }
}

#[async_trait]
impl StorefrontApi for HttpStorefrontApi {
    #[tracing::instrument(name = "api.products", skip(self), err)]
    async fn products(&self) -> Result<Vec<ProductRecord>, ApiError> {
        self.get_records("products").await
    }

    #[tracing::instrument(name = "api.promotions", skip(self), err)]
    async fn promotions(&self) -> Result<Vec<PromotionRecord>, ApiError> {
        self.get_records("promocodes").await
    }

    #[tracing::instrument(name = "api.states", skip(self), err)]
    async fn states(&self) -> Result<Vec<String>, ApiError> {
        self.get_json("locations/states").await
    }

    #[tracing::instrument(name = "api.districts", skip(self), err)]
    async fn districts(&self, state: &str) -> Result<Vec<String>, ApiError> {
        let response = self
            .http
            .get(self.url("locations/districts"))
            .query(&[("state", state)])
            .send()
            .await?;

        Ok(ensure_success(response, "locations/districts")
            .await?
            .json()
            .await?)
    }

    #[tracing::instrument(
        name = "api.submit_booking",
        skip(self, order),
        fields(lines = order.lines.len(), total = %order.total),
        err
    )]
    async fn submit_booking(&self, order: &OrderPayload) -> Result<OrderId, ApiError> {
        let response = self
            .http
            .post(self.url("bookings"))
            .json(order)
            .send()
            .await?;

        let status = response.status();

        if status.is_client_error() {
            let text = response.text().await.unwrap_or_default();

            return Err(ApiError::BookingRejected(format!("{status}: {text}")));
        }

        let parsed: BookingResponse = ensure_success(response, "bookings").await?.json().await?;

        debug!(order_id = %parsed.order_id, "booking accepted");

        Ok(parsed.order_id)
    }

    #[tracing::instrument(name = "api.booking", skip(self), fields(order_id = %order), err)]
    async fn booking(&self, order: &OrderId) -> Result<BookingRecord, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("bookings/{order}")))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::OrderNotFound(order.clone()));
        }

        Ok(ensure_success(response, "bookings").await?.json().await?)
    }

    #[tracing::instrument(name = "api.invoice", skip(self), fields(order_id = %order), err)]
    async fn invoice(&self, order: &OrderId) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("bookings/{order}/invoice")))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::OrderNotFound(order.clone()));
        }

        let bytes = ensure_success(response, "invoice").await?.bytes().await?;

        Ok(bytes.to_vec())
    }
}

async fn ensure_success(response: Response, what: &str) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    Err(ApiError::UnexpectedResponse(format!(
        "{what} request failed with status {status}: {text}"
    )))
}
