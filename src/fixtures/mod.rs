//! Fixtures
//!
//! Offline storefront data loaded from YAML files laid out as
//! `<base>/{products,promotions,locations}/<set>.yml`. [`FixtureApi`] serves a loaded
//! fixture through [`StorefrontApi`], keeping submitted bookings in memory.

use std::{fmt::Write as _, fs, path::PathBuf};

use async_trait::async_trait;
use jiff::Timestamp;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    api::{ApiError, BookingRecord, OrderId, ProductRecord, PromotionRecord, StorefrontApi},
    checkout::OrderPayload,
    pricing::format_amount,
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
struct ProductsFixture {
    products: Vec<ProductRecord>,
}

/// Wrapper for promotions in YAML
#[derive(Debug, Deserialize)]
struct PromotionsFixture {
    promotions: Vec<PromotionRecord>,
}

/// Wrapper for locations in YAML
#[derive(Debug, Deserialize)]
struct LocationsFixture {
    states: Vec<StateFixture>,
}

/// State and its districts
#[derive(Debug, Clone, Deserialize)]
pub struct StateFixture {
    /// State name
    pub name: String,

    /// District names
    #[serde(default)]
    pub districts: Vec<String>,
}

/// Fixture
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    products: Vec<ProductRecord>,
    promotions: Vec<PromotionRecord>,
    states: Vec<StateFixture>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            products: Vec::new(),
            promotions: Vec::new(),
            states: Vec::new(),
        }
    }

    /// Load product records from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: ProductsFixture = self.read("products", name)?;

        self.products.extend(fixture.products);

        Ok(self)
    }

    /// Load promotion records from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_promotions(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: PromotionsFixture = self.read("promotions", name)?;

        self.promotions.extend(fixture.promotions);

        Ok(self)
    }

    /// Load states and districts from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_locations(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: LocationsFixture = self.read("locations", name)?;

        self.states.extend(fixture.states);

        Ok(self)
    }

    /// Load a complete fixture set (products, promotions and locations with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// Load a complete fixture set from a custom base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set_in(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path);

        fixture
            .load_products(name)?
            .load_promotions(name)?
            .load_locations(name)?;

        Ok(fixture)
    }

    /// Product records, as the catalog endpoint would serve them
    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    /// Promotion records, as the directory endpoint would serve them
    pub fn promotions(&self) -> &[PromotionRecord] {
        &self.promotions
    }

    /// States with their districts
    pub fn states(&self) -> &[StateFixture] {
        &self.states
    }

    fn read<T: for<'de> Deserialize<'de>>(
        &self,
        category: &str,
        name: &str,
    ) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        debug!(path = %file_path.display(), "loaded fixture file");

        Ok(serde_norway::from_str(&contents)?)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// [`StorefrontApi`] served from a [`Fixture`].
#[derive(Debug)]
pub struct FixtureApi {
    fixture: Fixture,
    bookings: Mutex<Vec<(BookingRecord, OrderPayload)>>,
}

impl FixtureApi {
    /// Serve `fixture` with no bookings yet.
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            bookings: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StorefrontApi for FixtureApi {
    async fn products(&self) -> Result<Vec<ProductRecord>, ApiError> {
        Ok(self.fixture.products.clone())
    }

    async fn promotions(&self) -> Result<Vec<PromotionRecord>, ApiError> {
        Ok(self.fixture.promotions.clone())
    }

    async fn states(&self) -> Result<Vec<String>, ApiError> {
        Ok(self
            .fixture
            .states
            .iter()
            .map(|state| state.name.clone())
            .collect())
    }

    async fn districts(&self, state: &str) -> Result<Vec<String>, ApiError> {
        Ok(self
            .fixture
            .states
            .iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(state.trim()))
            .map(|state| state.districts.clone())
            .unwrap_or_default())
    }

    async fn submit_booking(&self, order: &OrderPayload) -> Result<OrderId, ApiError> {
        let mut bookings = self.bookings.lock().await;

        let order_id = OrderId::new(format!("FC-{}", 1001 + bookings.len()));

        let record = BookingRecord {
            order_id: order_id.clone(),
            status: "booked".to_string(),
            customer_name: Some(order.customer.name.clone()),
            total: Some(order.total),
            created_at: Some(Timestamp::now()),
        };

        bookings.push((record, order.clone()));

        Ok(order_id)
    }

    async fn booking(&self, order: &OrderId) -> Result<BookingRecord, ApiError> {
        self.bookings
            .lock()
            .await
            .iter()
            .find(|(record, _)| &record.order_id == order)
            .map(|(record, _)| record.clone())
            .ok_or_else(|| ApiError::OrderNotFound(order.clone()))
    }

    async fn invoice(&self, order: &OrderId) -> Result<Vec<u8>, ApiError> {
        let bookings = self.bookings.lock().await;

        let (record, payload) = bookings
            .iter()
            .find(|(record, _)| &record.order_id == order)
            .ok_or_else(|| ApiError::OrderNotFound(order.clone()))?;

        Ok(render_invoice(record, payload).into_bytes())
    }
}

fn render_invoice(record: &BookingRecord, order: &OrderPayload) -> String {
    let mut invoice = String::new();

    // Writing to a String cannot fail.
    _ = writeln!(invoice, "Invoice {}", record.order_id);
    _ = writeln!(invoice, "Customer: {}", order.customer.name);
    _ = writeln!(
        invoice,
        "Deliver to: {}, {}, {}",
        order.customer.address, order.customer.district, order.customer.state
    );
    _ = writeln!(invoice);

    for line in &order.lines {
        _ = writeln!(
            invoice,
            "{:<8} {:<32} {:>4} x {:>10} = {:>10}",
            line.serial_number,
            line.name,
            line.quantity,
            format_amount(line.unit_price),
            format_amount(line.total)
        );
    }

    _ = writeln!(invoice);
    _ = writeln!(invoice, "Net:              {}", format_amount(order.net));
    _ = writeln!(invoice, "Product discount: {}", format_amount(order.product_discount));
    _ = writeln!(invoice, "Promo discount:   {}", format_amount(order.promo_discount));
    _ = writeln!(invoice, "You save:         {}", format_amount(order.save));
    _ = writeln!(invoice, "Total:            {}", format_amount(order.total));

    if let Some(code) = &order.promo_code {
        _ = writeln!(invoice, "Promotion code:   {code}");
    }

    invoice
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rust_decimal::dec;
    use testresult::TestResult;

    use crate::{catalog::Catalog, checkout::CustomerDetails, promotions::PromotionDirectory};

    use super::*;

    fn write_fixture(base: &Path, category: &str, name: &str, contents: &str) -> TestResult {
        let dir = base.join(category);

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    fn order() -> OrderPayload {
        OrderPayload {
            lines: Vec::new(),
            net: dec!(4000),
            product_discount: dec!(400),
            promo_discount: dec!(0),
            save: dec!(400),
            total: dec!(3600),
            customer: CustomerDetails {
                name: "Meena".to_string(),
                mobile: "9876543210".to_string(),
                address: "12 Bazaar Street".to_string(),
                state: "Tamil Nadu".to_string(),
                district: "Virudhunagar".to_string(),
                ..CustomerDetails::default()
            },
            promo_code: None,
        }
    }

    #[test]
    fn default_set_loads_all_fixtures() -> TestResult {
        let fixture = Fixture::from_set("default")?;

        assert_eq!(fixture.products().len(), 8);
        assert_eq!(fixture.promotions().len(), 4);
        assert_eq!(fixture.states().len(), 3);

        Ok(())
    }

    #[test]
    fn default_catalog_skips_ineligible_and_malformed_products() -> TestResult {
        let fixture = Fixture::from_set("default")?;
        let catalog = Catalog::from_records(fixture.products().to_vec());

        assert_eq!(catalog.len(), 5);
        assert!(!catalog.contains("RK-12"));
        assert!(!catalog.contains("GB-01"));

        let directory = PromotionDirectory::from_records(fixture.promotions().to_vec());

        assert!(directory.lookup("diwali10").is_some());

        Ok(())
    }

    #[test]
    fn custom_base_path_is_used() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "products",
            "tiny",
            "products:\n  - serialNumber: \"A\"\n    name: \"Anar\"\n    unitPrice: \"10\"\n    status: \"on\"\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_products("tiny")?;

        assert_eq!(fixture.products().len(), 1);

        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut fixture = Fixture::with_base_path("./does-not-exist");

        assert!(matches!(
            fixture.load_products("default"),
            Err(FixtureError::Io(_))
        ));
    }

    #[tokio::test]
    async fn fixture_api_serves_locations() -> TestResult {
        let api = FixtureApi::new(Fixture::from_set("default")?);

        assert_eq!(api.states().await?.len(), 3);
        assert_eq!(
            api.districts("tamil nadu").await?,
            vec!["Chennai", "Madurai", "Virudhunagar"]
        );
        assert!(api.districts("Goa").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn bookings_round_trip_through_status_and_invoice() -> TestResult {
        let api = FixtureApi::new(Fixture::new());

        let order_id = api.submit_booking(&order()).await?;
        let record = api.booking(&order_id).await?;

        assert_eq!(order_id.as_str(), "FC-1001");
        assert_eq!(record.status, "booked");
        assert_eq!(record.total, Some(dec!(3600)));

        let invoice = String::from_utf8(api.invoice(&order_id).await?)?;

        assert!(invoice.contains("Invoice FC-1001"));
        assert!(invoice.contains("Total:            3600.00"));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let api = FixtureApi::new(Fixture::new());

        let result = api.booking(&OrderId::new("FC-0")).await;

        assert!(matches!(result, Err(ApiError::OrderNotFound(_))));
    }
}
