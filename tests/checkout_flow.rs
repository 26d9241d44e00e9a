//! End-to-end checkout against the offline fixture backend and a mocked backend.

use std::sync::Arc;

use jiff::{civil::date, tz::TimeZone};
use rust_decimal::dec;
use testresult::TestResult;

use firecart::{
    api::{ApiError, MockStorefrontApi, OrderId, StorefrontApi},
    cart::store::JsonFileCartStore,
    catalog::Catalog,
    checkout::{CheckoutError, CustomerDetails, DEFAULT_MIN_ORDER_AMOUNT},
    fixtures::{Fixture, FixtureApi},
    promotions::PromotionDirectory,
    storefront::Storefront,
};

fn customer() -> CustomerDetails {
    CustomerDetails {
        name: "Karthik".to_string(),
        mobile: "09443012345".to_string(),
        email: None,
        address: "4 Car Street".to_string(),
        state: "Tamil Nadu".to_string(),
        district: "Madurai".to_string(),
        pincode: Some("625001".to_string()),
    }
}

async fn open(
    api: &dyn StorefrontApi,
    store: JsonFileCartStore,
) -> TestResult<Storefront<JsonFileCartStore>> {
    let catalog = Catalog::fetch(api).await;
    let directory = PromotionDirectory::fetch(api).await;

    Ok(Storefront::open(Arc::new(catalog), Arc::new(directory), store)?)
}

#[tokio::test]
async fn cart_survives_restart_and_checkout_clears_it() -> TestResult {
    let dir = tempfile::tempdir()?;
    let cart_path = dir.path().join("session").join("cart.json");
    let api = FixtureApi::new(Fixture::from_set("default")?);

    let mut first = open(&api, JsonFileCartStore::new(&cart_path)).await?;

    for _ in 0..15 {
        first.add_to_cart("RK-10")?;
    }

    let before = first.totals();
    drop(first);

    let mut second = open(&api, JsonFileCartStore::new(&cart_path)).await?;

    assert_eq!(second.cart().quantity("RK-10"), 15);
    assert_eq!(second.totals(), before);

    let now = date(2026, 10, 16).at(18, 30, 0, 0).to_zoned(TimeZone::UTC)?;
    second.apply_promotion("ROCKET15", &now)?;

    let order_id = second
        .checkout(&api, &customer(), DEFAULT_MIN_ORDER_AMOUNT)
        .await?;

    assert_eq!(order_id.as_str(), "FC-1001");
    assert!(second.cart().is_empty());
    assert!(second.applied_promotion().is_none());

    let third = open(&api, JsonFileCartStore::new(&cart_path)).await?;

    assert!(third.cart().is_empty(), "cleared cart was persisted");

    let booking = api.booking(&order_id).await?;

    assert_eq!(booking.status, "booked");
    assert_eq!(booking.total, Some(dec!(3570.00)));

    let invoice = String::from_utf8(api.invoice(&order_id).await?)?;

    assert!(invoice.contains("Promotion code:   ROCKET15"));

    Ok(())
}

#[tokio::test]
async fn below_minimum_order_is_not_submitted() -> TestResult {
    let dir = tempfile::tempdir()?;
    let api = FixtureApi::new(Fixture::from_set("default")?);

    let mut storefront = open(&api, JsonFileCartStore::new(dir.path().join("cart.json"))).await?;
    storefront.add_to_cart("GC-01")?;

    let result = storefront
        .checkout(&api, &customer(), DEFAULT_MIN_ORDER_AMOUNT)
        .await;

    assert!(matches!(
        result,
        Err(CheckoutError::BelowMinimumOrder { total, .. }) if total == dec!(80)
    ));
    assert_eq!(storefront.cart().quantity("GC-01"), 1);
    assert!(matches!(
        api.booking(&OrderId::new("FC-1001")).await,
        Err(ApiError::OrderNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn submitted_payload_carries_normalised_customer_and_lines() -> TestResult {
    let dir = tempfile::tempdir()?;
    let fixture = Fixture::from_set("default")?;
    let offline = FixtureApi::new(fixture.clone());

    let mut storefront =
        open(&offline, JsonFileCartStore::new(dir.path().join("cart.json"))).await?;

    for serial in ["FP-02", "RK-10", "FP-02"] {
        storefront.add_to_cart(serial)?;
    }

    let mut backend = MockStorefrontApi::new();

    backend
        .expect_submit_booking()
        .withf(|order| {
            order.customer.mobile == "9443012345"
                && order.lines.len() == 2
                && order.lines.iter().map(|line| line.serial_number.as_str()).eq(["FP-02", "RK-10"])
                && order.total == dec!(637.00)
                && order.promo_code.is_none()
        })
        .times(1)
        .returning(|_| Ok(OrderId::new("SRV-77")));

    let order_id = storefront.checkout(&backend, &customer(), dec!(500)).await?;

    assert_eq!(order_id, OrderId::new("SRV-77"));

    Ok(())
}
