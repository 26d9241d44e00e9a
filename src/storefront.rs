//! Storefront session
//!
//! [`Storefront`] is the single owner of the mutable shopping state: the cart and the
//! applied promotion. Catalog and promotion data are read from immutable snapshots that
//! are swapped in whole when they refresh. Every cart mutation is written through to
//! the [`CartStore`].

use std::sync::Arc;

use jiff::Zoned;
use tracing::{debug, info, warn};

use crate::{
    cart::{
        Cart, CartError,
        store::{CartStore, CartStoreError},
    },
    catalog::Catalog,
    pricing::{PricedLine, PricingResult, compute_totals, price_lines},
    products::Product,
    promotions::{
        Promotion, PromotionDirectory,
        validation::{PromotionError, validate_promotion},
    },
    receipt::Quote,
};

/// What happens to an applied promotion when the cart changes afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StalePromotionPolicy {
    /// Keep the promotion until it is explicitly cleared.
    #[default]
    Retain,

    /// Re-run the acceptance checks after every cart change and drop the promotion if
    /// they no longer pass.
    Revalidate,
}

/// Cart, applied promotion and the snapshots they are priced against.
#[derive(Debug)]
pub struct Storefront<S: CartStore> {
    catalog: Arc<Catalog>,
    directory: Arc<PromotionDirectory>,
    cart: Cart,
    applied: Option<Promotion>,
    store: S,
    policy: StalePromotionPolicy,
    clock: fn() -> Zoned,
}

impl<S: CartStore> Storefront<S> {
    /// Start a session, rehydrating the cart from `store`.
    ///
    /// A stored cart that cannot be parsed is discarded and the session starts empty.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] if the store itself cannot be read.
    pub fn open(
        catalog: Arc<Catalog>,
        directory: Arc<PromotionDirectory>,
        mut store: S,
    ) -> Result<Self, CartStoreError> {
        let cart = match store.load() {
            Ok(cart) => cart,
            Err(CartStoreError::Malformed(error)) => {
                warn!(%error, "discarding unreadable stored cart");
                Cart::new()
            }
            Err(error) => return Err(error),
        };

        debug!(entries = cart.len(), "rehydrated cart");

        Ok(Self {
            catalog,
            directory,
            cart,
            applied: None,
            store,
            policy: StalePromotionPolicy::default(),
            clock: Zoned::now,
        })
    }

    /// Choose how an applied promotion reacts to later cart changes.
    #[must_use]
    pub fn with_policy(mut self, policy: StalePromotionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the clock used when an applied promotion is revalidated.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> Zoned) -> Self {
        self.clock = clock;
        self
    }

    /// Add one unit of a catalog product by serial number.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MissingSerialNumber`] for a blank serial and
    /// [`CartError::UnknownProduct`] if the serial is not in the catalog. The cart is not
    /// changed on error.
    pub fn add_to_cart(&mut self, serial_number: &str) -> Result<u32, CartError> {
        let serial = serial_number.trim();

        if serial.is_empty() {
            return Err(CartError::MissingSerialNumber);
        }

        if !self.catalog.contains(serial) {
            return Err(CartError::UnknownProduct(serial.to_string()));
        }

        let quantity = self.cart.increment(serial)?;

        debug!(serial, quantity, "added to cart");

        self.after_cart_change();

        Ok(quantity)
    }

    /// Add one unit of `product`.
    ///
    /// # Errors
    ///
    /// See [`Storefront::add_to_cart`].
    pub fn add_product(&mut self, product: &Product) -> Result<u32, CartError> {
        self.add_to_cart(&product.serial_number)
    }

    /// Remove one unit by serial number, deleting the entry at zero.
    ///
    /// Entries whose product has left the catalog can still be removed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MissingSerialNumber`] for a blank serial.
    pub fn remove_from_cart(&mut self, serial_number: &str) -> Result<u32, CartError> {
        let quantity = self.cart.decrement(serial_number)?;

        debug!(serial = serial_number.trim(), quantity, "removed from cart");

        self.after_cart_change();

        Ok(quantity)
    }

    /// Remove one unit of `product`.
    ///
    /// # Errors
    ///
    /// See [`Storefront::remove_from_cart`].
    pub fn remove_product(&mut self, product: &Product) -> Result<u32, CartError> {
        self.remove_from_cart(&product.serial_number)
    }

    /// Empty the cart and drop any applied promotion.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.applied = None;

        debug!("cleared cart");

        self.persist();
    }

    /// Validate `code` and make it the applied promotion.
    ///
    /// On failure any previously applied promotion is dropped and the cart is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the [`PromotionError`] of the first failing acceptance check.
    pub fn apply_promotion(
        &mut self,
        code: &str,
        now: &Zoned,
    ) -> Result<PricingResult, PromotionError> {
        self.applied = None;

        let current = self.totals().total;

        let promotion = validate_promotion(
            code,
            &self.directory,
            &self.catalog,
            &self.cart,
            current,
            now,
        )
        .inspect_err(|error| debug!(code, %error, "promotion rejected"))?
        .clone();

        info!(code = %promotion.code, discount = %promotion.discount_percent, "applied promotion");

        self.applied = Some(promotion);

        Ok(self.totals())
    }

    /// Drop the applied promotion, if any.
    pub fn clear_promotion(&mut self) {
        if let Some(promotion) = self.applied.take() {
            debug!(code = %promotion.code, "cleared promotion");
        }
    }

    /// Swap in a freshly fetched catalog.
    pub fn replace_catalog(&mut self, catalog: Arc<Catalog>) {
        self.catalog = catalog;

        if self.policy == StalePromotionPolicy::Revalidate {
            self.revalidate_promotion();
        }
    }

    /// Swap in a freshly fetched promotion directory.
    ///
    /// The applied promotion keeps the terms it was accepted with.
    pub fn replace_directory(&mut self, directory: Arc<PromotionDirectory>) {
        self.directory = directory;
    }

    /// Current order summary.
    pub fn totals(&self) -> PricingResult {
        compute_totals(&self.catalog, &self.cart, self.applied.as_ref())
    }

    /// Cart lines priced against the catalog, in catalog order.
    pub fn lines(&self) -> Vec<PricedLine<'_>> {
        price_lines(&self.catalog, &self.cart, self.applied.as_ref())
    }

    /// Lines, totals and promotion bundled for display.
    pub fn quote(&self) -> Quote<'_> {
        Quote::new(self.lines(), self.totals(), self.applied.as_ref())
    }

    /// The applied promotion.
    pub fn applied_promotion(&self) -> Option<&Promotion> {
        self.applied.as_ref()
    }

    /// The cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The catalog snapshot in use.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The promotion directory snapshot in use.
    pub fn directory(&self) -> &PromotionDirectory {
        &self.directory
    }

    /// The backing cart store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn after_cart_change(&mut self) {
        self.persist();

        if self.policy == StalePromotionPolicy::Revalidate {
            self.revalidate_promotion();
        }
    }

    fn revalidate_promotion(&mut self) {
        let Some(code) = self.applied.as_ref().map(|promotion| promotion.code.clone()) else {
            return;
        };

        let current = compute_totals(&self.catalog, &self.cart, None).total;

        match validate_promotion(
            &code,
            &self.directory,
            &self.catalog,
            &self.cart,
            current,
            &(self.clock)(),
        ) {
            Ok(promotion) => self.applied = Some(promotion.clone()),
            Err(error) => {
                info!(code = %code, %error, "dropping promotion that no longer applies");

                self.applied = None;
            }
        }
    }

    fn persist(&mut self) {
        if let Err(error) = self.store.save(&self.cart) {
            warn!(%error, "failed to persist cart");
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::{Timestamp, civil::date, tz::TimeZone};
    use rust_decimal::{Decimal, dec};
    use testresult::TestResult;

    use crate::{
        cart::store::{JsonFileCartStore, MemoryCartStore},
        products::ProductStatus,
    };

    use super::*;

    fn product(serial: &str, price: Decimal, discount: Decimal, kind: &str) -> Product {
        Product {
            serial_number: serial.to_string(),
            name: serial.to_string(),
            unit_price: price,
            discount_percent: discount,
            per: "box".to_string(),
            product_type: kind.to_string(),
            status: ProductStatus::On,
        }
    }

    fn now() -> TestResult<Zoned> {
        Ok(date(2026, 10, 16).at(10, 0, 0, 0).to_zoned(TimeZone::UTC)?)
    }

    fn storefront() -> TestResult<Storefront<MemoryCartStore>> {
        let catalog = Catalog::new([
            product("A", dec!(100), dec!(10), "rockets"),
            product("B", dec!(50), dec!(0), "sparklers"),
        ]);

        let directory = PromotionDirectory::new([
            Promotion::new("SAVE10", dec!(10)).with_min_amount(dec!(200)),
            Promotion::new("ROCKET15", dec!(15)).with_product_type("rockets"),
            Promotion::new("OLD", dec!(50)).with_expiry(date(2025, 12, 31)),
        ]);

        Ok(Storefront::open(
            Arc::new(catalog),
            Arc::new(directory),
            MemoryCartStore::default(),
        )?)
    }

    fn fill(storefront: &mut Storefront<MemoryCartStore>) -> TestResult {
        storefront.add_to_cart("A")?;
        storefront.add_to_cart("A")?;
        storefront.add_to_cart("B")?;

        Ok(())
    }

    #[test]
    fn open_rehydrates_stored_cart() -> TestResult {
        let stored = Cart::from_entries([("B".to_string(), 4)]);
        let storefront = Storefront::open(
            Arc::new(Catalog::default()),
            Arc::new(PromotionDirectory::default()),
            MemoryCartStore::with_cart(stored.clone()),
        )?;

        assert_eq!(storefront.cart(), &stored);

        Ok(())
    }

    #[test]
    fn open_starts_empty_when_stored_cart_is_unreadable() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cart.json");

        std::fs::write(&path, r#"{"A": 1.5}"#)?;

        let mut storefront = Storefront::open(
            Arc::new(Catalog::new([product("A", dec!(100), dec!(0), "rockets")])),
            Arc::new(PromotionDirectory::default()),
            JsonFileCartStore::new(&path),
        )?;

        assert!(storefront.cart().is_empty());

        storefront.add_to_cart("A")?;

        assert_eq!(std::fs::read_to_string(&path)?, r#"{"A":1}"#);

        Ok(())
    }

    #[test]
    fn open_starts_empty_when_stored_cart_is_truncated() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cart.json");

        std::fs::write(&path, r#"{"A": 2, "B"#)?;

        let storefront = Storefront::open(
            Arc::new(Catalog::default()),
            Arc::new(PromotionDirectory::default()),
            JsonFileCartStore::new(&path),
        )?;

        assert!(storefront.cart().is_empty());

        Ok(())
    }

    #[test]
    fn every_mutation_is_written_through() -> TestResult {
        let mut storefront = storefront()?;

        fill(&mut storefront)?;
        storefront.remove_from_cart("B")?;

        assert_eq!(storefront.store().saves(), 4);
        assert_eq!(storefront.store().stored(), Some(storefront.cart()));

        Ok(())
    }

    #[test]
    fn unknown_product_is_rejected_without_mutation() -> TestResult {
        let mut storefront = storefront()?;

        let result = storefront.add_to_cart("ZZZ");

        assert_eq!(result, Err(CartError::UnknownProduct("ZZZ".to_string())));
        assert!(storefront.cart().is_empty());
        assert_eq!(storefront.store().saves(), 0);

        Ok(())
    }

    #[test]
    fn blank_serial_is_rejected() -> TestResult {
        let mut storefront = storefront()?;

        assert_eq!(storefront.add_to_cart(""), Err(CartError::MissingSerialNumber));
        assert_eq!(
            storefront.remove_from_cart("  "),
            Err(CartError::MissingSerialNumber)
        );

        Ok(())
    }

    #[test]
    fn apply_promotion_updates_totals() -> TestResult {
        let mut storefront = storefront()?;
        fill(&mut storefront)?;

        let totals = storefront.apply_promotion("save10", &now()?)?;

        assert_eq!(totals.net, dec!(250));
        assert_eq!(totals.promo_discount, dec!(23));
        assert_eq!(totals.total, dec!(207));
        assert_eq!(totals.save, dec!(43));
        assert_eq!(
            storefront.applied_promotion().map(|p| p.code.as_str()),
            Some("SAVE10")
        );

        Ok(())
    }

    #[test]
    fn rejected_promotion_clears_previous_one() -> TestResult {
        let mut storefront = storefront()?;
        fill(&mut storefront)?;

        storefront.apply_promotion("SAVE10", &now()?)?;

        let result = storefront.apply_promotion("OLD", &now()?);

        assert!(matches!(result, Err(PromotionError::Expired(_))));
        assert!(storefront.applied_promotion().is_none());
        assert_eq!(storefront.totals().promo_discount, Decimal::ZERO);
        assert_eq!(storefront.cart().units(), 3);

        Ok(())
    }

    #[test]
    fn below_minimum_leaves_totals_unchanged() -> TestResult {
        let mut storefront = storefront()?;
        storefront.add_to_cart("B")?;

        let before = storefront.totals();
        let result = storefront.apply_promotion("SAVE10", &now()?);

        assert!(matches!(result, Err(PromotionError::BelowMinimum { .. })));
        assert_eq!(storefront.totals(), before);

        Ok(())
    }

    #[test]
    fn retain_policy_keeps_stale_promotion() -> TestResult {
        let mut storefront = storefront()?;
        fill(&mut storefront)?;

        storefront.apply_promotion("ROCKET15", &now()?)?;
        storefront.remove_from_cart("A")?;
        storefront.remove_from_cart("A")?;

        assert!(storefront.applied_promotion().is_some());
        assert_eq!(storefront.totals().promo_discount, Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn revalidate_policy_drops_stale_promotion() -> TestResult {
        let mut storefront = storefront()?.with_policy(StalePromotionPolicy::Revalidate);
        fill(&mut storefront)?;

        storefront.apply_promotion("ROCKET15", &now()?)?;
        storefront.remove_from_cart("A")?;

        assert!(storefront.applied_promotion().is_some());

        storefront.remove_from_cart("A")?;

        assert!(storefront.applied_promotion().is_none());

        Ok(())
    }

    #[test]
    fn revalidate_policy_drops_promotion_after_catalog_refresh() -> TestResult {
        let mut storefront = storefront()?.with_policy(StalePromotionPolicy::Revalidate);
        fill(&mut storefront)?;

        storefront.apply_promotion("ROCKET15", &now()?)?;
        storefront.replace_catalog(Arc::new(Catalog::new([product(
            "B",
            dec!(50),
            dec!(0),
            "sparklers",
        )])));

        assert!(storefront.applied_promotion().is_none());
        assert_eq!(storefront.totals().total, dec!(50));

        Ok(())
    }

    #[test]
    fn retain_policy_keeps_promotion_after_catalog_refresh() -> TestResult {
        let mut storefront = storefront()?;
        fill(&mut storefront)?;

        storefront.apply_promotion("ROCKET15", &now()?)?;
        storefront.replace_catalog(Arc::new(Catalog::default()));

        assert!(storefront.applied_promotion().is_some());

        Ok(())
    }

    #[test]
    fn revalidate_policy_drops_promotion_that_expired_mid_session() -> TestResult {
        let mut storefront = storefront()?
            .with_policy(StalePromotionPolicy::Revalidate)
            .with_clock(|| Timestamp::constant(1_767_225_600, 0).to_zoned(TimeZone::UTC));
        fill(&mut storefront)?;

        let new_years_eve = date(2025, 12, 31).at(23, 0, 0, 0).to_zoned(TimeZone::UTC)?;

        storefront.apply_promotion("OLD", &new_years_eve)?;

        assert!(storefront.applied_promotion().is_some());

        storefront.add_to_cart("B")?;

        assert!(storefront.applied_promotion().is_none());
        assert_eq!(storefront.totals().promo_discount, Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn clear_cart_resets_totals_and_promotion() -> TestResult {
        let mut storefront = storefront()?;
        fill(&mut storefront)?;
        storefront.apply_promotion("SAVE10", &now()?)?;

        storefront.clear_cart();
        storefront.clear_cart();

        assert_eq!(storefront.totals(), PricingResult::ZERO);
        assert!(storefront.applied_promotion().is_none());
        assert_eq!(storefront.store().stored(), Some(&Cart::new()));

        Ok(())
    }

    #[test]
    fn clear_promotion_returns_to_no_promotion() -> TestResult {
        let mut storefront = storefront()?;
        fill(&mut storefront)?;
        storefront.apply_promotion("SAVE10", &now()?)?;

        storefront.clear_promotion();

        assert!(storefront.applied_promotion().is_none());
        assert_eq!(storefront.totals().total, dec!(230));

        Ok(())
    }

    #[test]
    fn catalog_refresh_drops_vanished_lines_from_totals() -> TestResult {
        let mut storefront = storefront()?;
        fill(&mut storefront)?;

        storefront.replace_catalog(Arc::new(Catalog::new([product(
            "B",
            dec!(50),
            dec!(0),
            "sparklers",
        )])));

        assert_eq!(storefront.totals().net, dec!(50));
        assert_eq!(storefront.cart().quantity("A"), 2);
        assert_eq!(storefront.remove_from_cart("A")?, 1);

        Ok(())
    }
}
