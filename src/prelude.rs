//! Firecart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    api::{ApiError, OrderId, StorefrontApi, http::HttpStorefrontApi},
    cart::{
        Cart, CartError,
        store::{CartStore, CartStoreError, JsonFileCartStore, MemoryCartStore},
    },
    catalog::Catalog,
    checkout::{CheckoutError, CustomerDetails, OrderPayload},
    debounce::Debouncer,
    fixtures::{Fixture, FixtureApi},
    pricing::{PricedLine, PricingResult, compute_totals},
    products::{Product, ProductStatus},
    promotions::{Promotion, PromotionDirectory, PromotionError},
    receipt::{Quote, ReceiptError},
    storefront::{StalePromotionPolicy, Storefront},
};
