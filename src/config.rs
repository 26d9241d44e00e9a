//! Storefront configuration

use std::{path::PathBuf, time::Duration};

use clap::Args;
use rust_decimal::Decimal;

use crate::storefront::StalePromotionPolicy;

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    #[default]
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Storefront settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct StorefrontConfig {
    /// Base URL of the storefront backend
    #[arg(long, env = "STOREFRONT_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Where the cart is persisted between runs
    #[arg(long, env = "STOREFRONT_CART_PATH", default_value = ".firecart/cart.json")]
    pub cart_path: PathBuf,

    /// Minimum payable total accepted at checkout
    #[arg(long, env = "STOREFRONT_MIN_ORDER_AMOUNT", default_value = "3000")]
    pub min_order_amount: Decimal,

    /// Quiet window before a typed promotion code is looked up, in milliseconds
    #[arg(long, env = "STOREFRONT_PROMO_DEBOUNCE_MS", default_value_t = 500)]
    pub promo_debounce_ms: u64,

    /// Catalog refresh interval in seconds
    #[arg(long, env = "STOREFRONT_CATALOG_REFRESH_SECS", default_value_t = 300)]
    pub catalog_refresh_secs: u64,

    /// Promotion directory refresh interval in seconds
    #[arg(long, env = "STOREFRONT_PROMOTIONS_REFRESH_SECS", default_value_t = 60)]
    pub promotions_refresh_secs: u64,

    /// What happens to an applied promotion when the cart changes
    #[arg(
        long,
        env = "STOREFRONT_STALE_PROMOTION",
        value_enum,
        default_value_t = StalePromotionPolicy::Retain
    )]
    pub stale_promotion: StalePromotionPolicy,

    /// Serve data from this fixture set instead of the backend
    #[arg(long, env = "STOREFRONT_FIXTURES")]
    pub fixtures: Option<String>,

    /// Directory fixture sets are read from
    #[arg(long, env = "STOREFRONT_FIXTURES_DIR", default_value = "fixtures")]
    pub fixtures_dir: PathBuf,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl StorefrontConfig {
    /// Quiet window applied to promotion-code input
    #[must_use]
    pub fn promo_debounce(&self) -> Duration {
        Duration::from_millis(self.promo_debounce_ms)
    }

    /// Catalog refresh interval
    #[must_use]
    pub fn catalog_refresh(&self) -> Duration {
        Duration::from_secs(self.catalog_refresh_secs)
    }

    /// Promotion directory refresh interval
    #[must_use]
    pub fn promotions_refresh(&self) -> Duration {
        Duration::from_secs(self.promotions_refresh_secs)
    }
}
