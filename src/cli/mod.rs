use std::{io, path::PathBuf, sync::Arc};

use clap::{Args, Parser, Subcommand};
use firecart::{
    api::{ApiError, OrderId, StorefrontApi, http::HttpStorefrontApi},
    cart::{
        CartError,
        store::{CartStoreError, JsonFileCartStore},
    },
    catalog::Catalog,
    checkout::{CheckoutError, CustomerDetails},
    config::StorefrontConfig,
    fixtures::{Fixture, FixtureApi, FixtureError},
    pricing::format_amount,
    promotions::{PromotionDirectory, PromotionError},
    receipt::{ReceiptError, write_booking, write_price_list},
    storefront::Storefront,
};
use jiff::Zoned;
use thiserror::Error;
use tracing::debug;

mod shop;

/// Errors surfaced to the user by a command.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    CartStore(#[from] CartStoreError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Promotion(#[from] PromotionError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Parser)]
#[command(name = "firecart", about = "Fireworks storefront cart and checkout", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: StorefrontConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the price list
    Catalog,

    /// Inspect or change the cart
    Cart(CartCommand),

    /// Price the cart, optionally with a promotion code
    Quote {
        /// Promotion code to apply
        #[arg(long)]
        promo: Option<String>,
    },

    /// Place an order for the cart
    Checkout(CheckoutArgs),

    /// Look up submitted orders
    Order(OrderCommand),

    /// List delivery locations
    Locations(LocationsCommand),

    /// Interactive session with live catalog and promotion refresh
    Shop,
}

#[derive(Debug, Args)]
struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart
    Show,

    /// Add one unit of a product
    Add {
        /// Product serial number
        serial: String,
    },

    /// Remove one unit of a product
    Remove {
        /// Product serial number
        serial: String,
    },

    /// Empty the cart
    Clear,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    /// Full name
    #[arg(long)]
    name: String,

    /// Mobile number
    #[arg(long)]
    mobile: String,

    /// Email address
    #[arg(long)]
    email: Option<String>,

    /// Street address
    #[arg(long)]
    address: String,

    /// State
    #[arg(long)]
    state: String,

    /// District
    #[arg(long)]
    district: String,

    /// Postal code
    #[arg(long)]
    pincode: Option<String>,

    /// Promotion code to apply
    #[arg(long)]
    promo: Option<String>,
}

impl CheckoutArgs {
    fn customer(&self) -> CustomerDetails {
        CustomerDetails {
            name: self.name.clone(),
            mobile: self.mobile.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            state: self.state.clone(),
            district: self.district.clone(),
            pincode: self.pincode.clone(),
        }
    }
}

#[derive(Debug, Args)]
struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    /// Show the status of an order
    Status {
        /// Order identifier
        order_id: String,
    },

    /// Download the invoice of an order
    Invoice {
        /// Order identifier
        order_id: String,

        /// Where to write the invoice
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Args)]
struct LocationsCommand {
    #[command(subcommand)]
    command: LocationsSubcommand,
}

#[derive(Debug, Subcommand)]
enum LocationsSubcommand {
    /// List states
    States,

    /// List the districts of a state
    Districts {
        /// State name
        state: String,
    },
}

impl Cli {
    /// Load configuration from `.env`, environment and CLI arguments
    pub(crate) fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) async fn run(self) -> Result<(), CliError> {
        let api = backend(&self.config)?;
        let mut out = io::stdout();

        match self.command {
            Commands::Catalog => {
                let catalog = Catalog::fetch(api.as_ref()).await;

                write_price_list(&catalog, &mut out)?;
            }
            Commands::Cart(CartCommand { command }) => {
                let mut storefront = open_storefront(&self.config, api.as_ref()).await?;

                match command {
                    CartSubcommand::Show => {}
                    CartSubcommand::Add { serial } => {
                        storefront.add_to_cart(&serial)?;
                    }
                    CartSubcommand::Remove { serial } => {
                        storefront.remove_from_cart(&serial)?;
                    }
                    CartSubcommand::Clear => storefront.clear_cart(),
                }

                storefront.quote().write_to(&mut out)?;
            }
            Commands::Quote { promo } => {
                let mut storefront = open_storefront(&self.config, api.as_ref()).await?;

                if let Some(code) = promo {
                    storefront.apply_promotion(&code, &Zoned::now())?;
                }

                storefront.quote().write_to(&mut out)?;
            }
            Commands::Checkout(args) => {
                let mut storefront = open_storefront(&self.config, api.as_ref()).await?;

                if let Some(code) = &args.promo {
                    storefront.apply_promotion(code, &Zoned::now())?;
                }

                let totals = storefront.totals();
                let order_id = storefront
                    .checkout(api.as_ref(), &args.customer(), self.config.min_order_amount)
                    .await?;

                write_line(
                    &mut out,
                    &format!(
                        "Order {order_id} placed, total {}",
                        format_amount(totals.rounded().total)
                    ),
                )?;
            }
            Commands::Order(OrderCommand { command }) => match command {
                OrderSubcommand::Status { order_id } => {
                    let record = api.booking(&OrderId::new(order_id)).await?;

                    write_booking(&record, &mut out)?;
                }
                OrderSubcommand::Invoice { order_id, out: path } => {
                    let invoice = api.invoice(&OrderId::new(order_id)).await?;

                    tokio::fs::write(&path, &invoice).await?;

                    write_line(&mut out, &format!("Invoice written to {}", path.display()))?;
                }
            },
            Commands::Locations(LocationsCommand { command }) => {
                let names = match command {
                    LocationsSubcommand::States => api.states().await?,
                    LocationsSubcommand::Districts { state } => api.districts(&state).await?,
                };

                for name in names {
                    write_line(&mut out, &name)?;
                }
            }
            Commands::Shop => {
                let stdin = tokio::io::stdin();

                shop::run(&self.config, api, stdin, &mut out).await?;
            }
        }

        Ok(())
    }
}

fn backend(config: &StorefrontConfig) -> Result<Arc<dyn StorefrontApi>, CliError> {
    match &config.fixtures {
        Some(set) => {
            debug!(set, dir = %config.fixtures_dir.display(), "serving fixture data");

            let fixture = Fixture::from_set_in(&config.fixtures_dir, set)?;

            Ok(Arc::new(FixtureApi::new(fixture)))
        }
        None => Ok(Arc::new(HttpStorefrontApi::new(config.api_url.clone()))),
    }
}

async fn open_storefront(
    config: &StorefrontConfig,
    api: &dyn StorefrontApi,
) -> Result<Storefront<JsonFileCartStore>, CliError> {
    let (catalog, directory) = tokio::join!(Catalog::fetch(api), PromotionDirectory::fetch(api));

    let store = JsonFileCartStore::new(&config.cart_path);

    Ok(
        Storefront::open(Arc::new(catalog), Arc::new(directory), store)?
            .with_policy(config.stale_promotion),
    )
}

fn write_line(out: &mut impl io::Write, line: &str) -> Result<(), CliError> {
    writeln!(out, "{line}")?;

    Ok(())
}
