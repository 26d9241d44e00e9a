//! Interactive shopping session.
//!
//! Reads one command per line. Catalog and promotion snapshots refresh in the
//! background and promotion codes are looked up only once typing settles.

use std::{io, sync::Arc, time::Duration};

use firecart::{
    api::StorefrontApi,
    cart::store::{CartStore, JsonFileCartStore},
    config::StorefrontConfig,
    debounce::Debouncer,
    pricing::format_amount,
    receipt::write_price_list,
    refresh,
    storefront::Storefront,
};
use jiff::Zoned;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::watch,
    time::timeout,
};
use tracing::{debug, info};

use super::CliError;

/// How long to wait for the first catalog and promotion snapshots.
const INITIAL_FETCH_WAIT: Duration = Duration::from_secs(10);

const HELP: &str = "commands: list, add <serial>, remove <serial>, promo <code>, unpromo, show, clear, help, quit";

#[derive(Debug, PartialEq)]
enum Command<'a> {
    List,
    Add(&'a str),
    Remove(&'a str),
    Promo(&'a str),
    Unpromo,
    Show,
    Clear,
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let mut words = line.split_whitespace();

        let Some(verb) = words.next() else {
            return Command::Empty;
        };

        let argument = words.next().unwrap_or_default();

        match verb.to_ascii_lowercase().as_str() {
            "list" | "catalog" => Command::List,
            "add" => Command::Add(argument),
            "remove" => Command::Remove(argument),
            "promo" => Command::Promo(argument),
            "unpromo" => Command::Unpromo,
            "show" => Command::Show,
            "clear" => Command::Clear,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(verb),
        }
    }
}

pub(super) async fn run(
    config: &StorefrontConfig,
    api: Arc<dyn StorefrontApi>,
    input: impl AsyncRead + Unpin,
    out: &mut impl io::Write,
) -> Result<(), CliError> {
    let mut catalog = refresh::spawn_catalog(Arc::clone(&api), config.catalog_refresh());
    let mut promotions = refresh::spawn_promotions(api, config.promotions_refresh());

    let mut storefront = Storefront::open(
        first_snapshot(&mut catalog.snapshots).await,
        first_snapshot(&mut promotions.snapshots).await,
        JsonFileCartStore::new(&config.cart_path),
    )?
    .with_policy(config.stale_promotion);

    let (mut debouncer, mut codes) = Debouncer::new(config.promo_debounce());
    let mut lines = BufReader::new(input).lines();
    let mut input_closed = false;
    let mut awaiting_code = false;

    writeln!(out, "{HELP}")?;

    loop {
        // The most recently scheduled code always delivers unless cancelled.
        if input_closed && !awaiting_code {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if !input_closed => {
                let Some(line) = line? else {
                    debug!("input closed");
                    input_closed = true;
                    continue;
                };

                match Command::parse(&line) {
                    Command::Quit => break,
                    Command::Promo(code) => {
                        let code = code.to_string();

                        debouncer.schedule(async move { code });
                        awaiting_code = true;
                    }
                    Command::Unpromo => {
                        debouncer.cancel();
                        awaiting_code = false;
                        storefront.clear_promotion();
                        storefront.quote().write_to(&mut *out)?;
                    }
                    command => execute(&mut storefront, command, out)?,
                }
            }
            Some(code) = codes.recv() => {
                awaiting_code = false;
                apply_code(&mut storefront, &code, out)?;
            }
            Ok(()) = catalog.snapshots.changed() => {
                let snapshot = Arc::clone(&catalog.snapshots.borrow_and_update());

                info!(products = snapshot.len(), "catalog refreshed");

                storefront.replace_catalog(snapshot);
            }
            Ok(()) = promotions.snapshots.changed() => {
                let snapshot = Arc::clone(&promotions.snapshots.borrow_and_update());

                info!(promotions = snapshot.len(), "promotions refreshed");

                storefront.replace_directory(snapshot);
            }
        }
    }

    catalog.task.abort();
    promotions.task.abort();

    storefront.quote().write_to(&mut *out)?;

    Ok(())
}

fn execute<S: CartStore>(
    storefront: &mut Storefront<S>,
    command: Command<'_>,
    out: &mut impl io::Write,
) -> Result<(), CliError> {
    match command {
        Command::List => write_price_list(storefront.catalog(), &mut *out)?,
        Command::Add(serial) => match storefront.add_to_cart(serial) {
            Ok(quantity) => writeln!(out, "{serial}: {quantity} in cart")?,
            Err(error) => writeln!(out, "{error}")?,
        },
        Command::Remove(serial) => match storefront.remove_from_cart(serial) {
            Ok(quantity) => writeln!(out, "{serial}: {quantity} in cart")?,
            Err(error) => writeln!(out, "{error}")?,
        },
        Command::Show => storefront.quote().write_to(&mut *out)?,
        Command::Clear => {
            storefront.clear_cart();
            writeln!(out, "Cart cleared")?;
        }
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Unknown(verb) => writeln!(out, "unknown command {verb}; {HELP}")?,
        Command::Empty | Command::Quit | Command::Promo(_) | Command::Unpromo => {}
    }

    Ok(())
}

fn apply_code<S: CartStore>(
    storefront: &mut Storefront<S>,
    code: &str,
    out: &mut impl io::Write,
) -> Result<(), CliError> {
    match storefront.apply_promotion(code, &Zoned::now()) {
        Ok(totals) => writeln!(
            out,
            "Applied {}: you pay {} and save {}",
            code.trim().to_uppercase(),
            format_amount(totals.total),
            format_amount(totals.save)
        )?,
        Err(error) => writeln!(out, "{}: {error}", code.trim())?,
    }

    Ok(())
}

async fn first_snapshot<T>(snapshots: &mut watch::Receiver<Arc<T>>) -> Arc<T> {
    if timeout(INITIAL_FETCH_WAIT, snapshots.changed()).await.is_err() {
        debug!("no snapshot yet, starting empty");
    }

    Arc::clone(&snapshots.borrow_and_update())
}
