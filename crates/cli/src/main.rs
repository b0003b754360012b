//! Reuse cart CLI - drive the storefront cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! reuse-cart products
//! reuse-cart product organic-tote
//!
//! # Build a cart (the cart ID is remembered in REUSE_CART_FILE)
//! reuse-cart add gid://shopify/ProductVariant/123 --quantity 2
//! reuse-cart show
//! reuse-cart set gid://shopify/CartLine/abc 3
//! reuse-cart remove gid://shopify/CartLine/abc
//!
//! # Hand off to checkout, or start over
//! reuse-cart checkout
//! reuse-cart forget
//! ```
//!
//! Configuration comes from the environment (see `reuse_storefront::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reuse_core::{CartLineId, MerchandiseId};
use reuse_storefront::cart::{CartStore, FilePersistence};
use reuse_storefront::config::StorefrontConfig;
use reuse_storefront::shopify::StorefrontClient;

mod commands;

#[derive(Parser)]
#[command(name = "reuse-cart")]
#[command(author, version, about = "Reuse storefront cart client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog products
    Products {
        /// Number of products to list
        #[arg(short, long, default_value_t = 20)]
        first: i64,
    },
    /// Show one product and its variants
    Product {
        /// Product handle
        handle: String,
    },
    /// Show the current cart
    Show,
    /// Add a product variant to the cart
    Add {
        /// Product variant ID
        variant: MerchandiseId,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Remove a line from the cart
    Remove {
        /// Cart line ID
        line: CartLineId,
    },
    /// Set a line's quantity (0 removes it)
    Set {
        /// Cart line ID
        line: CartLineId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove every line from the cart
    Clear,
    /// Print the checkout URL
    Checkout,
    /// Forget the remembered cart
    Forget,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Logs go to stderr so command output stays pipeable.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "reuse_storefront=info,reuse_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Sentry must be initialized before the tracing subscriber
    let config = StorefrontConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = StorefrontClient::new(&config.shopify)?;
    let persistence = FilePersistence::new(&config.cart_file);

    match cli.command {
        Commands::Products { first } => commands::catalog::list(&client, first).await?,
        Commands::Product { handle } => commands::catalog::show(&client, &handle).await?,
        Commands::Forget => commands::cart::forget(&CartStore::new(client, persistence)),
        command => {
            let store = CartStore::rehydrate(client, persistence).await;
            match command {
                Commands::Show => commands::cart::show(&store),
                Commands::Add { variant, quantity } => {
                    commands::cart::add(&store, variant, quantity).await?;
                }
                Commands::Remove { line } => commands::cart::remove(&store, &line).await?,
                Commands::Set { line, quantity } => {
                    commands::cart::set(&store, &line, quantity).await?;
                }
                Commands::Clear => commands::cart::clear(&store).await?,
                Commands::Checkout => commands::cart::checkout(&store)?,
                Commands::Products { .. } | Commands::Product { .. } | Commands::Forget => {}
            }
        }
    }
    Ok(())
}
