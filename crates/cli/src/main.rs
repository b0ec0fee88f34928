//! RocketShoes CLI - drive a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! rs-cli show
//!
//! # Add one unit of product 3
//! rs-cli add 3
//!
//! # Set product 3 to 2 units
//! rs-cli update 3 2
//!
//! # Remove product 3
//! rs-cli remove 3
//!
//! # Try things out without touching the storage file
//! rs-cli --ephemeral add 3
//! ```
//!
//! # Environment Variables
//!
//! See `rocketshoes_cart::config` for the full list. `RUST_LOG` controls log
//! verbosity (logs go to stderr; the cart goes to stdout).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rocketshoes_cart::{CartConfig, CartError};
use rocketshoes_core::ProductId;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::cart::Session;

/// Log filter when `RUST_LOG` is unset; keeps stderr quiet so only the cart shows.
const DEFAULT_LOG_FILTER: &str = "rocketshoes_cart=warn,rs_cli=warn";

#[derive(Parser)]
#[command(name = "rs-cli")]
#[command(author, version, about = "RocketShoes cart tools")]
struct Cli {
    /// Keep the cart in memory instead of the storage file
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Log notifications instead of printing them
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart with line subtotals and total
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Set the amount of a product already in the cart
    Update {
        /// Product ID
        product_id: ProductId,

        /// New amount (must be greater than zero)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
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

    tracing::info!("Sentry initialized");
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

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().with_writer(std::io::stderr).init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let session = match Session::open(&config, cli.ephemeral, cli.quiet) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to create API client: {e}");
            std::process::exit(2);
        }
    };

    // The store has already reported the failure (toast, log, Sentry)
    if run(cli.command, session).await.is_err() {
        std::process::exit(1);
    }
}

async fn run(command: Commands, mut session: Session) -> Result<(), CartError> {
    let result = match command {
        Commands::Show => Ok(()),
        Commands::Add { product_id } => session.store.add_product(product_id).await.map(|_| ()),
        Commands::Remove { product_id } => session.store.remove_product(product_id).map(|_| ()),
        Commands::Update { product_id, amount } => session
            .store
            .update_product_amount(product_id, amount)
            .await
            .map(|_| ()),
    };

    session.print_toasts();
    result?;
    session.print_cart();
    Ok(())
}
