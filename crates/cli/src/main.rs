//! SheShape CLI - Cart, checkout and order tools for the SheShape shop.
//!
//! # Usage
//!
//! ```bash
//! # Store the bearer token issued at login
//! sheshape token set <TOKEN>
//!
//! # Browse the catalog
//! sheshape products list --category yoga
//!
//! # Manage the cart
//! sheshape cart add 7 --quantity 2
//! sheshape cart show
//!
//! # Place an order from a YAML checkout form
//! sheshape checkout --file checkout.yaml
//!
//! # Follow up on orders
//! sheshape orders recent
//! sheshape orders track SS-20240101-0001
//! ```
//!
//! # Environment Variables
//!
//! See `sheshape_client::config` for the full list. `RUST_LOG` controls
//! log output (default: `sheshape_client=info,sheshape_cli=info`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use sheshape_client::services::{OrderQuery, ProductQuery, SortDirection};
use sheshape_client::{ChannelNotifier, ClientConfig, Notifier, Storefront};
use sheshape_core::{OrderId, ProductId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "sheshape")]
#[command(author, version, about = "SheShape shop command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who the stored token belongs to
    Whoami,
    /// Manage the stored bearer token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the current cart
    Checkout {
        /// YAML file with the payment method, addresses and card details
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Inspect and cancel orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Save a token for later runs
    Set {
        /// Bearer token issued by the login endpoint
        token: String,
    },
    /// Forget the stored token
    Clear,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List a page of products
    List {
        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Products per page
        #[arg(long, default_value_t = 10)]
        size: u32,

        /// Field to sort by
        #[arg(long, default_value = "name")]
        sort_by: String,

        /// Sort direction (`asc` or `desc`)
        #[arg(long, default_value = "asc")]
        direction: SortDirection,

        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product
    Show {
        /// Product ID
        id: ProductId,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        /// Product ID
        product_id: ProductId,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a line (0 removes it)
    Update {
        /// Product ID
        product_id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i32,
    },
    /// Remove a line
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Empty the cart
    Clear,
    /// Check every line can still be bought
    Validate,
    /// Number of units in the cart, as counted by the server
    Count,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders, newest first
    List {
        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Orders per page
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    /// Your most recent orders
    Recent {
        #[arg(short, long, default_value_t = 5)]
        limit: u32,
    },
    /// Show one order
    Show {
        /// Order ID
        id: OrderId,
    },
    /// Cancel an order that has not shipped yet
    Cancel {
        /// Order ID
        id: OrderId,

        /// Reason recorded with the cancellation
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Look up an order by its order number
    Track {
        /// Order number, e.g. SS-20240101-0001
        order_number: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
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
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sheshape_client=info,sheshape_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Sentry flushes when its guard drops at the end of main
    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (notifier, mut notices) = ChannelNotifier::channel();
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);
    let storefront = Storefront::new(config, notifier)?;

    let result = dispatch(&storefront, cli.command).await;

    // Notices are shown after the command's own output
    while let Ok(notice) = notices.try_recv() {
        commands::print_notice(&notice);
    }
    result
}

async fn dispatch(
    storefront: &Storefront,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Whoami => commands::account::whoami(storefront).await,
        Commands::Token { action } => match action {
            TokenAction::Set { token } => commands::account::set_token(storefront, token)?,
            TokenAction::Clear => commands::account::clear_token(storefront)?,
        },
        Commands::Products { action } => match action {
            ProductsAction::List {
                page,
                size,
                sort_by,
                direction,
                category,
            } => {
                let query = ProductQuery {
                    page,
                    size,
                    sort_by,
                    direction,
                    category,
                };
                commands::products::list(storefront, &query).await?;
            }
            ProductsAction::Show { id } => commands::products::show(storefront, id).await?,
        },
        Commands::Cart { action } => {
            commands::require_session(storefront).await?;
            match action {
                CartAction::Show => commands::cart::show(storefront),
                CartAction::Add {
                    product_id,
                    quantity,
                } => commands::cart::add(storefront, product_id, quantity).await?,
                CartAction::Update {
                    product_id,
                    quantity,
                } => commands::cart::update(storefront, product_id, quantity).await?,
                CartAction::Remove { product_id } => {
                    commands::cart::remove(storefront, product_id).await?;
                }
                CartAction::Clear => commands::cart::clear(storefront).await?,
                CartAction::Validate => commands::cart::validate(storefront).await?,
                CartAction::Count => commands::cart::count(storefront).await?,
            }
        }
        Commands::Checkout { file } => {
            commands::require_session(storefront).await?;
            commands::checkout::run(storefront, &file).await?;
        }
        Commands::Orders { action } => {
            commands::require_session(storefront).await?;
            match action {
                OrdersAction::List { page, size } => {
                    let query = OrderQuery {
                        page,
                        size,
                        ..Default::default()
                    };
                    commands::orders::list(storefront, &query).await?;
                }
                OrdersAction::Recent { limit } => {
                    commands::orders::recent(storefront, limit).await?;
                }
                OrdersAction::Show { id } => commands::orders::show(storefront, id).await?,
                OrdersAction::Cancel { id, reason } => {
                    commands::orders::cancel(storefront, id, reason.as_deref()).await?;
                }
                OrdersAction::Track { order_number } => {
                    commands::orders::track(storefront, &order_number).await?;
                }
            }
        }
    }
    Ok(())
}
