//! Storefront sync CLI - browse the catalog and manage a cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally filtered
//! sfs-cli products list --keyword shoe --category Footwear --page 2
//!
//! # Show one product with its reviews
//! sfs-cli products show 64f1c2...
//!
//! # Sign in and print the profile
//! sfs-cli session
//!
//! # Cart operations (sign in first)
//! sfs-cli cart show
//! sfs-cli cart add 64f1c2... --quantity 2
//! sfs-cli cart update 650a9e... 3
//! sfs-cli cart remove 650a9e...
//! sfs-cli cart clear
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_API_URL` - Backend base URL (required)
//! - `STOREFRONT_EMAIL`, `STOREFRONT_PASSWORD` - Credentials for `session` and `cart`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! See `storefront_sync_client::config` for the remaining settings.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use storefront_sync_client::{ClientConfig, Dispatcher, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "sfs-cli")]
#[command(author, version, about = "Storefront sync CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Sign in and print the current profile
    Session,
    /// Manage the signed-in user's cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List one page of products
    List {
        /// Search keyword
        #[arg(short, long)]
        keyword: Option<String>,

        /// Category filter
        #[arg(short, long)]
        category: Option<String>,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show a product's details and reviews
    Show {
        /// Product ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart
    Show,
    /// Add a product
    Add {
        /// Product ID
        product: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity
    Update {
        /// Cart line ID
        line: String,

        /// New quantity
        quantity: u32,
    },
    /// Remove a line
    Remove {
        /// Cart line ID
        line: String,
    },
    /// Remove every line
    Clear,
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

    Some(guard)
}

/// Route warnings and errors to Sentry events, info and debug to breadcrumbs.
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
    let config = ClientConfig::from_env();

    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_sync_client=info,storefront_sync_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CliError> {
    let dispatcher = Dispatcher::from_config(config, Store::new())?;

    // Ctrl-C drops whatever response is still outstanding.
    let shutdown = dispatcher.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.shutdown();
        }
    });

    let scope = dispatcher.scope();
    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List {
                keyword,
                category,
                page,
            } => {
                commands::products::list(
                    &dispatcher,
                    &scope,
                    keyword.as_deref(),
                    category.as_deref(),
                    page,
                )
                .await?;
            }
            ProductsAction::Show { id } => {
                commands::products::show(&dispatcher, &scope, &id).await?;
            }
        },
        Commands::Session => commands::session::show(&dispatcher, &scope).await?,
        Commands::Cart { action } => {
            commands::session::login(&dispatcher, &scope).await?;
            match action {
                CartAction::Show => commands::cart::show(&dispatcher, &scope).await?,
                CartAction::Add { product, quantity } => {
                    commands::cart::add(&dispatcher, &scope, &product, quantity).await?;
                }
                CartAction::Update { line, quantity } => {
                    commands::cart::update(&dispatcher, &scope, &line, quantity).await?;
                }
                CartAction::Remove { line } => {
                    commands::cart::remove(&dispatcher, &scope, &line).await?;
                }
                CartAction::Clear => commands::cart::clear(&dispatcher, &scope).await?,
            }
        }
    }
    Ok(())
}
