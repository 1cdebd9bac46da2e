//! Acchiappasogni CLI - drive the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! acchiappasogni catalog --category "Classici" --sort price-asc
//!
//! # Fill the cart and check out
//! acchiappasogni cart add AE-1
//! acchiappasogni cart set AE-2 3
//! acchiappasogni checkout --name Giulia --street "Via Roma 1" --postal-code 00100 --city Roma
//!
//! # Edit the catalog on this device
//! acchiappasogni admin unlock 1234
//! acchiappasogni admin set-all-prices 5
//!
//! # Design a dreamcatcher
//! acchiappasogni design new luna --rings 3 --feathers 5
//! acchiappasogni design place luna 120 80 star
//! acchiappasogni design export luna luna.png
//! ```
//!
//! # Environment Variables
//!
//! - `ACCHIAPPASOGNI_DATA_SOURCE` - Base URL or directory with the shop documents
//! - `ACCHIAPPASOGNI_STORAGE_DIR` - Device storage directory
//! - `RUST_LOG` - Log filter (default: `acchiappasogni=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "acchiappasogni")]
#[command(author, version, about = "Acchiappasogni shop from the terminal")]
struct Cli {
    /// Base URL or directory holding products.json and config.json
    #[arg(long, global = true, env = "ACCHIAPPASOGNI_DATA_SOURCE")]
    source: Option<String>,

    /// Device storage directory
    #[arg(long, global = true, env = "ACCHIAPPASOGNI_STORAGE_DIR")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Catalog(commands::catalog::CatalogArgs),
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Build the WhatsApp order message and link
    Checkout(commands::checkout::CheckoutArgs),
    /// WhatsApp link for a custom dreamcatcher request
    CustomRequest,
    /// Edit the catalog on this device
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
    /// Design a dreamcatcher
    Design {
        #[command(subcommand)]
        action: commands::design::DesignAction,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before clap reads the env fallbacks
    let _ = dotenvy::dotenv();

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,acchiappasogni=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = commands::Context::new(cli.source.as_deref(), cli.storage)?;

    match cli.command {
        Commands::Catalog(args) => commands::catalog::list(&ctx, args).await?,
        Commands::Cart { action } => commands::cart::run(&ctx, action).await?,
        Commands::Checkout(args) => commands::checkout::checkout(&ctx, args).await?,
        Commands::CustomRequest => commands::checkout::custom_request(&ctx).await?,
        Commands::Admin { action } => commands::admin::run(&ctx, action).await?,
        Commands::Design { action } => commands::design::run(&ctx, action)?,
    }
    Ok(())
}
