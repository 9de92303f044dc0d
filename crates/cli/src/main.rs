//! Glemora CLI - browse the catalog and manage a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # List dresses under LKR 5000, cheapest first
//! glemora products --search dress --max 5000 --sort priceAsc
//!
//! # List categories
//! glemora categories
//!
//! # Add two of product 12 in size L to the local cart file
//! glemora cart add 12 --size L --quantity 2
//!
//! # Add to the signed-in remote cart instead
//! GLEMORA_API_TOKEN=... glemora cart add 12
//!
//! # Show or empty the local cart
//! glemora cart show
//! glemora cart clear
//! ```
//!
//! # Environment Variables
//!
//! - `GLEMORA_API_URL` - Base URL of the Glemora REST API
//! - `GLEMORA_API_TOKEN` - Bearer token; when set, `cart add` uses the remote cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use glemora_core::{CategoryId, CurrencyCode, ProductId};
use glemora_storefront::catalog::SortKey;
use rust_decimal::Decimal;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "glemora")]
#[command(author, version, about = "Glemora catalog and cart tools")]
struct Cli {
    /// Base URL of the Glemora REST API
    #[arg(long, env = "GLEMORA_API_URL", default_value = "http://localhost:8080/api")]
    api_url: String,

    /// File holding the local (anonymous) cart
    #[arg(long, default_value = "glemora-cart.json")]
    cart_file: PathBuf,

    /// Currency used when printing prices
    #[arg(long, default_value = "LKR")]
    currency: CurrencyCode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products, filtered and sorted
    Products {
        /// Case-insensitive name search
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only products in these categories (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<CategoryId>,

        /// Lowest price to include
        #[arg(long)]
        min: Option<Decimal>,

        /// Highest price to include
        #[arg(long)]
        max: Option<Decimal>,

        /// Sort order (`default`, `priceAsc`, `priceDesc`, `nameAsc`, `nameDesc`)
        #[arg(long, default_value = "default")]
        sort: SortKey,
    },
    /// List product categories
    Categories,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: ProductId,

        /// Size label
        #[arg(short, long, default_value = "M")]
        size: String,

        /// Number of units
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,

        /// API bearer token; adds to the remote cart when present
        #[arg(long, env = "GLEMORA_API_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Show the local cart
    Show,
    /// Empty the local cart
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Products {
            search,
            categories,
            min,
            max,
            sort,
        } => {
            let filter = commands::catalog::filter(search, categories, min, max, sort);
            commands::catalog::products(&cli.api_url, &filter, cli.currency).await?;
        }
        Commands::Categories => commands::catalog::categories(&cli.api_url).await?,
        Commands::Cart { action } => match action {
            CartAction::Add {
                product_id,
                size,
                quantity,
                token,
            } => {
                commands::cart::add(
                    &cli.api_url,
                    &cli.cart_file,
                    product_id,
                    &size,
                    quantity,
                    token,
                )
                .await?;
            }
            CartAction::Show => commands::cart::show(&cli.cart_file, cli.currency).await?,
            CartAction::Clear => commands::cart::clear(&cli.cart_file).await?,
        },
    }
    Ok(())
}
