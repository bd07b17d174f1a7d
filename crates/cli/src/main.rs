//! RocketShoes CLI - Drive the shopping cart from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! rs-cart show
//!
//! # Add one unit of product 3
//! rs-cart add 3
//!
//! # Set product 3 to 2 units
//! rs-cart update 3 2
//!
//! # Remove product 3
//! rs-cart remove 3
//! ```
//!
//! # Environment Variables
//!
//! - `CART_API_URL` - Storefront API base URL (required)
//! - `CART_API_TOKEN` - Bearer token for the API
//! - `CART_STORAGE_DIR` - Directory holding the cart snapshot (default `.rocketshoes`)
//! - `CART_STORAGE_KEY` - Snapshot slot name (default `cart`)
//! - `RUST_LOG` - Log filter (default `rocketshoes_cart=info,rs_cart=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rocketshoes_cart::CartError;
use rocketshoes_core::ProductId;

mod commands;

#[derive(Parser)]
#[command(name = "rs-cart")]
#[command(author, version, about = "RocketShoes shopping cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart contents
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the amount of a product already in the cart
    Update {
        /// Product ID
        id: ProductId,

        /// New amount (zero or less is ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rocketshoes_cart=info,rs_cart=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        if let Some(cart_error) = e.downcast_ref::<CartError>() {
            eprintln!("{}", cart_error.notification());
        }
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cart = commands::open_cart()?;

    match cli.command {
        Commands::Show => {}
        Commands::Add { id } => cart.add_product(id).await?,
        Commands::Remove { id } => cart.remove_product(id).await?,
        Commands::Update { id, amount } => cart.update_product_amount(id, amount).await?,
    }

    commands::cart::print(&cart.cart());
    Ok(())
}
