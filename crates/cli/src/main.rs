//! Shopfront CLI - inspect and edit persisted carts.
//!
//! # Usage
//!
//! ```bash
//! # Show the default cart
//! shopfront cart show
//!
//! # Add a hand-written item
//! shopfront cart add --product P1 --name "Pineapple Tee" --slug pineapple-tee \
//!     --price 24.00 --stock 5 --option size=M --option color=yellow
//!
//! # Add a product fetched from the catalog (needs CATALOG_API_URL)
//! shopfront cart add-product --product P1 --option size=M
//!
//! # Change or drop a line
//! shopfront cart set-qty --product P1 --option size=M --option color=yellow --quantity 3
//! shopfront cart remove --product P1 --option size=M --option color=yellow
//!
//! # Empty the cart
//! shopfront cart clear
//! ```
//!
//! All cart commands accept `--dir` (default `.shopfront/carts`) and
//! `--cart` (default `shopfront-cart`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use shopfront_core::cart::DEFAULT_CART_KEY;

mod commands;

use commands::cart::CartTarget;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit a persisted cart
    Cart {
        #[command(flatten)]
        target: TargetArgs,

        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Directory holding cart files
    #[arg(long, global = true, default_value = ".shopfront/carts")]
    dir: PathBuf,

    /// Cart key
    #[arg(long = "cart", global = true, default_value = DEFAULT_CART_KEY)]
    key: String,
}

/// A line's identity on the command line.
#[derive(Args)]
struct LineArgs {
    /// Product ID
    #[arg(long)]
    product: String,

    /// Variant choice as `axis=value` (repeatable)
    #[arg(long = "option", value_parser = commands::cart::parse_option)]
    options: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart's lines and totals
    Show,
    /// Add one unit of a fully described item
    Add {
        #[command(flatten)]
        line: LineArgs,

        /// Display name
        #[arg(long)]
        name: String,

        /// URL slug
        #[arg(long)]
        slug: String,

        /// Unit price, e.g. 24.00
        #[arg(long)]
        price: Decimal,

        /// Units available
        #[arg(long)]
        stock: u32,

        /// Image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Add one unit of a product fetched from the catalog
    AddProduct {
        #[command(flatten)]
        line: LineArgs,
    },
    /// Remove a line
    Remove {
        #[command(flatten)]
        line: LineArgs,
    },
    /// Set a line's quantity (0 or less removes it)
    SetQty {
        #[command(flatten)]
        line: LineArgs,

        /// New quantity
        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove every line
    Clear,
}

#[tokio::main]
async fn main() {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    run_with_output(cli, &mut std::io::stdout().lock()).await
}

async fn run_with_output(
    cli: Cli,
    out: &mut impl std::io::Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { target, action } => {
            let target = CartTarget::new(target.dir, target.key);
            match action {
                CartAction::Show => commands::cart::show(&target, out)?,
                CartAction::Add {
                    line,
                    name,
                    slug,
                    price,
                    stock,
                    image,
                } => {
                    let candidate = commands::cart::ItemSpec {
                        product: line.product,
                        options: line.options,
                        name,
                        slug,
                        price,
                        stock,
                        image,
                    }
                    .into_candidate();
                    commands::cart::add(&target, candidate, out)?;
                }
                CartAction::AddProduct { line } => {
                    commands::cart::add_product(&target, &line.product, line.options, out).await?;
                }
                CartAction::Remove { line } => {
                    commands::cart::remove(&target, &line.product, line.options, out)?;
                }
                CartAction::SetQty { line, quantity } => {
                    commands::cart::set_quantity(
                        &target,
                        &line.product,
                        line.options,
                        quantity,
                        out,
                    )?;
                }
                CartAction::Clear => {
                    commands::cart::clear(&target, out)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn run_args(dir: &std::path::Path, args: &[&str]) -> String {
        let dir = dir.to_str().unwrap();
        let cli = Cli::try_parse_from(
            ["shopfront", "cart", "--dir", dir, "--cart", "cli-test"]
                .into_iter()
                .chain(args.iter().copied()),
        )
        .unwrap();

        let mut buf = Vec::new();
        run_with_output(cli, &mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_clear_from_command_line() {
        let dir = tempfile::tempdir().unwrap();

        let added = run_args(
            dir.path(),
            &[
                "add", "--product", "P1", "--name", "Tee", "--slug", "tee", "--price", "24.00",
                "--stock", "3", "--option", "size=M",
            ],
        )
        .await;
        assert!(added.contains("Tee added to cart"));

        let shown = run_args(dir.path(), &["show"]).await;
        assert!(shown.contains("1 items, total $24.00"));

        run_args(dir.path(), &["clear"]).await;
        let shown = run_args(dir.path(), &["show"]).await;
        assert!(shown.contains("Cart cli-test is empty"));
    }

    #[tokio::test]
    async fn test_set_qty_accepts_negative_quantity() {
        let dir = tempfile::tempdir().unwrap();
        run_args(
            dir.path(),
            &[
                "add", "--product", "P2", "--name", "Mug", "--slug", "mug", "--price", "12.50",
                "--stock", "5",
            ],
        )
        .await;

        run_args(dir.path(), &["set-qty", "--product", "P2", "--quantity", "-1"]).await;
        let shown = run_args(dir.path(), &["show"]).await;
        assert!(shown.contains("is empty"));
    }
}
