//! Checkout Example
//!
//! This example walks a cart through checkout: it loads the catalog, adds the requested items,
//! applies a promo code, prints the share summary and the confirmation, places the order and
//! prints the bill.
//!
//! Use `--add` once per unit to add catalog items (defaults to one Margherita and two Pepperoni)
//! Use `--promo` to apply a promo code and `--pickup` to collect from the store
//! Use `--config` and `--catalog` to load YAML instead of the built-in defaults
//!
//! Run with: `cargo run --example checkout -- --add 1 --add 2 --promo SAVE10`

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crust::{
    catalog::{Catalog, CatalogSource, StaticCatalog, YamlCatalog},
    config::EngineConfig,
    order::InMemoryBackend,
    pricing::format_price,
    receipt::{PaymentMethod, render::render_receipt},
    session::ShoppingSession,
    utils::CheckoutArgs,
};

/// Checkout Example
#[expect(clippy::print_stdout, reason = "Example code")]
#[tokio::main(flavor = "current_thread")]
pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new("info")),
        )
        .init();

    let args = CheckoutArgs::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    let catalog = match &args.catalog {
        Some(path) => load_catalog(&YamlCatalog::new(path), &config).await?,
        None => load_catalog(&StaticCatalog::pizzas(), &config).await?,
    };

    let mut session = ShoppingSession::new(config)?;

    let ids = if args.items.is_empty() {
        vec!["1".to_string(), "2".to_string(), "2".to_string()]
    } else {
        args.items.clone()
    };

    for id in &ids {
        session.add_item(catalog.get(id)?)?;
    }

    session.set_fulfillment(args.fulfillment())?;

    if let Some(code) = args.promo.as_deref() {
        let discount = session.apply_promo(code)?;

        println!("Promo code applied: -{}\n", format_price(&discount));
    }

    println!("{}\n", session.share_summary()?);

    let customer = args.customer();

    println!("{}\n", session.order_confirmation(&customer)?);

    let backend = InMemoryBackend::new();
    let receipt = session
        .place_order(&backend, customer, PaymentMethod::CashOnDelivery)
        .await?;

    println!("{}", render_receipt(&receipt)?);

    Ok(())
}

async fn load_catalog(source: &impl CatalogSource, config: &EngineConfig) -> Result<Catalog> {
    Ok(Catalog::load(source, config.currency).await?)
}
