//! Utils

use std::path::PathBuf;

use clap::Parser;

use crate::{
    billing::FulfillmentMode,
    receipt::{Customer, CustomerIdentity},
};

/// Arguments for the checkout demo
#[derive(Debug, Parser)]
pub struct CheckoutArgs {
    /// Engine configuration YAML; storefront defaults when omitted
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Catalog YAML; the built-in pizza menu when omitted
    #[clap(long)]
    pub catalog: Option<PathBuf>,

    /// Catalog item id to add to the cart, once per unit
    #[clap(short = 'a', long = "add", value_name = "ID")]
    pub items: Vec<String>,

    /// Promo code to apply
    #[clap(short, long)]
    pub promo: Option<String>,

    /// Collect from the store instead of delivery
    #[clap(long)]
    pub pickup: bool,

    /// Customer name; orders as a guest when omitted
    #[clap(long)]
    pub customer: Option<String>,

    /// Customer email
    #[clap(long, requires = "customer")]
    pub email: Option<String>,
}

impl CheckoutArgs {
    /// Selected fulfillment mode.
    pub fn fulfillment(&self) -> FulfillmentMode {
        if self.pickup {
            FulfillmentMode::Pickup
        } else {
            FulfillmentMode::Delivery
        }
    }

    /// Customer identity built from `--customer` and `--email`.
    pub fn customer(&self) -> CustomerIdentity {
        match &self.customer {
            Some(name) => CustomerIdentity::Registered(Customer {
                name: name.clone(),
                email: self.email.clone().unwrap_or_default(),
                phone: None,
                address: None,
            }),
            None => CustomerIdentity::Guest,
        }
    }
}
