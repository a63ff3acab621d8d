//! Crust
//!
//! Crust is the cart and billing engine behind a pizza storefront: catalog loading, cart
//! aggregation with undo, promo-code discounts, delivery and tax billing, and receipts.

pub mod billing;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod order;
pub mod prelude;
pub mod pricing;
pub mod promotions;
pub mod receipt;
pub mod session;
pub mod utils;
