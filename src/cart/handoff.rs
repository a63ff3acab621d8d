//! Cart hand-off
//!
//! Structured encoding of a [`Cart`] for passing it between screens. Prices travel as integer
//! minor units so a decoded cart is identical to the encoded one.

use rusty_money::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartEntry, Size},
    catalog::{CatalogItem, ImageRef},
    pricing::{PricingError, currency_from_code},
};

/// Errors raised while decoding a handed-off cart.
#[derive(Debug, Error)]
pub enum HandoffError {
    /// Malformed JSON.
    #[error("Failed to decode cart: {0}")]
    Json(#[from] serde_json::Error),

    /// Unsupported currency code.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// An entry carried a zero quantity.
    #[error("Cart entry {0} has zero quantity")]
    ZeroQuantity(String),

    /// Two entries share an item id.
    #[error("Cart entry {0} appears more than once")]
    DuplicateEntry(String),

    /// An item carried a negative price.
    #[error("Cart entry {0} has a negative price")]
    NegativePrice(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct CartRecord {
    currency: String,
    entries: Vec<EntryRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryRecord {
    item: ItemRecord,
    quantity: u32,
    size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    customization: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ItemRecord {
    id: String,
    name: String,
    description: String,
    price_minor: i64,
    #[serde(default)]
    image: ImageRef,
}

impl From<&CartEntry> for EntryRecord {
    fn from(entry: &CartEntry) -> Self {
        let item = entry.item();

        Self {
            item: ItemRecord {
                id: item.id.clone(),
                name: item.name.clone(),
                description: item.description.clone(),
                price_minor: item.unit_price.to_minor_units(),
                image: item.image_ref.clone(),
            },
            quantity: entry.quantity(),
            size: entry.size(),
            customization: entry.customization().map(str::to_string),
        }
    }
}

/// Encode a cart as JSON bytes.
///
/// # Errors
///
/// Returns [`HandoffError::Json`] if serialization fails.
pub fn encode(cart: &Cart) -> Result<Vec<u8>, HandoffError> {
    let record = CartRecord {
        currency: cart.currency().iso_alpha_code.to_string(),
        entries: cart.iter().map(EntryRecord::from).collect(),
    };

    Ok(serde_json::to_vec(&record)?)
}

/// Decode a cart produced by [`encode`].
///
/// The decoded cart is a fresh cart: undo tokens issued by the original do not apply to it.
///
/// # Errors
///
/// Returns a [`HandoffError`] if the bytes are malformed or would break a cart invariant
/// (zero quantity, duplicate entry, negative price).
pub fn decode(bytes: &[u8]) -> Result<Cart, HandoffError> {
    let record: CartRecord = serde_json::from_slice(bytes)?;
    let currency = currency_from_code(&record.currency)?;

    let mut entries: Vec<CartEntry> = Vec::with_capacity(record.entries.len());

    for entry in record.entries {
        let id = entry.item.id;

        if entry.quantity == 0 {
            return Err(HandoffError::ZeroQuantity(id));
        }

        if entry.item.price_minor < 0 {
            return Err(HandoffError::NegativePrice(id));
        }

        if entries.iter().any(|existing| existing.id() == id) {
            return Err(HandoffError::DuplicateEntry(id));
        }

        let item = CatalogItem {
            id,
            name: entry.item.name,
            description: entry.item.description,
            unit_price: Money::from_minor(entry.item.price_minor, currency),
            image_ref: entry.item.image,
        };

        entries.push(CartEntry::with_details(
            item,
            entry.quantity,
            entry.size,
            entry.customization,
        ));
    }

    Ok(Cart::with_entries(entries, currency))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::INR;
    use testresult::TestResult;

    use super::*;

    fn cart() -> TestResult<Cart> {
        let mut cart = Cart::new(INR);
        let margherita = CatalogItem::new("1", "Margherita Classic", "Basil", Money::from_minor(24_900, INR))
            .with_image("italian_cheesy_margherita_pizza");
        let pepperoni = CatalogItem::new("2", "Pepperoni Delight", "Spicy", Money::from_minor(34_900, INR));

        cart.add_item(&pepperoni);
        cart.add_item(&margherita);
        cart.add_item(&pepperoni);
        cart.customize("1", Size::Large, Some("extra basil"))?;

        Ok(cart)
    }

    #[test]
    fn round_trip_preserves_entries_and_order() -> TestResult {
        let cart = cart()?;

        let decoded = decode(&encode(&cart)?)?;

        assert_eq!(decoded, cart);
        assert_eq!(
            decoded.iter().map(CartEntry::id).collect::<Vec<_>>(),
            vec!["2", "1"]
        );

        Ok(())
    }

    #[test]
    fn re_encoding_is_byte_identical() -> TestResult {
        let bytes = encode(&cart()?)?;

        assert_eq!(encode(&decode(&bytes)?)?, bytes);

        Ok(())
    }

    #[test]
    fn empty_cart_round_trips() -> TestResult {
        let cart = Cart::new(INR);

        assert_eq!(decode(&encode(&cart)?)?, cart);

        Ok(())
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let json = br#"{"currency":"INR","entries":[{"item":{"id":"1","name":"M","description":"","price_minor":100},"quantity":0,"size":"Medium"}]}"#;

        assert!(matches!(decode(json), Err(HandoffError::ZeroQuantity(id)) if id == "1"));
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        let entry = r#"{"item":{"id":"1","name":"M","description":"","price_minor":100},"quantity":1,"size":"Small"}"#;
        let json = format!(r#"{{"currency":"INR","entries":[{entry},{entry}]}}"#);

        assert!(matches!(
            decode(json.as_bytes()),
            Err(HandoffError::DuplicateEntry(id)) if id == "1"
        ));
    }

    #[test]
    fn negative_price_is_rejected() {
        let json = br#"{"currency":"INR","entries":[{"item":{"id":"1","name":"M","description":"","price_minor":-5},"quantity":1,"size":"Medium"}]}"#;

        assert!(matches!(decode(json), Err(HandoffError::NegativePrice(_))));
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let json = br#"{"currency":"XYZ","entries":[]}"#;

        assert!(matches!(
            decode(json),
            Err(HandoffError::Pricing(PricingError::UnknownCurrency(_)))
        ));
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(decode(b"not json"), Err(HandoffError::Json(_))));
    }
}
