//! Cart
//!
//! The ordered collection of cart entries owned by a shopping session. One entry exists per
//! catalog item id; adding an item again increments its quantity. Removals hand back an
//! [`UndoToken`] that reinserts the removed entries until the next mutation.

use std::fmt;

use rusty_money::{MoneyError, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    catalog::CatalogItem,
    pricing::{Price, PricingError, line_total, total_price},
};

pub mod handoff;

/// Errors related to cart mutation.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// No entry exists for this item id.
    #[error("Cart entry {0} not found")]
    EntryNotFound(String),

    /// Requested quantity cannot be represented.
    #[error("Quantity {0} is out of range")]
    QuantityOutOfRange(i64),

    /// The token was issued by another cart, or the cart changed since it was issued.
    #[error("Undo is no longer available")]
    UndoExpired,
}

/// Pizza size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    /// Small
    Small,

    /// Medium
    #[default]
    Medium,

    /// Large
    Large,
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Size::Small => "Small",
            Size::Medium => "Medium",
            Size::Large => "Large",
        })
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartEntry {
    item: CatalogItem,
    quantity: u32,
    size: Size,
    customization: Option<String>,
}

impl CartEntry {
    /// A single unit of `item` in the default size, with no customization.
    pub fn new(item: CatalogItem) -> Self {
        Self {
            item,
            quantity: 1,
            size: Size::default(),
            customization: None,
        }
    }

    /// An entry with explicit details; a zero quantity is raised to one.
    pub fn with_details(
        item: CatalogItem,
        quantity: u32,
        size: Size,
        customization: Option<String>,
    ) -> Self {
        Self {
            item,
            quantity: quantity.max(1),
            size,
            customization: normalize_note(customization.as_deref()),
        }
    }

    /// The item id, which doubles as the entry id.
    pub fn id(&self) -> &str {
        &self.item.id
    }

    /// The catalog item.
    pub fn item(&self) -> &CatalogItem {
        &self.item
    }

    /// Number of units, always at least one.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Chosen size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Customer note, if any.
    pub fn customization(&self) -> Option<&str> {
        self.customization.as_deref()
    }

    /// Unit price multiplied by quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the line total does not fit in minor units.
    pub fn line_total(&self) -> Result<Price, PricingError> {
        line_total(&self.item.unit_price, self.quantity)
    }
}

/// Outcome of [`Cart::set_quantity`].
#[derive(Debug)]
pub enum QuantityChange {
    /// The entry now has this quantity.
    Updated(u32),

    /// The quantity dropped to zero or below and the entry was removed.
    Removed(UndoToken),
}

/// Handle that restores entries removed by [`Cart::remove_item`] or [`Cart::clear`].
///
/// The token is valid only for the cart that issued it, and only until that cart is mutated
/// again.
#[derive(Debug)]
#[must_use = "dropping the token discards the ability to undo"]
pub struct UndoToken {
    cart: Uuid,
    revision: u64,
    removed: SmallVec<[(usize, CartEntry); 1]>,
}

impl UndoToken {
    /// Entries this token would restore, in their original order.
    pub fn entries(&self) -> impl Iterator<Item = &CartEntry> {
        self.removed.iter().map(|(_, entry)| entry)
    }
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart {
    id: Uuid,
    entries: Vec<CartEntry>,
    currency: &'static Currency,
    revision: u64,
}

impl PartialEq for Cart {
    fn eq(&self, other: &Self) -> bool {
        self.currency == other.currency && self.entries == other.entries
    }
}

impl Cart {
    /// Create a new, empty cart.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self::with_entries(Vec::new(), currency)
    }

    pub(crate) fn with_entries(entries: Vec<CartEntry>, currency: &'static Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            entries,
            currency,
            revision: 0,
        }
    }

    /// Add one unit of `item`: increments an existing entry, otherwise appends a new one.
    ///
    /// Returns the entry's new quantity. The item must be priced in the cart's currency; see
    /// [`Cart::check_currency`]. A foreign-currency entry makes [`Cart::subtotal`] fail with
    /// [`PricingError::Money`].
    pub fn add_item(&mut self, item: &CatalogItem) -> u32 {
        let quantity = if let Some(entry) = self.entry_mut(&item.id) {
            entry.quantity = entry.quantity.saturating_add(1);
            entry.quantity
        } else {
            self.entries.push(CartEntry::new(item.clone()));
            1
        };

        self.bump();

        debug!(item = %item.id, quantity, "cart item added");

        quantity
    }

    /// Replace an entry's quantity in place; zero or less removes the entry.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EntryNotFound`] for an unknown id, or
    /// [`CartError::QuantityOutOfRange`] if the quantity exceeds `u32::MAX`.
    pub fn set_quantity(
        &mut self,
        id: &str,
        new_quantity: i64,
    ) -> Result<QuantityChange, CartError> {
        if new_quantity <= 0 {
            return self.remove_item(id).map(QuantityChange::Removed);
        }

        let quantity =
            u32::try_from(new_quantity).map_err(|_err| CartError::QuantityOutOfRange(new_quantity))?;

        let entry = self
            .entry_mut(id)
            .ok_or_else(|| CartError::EntryNotFound(id.to_string()))?;

        entry.quantity = quantity;
        self.bump();

        debug!(item = id, quantity, "cart quantity changed");

        Ok(QuantityChange::Updated(quantity))
    }

    /// Remove an entry, returning a token that can put it back at the same index.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EntryNotFound`] for an unknown id.
    pub fn remove_item(&mut self, id: &str) -> Result<UndoToken, CartError> {
        let index = self
            .position(id)
            .ok_or_else(|| CartError::EntryNotFound(id.to_string()))?;

        let entry = self.entries.remove(index);
        self.bump();

        debug!(item = id, index, "cart item removed");

        Ok(self.token(smallvec![(index, entry)]))
    }

    /// Remove every entry. Returns `None` when the cart was already empty.
    pub fn clear(&mut self) -> Option<UndoToken> {
        if self.entries.is_empty() {
            return None;
        }

        let removed = self.entries.drain(..).enumerate().collect();
        self.bump();

        debug!("cart cleared");

        Some(self.token(removed))
    }

    /// Reinsert the entries held by `token` at their original indexes.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UndoExpired`] if the token belongs to another cart, the cart has
    /// been mutated since the token was issued, or an entry it would restore is already present.
    /// Clones share an id and revision, so the last check keeps a token issued by one copy from
    /// duplicating entries in another.
    pub fn undo(&mut self, token: UndoToken) -> Result<(), CartError> {
        if token.cart != self.id || token.revision != self.revision {
            return Err(CartError::UndoExpired);
        }

        if token
            .removed
            .iter()
            .any(|(_, entry)| self.position(entry.id()).is_some())
        {
            return Err(CartError::UndoExpired);
        }

        let restored = token.removed.len();

        for (index, entry) in token.removed {
            let index = index.min(self.entries.len());
            self.entries.insert(index, entry);
        }

        self.bump();

        debug!(restored, "cart removal undone");

        Ok(())
    }

    /// Set an entry's size and note; a blank note clears it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EntryNotFound`] for an unknown id.
    pub fn customize(&mut self, id: &str, size: Size, note: Option<&str>) -> Result<(), CartError> {
        let entry = self
            .entry_mut(id)
            .ok_or_else(|| CartError::EntryNotFound(id.to_string()))?;

        entry.size = size;
        entry.customization = normalize_note(note);
        self.bump();

        debug!(item = id, %size, "cart item customized");

        Ok(())
    }

    /// Sum of quantities across all entries.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| u64::from(entry.quantity))
            .sum()
    }

    /// Sum of line totals, in exact minor units.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] on overflow or if an entry is priced in another currency.
    pub fn subtotal(&self) -> Result<Price, PricingError> {
        let lines = self
            .entries
            .iter()
            .map(CartEntry::line_total)
            .collect::<Result<Vec<_>, _>>()?;

        total_price(lines, self.currency)
    }

    /// Get an entry by item id.
    pub fn get(&self, id: &str) -> Option<&CartEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Index of the entry for an item id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == id)
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Iterate over the entries in display order.
    pub fn iter(&self) -> impl Iterator<Item = &CartEntry> {
        self.entries.iter()
    }

    /// Number of distinct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Check that `currency` matches the cart's currency.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Money`] with a currency mismatch otherwise.
    pub fn check_currency(&self, currency: &Currency) -> Result<(), PricingError> {
        if currency == self.currency {
            return Ok(());
        }

        Err(PricingError::Money(MoneyError::CurrencyMismatch {
            expected: self.currency.iso_alpha_code,
            actual: currency.iso_alpha_code,
        }))
    }

    /// Counter bumped by every mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut CartEntry> {
        self.entries.iter_mut().find(|entry| entry.id() == id)
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn token(&self, removed: SmallVec<[(usize, CartEntry); 1]>) -> UndoToken {
        UndoToken {
            cart: self.id,
            revision: self.revision,
            removed,
        }
    }
}

fn normalize_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string)
}
