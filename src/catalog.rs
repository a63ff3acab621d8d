//! Catalog
//!
//! The read-only menu of purchasable items, loaded once per session from a [`CatalogSource`].

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, INR},
};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;
use tracing::debug;

use crate::pricing::{Price, PricingError, currency_from_code, parse_amount};

new_key_type! {
    /// Catalog Key
    pub struct ProductKey;
}

/// Errors raised while loading or querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two items share the same id.
    #[error("Duplicate catalog item id: {0}")]
    DuplicateId(String),

    /// An item is priced in a different currency than the catalog (id, item, catalog).
    #[error("Item {0} has currency {1}, but catalog has currency {2}")]
    CurrencyMismatch(String, &'static str, &'static str),

    /// No item with this id exists.
    #[error("Catalog item not found: {0}")]
    ItemNotFound(String),

    /// IO error reading a catalog file.
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price or currency in a catalog file.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Opaque reference to an item's artwork, resolved by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub String);

/// A purchasable menu item.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    /// Unique item id
    pub id: String,

    /// Display name
    pub name: String,

    /// Short description
    pub description: String,

    /// Price of a single unit
    pub unit_price: Price,

    /// Artwork reference
    pub image_ref: ImageRef,
}

impl CatalogItem {
    /// Create a new catalog item.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit_price: Price,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            unit_price,
            image_ref: ImageRef::default(),
        }
    }

    /// Attach an image reference.
    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = ImageRef(image_ref.into());
        self
    }
}

/// Where catalog items come from.
///
/// Loading is asynchronous with a single suspension point; dropping the future before it
/// resolves discards the load without side effects.
pub trait CatalogSource {
    /// Return every item on offer, in display order.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the items cannot be produced.
    async fn list_items(&self) -> Result<Vec<CatalogItem>, CatalogError>;
}

/// A fixed, in-memory list of items.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    items: Vec<CatalogItem>,
}

impl StaticCatalog {
    /// Serve the given items.
    pub fn new(items: impl Into<Vec<CatalogItem>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// The storefront's pizza menu, priced in INR.
    pub fn pizzas() -> Self {
        let pizza = |id: &str, name: &str, description: &str, rupees: i64, image: &str| {
            CatalogItem::new(id, name, description, Money::from_minor(rupees * 100, INR))
                .with_image(image)
        };

        Self::new([
            pizza(
                "1",
                "Margherita Classic",
                "Fresh tomatoes, mozzarella cheese, basil leaves",
                249,
                "italian_cheesy_margherita_pizza",
            ),
            pizza(
                "2",
                "Pepperoni Delight",
                "Spicy pepperoni, mozzarella cheese, oregano",
                349,
                "pepperoni_pizza",
            ),
            pizza(
                "3",
                "Veggie Supreme",
                "Bell peppers, onions, mushrooms, olives, corn",
                299,
                "veg_pizza",
            ),
            pizza(
                "4",
                "BBQ Paneer",
                "Grilled paneer, BBQ sauce, red onions, cilantro",
                399,
                "margherita_pizza",
            ),
            pizza(
                "5",
                "Four Cheese",
                "Mozzarella, cheddar, parmesan, goat cheese",
                379,
                "italian_cheesy_margherita_pizza",
            ),
            pizza(
                "6",
                "Spicy Mexican",
                "Jalapenos, pepperoni, onions, spicy sauce",
                359,
                "classic_pizza",
            ),
        ])
    }
}

impl CatalogSource for StaticCatalog {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        Ok(self.items.clone())
    }
}

/// Wrapper for catalog items in YAML
#[derive(Debug, Deserialize)]
struct CatalogFixture {
    currency: String,
    items: Vec<CatalogItemFixture>,
}

/// Catalog item in YAML; prices are decimal strings in the file's currency
#[derive(Debug, Deserialize)]
struct CatalogItemFixture {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    price: String,
    #[serde(default)]
    image: String,
}

/// Items read from a YAML file on every load.
///
/// ```yaml
/// currency: INR
/// items:
///   - id: "1"
///     name: Margherita Classic
///     description: Fresh tomatoes, mozzarella cheese, basil leaves
///     price: "249.00"
///     image: italian_cheesy_margherita_pizza
/// ```
#[derive(Debug, Clone)]
pub struct YamlCatalog {
    path: PathBuf,
}

impl YamlCatalog {
    /// Read items from the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse catalog YAML.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the YAML, a price or the currency code is malformed.
    pub fn parse(contents: &str) -> Result<Vec<CatalogItem>, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(contents)?;
        let currency = currency_from_code(&fixture.currency)?;

        fixture
            .items
            .into_iter()
            .map(|item| {
                Ok(CatalogItem {
                    unit_price: Money::from_minor(parse_amount(&item.price)?, currency),
                    id: item.id,
                    name: item.name,
                    description: item.description,
                    image_ref: ImageRef(item.image),
                })
            })
            .collect()
    }
}

impl CatalogSource for YamlCatalog {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let contents = fs::read_to_string(&self.path)?;

        Self::parse(&contents)
    }
}

/// The loaded catalog: items keyed by a generated [`ProductKey`], with lookups by item id.
#[derive(Debug)]
pub struct Catalog {
    items: SlotMap<ProductKey, CatalogItem>,
    ids: FxHashMap<String, ProductKey>,
    currency: &'static Currency,
}

impl Catalog {
    /// Build a catalog from items priced in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if two items share an id, or
    /// [`CatalogError::CurrencyMismatch`] if an item is priced in another currency.
    pub fn from_items(
        items: impl IntoIterator<Item = CatalogItem>,
        currency: &'static Currency,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self {
            items: SlotMap::with_key(),
            ids: FxHashMap::default(),
            currency,
        };

        for item in items {
            let item_currency = item.unit_price.currency();

            if item_currency != currency {
                return Err(CatalogError::CurrencyMismatch(
                    item.id,
                    item_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ));
            }

            if catalog.ids.contains_key(&item.id) {
                return Err(CatalogError::DuplicateId(item.id));
            }

            let id = item.id.clone();
            let key = catalog.items.insert(item);

            catalog.ids.insert(id, key);
        }

        Ok(catalog)
    }

    /// Load every item from `source`.
    ///
    /// # Errors
    ///
    /// Returns any error from the source, or from [`Catalog::from_items`].
    pub async fn load(
        source: &impl CatalogSource,
        currency: &'static Currency,
    ) -> Result<Self, CatalogError> {
        let items = source.list_items().await?;
        let catalog = Self::from_items(items, currency)?;

        debug!(items = catalog.len(), currency = currency.iso_alpha_code, "catalog loaded");

        Ok(catalog)
    }

    /// Get an item by its id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ItemNotFound`] if no item has this id.
    pub fn get(&self, id: &str) -> Result<&CatalogItem, CatalogError> {
        self.ids
            .get(id)
            .and_then(|key| self.items.get(*key))
            .ok_or_else(|| CatalogError::ItemNotFound(id.to_string()))
    }

    /// Get the product key for an item id.
    pub fn key(&self, id: &str) -> Option<ProductKey> {
        self.ids.get(id).copied()
    }

    /// Get an item by its product key.
    pub fn by_key(&self, key: ProductKey) -> Option<&CatalogItem> {
        self.items.get(key)
    }

    /// Iterate over items in load order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.values()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Currency every item is priced in.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}
