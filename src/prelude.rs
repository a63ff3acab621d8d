//! Crust prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    billing::{BillBreakdown, FulfillmentEstimate, FulfillmentMode, Tariff, calculate_bill},
    cart::{
        Cart, CartEntry, CartError, QuantityChange, Size, UndoToken,
        handoff::{HandoffError, decode as decode_cart, encode as encode_cart},
    },
    catalog::{
        Catalog, CatalogError, CatalogItem, CatalogSource, ImageRef, ProductKey, StaticCatalog,
        YamlCatalog,
    },
    config::{ConfigError, EngineConfig, StoreInfo},
    order::{InMemoryBackend, OrderBackend, OrderError, OrderFailure, SimulatedBackend},
    pricing::{Price, PricingError, format_price},
    promotions::{PromoCodes, PromoError, PromoState},
    receipt::{
        Customer, CustomerIdentity, OrderDetails, OrderId, PaymentMethod, PaymentStatus, Receipt,
        ReceiptError,
        render::{render_order_confirmation, render_receipt, render_share_summary, write_receipt},
    },
    session::{
        NoopObserver, RecordingObserver, SessionError, SessionEvent, SessionObserver,
        ShoppingSession,
    },
};
