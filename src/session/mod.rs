//! Shopping session
//!
//! A [`ShoppingSession`] owns one cart, its promo state and the chosen fulfillment mode, and
//! keeps the bill current. Every mutation works on a copy and is committed only once the new
//! bill has been computed, so a failed operation leaves the session exactly as it was.

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    billing::{BillBreakdown, FulfillmentEstimate, FulfillmentMode},
    cart::{
        Cart, CartError, QuantityChange, Size, UndoToken,
        handoff::{self, HandoffError},
    },
    catalog::CatalogItem,
    config::EngineConfig,
    order::{OrderBackend, OrderError},
    pricing::{Price, PricingError},
    promotions::{PromoError, PromoState},
    receipt::{
        CustomerIdentity, OrderDetails, PaymentMethod, Receipt, ReceiptError,
        render::{render_order_confirmation, render_share_summary},
    },
};

pub mod observer;

pub use observer::{NoopObserver, RecordingObserver, SessionEvent, SessionObserver};

/// Errors returned by session operations. The session is unchanged whenever one is returned.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Checkout or bill requested with nothing in the cart.
    #[error("Your cart is empty!")]
    EmptyCart,

    /// The order backend did not accept the order.
    #[error("Failed to place order: {0}")]
    OrderPlacementFailed(#[source] OrderError),

    /// Cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Promo code rejected.
    #[error(transparent)]
    Promo(#[from] PromoError),

    /// Bill could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Receipt could not be built or rendered.
    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    /// Cart could not be handed off or received.
    #[error(transparent)]
    Handoff(#[from] HandoffError),
}

/// One customer's cart, promo and fulfillment choice, with the bill kept up to date.
#[derive(Debug)]
pub struct ShoppingSession<O: SessionObserver = NoopObserver> {
    config: EngineConfig,
    cart: Cart,
    promo: PromoState,
    mode: FulfillmentMode,
    bill: BillBreakdown,
    observer: O,
}

impl ShoppingSession<NoopObserver> {
    /// Start an unobserved session with an empty cart.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pricing`] if the configured amounts cannot be billed.
    pub fn new(config: EngineConfig) -> Result<Self, SessionError> {
        Self::with_observer(config, NoopObserver)
    }
}

impl<O: SessionObserver> ShoppingSession<O> {
    /// Start a session with an empty cart that reports changes to `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pricing`] if the configured amounts cannot be billed.
    pub fn with_observer(config: EngineConfig, observer: O) -> Result<Self, SessionError> {
        let cart = Cart::new(config.currency);
        let promo = PromoState::new(config.currency);
        let mode = FulfillmentMode::default();
        let bill = config
            .tariff
            .bill(cart.entries(), mode, &promo.discount())?;

        Ok(Self {
            config,
            cart,
            promo,
            mode,
            bill,
            observer,
        })
    }

    /// Add one unit of `item` to the cart. Returns the entry's new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pricing`] if the item is priced in another currency or the bill
    /// overflows.
    pub fn add_item(&mut self, item: &CatalogItem) -> Result<u32, SessionError> {
        self.cart.check_currency(item.unit_price.currency())?;

        self.update_cart(|cart| Ok(cart.add_item(item)))
    }

    /// Set an entry's quantity; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Cart`] for an unknown entry.
    pub fn set_quantity(
        &mut self,
        id: &str,
        quantity: i64,
    ) -> Result<QuantityChange, SessionError> {
        self.update_cart(|cart| Ok(cart.set_quantity(id, quantity)?))
    }

    /// Remove an entry.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Cart`] for an unknown entry.
    pub fn remove_item(&mut self, id: &str) -> Result<UndoToken, SessionError> {
        self.update_cart(|cart| Ok(cart.remove_item(id)?))
    }

    /// Empty the cart. Returns `None`, without notifying, when it was already empty.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pricing`] if the bill cannot be recomputed.
    pub fn clear_cart(&mut self) -> Result<Option<UndoToken>, SessionError> {
        if self.cart.is_empty() {
            return Ok(None);
        }

        self.update_cart(|cart| Ok(cart.clear()))
    }

    /// Put back the entries removed by the mutation that issued `token`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Cart`] if the token has expired.
    pub fn undo(&mut self, token: UndoToken) -> Result<(), SessionError> {
        self.update_cart(|cart| Ok(cart.undo(token)?))
    }

    /// Set an entry's size and special-instructions note.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Cart`] for an unknown entry.
    pub fn customize(
        &mut self,
        id: &str,
        size: Size,
        note: Option<&str>,
    ) -> Result<(), SessionError> {
        self.update_cart(|cart| Ok(cart.customize(id, size, note)?))
    }

    /// Replace the cart with one handed off from another screen.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Handoff`] if the bytes cannot be decoded, or
    /// [`SessionError::Pricing`] if the cart is in another currency.
    pub fn receive_cart(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let received = handoff::decode(bytes)?;
        self.cart.check_currency(received.currency())?;

        self.update_cart(|cart| {
            *cart = received;
            Ok(())
        })
    }

    /// Encode the cart for hand-off to another screen.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Handoff`] if encoding fails.
    pub fn hand_off(&self) -> Result<Vec<u8>, SessionError> {
        Ok(handoff::encode(&self.cart)?)
    }

    /// Apply a promo code against the current subtotal. Returns the discount granted.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Promo`] if the code is blank, unknown or already active.
    pub fn apply_promo(&mut self, code: &str) -> Result<Price, SessionError> {
        let subtotal = self.cart.subtotal()?;
        let mut promo = self.promo.clone();
        let discount = promo.apply(&self.config.promo_codes, code, &subtotal)?;
        let code = promo.code().unwrap_or_default().to_string();

        self.commit_promo(promo, SessionEvent::PromoApplied { code, discount })?;

        Ok(discount)
    }

    /// Clear the active promo code. Returns the removed code; `None` leaves the session
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pricing`] if the bill cannot be recomputed.
    pub fn remove_promo(&mut self) -> Result<Option<String>, SessionError> {
        if !self.promo.is_active() {
            return Ok(None);
        }

        let mut promo = self.promo.clone();
        let removed = promo.remove();

        if let Some(code) = &removed {
            self.commit_promo(promo, SessionEvent::PromoRemoved { code: code.clone() })?;
        }

        Ok(removed)
    }

    /// Recompute the active promo's discount against the current subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pricing`] if the discount or bill cannot be computed.
    pub fn refresh_promo(&mut self) -> Result<Price, SessionError> {
        if !self.promo.is_active() {
            return Ok(self.promo.discount());
        }

        let subtotal = self.cart.subtotal()?;
        let mut promo = self.promo.clone();
        let discount = promo.refresh(&subtotal)?;

        self.commit_promo(promo, SessionEvent::PromoRefreshed { discount })?;

        Ok(discount)
    }

    /// Choose delivery or pickup.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pricing`] if the bill cannot be recomputed.
    pub fn set_fulfillment(&mut self, mode: FulfillmentMode) -> Result<(), SessionError> {
        let bill = self
            .config
            .tariff
            .bill(self.cart.entries(), mode, &self.promo.discount())?;

        self.mode = mode;
        self.bill = bill;
        self.notify(&SessionEvent::FulfillmentChanged(mode));

        Ok(())
    }

    /// The bill, for display before checkout.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyCart`] if there is nothing to bill.
    pub fn view_bill(&self) -> Result<&BillBreakdown, SessionError> {
        if self.cart.is_empty() {
            return Err(SessionError::EmptyCart);
        }

        Ok(&self.bill)
    }

    /// Text summary of the cart for sharing.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyCart`] for an empty cart, or [`SessionError::Receipt`] if
    /// the summary cannot be rendered.
    pub fn share_summary(&self) -> Result<String, SessionError> {
        if self.cart.is_empty() {
            return Err(SessionError::EmptyCart);
        }

        Ok(render_share_summary(&self.cart, &self.bill)?)
    }

    /// Confirmation text shown before placing the order.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyCart`] for an empty cart, or [`SessionError::Receipt`] if
    /// the text cannot be rendered.
    pub fn order_confirmation(&self, customer: &CustomerIdentity) -> Result<String, SessionError> {
        if self.cart.is_empty() {
            return Err(SessionError::EmptyCart);
        }

        Ok(render_order_confirmation(
            &self.cart,
            &self.bill,
            customer,
            self.promo.code(),
            self.estimate(),
        )?)
    }

    /// Build a receipt, submit it to `backend` and, once accepted, empty the cart and drop the
    /// promo code.
    ///
    /// Nothing changes unless the backend accepts the order, including when the returned
    /// future is dropped before it completes.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyCart`] for an empty cart,
    /// [`SessionError::OrderPlacementFailed`] if the backend refuses the order, or
    /// [`SessionError::Receipt`] if the receipt cannot be built.
    pub async fn place_order(
        &mut self,
        backend: &impl OrderBackend,
        customer: CustomerIdentity,
        payment: PaymentMethod,
    ) -> Result<Receipt, SessionError> {
        if self.cart.is_empty() {
            warn!("order rejected: cart is empty");
            return Err(SessionError::EmptyCart);
        }

        let details = OrderDetails {
            promo_code: self.promo.code().map(str::to_string),
            payment,
            store: self.config.store.clone(),
        };

        let receipt = Receipt::build(&self.cart, &self.bill, customer, self.estimate(), details)?;

        let currency = self.cart.currency();
        let promo = PromoState::new(currency);
        let bill = self.config.tariff.bill(&[], self.mode, &promo.discount())?;

        if let Err(error) = backend.submit(&receipt).await {
            warn!(order_id = %receipt.order_id(), %error, "order placement failed");
            return Err(SessionError::OrderPlacementFailed(error));
        }

        self.cart = Cart::new(currency);
        self.promo = promo;
        self.bill = bill;

        info!(
            order_id = %receipt.order_id(),
            total_minor = receipt.total().to_minor_units(),
            items = receipt.items().len(),
            "order placed"
        );

        self.notify(&SessionEvent::OrderPlaced {
            order_id: receipt.order_id().clone(),
            total: receipt.total(),
        });

        Ok(receipt)
    }

    /// The cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The bill for the current cart, promo and fulfillment mode.
    ///
    /// Unlike [`ShoppingSession::view_bill`], this is available for an empty cart too.
    pub fn bill(&self) -> &BillBreakdown {
        &self.bill
    }

    /// Promo state.
    pub fn promo(&self) -> &PromoState {
        &self.promo
    }

    /// Selected fulfillment mode.
    pub fn fulfillment(&self) -> FulfillmentMode {
        self.mode
    }

    /// Expected wait for the selected fulfillment mode.
    pub fn estimate(&self) -> FulfillmentEstimate {
        self.config.estimate(self.mode)
    }

    /// Configuration the session was started with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Mutable access to the observer.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    fn update_cart<T>(
        &mut self,
        change: impl FnOnce(&mut Cart) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let mut cart = self.cart.clone();
        let value = change(&mut cart)?;
        let bill = self
            .config
            .tariff
            .bill(cart.entries(), self.mode, &self.promo.discount())?;

        self.cart = cart;
        self.bill = bill;
        self.notify(&SessionEvent::CartChanged {
            item_count: self.cart.total_item_count(),
        });

        Ok(value)
    }

    fn commit_promo(&mut self, promo: PromoState, event: SessionEvent) -> Result<(), SessionError> {
        let bill = self
            .config
            .tariff
            .bill(self.cart.entries(), self.mode, &promo.discount())?;

        self.promo = promo;
        self.bill = bill;
        self.notify(&event);

        Ok(())
    }

    fn notify(&mut self, event: &SessionEvent) {
        self.observer.on_event(event, &self.bill);
    }
}
