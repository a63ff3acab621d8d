//! Receipt
//!
//! The immutable record of a placed order, and the text documents rendered from carts, bills and
//! receipts.

use std::fmt;

use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    billing::{BillBreakdown, FulfillmentEstimate},
    cart::{Cart, CartEntry},
    config::StoreInfo,
    pricing::{Price, PricingError},
};

pub mod render;

/// Errors that can occur when building or rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The cart has no entries.
    #[error("Your cart is empty!")]
    EmptyCart,

    /// The bill was computed for a different cart state.
    #[error("Bill subtotal {bill} does not match cart subtotal {cart}")]
    StaleBill {
        /// Subtotal in the bill, minor units
        bill: i64,
        /// Subtotal of the cart, minor units
        cart: i64,
    },

    /// Error calculating the cart subtotal.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Writing the document failed.
    #[error("Failed to write document")]
    Io,
}

/// Details of a signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Phone number
    pub phone: Option<String>,

    /// Delivery address
    pub address: Option<String>,
}

/// Who is ordering. Authentication happens elsewhere; the engine only records the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CustomerIdentity {
    /// A signed-in customer.
    Registered(Customer),

    /// Nobody is signed in.
    #[default]
    Guest,
}

impl CustomerIdentity {
    /// Name printed on bills.
    pub fn display_name(&self) -> &str {
        match self {
            CustomerIdentity::Registered(customer) => &customer.name,
            CustomerIdentity::Guest => "Guest Customer",
        }
    }

    /// Email address, if known.
    pub fn email(&self) -> Option<&str> {
        match self {
            CustomerIdentity::Registered(customer) => Some(&customer.email),
            CustomerIdentity::Guest => None,
        }
    }

    /// Phone number, if known.
    pub fn phone(&self) -> Option<&str> {
        match self {
            CustomerIdentity::Registered(customer) => customer.phone.as_deref(),
            CustomerIdentity::Guest => None,
        }
    }

    /// Delivery address, if known.
    pub fn address(&self) -> Option<&str> {
        match self {
            CustomerIdentity::Registered(customer) => customer.address.as_deref(),
            CustomerIdentity::Guest => None,
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Paid in cash when the order arrives.
    #[default]
    CashOnDelivery,

    /// Paid by card or UPI when ordering.
    OnlinePayment,

    /// Paid from a digital wallet when ordering.
    DigitalWallet,
}

impl PaymentMethod {
    /// Whether the money has been collected when the bill is printed.
    pub fn status(self) -> PaymentStatus {
        match self {
            PaymentMethod::CashOnDelivery => PaymentStatus::Pending,
            PaymentMethod::OnlinePayment | PaymentMethod::DigitalWallet => PaymentStatus::Paid,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
            PaymentMethod::OnlinePayment => "Online Payment (Card/UPI)",
            PaymentMethod::DigitalWallet => "Digital Wallet",
        })
    }
}

/// Payment status printed on bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Not yet collected
    Pending,

    /// Collected
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
        })
    }
}

/// Unique order identifier: `PP`, the placement time in milliseconds, and a random suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a fresh id for an order placed at `at`.
    pub fn generate(at: Timestamp) -> Self {
        let (suffix, ..) = Uuid::new_v4().as_fields();

        Self(format!("PP{}-{suffix:08X}", at.as_millisecond()))
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order metadata beyond the cart and bill.
#[derive(Debug, Clone, Default)]
pub struct OrderDetails {
    /// Promo code behind the bill's discount
    pub promo_code: Option<String>,

    /// Payment method
    pub payment: PaymentMethod,

    /// Store header
    pub store: StoreInfo,
}

/// Final receipt for a placed order. Never changes once built.
#[derive(Debug, Clone)]
pub struct Receipt {
    order_id: OrderId,
    customer: CustomerIdentity,
    timestamp: Timestamp,
    items: Vec<CartEntry>,
    bill: BillBreakdown,
    fulfillment: FulfillmentEstimate,
    details: OrderDetails,
}

impl Receipt {
    /// Build a receipt from a snapshot of `cart` and `bill`, stamped with the current time and
    /// a fresh order id. Neither input is modified.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::EmptyCart`] for an empty cart, [`ReceiptError::StaleBill`] if the
    /// bill was not computed from this cart, or [`ReceiptError::Pricing`] if the cart subtotal
    /// cannot be calculated.
    pub fn build(
        cart: &Cart,
        bill: &BillBreakdown,
        customer: CustomerIdentity,
        fulfillment: FulfillmentEstimate,
        details: OrderDetails,
    ) -> Result<Self, ReceiptError> {
        if cart.is_empty() {
            return Err(ReceiptError::EmptyCart);
        }

        let subtotal = cart.subtotal()?;

        if subtotal != bill.subtotal() {
            return Err(ReceiptError::StaleBill {
                bill: bill.subtotal().to_minor_units(),
                cart: subtotal.to_minor_units(),
            });
        }

        let timestamp = Timestamp::now();

        Ok(Self {
            order_id: OrderId::generate(timestamp),
            customer,
            timestamp,
            items: cart.entries().to_vec(),
            bill: *bill,
            fulfillment,
            details,
        })
    }

    /// Order id.
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Who ordered.
    pub fn customer(&self) -> &CustomerIdentity {
        &self.customer
    }

    /// When the order was placed.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Cart entries at placement time.
    pub fn items(&self) -> &[CartEntry] {
        &self.items
    }

    /// Full bill.
    pub fn bill(&self) -> &BillBreakdown {
        &self.bill
    }

    /// Total cost before discount, delivery and tax.
    pub fn subtotal(&self) -> Price {
        self.bill.subtotal()
    }

    /// Tax charged.
    pub fn tax(&self) -> Price {
        self.bill.tax()
    }

    /// Amount payable.
    pub fn total(&self) -> Price {
        self.bill.total()
    }

    /// Expected wait.
    pub fn fulfillment(&self) -> FulfillmentEstimate {
        self.fulfillment
    }

    /// Promo code behind the discount.
    pub fn promo_code(&self) -> Option<&str> {
        self.details.promo_code.as_deref()
    }

    /// Payment method.
    pub fn payment(&self) -> PaymentMethod {
        self.details.payment
    }

    /// Store header.
    pub fn store(&self) -> &StoreInfo {
        &self.details.store
    }
}
