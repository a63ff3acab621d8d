//! Order backends
//!
//! Where placed orders go. The engine hands a finished [`Receipt`] to an [`OrderBackend`] and
//! waits for it to accept or refuse.

use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::receipt::{OrderId, Receipt};

/// Errors returned by an order backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The backend refused the order.
    #[error("Order {order_id} rejected: {reason}")]
    Rejected {
        /// Id of the refused order
        order_id: OrderId,
        /// Why it was refused
        reason: String,
    },

    /// The backend could not be reached.
    #[error("Order backend unavailable")]
    Unavailable,
}

/// Accepts submitted orders.
pub trait OrderBackend {
    /// Submit a receipt for fulfillment.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] if the order was not accepted.
    async fn submit(&self, receipt: &Receipt) -> Result<(), OrderError>;
}

/// Accepts every order and keeps it in memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    orders: Mutex<Vec<Receipt>>,
}

impl InMemoryBackend {
    /// Empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders accepted so far, oldest first.
    pub fn orders(&self) -> Vec<Receipt> {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OrderBackend for InMemoryBackend {
    async fn submit(&self, receipt: &Receipt) -> Result<(), OrderError> {
        let mut orders = self.orders.lock().map_err(|_err| OrderError::Unavailable)?;

        orders.push(receipt.clone());

        debug!(order_id = %receipt.order_id(), accepted = orders.len(), "order stored");

        Ok(())
    }
}

/// Stand-in for a remote backend that can be told to fail.
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    failure: Option<OrderFailure>,
}

/// How a [`SimulatedBackend`] fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderFailure {
    /// Refuse every order with this reason.
    Reject(String),

    /// Act as if the backend is down.
    Unavailable,
}

impl SimulatedBackend {
    /// Backend that accepts every order.
    #[must_use]
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Backend that fails every order the given way.
    #[must_use]
    pub fn failing(failure: OrderFailure) -> Self {
        Self {
            failure: Some(failure),
        }
    }
}

impl OrderBackend for SimulatedBackend {
    async fn submit(&self, receipt: &Receipt) -> Result<(), OrderError> {
        match &self.failure {
            None => Ok(()),
            Some(OrderFailure::Reject(reason)) => Err(OrderError::Rejected {
                order_id: receipt.order_id().clone(),
                reason: reason.clone(),
            }),
            Some(OrderFailure::Unavailable) => Err(OrderError::Unavailable),
        }
    }
}
