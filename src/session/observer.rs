//! Session observer

use crate::{
    billing::{BillBreakdown, FulfillmentMode},
    pricing::Price,
    receipt::OrderId,
};

/// What changed in a shopping session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// An entry was added, changed, removed or restored, or the cart was cleared.
    CartChanged {
        /// Sum of quantities after the change
        item_count: u64,
    },

    /// A promo code became active.
    PromoApplied {
        /// Normalized code
        code: String,
        /// Discount granted
        discount: Price,
    },

    /// The active promo code was cleared.
    PromoRemoved {
        /// The code that was active
        code: String,
    },

    /// The active promo's discount was recomputed against the current subtotal.
    PromoRefreshed {
        /// New discount
        discount: Price,
    },

    /// Delivery or pickup was selected.
    FulfillmentChanged(FulfillmentMode),

    /// An order was accepted and the cart emptied.
    OrderPlaced {
        /// Id of the placed order
        order_id: OrderId,
        /// Amount charged
        total: Price,
    },
}

/// Receives a callback after every successful session mutation.
///
/// Failed operations leave the session unchanged and are not reported. When no observer is
/// supplied the session uses [`NoopObserver`].
pub trait SessionObserver {
    /// Called once the mutation has been committed, with the recomputed bill.
    fn on_event(&mut self, event: &SessionEvent, bill: &BillBreakdown);
}

/// No-op observer for unobserved sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_event(&mut self, _: &SessionEvent, _: &BillBreakdown) {}
}

/// Observer that keeps every event it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    events: Vec<SessionEvent>,
}

impl RecordingObserver {
    /// Events received so far, oldest first.
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Drop the events received so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl SessionObserver for RecordingObserver {
    fn on_event(&mut self, event: &SessionEvent, _: &BillBreakdown) {
        self.events.push(event.clone());
    }
}

impl<O: SessionObserver + ?Sized> SessionObserver for &mut O {
    fn on_event(&mut self, event: &SessionEvent, bill: &BillBreakdown) {
        (**self).on_event(event, bill);
    }
}
