//! Promotions
//!
//! Promo codes map to a fixed percentage off the cart subtotal. At most one code is active per
//! cart, and its discount is a snapshot of the subtotal at the moment the code was applied.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::{info, warn};

use crate::pricing::{Price, PricingError, apply_rate, percent_points, zero};

/// Errors raised when applying a promo code.
#[derive(Debug, Error, PartialEq)]
pub enum PromoError {
    /// Nothing left after trimming whitespace.
    #[error("Please enter a promo code")]
    EmptyCode,

    /// The same code is already active.
    #[error("Promo code {0} is already applied")]
    AlreadyApplied(String),

    /// The code is not in the promo table.
    #[error("Invalid promo code {0}")]
    InvalidCode(String),

    /// Discount could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// The table of accepted codes, keyed by normalized (trimmed, upper-case) code.
#[derive(Debug, Clone)]
pub struct PromoCodes {
    rates: FxHashMap<String, Percentage>,
}

impl PromoCodes {
    /// Build a table from `(code, rate)` pairs; codes are normalized on insert.
    pub fn new<S: AsRef<str>>(codes: impl IntoIterator<Item = (S, Percentage)>) -> Self {
        Self {
            rates: codes
                .into_iter()
                .map(|(code, rate)| (normalize(code.as_ref()), rate))
                .collect(),
        }
    }

    /// Normalized form of user input.
    pub fn normalize(code: &str) -> String {
        normalize(code)
    }

    /// Rate for a code, matched case-insensitively.
    pub fn rate(&self, code: &str) -> Option<Percentage> {
        self.rates.get(&normalize(code)).copied()
    }

    /// Number of codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether no codes are accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for PromoCodes {
    fn default() -> Self {
        Self::new([
            ("SAVE10", Percentage::from(Decimal::new(10, 2))),
            ("WELCOME20", Percentage::from(Decimal::new(20, 2))),
            ("FIRST15", Percentage::from(Decimal::new(15, 2))),
            ("NEW25", Percentage::from(Decimal::new(25, 2))),
            ("PIZZA50", Percentage::from(Decimal::new(50, 2))),
        ])
    }
}

/// The active promo code of a cart, if any, and the discount it granted.
#[derive(Debug, Clone)]
pub struct PromoState {
    code: Option<String>,
    rate: Option<Percentage>,
    discount: Price,
}

impl PromoState {
    /// No active code.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            code: None,
            rate: None,
            discount: zero(currency),
        }
    }

    /// Apply `input` against `subtotal`, replacing any other active code.
    ///
    /// Returns the discount granted. On error the state is unchanged.
    ///
    /// # Errors
    ///
    /// - [`PromoError::EmptyCode`]: the input is blank.
    /// - [`PromoError::AlreadyApplied`]: the same normalized code is already active.
    /// - [`PromoError::InvalidCode`]: the code is not in `codes`.
    /// - [`PromoError::Pricing`]: the discount could not be computed.
    pub fn apply(
        &mut self,
        codes: &PromoCodes,
        input: &str,
        subtotal: &Price,
    ) -> Result<Price, PromoError> {
        let code = normalize(input);

        if code.is_empty() {
            warn!("promo code rejected: empty");
            return Err(PromoError::EmptyCode);
        }

        if self.code.as_deref() == Some(code.as_str()) {
            warn!(%code, "promo code rejected: already applied");
            return Err(PromoError::AlreadyApplied(code));
        }

        let Some(rate) = codes.rate(&code) else {
            warn!(%code, "promo code rejected: invalid");
            return Err(PromoError::InvalidCode(code));
        };

        let discount = apply_rate(subtotal, &rate)?;

        info!(
            %code,
            percent = %percent_points(rate),
            discount_minor = discount.to_minor_units(),
            "promo code applied"
        );

        self.code = Some(code);
        self.rate = Some(rate);
        self.discount = discount;

        Ok(discount)
    }

    /// Recompute the active code's discount against a new subtotal. No-op without a code.
    ///
    /// # Errors
    ///
    /// Returns [`PromoError::Pricing`] if the discount could not be computed; the previous
    /// discount is kept.
    pub fn refresh(&mut self, subtotal: &Price) -> Result<Price, PromoError> {
        if let Some(rate) = self.rate {
            self.discount = apply_rate(subtotal, &rate)?;
        }

        Ok(self.discount)
    }

    /// Clear the active code and zero the discount. Returns the removed code, if any.
    pub fn remove(&mut self) -> Option<String> {
        let removed = self.code.take();

        self.rate = None;
        self.discount = zero(self.discount.currency());

        if let Some(code) = &removed {
            info!(%code, "promo code removed");
        }

        removed
    }

    /// The active code.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Rate of the active code.
    pub fn rate(&self) -> Option<Percentage> {
        self.rate
    }

    /// Discount granted by the active code; zero without one.
    pub fn discount(&self) -> Price {
        self.discount
    }

    /// Whether a code is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.code.is_some()
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}
