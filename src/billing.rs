//! Billing
//!
//! The billing calculator is a pure function of the cart entries, the delivery charge, the
//! discount and the tax rate. It holds no state: callers recompute after every change.

use std::fmt;

use decimal_percentage::Percentage;
use rusty_money::{Money, MoneyError, iso::Currency};
use tracing::debug;

use crate::{
    cart::CartEntry,
    pricing::{Price, PricingError, percent_of_minor, percent_points, total_price, zero},
};

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FulfillmentMode {
    /// Delivered to the customer for a fixed charge.
    #[default]
    Delivery,

    /// Collected from the store, free of charge.
    Pickup,
}

impl fmt::Display for FulfillmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FulfillmentMode::Delivery => "Delivery",
            FulfillmentMode::Pickup => "Pickup",
        })
    }
}

/// Expected wait, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillmentEstimate {
    /// Fulfillment mode the estimate is for
    pub mode: FulfillmentMode,

    /// Lower bound
    pub min_minutes: u32,

    /// Upper bound
    pub max_minutes: u32,
}

impl fmt::Display for FulfillmentEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            FulfillmentMode::Delivery => write!(
                f,
                "delivery in {}-{} minutes",
                self.min_minutes, self.max_minutes
            ),
            FulfillmentMode::Pickup => write!(
                f,
                "pickup ready in {}-{} minutes",
                self.min_minutes, self.max_minutes
            ),
        }
    }
}

/// Store-wide billing parameters.
#[derive(Debug, Clone, Copy)]
pub struct Tariff {
    /// Tax applied to the taxable base
    pub tax_rate: Percentage,

    /// Charge for [`FulfillmentMode::Delivery`]
    pub delivery_charge: Price,
}

impl Tariff {
    /// Delivery charge for a fulfillment mode; pickup is always free.
    pub fn delivery_charge_for(&self, mode: FulfillmentMode) -> Price {
        match mode {
            FulfillmentMode::Delivery => self.delivery_charge,
            FulfillmentMode::Pickup => zero(self.delivery_charge.currency()),
        }
    }

    /// Currency of the tariff's amounts.
    pub fn currency(&self) -> &'static Currency {
        self.delivery_charge.currency()
    }

    /// Bill `entries` for `mode` with `discount` applied.
    ///
    /// # Errors
    ///
    /// See [`calculate_bill`].
    pub fn bill(
        &self,
        entries: &[CartEntry],
        mode: FulfillmentMode,
        discount: &Price,
    ) -> Result<BillBreakdown, PricingError> {
        calculate_bill(
            entries,
            &self.delivery_charge_for(mode),
            discount,
            &self.tax_rate,
        )
    }
}

/// Derived bill for a cart.
///
/// `total = subtotal - discount + delivery_charge + tax`, and
/// `tax = (subtotal - discount + delivery_charge) * tax_rate`, rounded to minor units.
#[derive(Debug, Clone, Copy)]
pub struct BillBreakdown {
    subtotal: Price,
    delivery_charge: Price,
    discount: Price,
    tax: Price,
    total: Price,
    tax_rate: Percentage,
}

impl BillBreakdown {
    /// Sum of line totals.
    pub fn subtotal(&self) -> Price {
        self.subtotal
    }

    /// Delivery charge; zero for pickup.
    pub fn delivery_charge(&self) -> Price {
        self.delivery_charge
    }

    /// Discount taken off the bill.
    ///
    /// Never larger than subtotal plus delivery charge.
    pub fn discount(&self) -> Price {
        self.discount
    }

    /// Tax on the taxable base.
    pub fn tax(&self) -> Price {
        self.tax
    }

    /// Amount payable.
    pub fn total(&self) -> Price {
        self.total
    }

    /// Rate the tax was computed with.
    pub fn tax_rate(&self) -> Percentage {
        self.tax_rate
    }

    /// Subtotal minus discount plus delivery charge.
    pub fn taxable_base(&self) -> Price {
        Money::from_minor(
            self.total.to_minor_units() - self.tax.to_minor_units(),
            self.total.currency(),
        )
    }

    /// Currency of every amount in the bill.
    pub fn currency(&self) -> &'static Currency {
        self.total.currency()
    }
}

/// Compute the bill for `entries`.
///
/// The discount is capped at subtotal plus delivery charge so the taxable base never goes
/// negative; a negative discount counts as none.
///
/// # Errors
///
/// Returns [`PricingError::Money`] if an amount is in a different currency from the delivery
/// charge, [`PricingError::Overflow`] or [`PricingError::PercentConversion`] if an amount
/// overflows.
pub fn calculate_bill(
    entries: &[CartEntry],
    delivery_charge: &Price,
    discount: &Price,
    tax_rate: &Percentage,
) -> Result<BillBreakdown, PricingError> {
    let currency = delivery_charge.currency();

    if discount.currency() != currency {
        return Err(PricingError::Money(MoneyError::CurrencyMismatch {
            expected: currency.iso_alpha_code,
            actual: discount.currency().iso_alpha_code,
        }));
    }

    let lines = entries
        .iter()
        .map(CartEntry::line_total)
        .collect::<Result<Vec<_>, _>>()?;

    let subtotal = total_price(lines, currency)?.to_minor_units();
    let delivery = delivery_charge.to_minor_units().max(0);

    let gross = subtotal
        .checked_add(delivery)
        .ok_or(PricingError::Overflow("adding the delivery charge"))?;

    let discount = discount.to_minor_units().clamp(0, gross);
    let taxable_base = gross - discount;
    let tax = percent_of_minor(tax_rate, taxable_base)?;

    let total = taxable_base
        .checked_add(tax)
        .ok_or(PricingError::Overflow("adding tax"))?;

    debug!(
        subtotal,
        delivery,
        discount,
        tax,
        total,
        tax_percent = %percent_points(*tax_rate),
        "bill computed"
    );

    Ok(BillBreakdown {
        subtotal: Money::from_minor(subtotal, currency),
        delivery_charge: Money::from_minor(delivery, currency),
        discount: Money::from_minor(discount, currency),
        tax: Money::from_minor(tax, currency),
        total: Money::from_minor(total, currency),
        tax_rate: *tax_rate,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::{INR, USD};
    use testresult::TestResult;

    use crate::{cart::Cart, catalog::CatalogItem};

    use super::*;

    fn tax_rate() -> Percentage {
        Percentage::from(Decimal::new(85, 3))
    }

    fn rupees(minor: i64) -> Price {
        Money::from_minor(minor, INR)
    }

    fn cart() -> Cart {
        let mut cart = Cart::new(INR);
        let margherita = CatalogItem::new("1", "Margherita Classic", "", rupees(24_900));
        let pepperoni = CatalogItem::new("2", "Pepperoni Delight", "", rupees(34_900));

        cart.add_item(&margherita);
        cart.add_item(&pepperoni);
        cart.add_item(&pepperoni);

        cart
    }

    fn assert_total_invariant(bill: &BillBreakdown) {
        assert_eq!(
            bill.total().to_minor_units(),
            bill.subtotal().to_minor_units() - bill.discount().to_minor_units()
                + bill.delivery_charge().to_minor_units()
                + bill.tax().to_minor_units(),
            "total must equal subtotal - discount + delivery + tax"
        );
    }

    #[test]
    fn bill_without_discount() -> TestResult {
        let bill = calculate_bill(cart().entries(), &rupees(500), &rupees(0), &tax_rate())?;

        assert_eq!(bill.subtotal(), rupees(94_700));
        assert_eq!(bill.taxable_base(), rupees(95_200));
        assert_eq!(bill.tax(), rupees(8_092));
        assert_eq!(bill.total(), rupees(103_292));
        assert_total_invariant(&bill);

        Ok(())
    }

    #[test]
    fn bill_with_ten_percent_discount() -> TestResult {
        let bill = calculate_bill(cart().entries(), &rupees(500), &rupees(9_470), &tax_rate())?;

        assert_eq!(bill.discount(), rupees(9_470));
        assert_eq!(bill.taxable_base(), rupees(85_730));
        assert_eq!(bill.tax(), rupees(7_287));
        assert_eq!(bill.total(), rupees(93_017));
        assert_total_invariant(&bill);

        Ok(())
    }

    #[test]
    fn pickup_is_free() -> TestResult {
        let tariff = Tariff {
            tax_rate: tax_rate(),
            delivery_charge: rupees(500),
        };

        let bill = tariff.bill(cart().entries(), FulfillmentMode::Pickup, &rupees(0))?;

        assert_eq!(bill.delivery_charge(), rupees(0));
        assert_eq!(bill.taxable_base(), rupees(94_700));
        assert_eq!(bill.tax(), rupees(8_050));
        assert_total_invariant(&bill);

        Ok(())
    }

    #[test]
    fn oversized_discount_is_capped_at_base() -> TestResult {
        let bill = calculate_bill(cart().entries(), &rupees(500), &rupees(500_000), &tax_rate())?;

        assert_eq!(bill.discount(), rupees(95_200));
        assert_eq!(bill.tax(), rupees(0));
        assert_eq!(bill.total(), rupees(0));
        assert_total_invariant(&bill);

        Ok(())
    }

    #[test]
    fn empty_cart_still_bills_delivery() -> TestResult {
        let bill = calculate_bill(&[], &rupees(500), &rupees(0), &tax_rate())?;

        assert_eq!(bill.subtotal(), rupees(0));
        assert_eq!(bill.tax(), rupees(43));
        assert_eq!(bill.total(), rupees(543));

        Ok(())
    }

    #[test]
    fn invariant_holds_across_inputs() -> TestResult {
        let cart = cart();

        for delivery in [0, 1, 500, 999] {
            for discount in [0, 1, 4_735, 9_470, 94_700] {
                let bill = calculate_bill(
                    cart.entries(),
                    &rupees(delivery),
                    &rupees(discount),
                    &tax_rate(),
                )?;

                assert_total_invariant(&bill);
            }
        }

        Ok(())
    }

    #[test]
    fn mismatched_discount_currency_errors() {
        let result = calculate_bill(
            cart().entries(),
            &rupees(500),
            &Money::from_minor(100, USD),
            &tax_rate(),
        );

        assert!(matches!(result, Err(PricingError::Money(_))));
    }

    #[test]
    fn estimate_display_matches_mode() {
        let delivery = FulfillmentEstimate {
            mode: FulfillmentMode::Delivery,
            min_minutes: 30,
            max_minutes: 45,
        };
        let pickup = FulfillmentEstimate {
            mode: FulfillmentMode::Pickup,
            min_minutes: 15,
            max_minutes: 20,
        };

        assert_eq!(delivery.to_string(), "delivery in 30-45 minutes");
        assert_eq!(pickup.to_string(), "pickup ready in 15-20 minutes");
    }
}
