//! Pricing
//!
//! Minor-unit money arithmetic shared by the cart, the promo engine and the billing calculator.
//!
//! Every amount is held as integer minor units (paise, pence, cents). Products of a rate and an
//! amount are evaluated in [`Decimal`] and rounded back to minor units with
//! [`RoundingStrategy::MidpointAwayFromZero`], so no floating-point value ever touches a total.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money, MoneyError,
    iso::{Currency, EUR, GBP, INR, USD},
};
use thiserror::Error;

/// A monetary amount in one of the supported ISO currencies.
pub type Price = Money<'static, Currency>;

/// Decimal places in one minor unit of every supported currency.
const MINOR_DIGITS: u32 = 2;

/// Errors that can occur during money arithmetic or while parsing amounts and rates.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// An intermediate amount no longer fits in minor units.
    #[error("amount overflowed while {0}")]
    Overflow(&'static str),

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Amount string is not a non-negative amount with at most two decimals.
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Rate string could not be parsed, or was outside `[0, 1]`.
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Currency code is not one of the supported currencies.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// A zero amount in the given currency.
pub fn zero(currency: &'static Currency) -> Price {
    Money::from_minor(0, currency)
}

/// Price of `quantity` units at `unit_price`.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the product does not fit in minor units.
pub fn line_total(unit_price: &Price, quantity: u32) -> Result<Price, PricingError> {
    let minor = unit_price
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow("multiplying a line total"))?;

    Ok(Money::from_minor(minor, unit_price.currency()))
}

/// Sums a sequence of prices, starting from zero in `currency`.
///
/// # Errors
///
/// Returns [`PricingError::Money`] if any price is in another currency, or
/// [`PricingError::Overflow`] if the sum does not fit in minor units.
pub fn total_price(
    prices: impl IntoIterator<Item = Price>,
    currency: &'static Currency,
) -> Result<Price, PricingError> {
    prices.into_iter().try_fold(zero(currency), |acc, price| {
        if price.currency() != currency {
            return Err(PricingError::Money(MoneyError::CurrencyMismatch {
                expected: currency.iso_alpha_code,
                actual: price.currency().iso_alpha_code,
            }));
        }

        let minor = acc
            .to_minor_units()
            .checked_add(price.to_minor_units())
            .ok_or(PricingError::Overflow("summing prices"))?;

        Ok(Money::from_minor(minor, currency))
    })
}

/// Calculate a percentage of a minor-unit amount, rounded half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the product overflows the decimal range or
/// cannot be represented in minor units.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // the underlying Decimal is not exposed directly
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Apply a rate to a price, keeping its currency.
///
/// # Errors
///
/// See [`percent_of_minor`].
pub fn apply_rate(price: &Price, rate: &Percentage) -> Result<Price, PricingError> {
    let minor = percent_of_minor(rate, price.to_minor_units())?;

    Ok(Money::from_minor(minor, price.currency()))
}

/// Resolve a supported ISO currency code.
///
/// # Errors
///
/// Returns [`PricingError::UnknownCurrency`] for anything other than INR, USD, GBP or EUR.
pub fn currency_from_code(code: &str) -> Result<&'static Currency, PricingError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "INR" => Ok(INR),
        "USD" => Ok(USD),
        "GBP" => Ok(GBP),
        "EUR" => Ok(EUR),
        other => Err(PricingError::UnknownCurrency(other.to_string())),
    }
}

/// Parse a non-negative decimal amount (e.g. `"249.00"`) into minor units.
///
/// # Errors
///
/// Returns [`PricingError::InvalidPrice`] unless the string is a non-negative decimal with at
/// most two significant decimal places that fits in minor units.
pub fn parse_amount(s: &str) -> Result<i64, PricingError> {
    let amount = s
        .trim()
        .parse::<Decimal>()
        .map_err(|_err| PricingError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PricingError::InvalidPrice(s.to_string()));
    }

    // Trailing zeros are fine ("2.500"), sub-minor digits are not ("2.495").
    if amount.normalize().scale() > MINOR_DIGITS {
        return Err(PricingError::InvalidPrice(s.to_string()));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|value| value.to_i64())
        .ok_or_else(|| PricingError::InvalidPrice(s.to_string()))
}

/// Parse a rate string (e.g. `"8.5%"` or `"0.085"`) into a `Percentage`.
///
/// # Errors
///
/// Returns [`PricingError::InvalidPercentage`] if the string cannot be parsed or the rate lies
/// outside `[0, 1]`.
pub fn parse_percentage(s: &str) -> Result<Percentage, PricingError> {
    let trimmed = s.trim();

    let fraction = if let Some(points) = trimmed.strip_suffix('%') {
        points
            .trim()
            .parse::<Decimal>()
            .ok()
            .and_then(|points| points.checked_div(Decimal::ONE_HUNDRED))
    } else {
        trimmed.parse::<Decimal>().ok()
    }
    .ok_or_else(|| PricingError::InvalidPercentage(s.to_string()))?;

    if fraction < Decimal::ZERO || fraction > Decimal::ONE {
        return Err(PricingError::InvalidPercentage(s.to_string()));
    }

    Ok(Percentage::from(fraction))
}

/// Percent points of a fractional percentage, for display (0.085 renders as `8.5`).
pub fn percent_points(percentage: Percentage) -> Decimal {
    (percentage * Decimal::ONE_HUNDRED).round_dp(2).normalize()
}

/// Amount with exactly two decimal places and no currency symbol (e.g. `1032.92`).
pub fn format_amount(price: &Price) -> String {
    let mut amount = price
        .amount()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);

    amount.to_string()
}

/// Amount prefixed with the currency symbol (e.g. `₹1032.92`).
pub fn format_price(price: &Price) -> String {
    format!("{}{}", price.currency().symbol, format_amount(price))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn line_total_multiplies_minor_units() -> TestResult {
        let unit = Money::from_minor(34_900, INR);

        assert_eq!(line_total(&unit, 2)?, Money::from_minor(69_800, INR));
        assert_eq!(line_total(&unit, 0)?, Money::from_minor(0, INR));

        Ok(())
    }

    #[test]
    fn line_total_overflow_is_reported() {
        let unit = Money::from_minor(i64::MAX, INR);

        assert!(matches!(
            line_total(&unit, 2),
            Err(PricingError::Overflow(_))
        ));
    }

    #[test]
    fn total_price_sums_exactly() -> TestResult {
        let prices = [
            Money::from_minor(24_900, INR),
            Money::from_minor(69_800, INR),
        ];

        assert_eq!(total_price(prices, INR)?, Money::from_minor(94_700, INR));

        Ok(())
    }

    #[test]
    fn total_price_of_nothing_is_zero() -> TestResult {
        assert_eq!(total_price([], USD)?, Money::from_minor(0, USD));

        Ok(())
    }

    #[test]
    fn total_price_rejects_mixed_currencies() {
        let prices = [Money::from_minor(100, INR), Money::from_minor(100, USD)];

        assert_eq!(
            total_price(prices, INR),
            Err(PricingError::Money(MoneyError::CurrencyMismatch {
                expected: INR.iso_alpha_code,
                actual: USD.iso_alpha_code,
            }))
        );
    }

    #[test]
    fn percent_of_minor_rounds_half_away_from_zero() -> TestResult {
        let tax = Percentage::from(Decimal::new(85, 3));

        assert_eq!(percent_of_minor(&tax, 95_200)?, 8_092);
        assert_eq!(percent_of_minor(&tax, 85_730)?, 7_287);
        assert_eq!(percent_of_minor(&Percentage::from(Decimal::new(5, 1)), 1)?, 1);

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(2.0);
        let result = percent_of_minor(&percent, i64::MAX);

        assert!(matches!(result, Err(PricingError::PercentConversion)));
    }

    #[test]
    fn apply_rate_keeps_currency() -> TestResult {
        let subtotal = Money::from_minor(94_700, INR);
        let discount = apply_rate(&subtotal, &Percentage::from(Decimal::new(1, 1)))?;

        assert_eq!(discount, Money::from_minor(9_470, INR));

        Ok(())
    }

    #[test]
    fn currency_codes_are_case_insensitive() -> TestResult {
        assert_eq!(currency_from_code("inr")?, INR);
        assert_eq!(currency_from_code(" GBP ")?, GBP);
        assert!(matches!(
            currency_from_code("ABC"),
            Err(PricingError::UnknownCurrency(code)) if code == "ABC"
        ));

        Ok(())
    }

    #[test]
    fn parse_amount_accepts_decimal_strings() -> TestResult {
        assert_eq!(parse_amount("249.00")?, 24_900);
        assert_eq!(parse_amount("5")?, 500);
        assert_eq!(parse_amount(" 0.5 ")?, 50);

        Ok(())
    }

    #[test]
    fn parse_amount_rejects_garbage_and_negatives() {
        assert!(matches!(parse_amount("abc"), Err(PricingError::InvalidPrice(_))));
        assert!(matches!(parse_amount("-1.00"), Err(PricingError::InvalidPrice(_))));
    }

    #[test]
    fn parse_amount_rejects_sub_minor_digits() -> TestResult {
        assert!(matches!(
            parse_amount("2.495"),
            Err(PricingError::InvalidPrice(amount)) if amount == "2.495"
        ));
        assert!(matches!(parse_amount("0.001"), Err(PricingError::InvalidPrice(_))));
        assert_eq!(parse_amount("2.50")?, 250);
        assert_eq!(parse_amount("2.500")?, 250);

        Ok(())
    }

    #[test]
    fn parse_percentage_accepts_both_formats() -> TestResult {
        let points = parse_percentage("8.5%")?;
        let fraction = parse_percentage("0.085")?;

        assert_eq!(percent_of_minor(&points, 95_200)?, 8_092);
        assert_eq!(percent_of_minor(&fraction, 95_200)?, 8_092);

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_out_of_range() {
        assert!(matches!(
            parse_percentage("150%"),
            Err(PricingError::InvalidPercentage(_))
        ));
        assert!(matches!(
            parse_percentage("-0.1"),
            Err(PricingError::InvalidPercentage(_))
        ));
        assert!(matches!(
            parse_percentage("ten"),
            Err(PricingError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn percent_points_for_display() -> TestResult {
        assert_eq!(percent_points(parse_percentage("0.085")?).to_string(), "8.5");
        assert_eq!(percent_points(parse_percentage("10%")?).to_string(), "10");

        Ok(())
    }

    #[test]
    fn format_amount_always_has_two_places() {
        assert_eq!(format_amount(&Money::from_minor(94_700, INR)), "947.00");
        assert_eq!(format_amount(&Money::from_minor(103_292, INR)), "1032.92");
        assert_eq!(format_amount(&Money::from_minor(0, INR)), "0.00");
        assert_eq!(format_amount(&Money::from_minor(5, INR)), "0.05");
    }

    #[test]
    fn format_price_prefixes_symbol() {
        assert_eq!(format_price(&Money::from_minor(500, USD)), "$5.00");
    }
}
