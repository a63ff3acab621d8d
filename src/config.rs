//! Engine configuration
//!
//! Tax rate, delivery charge, currency, promo-code table, fulfillment estimates and the store
//! header printed on bills. Loaded from YAML; any key left out falls back to the storefront
//! defaults.
//!
//! ```yaml
//! currency: INR
//! tax_rate: "8.5%"
//! delivery_charge: "5.00"
//! promo_codes:
//!   SAVE10: "10%"
//!   PIZZA50: "0.5"
//! fulfillment:
//!   delivery: { min_minutes: 30, max_minutes: 45 }
//!   pickup: { min_minutes: 15, max_minutes: 20 }
//! store:
//!   name: One Bite Pizza's
//!   address: Chandigarh, India
//!   phone: "+91 7903287***"
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{Currency, INR},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    billing::{FulfillmentEstimate, FulfillmentMode, Tariff},
    pricing::{PricingError, currency_from_code, parse_amount, parse_percentage},
    promotions::PromoCodes,
};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid currency, amount or rate
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Estimate lower bound above its upper bound
    #[error("Invalid {0} estimate: min_minutes exceeds max_minutes")]
    InvalidEstimate(FulfillmentMode),
}

/// Store header printed on bills.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreInfo {
    /// Store name
    pub name: String,

    /// Store address
    pub address: String,

    /// Store phone number
    pub phone: String,
}

impl Default for StoreInfo {
    fn default() -> Self {
        Self {
            name: "One Bite Pizza's".to_string(),
            address: "Chandigarh, India".to_string(),
            phone: "+91 7903287***".to_string(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Currency of the catalog, cart and bills
    pub currency: &'static Currency,

    /// Tax rate and delivery charge
    pub tariff: Tariff,

    /// Accepted promo codes
    pub promo_codes: PromoCodes,

    /// Wait for delivery orders
    pub delivery_estimate: FulfillmentEstimate,

    /// Wait for pickup orders
    pub pickup_estimate: FulfillmentEstimate,

    /// Bill header
    pub store: StoreInfo,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: INR,
            tariff: Tariff {
                tax_rate: Percentage::from(Decimal::new(85, 3)),
                delivery_charge: Money::from_minor(DEFAULT_DELIVERY_MINOR, INR),
            },
            promo_codes: PromoCodes::default(),
            delivery_estimate: FulfillmentEstimate {
                mode: FulfillmentMode::Delivery,
                min_minutes: 30,
                max_minutes: 45,
            },
            pickup_estimate: FulfillmentEstimate {
                mode: FulfillmentMode::Pickup,
                min_minutes: 15,
                max_minutes: 20,
            },
            store: StoreInfo::default(),
        }
    }
}

const DEFAULT_DELIVERY_MINOR: i64 = 500;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFixture {
    currency: Option<String>,
    tax_rate: Option<String>,
    delivery_charge: Option<String>,
    promo_codes: Option<BTreeMap<String, String>>,
    #[serde(default)]
    fulfillment: FulfillmentFixture,
    store: Option<StoreInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FulfillmentFixture {
    delivery: Option<EstimateFixture>,
    pickup: Option<EstimateFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EstimateFixture {
    min_minutes: u32,
    max_minutes: u32,
}

impl EngineConfig {
    /// Parse configuration YAML.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the YAML is malformed, a currency, amount or rate is
    /// invalid, or an estimate's bounds are reversed.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let fixture: ConfigFixture = serde_norway::from_str(contents)?;
        let defaults = Self::default();

        let currency = fixture
            .currency
            .as_deref()
            .map(currency_from_code)
            .transpose()?
            .unwrap_or(defaults.currency);

        let tax_rate = fixture
            .tax_rate
            .as_deref()
            .map(parse_percentage)
            .transpose()?
            .unwrap_or(defaults.tariff.tax_rate);

        let delivery_minor = fixture
            .delivery_charge
            .as_deref()
            .map(parse_amount)
            .transpose()?
            .unwrap_or(DEFAULT_DELIVERY_MINOR);

        let promo_codes = match fixture.promo_codes {
            Some(codes) => PromoCodes::new(
                codes
                    .iter()
                    .map(|(code, rate)| Ok((code.as_str(), parse_percentage(rate)?)))
                    .collect::<Result<Vec<_>, PricingError>>()?,
            ),
            None => defaults.promo_codes,
        };

        let delivery_estimate = estimate(
            FulfillmentMode::Delivery,
            fixture.fulfillment.delivery,
            defaults.delivery_estimate,
        )?;

        let pickup_estimate = estimate(
            FulfillmentMode::Pickup,
            fixture.fulfillment.pickup,
            defaults.pickup_estimate,
        )?;

        Ok(Self {
            currency,
            tariff: Tariff {
                tax_rate,
                delivery_charge: Money::from_minor(delivery_minor, currency),
            },
            promo_codes,
            delivery_estimate,
            pickup_estimate,
            store: fixture.store.unwrap_or(defaults.store),
        })
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise see
    /// [`EngineConfig::from_yaml`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_yaml(&contents)?;

        debug!(path = %path.display(), currency = config.currency.iso_alpha_code, "config loaded");

        Ok(config)
    }

    /// Estimate for a fulfillment mode.
    pub fn estimate(&self, mode: FulfillmentMode) -> FulfillmentEstimate {
        match mode {
            FulfillmentMode::Delivery => self.delivery_estimate,
            FulfillmentMode::Pickup => self.pickup_estimate,
        }
    }
}

fn estimate(
    mode: FulfillmentMode,
    fixture: Option<EstimateFixture>,
    default: FulfillmentEstimate,
) -> Result<FulfillmentEstimate, ConfigError> {
    let Some(fixture) = fixture else {
        return Ok(default);
    };

    if fixture.min_minutes > fixture.max_minutes {
        return Err(ConfigError::InvalidEstimate(mode));
    }

    Ok(FulfillmentEstimate {
        mode,
        min_minutes: fixture.min_minutes,
        max_minutes: fixture.max_minutes,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::pricing::percent_points;

    use super::*;

    #[test]
    fn defaults_match_storefront() {
        let config = EngineConfig::default();

        assert_eq!(config.currency, INR);
        assert_eq!(percent_points(config.tariff.tax_rate).to_string(), "8.5");
        assert_eq!(config.tariff.delivery_charge, Money::from_minor(500, INR));
        assert_eq!(config.promo_codes.len(), 5);
        assert_eq!(
            config.estimate(FulfillmentMode::Pickup).to_string(),
            "pickup ready in 15-20 minutes"
        );
    }

    #[test]
    fn empty_yaml_uses_defaults() -> TestResult {
        let config = EngineConfig::from_yaml("{}")?;

        assert_eq!(config.currency, INR);
        assert_eq!(config.store, StoreInfo::default());

        Ok(())
    }

    #[test]
    fn yaml_overrides_values() -> TestResult {
        let config = EngineConfig::from_yaml(
            r#"
currency: USD
tax_rate: "0.1"
delivery_charge: "3.99"
promo_codes:
  half: "50%"
fulfillment:
  delivery: { min_minutes: 25, max_minutes: 35 }
store:
  name: Slice
  address: Main St
  phone: "555"
"#,
        )?;

        assert_eq!(config.currency, USD);
        assert_eq!(config.tariff.delivery_charge, Money::from_minor(399, USD));
        assert_eq!(percent_points(config.tariff.tax_rate).to_string(), "10");
        assert_eq!(config.promo_codes.len(), 1);
        assert!(config.promo_codes.rate("HALF").is_some());
        assert_eq!(config.delivery_estimate.min_minutes, 25);
        assert_eq!(config.pickup_estimate.max_minutes, 20);
        assert_eq!(config.store.name, "Slice");

        Ok(())
    }

    #[test]
    fn bad_rate_is_rejected() {
        let result = EngineConfig::from_yaml("tax_rate: \"120%\"");

        assert!(matches!(
            result,
            Err(ConfigError::Pricing(PricingError::InvalidPercentage(_)))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            EngineConfig::from_yaml("tax: 1"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn reversed_estimate_is_rejected() {
        let result =
            EngineConfig::from_yaml("fulfillment:\n  pickup: { min_minutes: 30, max_minutes: 10 }");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidEstimate(FulfillmentMode::Pickup))
        ));
    }

    #[test]
    fn from_path_reads_file() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "currency: GBP\ndelivery_charge: \"2.50\"")?;

        let config = EngineConfig::from_path(file.path())?;

        assert_eq!(config.tariff.delivery_charge.to_minor_units(), 250);

        Ok(())
    }

    #[test]
    fn from_path_missing_file_is_io_error() {
        assert!(matches!(
            EngineConfig::from_path("/nonexistent/crust.yml"),
            Err(ConfigError::Io(_))
        ));
    }
}
