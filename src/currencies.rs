//! Currencies

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Money as used throughout the storefront.
pub type Price = Money<'static, Currency>;

/// Minor units per major unit, shared by every supported currency.
const MINOR_UNITS: i64 = 100;

/// Errors converting between amounts and currencies.
#[derive(Debug, Error, PartialEq)]
pub enum CurrencyError {
    /// The ISO code is not one of the supported storefront currencies.
    #[error("unsupported currency: {0}")]
    Unsupported(String),

    /// A decimal amount does not fit in minor units.
    #[error("amount {0} cannot be represented in minor units")]
    InvalidAmount(Decimal),
}

/// The currencies a storefront price can be displayed and charged in.
///
/// `Thb` is the base currency: every product carries a base price, and the other two fall back
/// to it when a product has no price of their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum StoreCurrency {
    /// Thai baht, the base currency.
    #[default]
    #[value(name = "THB", alias = "thb")]
    Thb,

    /// Russian rouble.
    #[value(name = "RUB", alias = "rub")]
    Rub,

    /// US dollar.
    #[value(name = "USD", alias = "usd")]
    Usd,
}

impl StoreCurrency {
    /// All supported currencies, base first.
    pub const ALL: [StoreCurrency; 3] = [StoreCurrency::Thb, StoreCurrency::Rub, StoreCurrency::Usd];

    /// The base currency.
    pub const BASE: StoreCurrency = StoreCurrency::Thb;

    /// Returns the ISO currency used for money arithmetic.
    #[must_use]
    pub fn iso(self) -> &'static Currency {
        match self {
            StoreCurrency::Thb => iso::THB,
            StoreCurrency::Rub => iso::RUB,
            StoreCurrency::Usd => iso::USD,
        }
    }

    /// Returns the ISO alpha code, e.g. `"USD"`.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            StoreCurrency::Thb => "THB",
            StoreCurrency::Rub => "RUB",
            StoreCurrency::Usd => "USD",
        }
    }

    /// Zero in this currency.
    #[must_use]
    pub fn zero(self) -> Price {
        Money::from_minor(0, self.iso())
    }

    /// Money from minor units in this currency.
    #[must_use]
    pub fn minor(self, minor_units: i64) -> Price {
        Money::from_minor(minor_units, self.iso())
    }

    /// Money from a major-unit decimal in this currency.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::InvalidAmount`] if the amount overflows minor units.
    pub fn major(self, amount: Decimal) -> Result<Price, CurrencyError> {
        Ok(self.minor(to_minor_units(amount)?))
    }

    /// Resolve a supported currency from a money value.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::Unsupported`] for any other ISO currency.
    pub fn of(price: &Price) -> Result<Self, CurrencyError> {
        price.currency().iso_alpha_code.parse()
    }
}

impl fmt::Display for StoreCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for StoreCurrency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "THB" => Ok(StoreCurrency::Thb),
            "RUB" => Ok(StoreCurrency::Rub),
            "USD" => Ok(StoreCurrency::Usd),
            _ => Err(CurrencyError::Unsupported(s.to_string())),
        }
    }
}

impl Serialize for StoreCurrency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for StoreCurrency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;

        code.parse().map_err(serde::de::Error::custom)
    }
}

/// Convert a major-unit decimal (e.g. `45.50`) into minor units (`4550`).
///
/// # Errors
///
/// Returns [`CurrencyError::InvalidAmount`] if the amount overflows `i64` minor units.
pub fn to_minor_units(amount: Decimal) -> Result<i64, CurrencyError> {
    amount
        .checked_mul(Decimal::from(MINOR_UNITS))
        .map(|value| value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|value| value.to_i64())
        .ok_or(CurrencyError::InvalidAmount(amount))
}

/// Convert minor units into a major-unit decimal with two decimal places.
#[must_use]
pub fn to_major_units(minor_units: i64) -> Decimal {
    Decimal::new(minor_units, 2)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_codes_case_insensitively() -> TestResult {
        assert_eq!("usd".parse::<StoreCurrency>()?, StoreCurrency::Usd);
        assert_eq!(" RUB ".parse::<StoreCurrency>()?, StoreCurrency::Rub);
        assert_eq!("Thb".parse::<StoreCurrency>()?, StoreCurrency::Thb);

        Ok(())
    }

    #[test]
    fn rejects_unsupported_codes() {
        let result = "GBP".parse::<StoreCurrency>();

        assert_eq!(result, Err(CurrencyError::Unsupported("GBP".to_string())));
    }

    #[test]
    fn major_amounts_convert_to_minor_units() -> TestResult {
        assert_eq!(to_minor_units(Decimal::new(45, 0))?, 4500);
        assert_eq!(to_minor_units(Decimal::new(1999, 2))?, 1999);
        assert_eq!(to_minor_units(Decimal::new(12345, 3))?, 1235);

        Ok(())
    }

    #[test]
    fn minor_amounts_convert_back_to_major_units() {
        assert_eq!(to_major_units(4500), Decimal::new(45, 0));
        assert_eq!(to_major_units(-150), Decimal::new(-15, 1));
    }

    #[test]
    fn overflowing_amounts_are_rejected() {
        let result = to_minor_units(Decimal::MAX);

        assert!(matches!(result, Err(CurrencyError::InvalidAmount(_))));
    }

    #[test]
    fn money_round_trips_through_store_currency() -> TestResult {
        let price = StoreCurrency::Rub.major(Decimal::new(3200, 0))?;

        assert_eq!(price, Money::from_minor(320_000, iso::RUB));
        assert_eq!(StoreCurrency::of(&price)?, StoreCurrency::Rub);

        Ok(())
    }

    #[test]
    fn serializes_as_iso_code() -> TestResult {
        let json = serde_json::to_string(&StoreCurrency::Usd)?;

        assert_eq!(json, "\"USD\"");
        assert_eq!(serde_json::from_str::<StoreCurrency>("\"thb\"")?, StoreCurrency::Thb);

        Ok(())
    }
}
