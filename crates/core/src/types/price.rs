//! Type-safe money representation using decimal arithmetic.
//!
//! The commerce API reports amounts as decimal strings (`"19.99"`) paired
//! with an ISO 4217 code. [`Money`] parses both so downstream code never
//! does float arithmetic on prices.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is not a valid decimal number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// The currency code is not one we sell in.
    #[error("unsupported currency code: {0}")]
    UnsupportedCurrency(String),
}

/// A monetary amount with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Parse an amount/currency pair as returned by the commerce API.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not a decimal or the currency code
    /// is not supported.
    ///
    /// ```
    /// use reuse_core::{CurrencyCode, Money};
    ///
    /// let price = Money::parse("24.5", "EUR").unwrap();
    /// assert_eq!(price.currency_code, CurrencyCode::EUR);
    /// assert_eq!(price.display(), "€24.50");
    /// ```
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|_| MoneyError::InvalidAmount(amount.to_string()))?;
        let currency_code = currency_code.parse::<CurrencyCode>()?;
        Ok(Self::new(amount, currency_code))
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency_code.code())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            _ => Err(MoneyError::UnsupportedCurrency(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let money = Money::parse("19.9", "usd").unwrap();
        assert_eq!(money.amount, Decimal::new(1990, 2));
        assert_eq!(money.currency_code, CurrencyCode::USD);
        assert_eq!(money.display(), "$19.90");
        assert_eq!(money.to_string(), "19.90 USD");
    }

    #[test]
    fn test_parse_rejects_garbage_amount() {
        let err = Money::parse("nineteen", "EUR").unwrap_err();
        assert_eq!(err, MoneyError::InvalidAmount("nineteen".to_string()));
    }

    #[test]
    fn test_parse_rejects_unknown_currency() {
        let err = Money::parse("1.00", "XYZ").unwrap_err();
        assert!(matches!(err, MoneyError::UnsupportedCurrency(_)));
    }

    #[test]
    fn test_zero() {
        let zero = Money::zero(CurrencyCode::GBP);
        assert!(zero.is_zero());
        assert_eq!(zero.display(), "£0.00");
    }
}
