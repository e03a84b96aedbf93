//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices are quoted by the API in the store's base currency (USD).
//! Display prices in other currencies are derived with a static
//! [`ExchangeRates`] table.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes supported by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    INR,
}

impl CurrencyCode {
    /// All supported currencies, base currency first.
    pub const ALL: [Self; 6] = [
        Self::USD,
        Self::EUR,
        Self::GBP,
        Self::CAD,
        Self::AUD,
        Self::INR,
    ];

    /// Display symbol (e.g., "$", "€").
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::CAD => "CA$",
            Self::AUD => "A$",
            Self::INR => "₹",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::INR => "INR",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error parsing a [`CurrencyCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported currency: {0}")]
pub struct UnsupportedCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnsupportedCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or(UnsupportedCurrency(s.to_owned()))
    }
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{}{:.2}",
            self.currency_code.symbol(),
            round_money(self.amount)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Round a monetary amount to cents, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Static conversion table relative to the base currency.
///
/// A rate of `0.92` for EUR means one base unit buys 0.92 EUR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRates {
    base: CurrencyCode,
    rates: HashMap<CurrencyCode, Decimal>,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        let rates = [
            (CurrencyCode::EUR, Decimal::new(92, 2)),
            (CurrencyCode::GBP, Decimal::new(79, 2)),
            (CurrencyCode::CAD, Decimal::new(136, 2)),
            (CurrencyCode::AUD, Decimal::new(152, 2)),
            (CurrencyCode::INR, Decimal::new(8320, 2)),
        ];
        Self::new(CurrencyCode::USD, rates)
    }
}

impl ExchangeRates {
    /// Build a table. The base currency always converts at 1.
    #[must_use]
    pub fn new(base: CurrencyCode, rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>) -> Self {
        let mut rates: HashMap<_, _> = rates.into_iter().collect();
        rates.insert(base, Decimal::ONE);
        Self { base, rates }
    }

    /// The currency catalog prices are quoted in.
    #[must_use]
    pub const fn base(&self) -> CurrencyCode {
        self.base
    }

    /// Rate for a currency, if known.
    #[must_use]
    pub fn rate(&self, currency: CurrencyCode) -> Option<Decimal> {
        self.rates.get(&currency).copied()
    }

    /// Currencies with a known rate, in declaration order.
    #[must_use]
    pub fn supported(&self) -> Vec<CurrencyCode> {
        CurrencyCode::ALL
            .into_iter()
            .filter(|c| self.rates.contains_key(c))
            .collect()
    }

    /// Convert a base-currency amount into `target`.
    ///
    /// Unknown targets fall back to the base currency unchanged.
    #[must_use]
    pub fn convert(&self, amount: Decimal, target: CurrencyCode) -> Price {
        match self.rate(target) {
            Some(rate) => Price::new(round_money(amount * rate), target),
            None => Price::new(round_money(amount), self.base),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_display() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$19.99");

        let price = Price::new(Decimal::new(5, 0), CurrencyCode::EUR);
        assert_eq!(price.to_string(), "€5.00");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert_eq!(" INR ".parse::<CurrencyCode>().unwrap(), CurrencyCode::INR);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_round_money_midpoint() {
        assert_eq!(round_money(Decimal::new(1_005, 3)), Decimal::new(101, 2));
        assert_eq!(round_money(Decimal::new(-1_005, 3)), Decimal::new(-101, 2));
    }

    #[test]
    fn test_convert_known_rate() {
        let rates = ExchangeRates::default();
        let price = rates.convert(Decimal::new(1000, 2), CurrencyCode::EUR);
        assert_eq!(price.amount, Decimal::new(920, 2));
        assert_eq!(price.currency_code, CurrencyCode::EUR);
    }

    #[test]
    fn test_convert_base_is_identity() {
        let rates = ExchangeRates::default();
        let price = rates.convert(Decimal::new(1234, 2), CurrencyCode::USD);
        assert_eq!(price.amount, Decimal::new(1234, 2));
    }

    #[test]
    fn test_convert_unknown_rate_falls_back() {
        let rates = ExchangeRates::new(CurrencyCode::USD, [(CurrencyCode::EUR, Decimal::ONE)]);
        let price = rates.convert(Decimal::TEN, CurrencyCode::GBP);
        assert_eq!(price.currency_code, CurrencyCode::USD);
        assert_eq!(rates.supported(), vec![CurrencyCode::USD, CurrencyCode::EUR]);
    }
}
