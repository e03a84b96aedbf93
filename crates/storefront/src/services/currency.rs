//! Display currency selection.
//!
//! Catalog prices and cart totals are always computed in the base currency.
//! The selected currency only changes how they are presented.

use lumen_core::{CartSummary, CurrencyCode, ExchangeRates, UnsupportedCurrency};
use tower_sessions::Session;

use super::{ServiceError, load_opt, save};
use crate::config::PricingConfig;
use crate::models::session_keys;

pub struct CurrencyService<'a> {
    session: &'a Session,
    pricing: &'a PricingConfig,
}

impl<'a> CurrencyService<'a> {
    #[must_use]
    pub const fn new(session: &'a Session, pricing: &'a PricingConfig) -> Self {
        Self { session, pricing }
    }

    /// The visitor's currency, or the configured default.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn current(&self) -> Result<CurrencyCode, ServiceError> {
        let selected: Option<CurrencyCode> = load_opt(self.session, session_keys::CURRENCY).await?;
        Ok(selected
            .filter(|c| self.pricing.rates.rate(*c).is_some())
            .unwrap_or(self.pricing.default_currency))
    }

    /// Select a currency.
    ///
    /// # Errors
    ///
    /// Returns `Currency` if no rate is configured for it.
    pub async fn select(&self, code: CurrencyCode) -> Result<CurrencyCode, ServiceError> {
        if self.pricing.rates.rate(code).is_none() {
            return Err(UnsupportedCurrency(code.to_string()).into());
        }
        save(self.session, session_keys::CURRENCY, &code).await?;
        Ok(code)
    }

    #[must_use]
    pub fn rates(&self) -> &ExchangeRates {
        &self.pricing.rates
    }

    /// A base-currency summary re-expressed in the visitor's currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn present(&self, summary: &CartSummary) -> Result<CartSummary, ServiceError> {
        let currency = self.current().await?;
        Ok(summary.converted(&self.pricing.rates, currency))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use lumen_core::{CartLines, DeliveryOption, TotalsPolicy};
    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_default_then_select() {
        let session = session();
        let pricing = PricingConfig::default();
        let currency = CurrencyService::new(&session, &pricing);

        assert_eq!(currency.current().await.unwrap(), CurrencyCode::USD);
        currency.select(CurrencyCode::GBP).await.unwrap();
        assert_eq!(currency.current().await.unwrap(), CurrencyCode::GBP);
    }

    #[tokio::test]
    async fn test_select_without_rate_is_rejected() {
        let session = session();
        let pricing = PricingConfig {
            rates: ExchangeRates::new(CurrencyCode::USD, [(CurrencyCode::EUR, Decimal::ONE)]),
            ..PricingConfig::default()
        };
        let currency = CurrencyService::new(&session, &pricing);

        let err = currency.select(CurrencyCode::INR).await.unwrap_err();
        assert!(matches!(err, ServiceError::Currency(_)));
        assert_eq!(currency.current().await.unwrap(), CurrencyCode::USD);
    }

    #[tokio::test]
    async fn test_present_converts_summary() {
        let session = session();
        let pricing = PricingConfig::default();
        let currency = CurrencyService::new(&session, &pricing);
        currency.select(CurrencyCode::EUR).await.unwrap();

        let summary =
            TotalsPolicy::default().summarize(&CartLines::default(), None, DeliveryOption::Standard);
        let shown = currency.present(&summary).await.unwrap();
        assert_eq!(shown.currency, CurrencyCode::EUR);
        assert_eq!(shown.total, Decimal::ZERO);
    }
}
