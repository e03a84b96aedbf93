//! Display currency handlers.

use axum::{Json, extract::State};
use lumen_core::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::Result;
use crate::services::{CurrencyService, ServiceError};
use crate::state::AppState;

/// One selectable currency.
#[derive(Debug, Serialize)]
pub struct CurrencyOption {
    pub code: CurrencyCode,
    pub symbol: &'static str,
    /// Units of this currency per unit of the base currency.
    pub rate: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CurrencyView {
    pub current: CurrencyCode,
    pub base: CurrencyCode,
    pub supported: Vec<CurrencyOption>,
}

#[derive(Debug, Deserialize)]
pub struct SelectCurrency {
    pub currency: String,
}

async fn view(currency: &CurrencyService<'_>) -> Result<CurrencyView> {
    let rates = currency.rates();
    let supported = rates
        .supported()
        .into_iter()
        .filter_map(|code| {
            rates.rate(code).map(|rate| CurrencyOption {
                code,
                symbol: code.symbol(),
                rate,
            })
        })
        .collect();
    Ok(CurrencyView {
        current: currency.current().await?,
        base: rates.base(),
        supported,
    })
}

/// The selected currency and the supported ones.
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CurrencyView>> {
    let currency = CurrencyService::new(&session, state.pricing());
    Ok(Json(view(&currency).await?))
}

/// Select a display currency.
#[instrument(skip(state, session))]
pub async fn select(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<SelectCurrency>,
) -> Result<Json<CurrencyView>> {
    let code = req
        .currency
        .trim()
        .parse::<CurrencyCode>()
        .map_err(ServiceError::from)?;
    let currency = CurrencyService::new(&session, state.pricing());
    currency.select(code).await?;
    info!(currency = %code, "Display currency changed");
    Ok(Json(view(&currency).await?))
}
