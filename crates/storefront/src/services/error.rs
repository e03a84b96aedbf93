//! Service error types.

use lumen_core::{CartError, CompareError, ProductId, UnsupportedCurrency};
use thiserror::Error;

use crate::api::{ApiError, InvalidInput};

/// Errors from the cart, list and currency services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The commerce API call failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// A cart rule was violated.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The comparison list is full.
    #[error(transparent)]
    Compare(#[from] CompareError),

    /// The currency has no configured rate.
    #[error(transparent)]
    Currency(#[from] UnsupportedCurrency),

    /// Input failed local checks.
    #[error(transparent)]
    Invalid(#[from] InvalidInput),

    /// The catalog has no such product.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The operation needs a signed-in customer.
    #[error("sign in to continue")]
    SignInRequired,
}
