//! Per-visitor services over the session and the commerce API.
//!
//! # Services
//!
//! - `auth` - One-time-code sign-in, profile, logout
//! - `cart` - Guest and server carts, optimistic updates, sign-in reconciliation
//! - `wishlist` - Saved products, reconciled like the cart
//! - `compare` - Side-by-side comparison (session only)
//! - `recently_viewed` - Recently viewed strip (session only)
//! - `currency` - Display currency and conversion
//!
//! Services borrow the request's [`Session`] and the shared [`ApiClient`];
//! construct one per request.
//!
//! [`ApiClient`]: crate::api::ApiClient

pub mod auth;
pub mod cart;
pub mod compare;
pub mod currency;
pub mod recently_viewed;
pub mod wishlist;

mod error;

pub use auth::{AuthError, AuthService, SignIn};
pub use cart::{CartService, CartState};
pub use compare::{CompareService, CompareView};
pub use currency::CurrencyService;
pub use error::ServiceError;
pub use recently_viewed::RecentlyViewedService;
pub use wishlist::WishlistService;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;
use tracing::warn;

use crate::api::ApiError;
use crate::error::clear_sentry_user;
use crate::models::{AuthSession, session_keys};

/// Outcome of pushing guest entries to the server after sign-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Entries the server accepted.
    pub pushed: usize,
    /// Entries kept in the guest copy because the push failed.
    pub failed: usize,
    /// Whether the authoritative server copy was fetched afterwards.
    pub synced: bool,
}

/// Read a slice, treating a value that no longer deserializes as absent.
pub(crate) async fn load_opt<T: DeserializeOwned>(
    session: &Session,
    key: &str,
) -> Result<Option<T>, SessionError> {
    match session.get::<T>(key).await {
        Ok(value) => Ok(value),
        Err(SessionError::SerdeJson(e)) => {
            warn!(key, error = %e, "Discarding unreadable session value");
            session.remove_value(key).await?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Read a slice, defaulting when absent.
pub(crate) async fn load<T: DeserializeOwned + Default>(
    session: &Session,
    key: &str,
) -> Result<T, SessionError> {
    Ok(load_opt(session, key).await?.unwrap_or_default())
}

/// Write a slice.
pub(crate) async fn save<T: Serialize + Sync>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), SessionError> {
    session.insert(key, value).await
}

/// The signed-in customer, if any.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn current_auth(session: &Session) -> Result<Option<AuthSession>, SessionError> {
    load_opt(session, session_keys::AUTH).await
}

/// Map an API failure to a service error.
///
/// A rejected token ends the sign-in: the auth slice and the server mirrors
/// are dropped and the caller gets `SignInRequired`. Guest copies are kept.
pub(crate) async fn api_failure(session: &Session, err: ApiError) -> ServiceError {
    if !matches!(err, ApiError::Unauthorized) {
        return err.into();
    }
    warn!("API rejected the session token, signing out");
    for key in [
        session_keys::AUTH,
        session_keys::CART,
        session_keys::CART_TOTALS,
        session_keys::WISHLIST,
    ] {
        if let Err(e) = session.remove_value(key).await {
            return e.into();
        }
    }
    clear_sentry_user();
    ServiceError::SignInRequired
}
