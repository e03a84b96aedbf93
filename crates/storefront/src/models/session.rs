//! Session-related types.

use std::fmt;

use lumen_core::{User, UserId};
use serde::{Deserialize, Serialize};

/// A signed-in customer: the API bearer token and the profile it belongs to.
///
/// `Debug` redacts the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

impl AuthSession {
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user.id
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Session keys, one per slice of visitor state.
pub mod session_keys {
    /// [`super::AuthSession`] of the signed-in customer.
    pub const AUTH: &str = "auth";

    /// Cart lines of a visitor who is not signed in. After sign-in it only
    /// holds lines the server refused.
    pub const GUEST_CART: &str = "guest_cart";

    /// Mirror of the server cart while signed in.
    pub const CART: &str = "cart";

    /// Totals the server attached to its cart.
    pub const CART_TOTALS: &str = "cart_totals";

    /// Guest wishlist, same lifecycle as [`GUEST_CART`].
    pub const GUEST_WISHLIST: &str = "guest_wishlist";

    /// Mirror of the server wishlist while signed in.
    pub const WISHLIST: &str = "wishlist";

    /// Products picked for comparison.
    pub const COMPARE: &str = "compare";

    /// Recently viewed products.
    pub const RECENTLY_VIEWED: &str = "recently_viewed";

    /// Selected display currency.
    pub const CURRENCY: &str = "currency";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let auth = AuthSession {
            token: "tok_live_9f8e7d".to_string(),
            user: serde_json::from_str(r#"{"id": 1, "name": "Ada"}"#).unwrap(),
        };
        let debug = format!("{auth:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("tok_live_9f8e7d"));
        assert_eq!(auth.user_id().as_str(), "1");
    }
}
