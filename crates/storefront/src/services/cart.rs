//! Cart service.
//!
//! A visitor who is not signed in keeps a guest cart in the session. Once
//! signed in, the session mirrors the server cart instead and every change
//! is sent to the API.
//!
//! Mutations are optimistic: the session copy changes first, then the server
//! call runs, and a failed call writes the pre-change snapshot back.

use lumen_core::{
    CartError, CartItem, CartItemId, CartLines, CartSummary, DeliveryOption, MAX_LINE_QUANTITY,
    ProductId, ServerTotals, TotalsPolicy,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use super::{ReconcileReport, ServiceError, api_failure, current_auth, load, load_opt, save};
use crate::api::cart::ServerCart;
use crate::api::{ApiClient, ApiError, InvalidInput};
use crate::error::add_breadcrumb;
use crate::models::{AuthSession, session_keys};

/// The visitor's cart as currently held in the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CartState {
    pub lines: CartLines,
    /// Figures the server attached to its cart, when signed in.
    pub totals: Option<ServerTotals>,
    pub signed_in: bool,
}

impl CartState {
    /// Derived totals for a delivery option.
    #[must_use]
    pub fn summarize(&self, policy: &TotalsPolicy, delivery: DeliveryOption) -> CartSummary {
        policy.summarize(&self.lines, self.totals.as_ref(), delivery)
    }

    /// Server shipping and tax were priced for the old lines.
    fn invalidate_server_figures(&mut self) {
        if let Some(totals) = &mut self.totals {
            totals.shipping = None;
            totals.tax = None;
        }
    }
}

/// The API's id for a line, falling back to the product id for lines the
/// server has not assigned one.
fn line_item_id(item: &CartItem) -> CartItemId {
    item.id
        .clone()
        .unwrap_or_else(|| CartItemId::new(item.product.id.as_str()))
}

/// Cart operations for one visitor.
pub struct CartService<'a> {
    api: &'a ApiClient,
    session: &'a Session,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, session: &'a Session) -> Self {
        Self { api, session }
    }

    /// The current cart. Signed-in visitors without a mirror fetch it first.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store or the API fails.
    pub async fn state(&self) -> Result<CartState, ServiceError> {
        let auth = current_auth(self.session).await?;
        self.load_state(auth.as_ref()).await
    }

    /// Re-fetch the server cart, or read the guest cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store or the API fails.
    pub async fn refresh(&self) -> Result<CartState, ServiceError> {
        match current_auth(self.session).await? {
            Some(auth) => self.pull(&auth.token).await,
            None => self.load_state(None).await,
        }
    }

    /// Add units of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// - `ProductNotFound` if the catalog has no such product
    /// - `Cart` for zero quantities and stock problems
    /// - `Api` if the server call fails (the cart is rolled back)
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<CartState, ServiceError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity.into());
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                max: MAX_LINE_QUANTITY,
            }
            .into());
        }
        let product = self
            .api
            .get_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(product_id.clone()))?;

        let auth = current_auth(self.session).await?;
        let snapshot = self.load_state(auth.as_ref()).await?;
        let before = snapshot.lines.find(product_id).map_or(0, |i| i.quantity);

        let mut state = snapshot.clone();
        let after = state.lines.add(product, quantity)?;
        state.invalidate_server_figures();
        self.store(&state).await?;
        add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));

        let Some(auth) = auth else {
            return Ok(state);
        };
        let result = self
            .api
            .add_cart_item(&auth.token, product_id, after - before)
            .await;
        let state = self.settle(state, &snapshot, result).await?;

        // Later updates and removes address the line by its server id.
        if state.lines.find(product_id).is_some_and(|i| i.id.is_none()) {
            match self.pull(&auth.token).await {
                Ok(fresh) => return Ok(fresh),
                Err(e @ (ServiceError::Session(_) | ServiceError::SignInRequired)) => return Err(e),
                Err(e) => warn!(error = %e, "Could not fetch server line id after add"),
            }
        }
        Ok(state)
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// - `Cart` if the product is not in the cart
    /// - `Api` if the server call fails (the cart is rolled back)
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartState, ServiceError> {
        let auth = current_auth(self.session).await?;
        let snapshot = self.load_state(auth.as_ref()).await?;
        let item_id = snapshot
            .lines
            .find(product_id)
            .map(line_item_id)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;

        let mut state = snapshot.clone();
        let stored = state.lines.set_quantity(product_id, quantity)?;
        state.invalidate_server_figures();
        self.store(&state).await?;

        let Some(auth) = auth else {
            return Ok(state);
        };
        let result = if stored == 0 {
            self.api.remove_cart_item(&auth.token, &item_id).await
        } else {
            self.api.update_cart_item(&auth.token, &item_id, stored).await
        };
        self.settle(state, &snapshot, result).await
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// - `Cart` if the product is not in the cart
    /// - `Api` if the server call fails (the cart is rolled back)
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<CartState, ServiceError> {
        let auth = current_auth(self.session).await?;
        let snapshot = self.load_state(auth.as_ref()).await?;

        let mut state = snapshot.clone();
        let removed = state.lines.remove(product_id)?;
        state.invalidate_server_figures();
        self.store(&state).await?;

        let Some(auth) = auth else {
            return Ok(state);
        };
        let result = self
            .api
            .remove_cart_item(&auth.token, &line_item_id(&removed))
            .await;
        self.settle(state, &snapshot, result).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the server call fails (the cart is rolled back).
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<CartState, ServiceError> {
        let auth = current_auth(self.session).await?;
        let snapshot = self.load_state(auth.as_ref()).await?;

        let mut state = snapshot.clone();
        state.lines.clear();
        state.totals = None;
        self.store(&state).await?;

        let Some(auth) = auth else {
            return Ok(state);
        };
        let result = self.api.clear_cart(&auth.token).await.map(|()| None);
        self.settle(state, &snapshot, result).await
    }

    /// Apply a coupon to the server cart. Signed-in customers only.
    ///
    /// # Errors
    ///
    /// - `SignInRequired` for guests
    /// - `Invalid` for a blank code
    /// - `Api` if the server rejects the code
    #[instrument(skip(self))]
    pub async fn apply_coupon(&self, code: &str) -> Result<CartState, ServiceError> {
        let auth = current_auth(self.session)
            .await?
            .ok_or(ServiceError::SignInRequired)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(InvalidInput("coupon code is required").into());
        }

        match self.api.apply_coupon(&auth.token, code).await {
            Ok(Some(cart)) => self.store_server(cart).await,
            Ok(None) => self.pull(&auth.token).await,
            Err(e) => Err(api_failure(self.session, e).await),
        }
    }

    /// Remove the coupon. Signed-in customers only.
    ///
    /// # Errors
    ///
    /// - `SignInRequired` for guests
    /// - `Api` if the server call fails (the cart is rolled back)
    #[instrument(skip(self))]
    pub async fn remove_coupon(&self) -> Result<CartState, ServiceError> {
        let auth = current_auth(self.session)
            .await?
            .ok_or(ServiceError::SignInRequired)?;
        let snapshot = self.load_state(Some(&auth)).await?;

        let mut state = snapshot.clone();
        if let Some(totals) = &mut state.totals {
            totals.discount = None;
            totals.coupon_code = None;
        }
        state.invalidate_server_figures();
        self.store(&state).await?;

        let result = self.api.remove_coupon(&auth.token).await;
        self.settle(state, &snapshot, result).await
    }

    /// Push every guest line to the server, one at a time, then adopt the
    /// server cart.
    ///
    /// Lines the server refuses stay in the guest cart. A failed fetch of the
    /// server cart leaves no mirror, so the next read fetches again.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session store fails.
    #[instrument(skip_all)]
    pub async fn reconcile(&self, token: &str) -> Result<ReconcileReport, ServiceError> {
        let guest: CartLines = load(self.session, session_keys::GUEST_CART).await?;

        let mut report = ReconcileReport::default();
        let mut kept = Vec::new();
        for item in guest.into_items() {
            match self
                .api
                .add_cart_item(token, &item.product.id, item.quantity)
                .await
            {
                Ok(_) => report.pushed += 1,
                Err(e) => {
                    warn!(
                        product_id = %item.product.id,
                        error = %e,
                        "Could not push guest cart line, keeping it"
                    );
                    kept.push(item);
                }
            }
        }

        report.failed = kept.len();
        if kept.is_empty() {
            self.session.remove_value(session_keys::GUEST_CART).await?;
        } else {
            save(self.session, session_keys::GUEST_CART, &CartLines::from_items(kept)).await?;
        }

        match self.pull(token).await {
            Ok(_) => report.synced = true,
            Err(e @ (ServiceError::Session(_) | ServiceError::SignInRequired)) => return Err(e),
            Err(e) => {
                warn!(error = %e, "Could not fetch server cart after sign-in");
                self.forget_server_copy().await?;
            }
        }

        info!(
            pushed = report.pushed,
            failed = report.failed,
            synced = report.synced,
            "Guest cart reconciled"
        );
        Ok(report)
    }

    /// Drop the server mirror (on logout). The server cart itself is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn forget_server_copy(&self) -> Result<(), ServiceError> {
        self.session.remove_value(session_keys::CART).await?;
        self.session.remove_value(session_keys::CART_TOTALS).await?;
        Ok(())
    }

    // =========================================================================
    // Session plumbing
    // =========================================================================

    async fn load_state(&self, auth: Option<&AuthSession>) -> Result<CartState, ServiceError> {
        let Some(auth) = auth else {
            return Ok(CartState {
                lines: load(self.session, session_keys::GUEST_CART).await?,
                totals: None,
                signed_in: false,
            });
        };

        match load_opt::<CartLines>(self.session, session_keys::CART).await? {
            Some(lines) => Ok(CartState {
                lines,
                totals: load_opt(self.session, session_keys::CART_TOTALS).await?,
                signed_in: true,
            }),
            None => self.pull(&auth.token).await,
        }
    }

    async fn pull(&self, token: &str) -> Result<CartState, ServiceError> {
        match self.api.get_cart(token).await {
            Ok(cart) => self.store_server(cart).await,
            Err(e) => Err(api_failure(self.session, e).await),
        }
    }

    async fn store_server(&self, cart: ServerCart) -> Result<CartState, ServiceError> {
        let state = CartState {
            lines: cart.lines,
            totals: Some(cart.totals),
            signed_in: true,
        };
        self.store(&state).await?;
        Ok(state)
    }

    async fn store(&self, state: &CartState) -> Result<(), ServiceError> {
        if !state.signed_in {
            save(self.session, session_keys::GUEST_CART, &state.lines).await?;
            return Ok(());
        }
        save(self.session, session_keys::CART, &state.lines).await?;
        match &state.totals {
            Some(totals) => save(self.session, session_keys::CART_TOTALS, totals).await?,
            None => {
                self.session.remove_value(session_keys::CART_TOTALS).await?;
            }
        }
        Ok(())
    }

    /// Finish an optimistic change once the server answered.
    async fn settle(
        &self,
        state: CartState,
        snapshot: &CartState,
        result: Result<Option<ServerCart>, ApiError>,
    ) -> Result<CartState, ServiceError> {
        match result {
            Ok(Some(cart)) => self.store_server(cart).await,
            Ok(None) => Ok(state),
            // The mirror is dropped with the sign-in, nothing to restore.
            Err(ApiError::Unauthorized) => {
                Err(api_failure(self.session, ApiError::Unauthorized).await)
            }
            Err(e) => {
                warn!(error = %e, "Cart change rejected, restoring snapshot");
                if let Err(restore) = self.store(snapshot).await {
                    tracing::error!(error = %restore, "Failed to restore cart snapshot");
                }
                Err(e.into())
            }
        }
    }
}
