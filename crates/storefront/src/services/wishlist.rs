//! Wishlist service.
//!
//! Same split as the cart: a guest wishlist in the session, a mirror of the
//! server wishlist once signed in, optimistic changes with rollback.

use lumen_core::{ProductId, Wishlist};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use super::cart::{CartService, CartState};
use super::{ReconcileReport, ServiceError, api_failure, current_auth, load, load_opt, save};
use crate::api::{ApiClient, ApiError};
use crate::models::{AuthSession, session_keys};

/// Wishlist operations for one visitor.
pub struct WishlistService<'a> {
    api: &'a ApiClient,
    session: &'a Session,
}

impl<'a> WishlistService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, session: &'a Session) -> Self {
        Self { api, session }
    }

    /// The saved products.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store or the API fails.
    pub async fn list(&self) -> Result<Wishlist, ServiceError> {
        let auth = current_auth(self.session).await?;
        self.load_list(auth.as_ref()).await
    }

    /// Save a product. Saving it twice is a no-op.
    ///
    /// # Errors
    ///
    /// - `ProductNotFound` if the catalog has no such product
    /// - `Api` if the server call fails (the list is rolled back)
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> Result<Wishlist, ServiceError> {
        let auth = current_auth(self.session).await?;
        let snapshot = self.load_list(auth.as_ref()).await?;
        if snapshot.contains(product_id) {
            return Ok(snapshot);
        }
        let product = self
            .api
            .get_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(product_id.clone()))?;

        let mut list = snapshot.clone();
        list.add(product);
        self.store(auth.is_some(), &list).await?;

        let Some(auth) = auth else {
            return Ok(list);
        };
        let result = self.api.add_to_wishlist(&auth.token, product_id).await;
        self.settle(list, &snapshot, true, result).await
    }

    /// Unsave a product. Unknown products are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the server call fails (the list is rolled back).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<Wishlist, ServiceError> {
        let auth = current_auth(self.session).await?;
        let snapshot = self.load_list(auth.as_ref()).await?;
        if !snapshot.contains(product_id) {
            return Ok(snapshot);
        }

        let mut list = snapshot.clone();
        list.remove(product_id);
        self.store(auth.is_some(), &list).await?;

        let Some(auth) = auth else {
            return Ok(list);
        };
        let result = self.api.remove_from_wishlist(&auth.token, product_id).await;
        self.settle(list, &snapshot, true, result).await
    }

    /// Save if absent, unsave if present.
    ///
    /// # Errors
    ///
    /// See [`WishlistService::add`] and [`WishlistService::remove`].
    pub async fn toggle(&self, product_id: &ProductId) -> Result<Wishlist, ServiceError> {
        if self.list().await?.contains(product_id) {
            self.remove(product_id).await
        } else {
            self.add(product_id).await
        }
    }

    /// Move a saved product into the cart.
    ///
    /// The cart add happens first, so a product the cart refuses stays saved.
    ///
    /// # Errors
    ///
    /// Returns the cart or wishlist error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn move_to_cart(
        &self,
        product_id: &ProductId,
    ) -> Result<(Wishlist, CartState), ServiceError> {
        let cart = CartService::new(self.api, self.session)
            .add(product_id, 1)
            .await?;
        let list = self.remove(product_id).await?;
        Ok((list, cart))
    }

    /// Push every guest entry to the server, then adopt the server list.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session store fails.
    #[instrument(skip_all)]
    pub async fn reconcile(&self, token: &str) -> Result<ReconcileReport, ServiceError> {
        let guest: Wishlist = load(self.session, session_keys::GUEST_WISHLIST).await?;

        let mut report = ReconcileReport::default();
        let mut kept = Vec::new();
        for product in guest.items() {
            match self.api.add_to_wishlist(token, &product.id).await {
                Ok(()) => report.pushed += 1,
                Err(e) => {
                    warn!(product_id = %product.id, error = %e, "Could not push wishlist entry, keeping it");
                    kept.push(product.clone());
                }
            }
        }

        report.failed = kept.len();
        if kept.is_empty() {
            self.session.remove_value(session_keys::GUEST_WISHLIST).await?;
        } else {
            save(self.session, session_keys::GUEST_WISHLIST, &Wishlist::from_products(kept)).await?;
        }

        match self.pull(token).await {
            Ok(_) => report.synced = true,
            Err(e @ (ServiceError::Session(_) | ServiceError::SignInRequired)) => return Err(e),
            Err(e) => {
                warn!(error = %e, "Could not fetch server wishlist after sign-in");
                self.forget_server_copy().await?;
            }
        }

        info!(
            pushed = report.pushed,
            failed = report.failed,
            synced = report.synced,
            "Guest wishlist reconciled"
        );
        Ok(report)
    }

    /// Drop the server mirror (on logout).
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn forget_server_copy(&self) -> Result<(), ServiceError> {
        self.session.remove_value(session_keys::WISHLIST).await?;
        Ok(())
    }

    async fn load_list(&self, auth: Option<&AuthSession>) -> Result<Wishlist, ServiceError> {
        let Some(auth) = auth else {
            return Ok(load(self.session, session_keys::GUEST_WISHLIST).await?);
        };
        match load_opt(self.session, session_keys::WISHLIST).await? {
            Some(list) => Ok(list),
            None => self.pull(&auth.token).await,
        }
    }

    async fn pull(&self, token: &str) -> Result<Wishlist, ServiceError> {
        let products = match self.api.get_wishlist(token).await {
            Ok(products) => products,
            Err(e) => return Err(api_failure(self.session, e).await),
        };
        let list = Wishlist::from_products(products);
        self.store(true, &list).await?;
        Ok(list)
    }

    async fn store(&self, signed_in: bool, list: &Wishlist) -> Result<(), ServiceError> {
        let key = if signed_in {
            session_keys::WISHLIST
        } else {
            session_keys::GUEST_WISHLIST
        };
        save(self.session, key, list).await?;
        Ok(())
    }

    async fn settle(
        &self,
        list: Wishlist,
        snapshot: &Wishlist,
        signed_in: bool,
        result: Result<(), ApiError>,
    ) -> Result<Wishlist, ServiceError> {
        match result {
            Ok(()) => Ok(list),
            Err(ApiError::Unauthorized) => {
                Err(api_failure(self.session, ApiError::Unauthorized).await)
            }
            Err(e) => {
                warn!(error = %e, "Wishlist change rejected, restoring snapshot");
                if let Err(restore) = self.store(signed_in, snapshot).await {
                    tracing::error!(error = %restore, "Failed to restore wishlist snapshot");
                }
                Err(e.into())
            }
        }
    }
}
