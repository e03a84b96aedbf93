//! Product comparison, held in the session only.

use lumen_core::{CompareList, FeatureRow, Product, ProductId};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{ServiceError, load, save};
use crate::api::ApiClient;
use crate::models::session_keys;

/// Compared products and the feature table built from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareView {
    pub products: Vec<Product>,
    pub features: Vec<FeatureRow>,
}

impl From<&CompareList> for CompareView {
    fn from(list: &CompareList) -> Self {
        Self {
            products: list.items().to_vec(),
            features: list.feature_matrix(),
        }
    }
}

pub struct CompareService<'a> {
    api: &'a ApiClient,
    session: &'a Session,
}

impl<'a> CompareService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, session: &'a Session) -> Self {
        Self { api, session }
    }

    /// The comparison table.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn view(&self) -> Result<CompareView, ServiceError> {
        let list: CompareList = load(self.session, session_keys::COMPARE).await?;
        Ok(CompareView::from(&list))
    }

    /// Add a product to the comparison.
    ///
    /// # Errors
    ///
    /// - `Compare` when the list is full
    /// - `ProductNotFound` if the catalog has no such product
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> Result<CompareView, ServiceError> {
        let mut list: CompareList = load(self.session, session_keys::COMPARE).await?;
        if list.contains(product_id) {
            return Ok(CompareView::from(&list));
        }
        let product = self
            .api
            .get_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(product_id.clone()))?;

        list.add(product)?;
        save(self.session, session_keys::COMPARE, &list).await?;
        Ok(CompareView::from(&list))
    }

    /// Drop one product from the comparison.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn remove(&self, product_id: &ProductId) -> Result<CompareView, ServiceError> {
        let mut list: CompareList = load(self.session, session_keys::COMPARE).await?;
        if list.remove(product_id).is_some() {
            save(self.session, session_keys::COMPARE, &list).await?;
        }
        Ok(CompareView::from(&list))
    }

    /// Empty the comparison.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear(&self) -> Result<(), ServiceError> {
        self.session.remove_value(session_keys::COMPARE).await?;
        Ok(())
    }
}
