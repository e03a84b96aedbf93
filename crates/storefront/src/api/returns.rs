//! Return request endpoints.

use lumen_core::{OrderId, ProductId, ReturnRequest};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::envelope;
use super::{ApiClient, ApiError, Auth, InvalidInput};

/// A return as filed by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReturn {
    pub order_id: OrderId,
    pub product_ids: Vec<ProductId>,
    pub reason: String,
}

impl NewReturn {
    /// # Errors
    ///
    /// Returns `InvalidInput` without products or a reason.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.product_ids.is_empty() {
            return Err(InvalidInput("choose at least one item to return"));
        }
        if self.reason.trim().is_empty() {
            return Err(InvalidInput("a reason is required"));
        }
        Ok(())
    }
}

impl ApiClient {
    /// The customer's return requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn list_returns(&self, token: &str) -> Result<Vec<ReturnRequest>, ApiError> {
        let body = self.get(&["returns"], &[], Auth::Bearer(token)).await?;
        Ok(envelope::list(&body))
    }

    /// File a return.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request.
    #[instrument(skip_all, fields(order_id = %request.order_id))]
    pub async fn create_return(
        &self,
        token: &str,
        request: &NewReturn,
    ) -> Result<Option<ReturnRequest>, ApiError> {
        let body = self
            .call(Method::POST, &["returns"], &[], Some(request), Auth::Bearer(token))
            .await?;
        Ok(envelope::single(&body, &["return"]))
    }
}
