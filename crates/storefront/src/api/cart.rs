//! Server cart endpoints for signed-in customers.

use lumen_core::{CartItem, CartItemId, CartLines, ProductId, ServerTotals};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use super::envelope;
use super::{ApiClient, ApiError, Auth};

/// The server's copy of a cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerCart {
    pub lines: CartLines,
    pub totals: ServerTotals,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

/// Find the cart object inside a response body.
fn cart_object(body: &Value) -> Option<&Value> {
    let object = body.as_object()?;
    if let Some(cart @ Value::Object(_)) = object.get("cart") {
        return Some(cart);
    }
    if let Some(data @ Value::Object(inner)) = object.get("data") {
        if let Some(cart @ Value::Object(_)) = inner.get("cart") {
            return Some(cart);
        }
        return Some(data);
    }
    Some(body)
}

/// Parse a cart from a response body.
///
/// Returns `None` when the body does not carry a cart, which is normal for
/// mutation endpoints that answer with only a status.
#[must_use]
pub fn parse_cart(body: &Value) -> Option<ServerCart> {
    let cart = cart_object(body)?;
    let has_lines = ["items", "lines", "data"]
        .iter()
        .any(|key| cart.get(*key).is_some_and(Value::is_array));
    if !has_lines {
        return None;
    }

    let items: Vec<CartItem> = envelope::list(cart);
    let items = if items.is_empty() {
        envelope::list(&cart["lines"])
    } else {
        items
    };

    let totals_source = cart
        .get("totals")
        .or_else(|| cart.get("summary"))
        .filter(|v| v.is_object())
        .unwrap_or(cart);
    let mut totals = ServerTotals::deserialize(totals_source).unwrap_or_default();
    if totals.coupon_code.is_none() {
        totals.coupon_code = cart
            .get("couponCode")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
    }

    Some(ServerCart {
        lines: CartLines::from_items(items),
        totals,
    })
}

impl ApiClient {
    /// Fetch the customer's server cart. A body without a cart reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_cart(&self, token: &str) -> Result<ServerCart, ApiError> {
        let body = self.get(&["cart"], &[], Auth::Bearer(token)).await?;
        Ok(parse_cart(&body).unwrap_or_default())
    }

    /// Add units of a product to the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_cart_item(
        &self,
        token: &str,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Option<ServerCart>, ApiError> {
        let body = AddItemBody {
            product_id,
            quantity,
        };
        let response = self
            .call(Method::POST, &["cart", "items"], &[], Some(&body), Auth::Bearer(token))
            .await?;
        Ok(parse_cart(&response))
    }

    /// Set the quantity of a server cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn update_cart_item(
        &self,
        token: &str,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<Option<ServerCart>, ApiError> {
        let response = self
            .call(
                Method::PUT,
                &["cart", "items", item_id.as_str()],
                &[],
                Some(&json!({ "quantity": quantity })),
                Auth::Bearer(token),
            )
            .await?;
        Ok(parse_cart(&response))
    }

    /// Remove a line from the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn remove_cart_item(
        &self,
        token: &str,
        item_id: &CartItemId,
    ) -> Result<Option<ServerCart>, ApiError> {
        let response = self
            .call::<()>(
                Method::DELETE,
                &["cart", "items", item_id.as_str()],
                &[],
                None,
                Auth::Bearer(token),
            )
            .await?;
        Ok(parse_cart(&response))
    }

    /// Empty the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn clear_cart(&self, token: &str) -> Result<(), ApiError> {
        self.call::<()>(Method::DELETE, &["cart"], &[], None, Auth::Bearer(token))
            .await?;
        Ok(())
    }

    /// Apply a coupon code to the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is rejected or the API request fails.
    #[instrument(skip(self, token))]
    pub async fn apply_coupon(&self, token: &str, code: &str) -> Result<Option<ServerCart>, ApiError> {
        let response = self
            .call(
                Method::POST,
                &["cart", "coupon"],
                &[],
                Some(&json!({ "code": code })),
                Auth::Bearer(token),
            )
            .await?;
        Ok(parse_cart(&response))
    }

    /// Remove the coupon from the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn remove_coupon(&self, token: &str) -> Result<Option<ServerCart>, ApiError> {
        let response = self
            .call::<()>(Method::DELETE, &["cart", "coupon"], &[], None, Auth::Bearer(token))
            .await?;
        Ok(parse_cart(&response))
    }
}
