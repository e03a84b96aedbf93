//! Order history and checkout endpoints.

use lumen_core::{CartLines, DeliveryOption, Order, OrderId, PaymentMethod, ProductId, ShippingDetails};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::envelope::{self, Page};
use super::{ApiClient, ApiError, Auth, InvalidInput};

/// Orders requested per history page.
pub const ORDERS_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// An order as submitted at checkout.
///
/// Prices are not sent: the API prices the order from its own catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<NewOrderLine>,
    pub shipping_details: ShippingDetails,
    pub delivery_option: DeliveryOption,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

impl NewOrder {
    /// Build an order from the cart lines and validated shipping details.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the cart is empty.
    pub fn from_cart(
        lines: &CartLines,
        shipping_details: ShippingDetails,
        payment_method: PaymentMethod,
        coupon_code: Option<String>,
    ) -> Result<Self, InvalidInput> {
        if lines.is_empty() {
            return Err(InvalidInput("cart is empty"));
        }
        Ok(Self {
            items: lines
                .items()
                .iter()
                .map(|i| NewOrderLine {
                    product_id: i.product.id.clone(),
                    quantity: i.quantity,
                })
                .collect(),
            delivery_option: shipping_details.delivery_option,
            shipping_details,
            payment_method,
            coupon_code,
        })
    }
}

impl ApiClient {
    /// A page of the customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_orders(&self, token: &str, page: Option<u32>) -> Result<Page<Order>, ApiError> {
        let query = [
            ("page", page.unwrap_or(1).max(1).to_string()),
            ("limit", ORDERS_PAGE_SIZE.to_string()),
        ];
        let body = self.get(&["orders"], &query, Auth::Bearer(token)).await?;
        Ok(envelope::page(&body, Some(u64::from(ORDERS_PAGE_SIZE))))
    }

    /// A single order. A 404 yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for another reason.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &str, id: &OrderId) -> Result<Option<Order>, ApiError> {
        match self.get(&["orders", id.as_str()], &[], Auth::Bearer(token)).await {
            Ok(body) => Ok(envelope::single(&body, &["order"])),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the order or the request fails.
    #[instrument(skip_all, fields(lines = order.items.len()))]
    pub async fn place_order(&self, token: &str, order: &NewOrder) -> Result<Option<Order>, ApiError> {
        let body = self
            .call(Method::POST, &["orders"], &[], Some(order), Auth::Bearer(token))
            .await?;
        Ok(envelope::single(&body, &["order"]))
    }

    /// Cancel an order that has not shipped yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses or the request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn cancel_order(&self, token: &str, id: &OrderId) -> Result<Option<Order>, ApiError> {
        let body = self
            .call::<()>(
                Method::POST,
                &["orders", id.as_str(), "cancel"],
                &[],
                None,
                Auth::Bearer(token),
            )
            .await?;
        Ok(envelope::single(&body, &["order"]))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lumen_core::Product;
    use serde_json::json;

    fn details() -> ShippingDetails {
        serde_json::from_value(json!({
            "fullName": "Ada Lovelace",
            "email": "ada@example.com",
            "phone": "+442079460958",
            "addressLine1": "12 St James's Square",
            "city": "London",
            "state": "London",
            "postalCode": "SW1Y 4JH",
            "country": "GB",
            "deliveryOption": "overnight"
        }))
        .unwrap()
    }

    #[test]
    fn test_new_order_from_cart() {
        let product: Product =
            serde_json::from_value(json!({"id": "p1", "name": "Serum", "price": "20"})).unwrap();
        let mut lines = CartLines::default();
        lines.add(product, 2).unwrap();

        let order =
            NewOrder::from_cart(&lines, details(), PaymentMethod::Card, Some("GLOW".into())).unwrap();
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["items"], json!([{"productId": "p1", "quantity": 2}]));
        assert_eq!(value["deliveryOption"], "overnight");
        assert_eq!(value["paymentMethod"], "card");
        assert_eq!(value["couponCode"], "GLOW");
    }

    #[test]
    fn test_new_order_rejects_empty_cart() {
        let err = NewOrder::from_cart(&CartLines::default(), details(), PaymentMethod::Card, None)
            .unwrap_err();
        assert_eq!(err, InvalidInput("cart is empty"));
    }
}
