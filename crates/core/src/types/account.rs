//! Customer account records served by the API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::checkout::{DeliveryOption, ShippingDetails};
use super::id::{NotificationId, OrderId, ProductId, ReturnId, TicketId, UserId};
use super::status::{OrderStatus, ReturnStatus, TicketStatus};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
    #[serde(other)]
    Other,
}

/// A signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// One line of a placed order, priced at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: Decimal,
    pub quantity: u32,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub shipping: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_details: Option<ShippingDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_option: Option<DeliveryOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A request to return items from a delivered order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub id: ReturnId,
    pub order_id: OrderId,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: ReturnStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One message in a support conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMessage {
    #[serde(default)]
    pub author: String,
    pub body: String,
    #[serde(default)]
    pub from_staff: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A customer support ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub id: TicketId,
    pub subject: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub messages: Vec<TicketMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// An account notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "isRead")]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_minimal() {
        let user: User = serde_json::from_str(r#"{"id": 5, "email": "a@b.co"}"#).unwrap();
        assert_eq!(user.id, UserId::new("5"));
        assert!(user.name.is_empty());
        assert_eq!(user.role, None);
    }

    #[test]
    fn test_unknown_role() {
        let user: User = serde_json::from_str(r#"{"id": "u1", "role": "vendor"}"#).unwrap();
        assert_eq!(user.role, Some(Role::Other));
    }

    #[test]
    fn test_order_defaults() {
        let order: Order =
            serde_json::from_str(r#"{"id": "o1", "total": "41.20", "status": "delivered"}"#)
                .unwrap();
        assert!(order.status.is_returnable());
        assert!(order.items.is_empty());
        assert_eq!(order.total, Decimal::new(4120, 2));
    }

    #[test]
    fn test_notification_is_read_alias() {
        let n: Notification =
            serde_json::from_str(r#"{"id": 3, "title": "Shipped", "isRead": true}"#).unwrap();
        assert!(n.read);
    }
}
