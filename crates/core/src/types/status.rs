//! Status enums for account records.
//!
//! Unknown values from the API deserialize to an `Other` variant so a new
//! backend status never breaks an order history page.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
    #[serde(other)]
    Other,
}

impl OrderStatus {
    /// Orders can be cancelled until they leave the warehouse.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Processing)
    }

    /// Only delivered orders can be returned.
    #[must_use]
    pub const fn is_returnable(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Return request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    #[default]
    Requested,
    Approved,
    Rejected,
    Received,
    Refunded,
    #[serde(other)]
    Other,
}

/// Support ticket status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    AwaitingCustomer,
    Resolved,
    Closed,
    #[serde(other)]
    Other,
}

impl TicketStatus {
    /// Customers can reply until the ticket is closed.
    #[must_use]
    pub const fn accepts_replies(self) -> bool {
        !matches!(self, Self::Closed)
    }
}
