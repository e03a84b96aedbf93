//! Support ticket endpoints.

use lumen_core::{OrderId, SupportTicket, TicketId};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use super::envelope;
use super::{ApiClient, ApiError, Auth, InvalidInput};

/// Longest message accepted on a ticket.
pub const MAX_MESSAGE_LEN: usize = 5000;

/// A ticket as opened by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub subject: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

/// Check a ticket message body.
///
/// # Errors
///
/// Returns `InvalidInput` for blank or oversized messages.
pub fn validate_message(message: &str) -> Result<(), InvalidInput> {
    let message = message.trim();
    if message.is_empty() {
        return Err(InvalidInput("message is required"));
    }
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(InvalidInput("message is too long"));
    }
    Ok(())
}

impl NewTicket {
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank subject or invalid message.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.subject.trim().is_empty() {
            return Err(InvalidInput("subject is required"));
        }
        validate_message(&self.message)
    }
}

impl ApiClient {
    /// The customer's tickets.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn list_tickets(&self, token: &str) -> Result<Vec<SupportTicket>, ApiError> {
        let body = self.get(&["support", "tickets"], &[], Auth::Bearer(token)).await?;
        let tickets: Vec<SupportTicket> = match body.get("tickets") {
            Some(inner) => envelope::list(inner),
            None => envelope::list(&body),
        };
        Ok(tickets)
    }

    /// A ticket with its messages. A 404 yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for another reason.
    #[instrument(skip(self, token), fields(ticket_id = %id))]
    pub async fn get_ticket(&self, token: &str, id: &TicketId) -> Result<Option<SupportTicket>, ApiError> {
        match self
            .get(&["support", "tickets", id.as_str()], &[], Auth::Bearer(token))
            .await
        {
            Ok(body) => Ok(envelope::single(&body, &["ticket"])),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Open a ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn create_ticket(
        &self,
        token: &str,
        ticket: &NewTicket,
    ) -> Result<Option<SupportTicket>, ApiError> {
        let body = self
            .call(Method::POST, &["support", "tickets"], &[], Some(ticket), Auth::Bearer(token))
            .await?;
        Ok(envelope::single(&body, &["ticket"]))
    }

    /// Reply on a ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, message), fields(ticket_id = %id))]
    pub async fn add_ticket_message(
        &self,
        token: &str,
        id: &TicketId,
        message: &str,
    ) -> Result<Option<SupportTicket>, ApiError> {
        let body = self
            .call(
                Method::POST,
                &["support", "tickets", id.as_str(), "messages"],
                &[],
                Some(&json!({ "message": message.trim() })),
                Auth::Bearer(token),
            )
            .await?;
        Ok(envelope::single(&body, &["ticket"]))
    }
}
