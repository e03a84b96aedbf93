//! Account route handlers. All require a signed-in customer.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use lumen_core::{
    Address, AddressId, Notification, NotificationId, Order, OrderId, ReturnRequest,
    SupportTicket, TicketId,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::api::Page;
use crate::api::addresses::validate_address;
use crate::api::returns::NewReturn;
use crate::api::support::{NewTicket, validate_message};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TicketReply {
    pub message: String,
}

// =============================================================================
// Orders
// =============================================================================

/// Order history, one page at a time.
#[instrument(skip(state, auth))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Order>>> {
    Ok(Json(state.api().list_orders(&auth.token, query.page).await?))
}

#[instrument(skip(state, auth))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let id = OrderId::new(id);
    state
        .api()
        .get_order(&auth.token, &id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))
}

/// Cancel an order that has not shipped.
///
/// The status is checked locally first so a shipped order is refused without
/// a round trip.
#[instrument(skip(state, auth))]
pub async fn cancel_order(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Option<Order>>> {
    let id = OrderId::new(id);
    let current = state
        .api()
        .get_order(&auth.token, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;
    if !current.status.is_cancellable() {
        return Err(AppError::BadRequest(format!(
            "Order {id} can no longer be cancelled"
        )));
    }

    let cancelled = state.api().cancel_order(&auth.token, &id).await?;
    info!(order_id = %id, "Order cancelled");
    Ok(Json(cancelled))
}

// =============================================================================
// Addresses
// =============================================================================

pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(state.api().list_addresses(&auth.token).await?))
}

#[instrument(skip_all)]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(address): Json<Address>,
) -> Result<(StatusCode, Json<Option<Address>>)> {
    validate_address(&address)?;
    let saved = state.api().create_address(&auth.token, &address).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[instrument(skip(state, auth, address))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    Json(address): Json<Address>,
) -> Result<Json<Option<Address>>> {
    validate_address(&address)?;
    let saved = state
        .api()
        .update_address(&auth.token, &AddressId::new(id), &address)
        .await?;
    Ok(Json(saved))
}

#[instrument(skip(state, auth))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .api()
        .delete_address(&auth.token, &AddressId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, auth))]
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .api()
        .set_default_address(&auth.token, &AddressId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Returns
// =============================================================================

pub async fn returns(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<ReturnRequest>>> {
    Ok(Json(state.api().list_returns(&auth.token).await?))
}

#[instrument(skip(state, auth), fields(order_id = %request.order_id))]
pub async fn create_return(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<NewReturn>,
) -> Result<(StatusCode, Json<Option<ReturnRequest>>)> {
    request.validate()?;
    let created = state.api().create_return(&auth.token, &request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// =============================================================================
// Support
// =============================================================================

pub async fn tickets(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<SupportTicket>>> {
    Ok(Json(state.api().list_tickets(&auth.token).await?))
}

#[instrument(skip(state, auth))]
pub async fn ticket(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<SupportTicket>> {
    let id = TicketId::new(id);
    state
        .api()
        .get_ticket(&auth.token, &id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Ticket {id}")))
}

#[instrument(skip_all)]
pub async fn create_ticket(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(ticket): Json<NewTicket>,
) -> Result<(StatusCode, Json<Option<SupportTicket>>)> {
    ticket.validate()?;
    let created = state.api().create_ticket(&auth.token, &ticket).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, auth, reply))]
pub async fn reply_to_ticket(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    Json(reply): Json<TicketReply>,
) -> Result<Json<Option<SupportTicket>>> {
    validate_message(&reply.message)?;
    let ticket = state
        .api()
        .add_ticket_message(&auth.token, &TicketId::new(id), &reply.message)
        .await?;
    Ok(Json(ticket))
}

// =============================================================================
// Notifications
// =============================================================================

pub async fn notifications(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<Notification>>> {
    Ok(Json(state.api().list_notifications(&auth.token).await?))
}

#[instrument(skip(state, auth))]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .api()
        .mark_notification_read(&auth.token, &NotificationId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<StatusCode> {
    state
        .api()
        .mark_all_notifications_read(&auth.token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
