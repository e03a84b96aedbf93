//! Sign-in route handlers.
//!
//! Sign-in is by one-time code sent to an email address or phone number.
//! Both OTP endpoints sit behind the strict rate limiter.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use lumen_core::{LoginIdentifier, User};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::auth::ProfileUpdate;
use crate::error::Result;
use crate::services::{AuthService, SignIn};
use crate::state::AppState;

/// OTP request body.
#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    /// Email address or phone number.
    pub identifier: String,
}

/// OTP verification body.
#[derive(Deserialize)]
pub struct OtpVerify {
    pub identifier: String,
    pub code: String,
}

/// Where the code went.
#[derive(Debug, Serialize)]
pub struct OtpSent {
    pub channel: &'static str,
}

/// Send a sign-in code.
#[instrument(skip_all)]
pub async fn request_otp(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<OtpRequest>,
) -> Result<(StatusCode, Json<OtpSent>)> {
    let identifier = AuthService::new(state.api(), &session)
        .request_otp(&req.identifier)
        .await?;
    let channel = match identifier {
        LoginIdentifier::Email(_) => "email",
        LoginIdentifier::Phone(_) => "sms",
    };
    Ok((StatusCode::ACCEPTED, Json(OtpSent { channel })))
}

/// Verify a code and sign in. Guest cart and wishlist are merged into the
/// account; the response reports how many entries made it.
#[instrument(skip_all)]
pub async fn verify_otp(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<OtpVerify>,
) -> Result<Json<SignIn>> {
    let signed_in = AuthService::new(state.api(), &session)
        .verify_otp(&req.identifier, &req.code)
        .await?;
    Ok(Json(signed_in))
}

/// Sign out.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    AuthService::new(state.api(), &session).logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in customer's profile.
#[instrument(skip_all)]
pub async fn me(State(state): State<AppState>, session: Session) -> Result<Json<User>> {
    Ok(Json(AuthService::new(state.api(), &session).profile().await?))
}

/// Update the signed-in customer's profile.
#[instrument(skip_all)]
pub async fn update_me(
    State(state): State<AppState>,
    session: Session,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.api(), &session)
        .update_profile(update)
        .await?;
    Ok(Json(user))
}
