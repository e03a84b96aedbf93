//! Sign-in by one-time code.
//!
//! # Flow
//!
//! 1. `request_otp` validates the email or phone and asks the API to send a code
//! 2. `verify_otp` exchanges the code for a bearer token and profile
//! 3. The session id is cycled and the token stored under `session_keys::AUTH`
//! 4. Guest cart and wishlist are pushed to the server, then mirrored
//!
//! `logout` revokes the token (best effort) and drops the server mirrors.
//! Guest lines the server refused during sign-in remain in the guest cart.

use lumen_core::{ContactError, LoginIdentifier, OtpCode, User};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use super::cart::CartService;
use super::wishlist::WishlistService;
use super::{ReconcileReport, ServiceError, current_auth, save};
use crate::api::ApiClient;
use crate::api::ApiError;
use crate::api::auth::ProfileUpdate;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{AuthSession, session_keys};

/// Errors that can occur during sign-in and profile operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email, phone or code is malformed.
    #[error("invalid input: {0}")]
    Invalid(#[from] ContactError),

    /// The API refused the code.
    #[error("invalid or expired code")]
    InvalidCode,

    /// No customer is signed in.
    #[error("not signed in")]
    NotSignedIn,

    /// The commerce API call failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Post sign-in reconciliation hit a session failure.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

/// A completed sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignIn {
    pub user: User,
    pub cart: ReconcileReport,
    pub wishlist: ReconcileReport,
}

/// Authentication service for one visitor.
pub struct AuthService<'a> {
    api: &'a ApiClient,
    session: &'a Session,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, session: &'a Session) -> Self {
        Self { api, session }
    }

    /// Send a sign-in code to an email address or phone number.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the identifier is malformed, or `Api` on failure.
    #[instrument(skip_all)]
    pub async fn request_otp(&self, identifier: &str) -> Result<LoginIdentifier, AuthError> {
        let identifier = LoginIdentifier::parse(identifier)?;
        self.api.request_otp(&identifier).await?;
        info!(
            kind = match identifier {
                LoginIdentifier::Email(_) => "email",
                LoginIdentifier::Phone(_) => "phone",
            },
            "Sign-in code requested"
        );
        Ok(identifier)
    }

    /// Verify a code and sign the visitor in.
    ///
    /// # Errors
    ///
    /// - `Invalid` for a malformed identifier or code
    /// - `InvalidCode` if the API rejects the code
    /// - `Api` or `Session` on infrastructure failures
    #[instrument(skip_all)]
    pub async fn verify_otp(&self, identifier: &str, code: &str) -> Result<SignIn, AuthError> {
        let identifier = LoginIdentifier::parse(identifier)?;
        let code = OtpCode::parse(code)?;

        let grant = match self.api.verify_otp(&identifier, &code).await {
            Ok(grant) => grant,
            Err(ApiError::Unauthorized) => return Err(AuthError::InvalidCode),
            Err(ApiError::Status { status, .. })
                if status == StatusCode::BAD_REQUEST
                    || status == StatusCode::UNPROCESSABLE_ENTITY =>
            {
                return Err(AuthError::InvalidCode);
            }
            Err(e) => return Err(e.into()),
        };

        // New privilege level, new session id.
        self.session.cycle_id().await?;
        let auth = AuthSession {
            token: grant.token,
            user: grant.user,
        };
        save(self.session, session_keys::AUTH, &auth).await?;
        set_sentry_user(auth.user_id(), Some(auth.user.email.as_str()).filter(|e| !e.is_empty()));

        let cart = CartService::new(self.api, self.session)
            .reconcile(&auth.token)
            .await?;
        let wishlist = WishlistService::new(self.api, self.session)
            .reconcile(&auth.token)
            .await?;

        info!(user_id = %auth.user.id, "Customer signed in");
        Ok(SignIn {
            user: auth.user,
            cart,
            wishlist,
        })
    }

    /// Sign out. The server is told to revoke the token, but a failure there
    /// does not keep the visitor signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let Some(auth) = current_auth(self.session).await? else {
            return Ok(());
        };

        if let Err(e) = self.api.logout(&auth.token).await {
            warn!(error = %e, "Token revocation failed, signing out locally");
        }

        self.session
            .remove::<AuthSession>(session_keys::AUTH)
            .await?;
        CartService::new(self.api, self.session)
            .forget_server_copy()
            .await?;
        WishlistService::new(self.api, self.session)
            .forget_server_copy()
            .await?;
        self.session.cycle_id().await?;
        clear_sentry_user();

        info!(user_id = %auth.user.id, "Customer signed out");
        Ok(())
    }

    /// The signed-in customer, from the session.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` for guests.
    pub async fn current(&self) -> Result<AuthSession, AuthError> {
        current_auth(self.session)
            .await?
            .ok_or(AuthError::NotSignedIn)
    }

    /// Fetch the profile from the API and refresh the session copy.
    ///
    /// An expired token signs the visitor out.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` for guests and expired tokens.
    #[instrument(skip_all)]
    pub async fn profile(&self) -> Result<User, AuthError> {
        let auth = self.current().await?;
        match self.api.me(&auth.token).await {
            Ok(user) => self.remember(auth, user).await,
            Err(ApiError::Unauthorized) => {
                self.logout().await?;
                Err(AuthError::NotSignedIn)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update the profile.
    ///
    /// # Errors
    ///
    /// - `Invalid` for a malformed email or phone
    /// - `NotSignedIn` for guests and expired tokens
    #[instrument(skip_all)]
    pub async fn update_profile(&self, mut update: ProfileUpdate) -> Result<User, AuthError> {
        let auth = self.current().await?;
        if let Some(email) = &update.email {
            update.email = Some(lumen_core::Email::parse(email)?.as_str().to_owned());
        }
        if let Some(phone) = &update.phone {
            update.phone = Some(lumen_core::Phone::parse(phone)?.as_str().to_owned());
        }
        update.name = update.name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty());

        match self.api.update_me(&auth.token, &update).await {
            Ok(user) => self.remember(auth, user).await,
            Err(ApiError::Unauthorized) => {
                self.logout().await?;
                Err(AuthError::NotSignedIn)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Store a fresh profile, keeping the session copy when the body had none.
    async fn remember(&self, mut auth: AuthSession, user: Option<User>) -> Result<User, AuthError> {
        if let Some(user) = user {
            auth.user = user;
            save(self.session, session_keys::AUTH, &auth).await?;
        }
        Ok(auth.user)
    }
}
