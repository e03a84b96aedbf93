//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Responses carry a JSON body:
//!
//! ```json
//! { "error": { "code": "out_of_stock", "message": "product 42 is out of stock" } }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lumen_core::{CartError, CompareError, ContactError, ReviewError, ShippingError};
use serde_json::json;
use thiserror::Error;

use crate::api::{ApiError, InvalidInput};
use crate::services::{AuthError, ServiceError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Commerce API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Cart, list or currency operation failed.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Sign-in or profile operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<InvalidInput> for AppError {
    fn from(err: InvalidInput) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ShippingError> for AppError {
    fn from(err: ShippingError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ContactError> for AppError {
    fn from(err: ContactError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// How an error is presented to the client.
#[derive(Debug, PartialEq, Eq)]
struct Classified {
    status: StatusCode,
    code: String,
    message: String,
    /// Report to Sentry. Upstream 5xx and timeouts are reported by the client.
    capture: bool,
}

impl Classified {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
            capture: false,
        }
    }

    const fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "Internal server error",
        )
        .captured()
    }
}

fn classify_api(err: &ApiError) -> Classified {
    match err {
        ApiError::Timeout { .. } => Classified::new(
            StatusCode::GATEWAY_TIMEOUT,
            "upstream_timeout",
            "The store did not respond in time, please try again",
        ),
        ApiError::Network(_) => Classified::new(
            StatusCode::BAD_GATEWAY,
            "upstream_unavailable",
            "External service error",
        )
        .captured(),
        ApiError::Unauthorized => Classified::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Please sign in again",
        ),
        ApiError::Status { status, .. } if status.is_server_error() => Classified::new(
            StatusCode::BAD_GATEWAY,
            "upstream_error",
            "External service error",
        ),
        ApiError::Status {
            status,
            code,
            message,
        } => Classified::new(
            *status,
            code.as_deref().unwrap_or("rejected"),
            message.clone(),
        ),
        ApiError::InvalidUrl(_) | ApiError::Encode(_) => Classified::internal(),
    }
}

fn classify_cart(err: &CartError) -> Classified {
    let (status, code) = match err {
        CartError::InvalidQuantity => (StatusCode::BAD_REQUEST, "invalid_quantity"),
        CartError::QuantityTooLarge { .. } => (StatusCode::BAD_REQUEST, "quantity_too_large"),
        CartError::OutOfStock(_) => (StatusCode::CONFLICT, "out_of_stock"),
        CartError::StockLimit { .. } => (StatusCode::CONFLICT, "stock_limit"),
        CartError::NotInCart(_) => (StatusCode::NOT_FOUND, "not_in_cart"),
    };
    Classified::new(status, code, err.to_string())
}

fn classify_service(err: &ServiceError) -> Classified {
    match err {
        ServiceError::Session(_) => Classified::internal(),
        ServiceError::Api(e) => classify_api(e),
        ServiceError::Cart(e) => classify_cart(e),
        ServiceError::Compare(e @ CompareError::Full) => {
            Classified::new(StatusCode::CONFLICT, "compare_full", e.to_string())
        }
        ServiceError::Currency(e) => {
            Classified::new(StatusCode::BAD_REQUEST, "unsupported_currency", e.to_string())
        }
        ServiceError::Invalid(e) => Classified::new(StatusCode::BAD_REQUEST, "bad_request", e.0),
        ServiceError::ProductNotFound(_) => {
            Classified::new(StatusCode::NOT_FOUND, "product_not_found", err.to_string())
        }
        ServiceError::SignInRequired => {
            Classified::new(StatusCode::UNAUTHORIZED, "sign_in_required", err.to_string())
        }
    }
}

fn classify_auth(err: &AuthError) -> Classified {
    match err {
        AuthError::Invalid(e) => {
            Classified::new(StatusCode::BAD_REQUEST, "invalid_input", e.to_string())
        }
        AuthError::InvalidCode => Classified::new(
            StatusCode::UNAUTHORIZED,
            "invalid_code",
            "Invalid or expired code",
        ),
        AuthError::NotSignedIn => {
            Classified::new(StatusCode::UNAUTHORIZED, "unauthorized", "Not signed in")
        }
        AuthError::Api(e) => classify_api(e),
        AuthError::Session(_) => Classified::internal(),
        AuthError::Service(e) => classify_service(e),
    }
}

impl AppError {
    fn classify(&self) -> Classified {
        match self {
            Self::Api(e) => classify_api(e),
            Self::Service(e) => classify_service(e),
            Self::Auth(e) => classify_auth(e),
            Self::Session(_) => Classified::internal(),
            Self::NotFound(what) => Classified::new(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
            Self::Unauthorized(msg) => Classified::new(StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            Self::BadRequest(msg) => Classified::new(StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            Self::Internal(_) => Classified::internal(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let classified = self.classify();

        // Capture server errors to Sentry
        if classified.capture {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if classified.status.is_server_error() {
            tracing::warn!(error = %self, status = %classified.status, "Upstream error");
        } else {
            tracing::debug!(error = %self, status = %classified.status, "Request rejected");
        }

        let body = json!({
            "error": {
                "code": classified.code,
                "message": classified.message,
            }
        });
        (classified.status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lumen_core::ProductId;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status(AppError::NotFound("test".to_string())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::Unauthorized("test".to_string())), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::BadRequest("test".to_string())), StatusCode::BAD_REQUEST);
        assert_eq!(status(AppError::Internal("test".to_string())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_service_error_status_codes() {
        let out_of_stock = ServiceError::Cart(CartError::OutOfStock(ProductId::new("1")));
        assert_eq!(status(out_of_stock), StatusCode::CONFLICT);
        let too_many = ServiceError::Cart(CartError::QuantityTooLarge { max: 99 });
        assert_eq!(status(too_many), StatusCode::BAD_REQUEST);
        assert_eq!(status(ServiceError::Compare(CompareError::Full)), StatusCode::CONFLICT);
        assert_eq!(status(ServiceError::SignInRequired), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(ServiceError::ProductNotFound(ProductId::new("9"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(AuthError::InvalidCode), StatusCode::UNAUTHORIZED);
        assert_eq!(status(ContactError::MalformedCode), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_errors_hide_details() {
        let err = ApiError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: Some("DB_DOWN".to_string()),
            message: "connection pool exhausted".to_string(),
        };
        let classified = AppError::from(err).classify();
        assert_eq!(classified.status, StatusCode::BAD_GATEWAY);
        assert_eq!(classified.code, "upstream_error");
        assert!(!classified.message.contains("pool"));

        let timeout = AppError::from(ApiError::Timeout {
            path: "/products".to_string(),
            attempts: 2,
        });
        assert_eq!(timeout.classify().status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_client_errors_pass_through_message() {
        let err = AppError::from(ApiError::Status {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            code: Some("COUPON_EXPIRED".to_string()),
            message: "This coupon has expired".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "COUPON_EXPIRED");
        assert_eq!(body["error"]["message"], "This coupon has expired");
    }

    #[tokio::test]
    async fn test_internal_errors_are_generic() {
        let response = AppError::Internal("pool timed out at 10.0.0.3".to_string()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "internal");
        assert_eq!(body["error"]["message"], "Internal server error");
    }
}
