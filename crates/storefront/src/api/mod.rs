//! Client for the Lumen commerce REST API.
//!
//! # Architecture
//!
//! - The API is the source of truth for catalog, carts, orders and accounts
//! - [`ApiClient`] owns URL building, auth headers, timeouts and the retry
//! - Endpoint groups (`products`, `cart`, `auth`, ...) add typed methods on
//!   top of [`ApiClient::call`] and normalize envelopes via [`envelope`]
//! - Catalog reads are cached in memory via `moka`
//!
//! # Retries
//!
//! A call makes at most two attempts. The second attempt only happens when
//! the first one timed out. Mutating calls carry an `Idempotency-Key` header
//! and both attempts send the same key.
//!
//! # Example
//!
//! ```rust,ignore
//! use lumen_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api);
//! let page = client.list_products(&ProductQuery::default()).await?;
//! let cart = client.get_cart(&token).await?;
//! ```

mod cache;
pub mod envelope;

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod returns;
pub mod reviews;
pub mod support;
pub mod wishlist;

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ApiConfig;

pub use cache::{CacheKey, CacheValue};
pub use envelope::Page;
pub use products::ProductQuery;

/// Attempts per call: the first try plus one retry after a timeout.
pub const MAX_ATTEMPTS: u32 = 2;

/// Header carrying the per-call idempotency key on mutating requests.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Errors from calls to the commerce API.
///
/// Unreadable success bodies are not errors: they surface as empty lists or
/// missing objects from [`envelope`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Both attempts timed out.
    #[error("request to {path} timed out after {attempts} attempts")]
    Timeout { path: String, attempts: u32 },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The API rejected the bearer token.
    #[error("not signed in")]
    Unauthorized,

    /// Any other non-success status.
    #[error("API returned {status}: {message}")]
    Status {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },

    /// A path segment or base URL could not form a URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The request body could not be serialized.
    #[error("could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A request body that fails local checks before it is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidInput(pub &'static str);

impl ApiError {
    /// HTTP status, when the API answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the commerce REST API.
///
/// Cheap to clone: all state sits behind an `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<SecretString>,
    timeout: Duration,
    cache: Cache<CacheKey, CacheValue>,
}

/// Who a call is made on behalf of.
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    Anonymous,
    Bearer(&'a str),
}

impl ApiClient {
    /// Create a new API client.
    #[must_use]
    pub fn new(config: &ApiConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
                timeout: config.timeout,
                cache,
            }),
        }
    }

    /// Build the URL for a path under the base URL.
    ///
    /// Segments are percent-encoded individually, so ids cannot escape their
    /// position in the path.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the base URL cannot take a path.
    pub fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Send a request and return the decoded JSON body.
    ///
    /// An empty or unreadable success body yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// - `Timeout` if both attempts time out
    /// - `Network` for other transport failures
    /// - `Unauthorized` for 401
    /// - `Status` for other non-success statuses
    #[instrument(skip(self, query, body, auth), fields(method = %method, path = %segments.join("/")))]
    pub async fn call<B: Serialize + Sync>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
        auth: Auth<'_>,
    ) -> Result<Value, ApiError> {
        let url = self.url(segments, query)?;
        let body = body.map(serde_json::to_vec).transpose()?;
        let idempotency_key =
            (method != Method::GET).then(|| uuid::Uuid::new_v4().to_string());
        let path = url.path().to_string();

        let mut attempt = 0;
        loop {
            attempt += 1;
            let started = Instant::now();
            let mut request = self
                .inner
                .client
                .request(method.clone(), url.clone())
                .timeout(self.inner.timeout)
                .header(reqwest::header::ACCEPT, "application/json");

            if let Some(key) = &self.inner.api_key {
                request = request.header("x-api-key", key.expose_secret());
            }
            if let Auth::Bearer(token) = auth {
                request = request.bearer_auth(token);
            }
            if let Some(key) = &idempotency_key {
                request = request.header(IDEMPOTENCY_HEADER, key);
            }
            if let Some(bytes) = &body {
                request = request
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(bytes.clone());
            }

            match send(request).await {
                Ok((status, text)) => {
                    let elapsed_ms = started.elapsed().as_millis();
                    debug!(status = %status, elapsed_ms, attempt, "API call completed");
                    return interpret(&method, &path, status, &text);
                }
                Err(e) if e.is_timeout() && attempt < MAX_ATTEMPTS => {
                    warn!(
                        elapsed_ms = started.elapsed().as_millis(),
                        attempt, "API call timed out, retrying once"
                    );
                }
                Err(e) if e.is_timeout() => {
                    report_failure(&method, &path, None, "API call timed out after retry");
                    return Err(ApiError::Timeout {
                        path,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    warn!(error = %e, attempt, "API call failed");
                    return Err(ApiError::Network(e));
                }
            }
        }
    }

    /// `GET` shorthand.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        auth: Auth<'_>,
    ) -> Result<Value, ApiError> {
        self.call::<()>(Method::GET, segments, query, None, auth)
            .await
    }

    pub(crate) fn cache(&self) -> &Cache<CacheKey, CacheValue> {
        &self.inner.cache
    }
}

/// One attempt: send and read the whole body, so a slow body also counts as
/// a timeout.
async fn send(request: reqwest::RequestBuilder) -> Result<(StatusCode, String), reqwest::Error> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    Ok((status, text))
}

/// Turn a status and body into the call's result.
fn interpret(method: &Method, path: &str, status: StatusCode, text: &str) -> Result<Value, ApiError> {
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text).unwrap_or_else(|e| {
            if status.is_success() {
                warn!(
                    error = %e,
                    body = %text.chars().take(200).collect::<String>(),
                    "API returned a body that is not JSON"
                );
            }
            Value::Null
        })
    };

    if status.is_success() {
        return Ok(body);
    }
    if status == StatusCode::UNAUTHORIZED {
        debug!("API rejected bearer token");
        return Err(ApiError::Unauthorized);
    }

    let (code, message) = envelope::error_details(&body);
    let message = message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    if status.is_server_error() {
        tracing::error!(
            status = %status,
            body = %text.chars().take(500).collect::<String>(),
            "API returned a server error"
        );
        report_failure(method, path, Some(status), &message);
    } else {
        debug!(status = %status, code = ?code, message = %message, "API returned a client error");
    }

    Err(ApiError::Status {
        status,
        code,
        message,
    })
}

/// Capture a failed call in Sentry, tagged with the endpoint.
fn report_failure(method: &Method, path: &str, status: Option<StatusCode>, message: &str) {
    sentry::with_scope(
        |scope| {
            scope.set_tag("api.method", method.as_str());
            scope.set_tag("api.path", path);
            if let Some(status) = status {
                scope.set_tag("api.status", status.as_u16());
            }
        },
        || sentry::capture_message(message, sentry::Level::Error),
    );
}
