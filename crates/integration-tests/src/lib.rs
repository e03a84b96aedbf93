//! Integration test harness for the Lumen storefront.
//!
//! [`MockApi`] stands in for the commerce REST API: an axum server on an
//! ephemeral port that answers from scripted rules and records every request
//! it receives. Tests point a real [`ApiClient`] at it and drive the
//! storefront services with an in-memory session.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lumen-integration-tests
//! ```

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use lumen_storefront::api::ApiClient;
use lumen_storefront::config::{ApiConfig, PricingConfig, StorefrontConfig};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower_sessions::{MemoryStore, Session};
use url::Url;

/// A request as the mock API received it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub idempotency_key: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

/// A scripted answer.
#[derive(Debug, Clone)]
struct Rule {
    method: Method,
    path: String,
    status: StatusCode,
    body: Value,
    delay: Option<Duration>,
    /// How many more requests this rule answers; `None` is unlimited.
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct MockState {
    rules: VecDeque<Rule>,
    requests: Vec<Recorded>,
}

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<MockState>>);

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process mock of the commerce REST API.
pub struct MockApi {
    addr: SocketAddr,
    shared: Shared,
}

impl MockApi {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let shared = Shared::default();
        let app = Router::new().fallback(answer).with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock API");
        let addr = listener.local_addr().expect("mock API address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, shared }
    }

    /// Base URL of the mock.
    ///
    /// # Panics
    ///
    /// Never for a bound socket address.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("mock API url")
    }

    /// Client settings pointing at the mock, with a short timeout.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        let mut config = ApiConfig::new(self.url());
        config.timeout = Duration::from_millis(300);
        config
    }

    /// A real client pointed at the mock.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_config())
    }

    /// Storefront settings pointing at the mock. No database is used.
    #[must_use]
    pub fn storefront_config(&self) -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://unused@localhost/unused"),
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            api: self.api_config(),
            pricing: PricingConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
        }
    }

    /// Answer every matching request.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, status, body, None, None);
    }

    /// Answer the next matching request only.
    pub fn respond_once(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, status, body, None, Some(1));
    }

    /// Answer the next matching request only, after a delay.
    pub fn respond_once_after(
        &self,
        delay: Duration,
        method: Method,
        path: &str,
        status: u16,
        body: Value,
    ) {
        self.push(method, path, status, body, Some(delay), Some(1));
    }

    fn push(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: Value,
        delay: Option<Duration>,
        remaining: Option<usize>,
    ) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.shared.lock().rules.push_back(Rule {
            method,
            path: path.to_string(),
            status,
            body,
            delay,
            remaining,
        });
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.lock().requests.clone()
    }

    /// Requests received for one method and path.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == *method && r.path == path)
            .collect()
    }
}

/// Fallback handler: record the request, then answer from the first rule
/// that matches. Unmatched requests get a 404 envelope.
async fn answer(
    State(shared): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    };
    let recorded = Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(ToOwned::to_owned),
        idempotency_key: header("idempotency-key"),
        authorization: header("authorization"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };

    let rule = {
        let mut state = shared.lock();
        state.requests.push(recorded);
        let path = uri.path();
        state
            .rules
            .iter()
            .position(|r| r.method == method && r.path == path)
            .and_then(|i| {
                let answer = state.rules.get(i)?.clone();
                let exhausted = match state.rules.get_mut(i).and_then(|r| r.remaining.as_mut()) {
                    Some(n) => {
                        *n = n.saturating_sub(1);
                        *n == 0
                    }
                    None => false,
                };
                if exhausted {
                    state.rules.remove(i);
                }
                Some(answer)
            })
    };

    let Some(rule) = rule else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "no such route", "code": "not_found" })),
        )
            .into_response();
    };
    if let Some(delay) = rule.delay {
        tokio::time::sleep(delay).await;
    }
    (rule.status, Json(rule.body)).into_response()
}

/// A fresh visitor session backed by memory.
#[must_use]
pub fn session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

/// Catalog product JSON as the API sends it.
#[must_use]
pub fn product_json(id: u64, name: &str, price: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "category": "skincare",
        "price": price,
        "rating": 4.5,
        "reviewCount": 12,
        "image": format!("https://cdn.lumen.example/{id}.jpg"),
        "features": ["vegan", "fragrance-free"],
        "inStock": true
    })
}

/// A server cart holding the given `(product json, quantity)` lines.
#[must_use]
pub fn cart_json(lines: &[(Value, u32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .enumerate()
        .map(|(i, (product, quantity))| {
            json!({ "id": format!("line-{i}"), "product": product, "quantity": quantity })
        })
        .collect();
    json!({ "cart": { "items": items } })
}

/// Script a successful OTP verification for `token`.
pub fn script_sign_in(mock: &MockApi, token: &str) {
    mock.respond(
        Method::POST,
        "/auth/otp/verify",
        200,
        json!({
            "data": {
                "accessToken": token,
                "user": { "id": 77, "name": "Ada", "email": "ada@lumen.example" }
            }
        }),
    );
}
