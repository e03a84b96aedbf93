//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID and latency logging
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Rate limiting on the sign-in routes (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::RequireAuth;
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::{create_session_layer, session_layer};
