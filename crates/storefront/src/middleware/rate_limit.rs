//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: strict limits for the OTP endpoints (~10/min)
//! - `api_rate_limiter`: relaxed limits for everything else (~100/min)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Client address as set by Cloudflare at the edge.
const EDGE_IP_HEADER: &str = "cf-connecting-ip";

/// Single-address proxy headers checked after `X-Forwarded-For`.
const PROXY_IP_HEADERS: [&str; 2] = ["x-real-ip", "fly-client-ip"];

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// Key extractor for the visitor's IP.
///
/// Order: `CF-Connecting-IP`, then `X-Forwarded-For` (first hop), then the
/// single-address proxy headers, then the socket peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if let Some(ip) = header_ip(req, EDGE_IP_HEADER) {
            return Ok(ip);
        }

        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok());

        forwarded
            .or_else(|| PROXY_IP_HEADERS.iter().find_map(|name| header_ip(req, name)))
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Build a limiter that replenishes one token every `per_second` seconds.
///
/// # Panics
///
/// Only if `per_second` or `burst` is zero; both callers pass constants.
fn limiter(per_second: u64, burst: u32) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(per_second)
        .burst_size(burst)
        .finish()
        .expect("rate limiter period and burst are non-zero");
    GovernorLayer::new(Arc::new(config))
}

/// Rate limiter for the OTP endpoints: ~10 requests per minute per IP.
///
/// One token every 6 seconds, burst of 5. Each request can send an SMS or
/// email, and verification is a guessable 4 to 8 digit code.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    limiter(6, 5)
}

/// Rate limiter for the rest of the API: ~100 requests per minute per IP.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    limiter(1, 50)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tower_governor::key_extractor::KeyExtractor;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/api/auth/otp/request");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_edge_header_wins_over_forwarded_for() {
        let req = request(&[
            ("x-forwarded-for", "10.9.8.7"),
            ("cf-connecting-ip", "203.0.113.50"),
        ]);
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.50".parse::<IpAddr>().unwrap());

        let rotated = request(&[
            ("x-forwarded-for", "10.1.1.1"),
            ("cf-connecting-ip", "203.0.113.50"),
        ]);
        assert_eq!(ClientIpKeyExtractor.extract(&rotated).unwrap(), ip);
    }

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let req = request(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_proxy_header_fallback() {
        let req = request(&[("x-real-ip", "198.51.100.2")]);
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.2".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_peer_address_fallback() {
        let mut req = request(&[]);
        let peer: SocketAddr = "192.0.2.9:5123".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(ClientIpKeyExtractor.extract(&req).unwrap(), peer.ip());
    }

    #[test]
    fn test_no_address_is_an_error() {
        let req = request(&[("x-forwarded-for", "not-an-ip")]);
        assert!(ClientIpKeyExtractor.extract(&req).is_err());
    }
}
