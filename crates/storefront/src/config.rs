//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LUMEN_DATABASE_URL` - `PostgreSQL` connection string for the session store
//!   (falls back to `DATABASE_URL`)
//! - `LUMEN_API_BASE_URL` - Base URL of the commerce REST API
//! - `LUMEN_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `LUMEN_HOST` - Bind address (default: 127.0.0.1)
//! - `LUMEN_PORT` - Listen port (default: 3000)
//! - `LUMEN_API_TIMEOUT_MS` - Per-request timeout (default: 10000)
//! - `LUMEN_API_KEY` - Server-to-server key sent as `x-api-key`
//! - `LUMEN_PRODUCT_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `LUMEN_DEFAULT_CURRENCY` - Display currency for new visitors (default: USD)
//! - `LUMEN_CURRENCY_RATES` - Rates against USD, e.g. `EUR=0.92,GBP=0.79`
//! - `LUMEN_FREE_SHIPPING_THRESHOLD` - Standard shipping is free from here (default: 50.00)
//! - `LUMEN_FLAT_SHIPPING_FEE` - Standard shipping below the threshold (default: 5.99)
//! - `LUMEN_EXPRESS_SHIPPING_FEE` - Express delivery fee (default: 9.99)
//! - `LUMEN_OVERNIGHT_SHIPPING_FEE` - Overnight delivery fee (default: 19.99)
//! - `LUMEN_TAX_RATE` - Tax rate applied after discounts (default: 0.08)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate in 0.0-1.0 (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use lumen_core::{CurrencyCode, ExchangeRates, TotalsPolicy};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Commerce REST API configuration
    pub api: ApiConfig,
    /// Cart pricing and currency configuration
    pub pricing: PricingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
}

/// Commerce REST API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Optional server-to-server API key
    pub api_key: Option<SecretString>,
    /// Lifetime of cached catalog responses
    pub cache_ttl: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl ApiConfig {
    /// Config with default timeouts and no API key.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(10),
            api_key: None,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Cart totals policy, display currencies and conversion rates.
#[derive(Debug, Clone, Default)]
pub struct PricingConfig {
    pub totals: TotalsPolicy,
    pub default_currency: CurrencyCode,
    pub rates: ExchangeRates,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the API key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("LUMEN_DATABASE_URL")?;
        let host = parse_env_or("LUMEN_HOST", "127.0.0.1")?;
        let port = parse_env_or("LUMEN_PORT", "3000")?;
        let base_url = get_required_env("LUMEN_BASE_URL")?;

        let api = ApiConfig::from_env()?;
        let pricing = PricingConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            api,
            pricing,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or("SENTRY_SAMPLE_RATE", "1.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over TLS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("LUMEN_API_BASE_URL")?;
        let base_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("LUMEN_API_BASE_URL".to_string(), e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "LUMEN_API_BASE_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let timeout_ms: u64 = parse_env_or("LUMEN_API_TIMEOUT_MS", "10000")?;
        let ttl_secs: u64 = parse_env_or("LUMEN_PRODUCT_CACHE_TTL_SECS", "300")?;
        let api_key = match get_optional_env("LUMEN_API_KEY") {
            Some(value) => {
                validate_secret_strength(&value, "LUMEN_API_KEY")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            base_url,
            timeout: Duration::from_millis(timeout_ms),
            api_key,
            cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

impl PricingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = TotalsPolicy::default();
        let totals = TotalsPolicy {
            free_shipping_threshold: parse_env_or_value(
                "LUMEN_FREE_SHIPPING_THRESHOLD",
                defaults.free_shipping_threshold,
            )?,
            flat_shipping_fee: parse_env_or_value("LUMEN_FLAT_SHIPPING_FEE", defaults.flat_shipping_fee)?,
            express_fee: parse_env_or_value("LUMEN_EXPRESS_SHIPPING_FEE", defaults.express_fee)?,
            overnight_fee: parse_env_or_value(
                "LUMEN_OVERNIGHT_SHIPPING_FEE",
                defaults.overnight_fee,
            )?,
            tax_rate: parse_env_or_value("LUMEN_TAX_RATE", defaults.tax_rate)?,
        };

        let default_currency = parse_env_or("LUMEN_DEFAULT_CURRENCY", "USD")?;
        let rates = match get_optional_env("LUMEN_CURRENCY_RATES") {
            Some(raw) => parse_rates(&raw)
                .map_err(|e| ConfigError::InvalidEnvVar("LUMEN_CURRENCY_RATES".to_string(), e))?,
            None => ExchangeRates::default(),
        };

        if rates.rate(default_currency).is_none() {
            return Err(ConfigError::InvalidEnvVar(
                "LUMEN_DEFAULT_CURRENCY".to_string(),
                format!("no conversion rate configured for {default_currency}"),
            ));
        }

        Ok(Self {
            totals,
            default_currency,
            rates,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// The session database URL alone, for tools that need nothing else.
///
/// # Errors
///
/// Returns `MissingEnvVar` if neither `LUMEN_DATABASE_URL` nor
/// `DATABASE_URL` is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    get_database_url("LUMEN_DATABASE_URL")
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, using `default` when it is unset.
fn parse_env_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an environment variable into a non-negative decimal.
fn parse_env_or_value(key: &str, default: Decimal) -> Result<Decimal, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let value = Decimal::from_str(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if value.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(value)
}

/// Parse `EUR=0.92,GBP=0.79` into a USD-based rate table.
fn parse_rates(raw: &str) -> Result<ExchangeRates, String> {
    let mut rates = Vec::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (code, rate) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected CODE=RATE, got '{pair}'"))?;
        let code = CurrencyCode::from_str(code).map_err(|e| e.to_string())?;
        let rate = Decimal::from_str(rate.trim()).map_err(|e| format!("{code}: {e}"))?;
        if rate <= Decimal::ZERO {
            return Err(format!("{code}: rate must be positive"));
        }
        rates.push((code, rate));
    }
    Ok(ExchangeRates::new(CurrencyCode::USD, rates))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated key."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-api-key-here", "LUMEN_API_KEY").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "LUMEN_API_KEY").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        assert!(validate_secret_strength(&"ab".repeat(20), "LUMEN_API_KEY").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "LUMEN_API_KEY").is_ok());
    }

    #[test]
    fn test_parse_rates() {
        let rates = parse_rates("EUR=0.9, GBP = 0.8 ,").unwrap();
        assert_eq!(rates.rate(CurrencyCode::EUR), Some(Decimal::new(9, 1)));
        assert_eq!(rates.rate(CurrencyCode::USD), Some(Decimal::ONE));
        assert_eq!(rates.rate(CurrencyCode::INR), None);
    }

    #[test]
    fn test_parse_rates_errors() {
        assert!(parse_rates("EUR").is_err());
        assert!(parse_rates("XYZ=1").is_err());
        assert!(parse_rates("EUR=abc").is_err());
        assert!(parse_rates("EUR=0").is_err());
    }

    #[test]
    fn test_socket_addr_and_secure() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://shop.lumen.example".to_string(),
            api: ApiConfig::new(Url::parse("https://api.lumen.example/v1/").unwrap()),
            pricing: PricingConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(config.is_secure());
    }

    #[test]
    fn test_api_config_debug_redacts_key() {
        let mut api = ApiConfig::new(Url::parse("https://api.lumen.example/").unwrap());
        api.api_key = Some(SecretString::from("k3y-Vq9#Lm2@Xt7!"));

        let debug_output = format!("{api:?}");
        assert!(debug_output.contains("api.lumen.example"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k3y-Vq9#Lm2@Xt7!"));
    }
}
