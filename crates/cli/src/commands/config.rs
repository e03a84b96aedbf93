//! Configuration checks.

use lumen_storefront::config::StorefrontConfig;

use super::CommandError;

/// Load the storefront configuration the way the server does and log a
/// summary. Secrets are never logged.
///
/// # Errors
///
/// Returns the first configuration problem found.
pub fn check() -> Result<(), CommandError> {
    let config = StorefrontConfig::from_env()?;

    tracing::info!(
        listen = %config.socket_addr(),
        public_url = %config.base_url,
        secure_cookies = config.is_secure(),
        "Storefront"
    );
    tracing::info!(
        base_url = %config.api.base_url,
        timeout_ms = u64::try_from(config.api.timeout.as_millis()).unwrap_or(u64::MAX),
        api_key = config.api.api_key.is_some(),
        cache_ttl_secs = config.api.cache_ttl.as_secs(),
        "Commerce API"
    );
    tracing::info!(
        default_currency = %config.pricing.default_currency,
        currencies = config.pricing.rates.supported().len(),
        "Pricing"
    );
    tracing::info!(sentry = config.sentry_dsn.is_some(), "Monitoring");
    tracing::info!("Configuration OK");
    Ok(())
}
