//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::api::ApiClient;
use crate::config::{PricingConfig, StorefrontConfig};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Everything inside is read-only or internally
/// synchronized (the HTTP client and its product cache).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    api: ApiClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` pool backing the session store
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        Self::build(config, Some(pool))
    }

    /// State without a database, for sessions held in memory.
    #[must_use]
    pub fn without_database(config: StorefrontConfig) -> Self {
        Self::build(config, None)
    }

    fn build(config: StorefrontConfig, pool: Option<PgPool>) -> Self {
        let api = ApiClient::new(&config.api);
        Self {
            inner: Arc::new(AppStateInner { config, pool, api }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The session-store pool, when one was configured.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get a reference to the commerce API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn pricing(&self) -> &PricingConfig {
        &self.inner.config.pricing
    }
}
