//! Recently viewed products, held in the session only.

use lumen_core::{Product, ProductId, RecentlyViewed};
use tower_sessions::Session;

use super::{ServiceError, load, save};
use crate::models::session_keys;

pub struct RecentlyViewedService<'a> {
    session: &'a Session,
}

impl<'a> RecentlyViewedService<'a> {
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Record a product view.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn record(&self, product: Product) -> Result<(), ServiceError> {
        let mut recent: RecentlyViewed = load(self.session, session_keys::RECENTLY_VIEWED).await?;
        recent.record(product);
        save(self.session, session_keys::RECENTLY_VIEWED, &recent).await?;
        Ok(())
    }

    /// Recent products, most recent first, optionally without the current one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn list(&self, excluding: Option<&ProductId>) -> Result<Vec<Product>, ServiceError> {
        let recent: RecentlyViewed = load(self.session, session_keys::RECENTLY_VIEWED).await?;
        Ok(match excluding {
            Some(id) => recent.excluding(id).into_iter().cloned().collect(),
            None => recent.items().to_vec(),
        })
    }

    /// Forget every view.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear(&self) -> Result<(), ServiceError> {
        self.session.remove_value(session_keys::RECENTLY_VIEWED).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use lumen_core::RECENTLY_VIEWED_LIMIT;
    use serde_json::json;
    use tower_sessions::MemoryStore;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn product(id: usize) -> Product {
        serde_json::from_value(json!({"id": id, "name": "Lip tint", "price": 9})).unwrap()
    }

    #[tokio::test]
    async fn test_record_caps_and_orders() {
        let session = session();
        let recent = RecentlyViewedService::new(&session);
        for id in 0..20 {
            recent.record(product(id)).await.unwrap();
        }
        recent.record(product(12)).await.unwrap();

        let items = recent.list(None).await.unwrap();
        assert_eq!(items.len(), RECENTLY_VIEWED_LIMIT);
        assert_eq!(items.first().unwrap().id.as_str(), "12");
        assert_eq!(items.get(1).unwrap().id.as_str(), "19");

        let others = recent.list(Some(&ProductId::new("12"))).await.unwrap();
        assert_eq!(others.len(), RECENTLY_VIEWED_LIMIT - 1);

        recent.clear().await.unwrap();
        assert!(recent.list(None).await.unwrap().is_empty());
    }
}
