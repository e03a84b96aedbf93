//! Account notification endpoints.

use lumen_core::{Notification, NotificationId};
use reqwest::Method;
use tracing::instrument;

use super::envelope;
use super::{ApiClient, ApiError, Auth};

impl ApiClient {
    /// The customer's notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn list_notifications(&self, token: &str) -> Result<Vec<Notification>, ApiError> {
        let body = self.get(&["notifications"], &[], Auth::Bearer(token)).await?;
        let notifications: Vec<Notification> = match body.get("notifications") {
            Some(inner) => envelope::list(inner),
            None => envelope::list(&body),
        };
        Ok(notifications)
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(notification_id = %id))]
    pub async fn mark_notification_read(
        &self,
        token: &str,
        id: &NotificationId,
    ) -> Result<(), ApiError> {
        self.call::<()>(
            Method::POST,
            &["notifications", id.as_str(), "read"],
            &[],
            None,
            Auth::Bearer(token),
        )
        .await?;
        Ok(())
    }

    /// Mark every notification read.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn mark_all_notifications_read(&self, token: &str) -> Result<(), ApiError> {
        self.call::<()>(
            Method::POST,
            &["notifications", "read-all"],
            &[],
            None,
            Auth::Bearer(token),
        )
        .await?;
        Ok(())
    }
}
