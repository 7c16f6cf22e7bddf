//! Notification endpoints.

use reqwest::Method;
use tracing::instrument;

use brewery_core::NotificationId;

use super::{BackendClient, BackendError};
use crate::backend::types::{Notification, Page, UnreadCount};

impl BackendClient {
    /// List notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access))]
    pub async fn get_notifications(
        &self,
        access: &str,
        page: u32,
    ) -> Result<Page<Notification>, BackendError> {
        let request = self
            .request(Method::GET, "/notifications", Some(access))
            .query(&[("page", page.max(1))]);
        self.send(request).await
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_unread_count(&self, access: &str) -> Result<u32, BackendError> {
        let count: UnreadCount = self
            .send(self.request(Method::GET, "/notifications/unread-count", Some(access)))
            .await?;
        Ok(count.count)
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access))]
    pub async fn mark_notification_read(
        &self,
        access: &str,
        id: NotificationId,
    ) -> Result<(), BackendError> {
        self.send_empty(self.request(
            Method::POST,
            &format!("/notifications/{id}/read"),
            Some(access),
        ))
        .await
    }

    /// Mark every notification read.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn mark_all_notifications_read(&self, access: &str) -> Result<(), BackendError> {
        self.send_empty(self.request(Method::POST, "/notifications/read-all", Some(access)))
            .await
    }
}
