//! Contact form and newsletter endpoints.

use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use super::{BackendClient, BackendError};
use crate::backend::types::ContactMessage;

impl BackendClient {
    /// Submit the contact form.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, message), fields(email = %message.email))]
    pub async fn send_contact(&self, message: &ContactMessage) -> Result<(), BackendError> {
        let request = self.request(Method::POST, "/contact", None).json(message);
        self.send_empty(request).await
    }

    /// Subscribe an email to the newsletter.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn subscribe_newsletter(&self, email: &str) -> Result<(), BackendError> {
        let request = self
            .request(Method::POST, "/newsletter", None)
            .json(&json!({ "email": email }));
        self.send_empty(request).await
    }
}
