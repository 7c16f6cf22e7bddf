//! Authentication and account endpoints.

use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use super::{BackendClient, BackendError};
use crate::backend::types::{
    AuthResponse, AuthTokens, LoginRequest, ProfileUpdate, RefreshResponse, RegisterRequest, User,
};

impl BackendClient {
    /// Exchange email/password for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] on bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, BackendError> {
        let request = self
            .request(Method::POST, "/auth/login", None)
            .json(&LoginRequest { email, password });
        let mut response: AuthResponse = self.send(request).await?;
        response.tokens = response.tokens.received_now();
        Ok(response)
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Api`] with field messages on validation failure.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(
        &self,
        registration: &RegisterRequest<'_>,
    ) -> Result<AuthResponse, BackendError> {
        let request = self
            .request(Method::POST, "/auth/register", None)
            .json(registration);
        let mut response: AuthResponse = self.send(request).await?;
        response.tokens = response.tokens.received_now();
        Ok(response)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] when the refresh token is dead.
    #[instrument(skip_all)]
    pub async fn refresh_token(&self, refresh: &str) -> Result<AuthTokens, BackendError> {
        let request = self
            .request(Method::POST, "/auth/token/refresh", None)
            .json(&json!({ "refresh": refresh }));
        let response: RefreshResponse = self.send(request).await?;
        Ok(response.into_tokens(refresh))
    }

    /// Exchange an identity provider `id_token` for backend tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the provider token.
    #[instrument(skip(self, id_token))]
    pub async fn social_login(
        &self,
        provider: &str,
        id_token: &str,
    ) -> Result<AuthResponse, BackendError> {
        let request = self
            .request(Method::POST, &format!("/auth/social/{provider}"), None)
            .json(&json!({ "id_token": id_token }));
        let mut response: AuthResponse = self.send(request).await?;
        response.tokens = response.tokens.received_now();
        Ok(response)
    }

    /// Revoke a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn logout(&self, tokens: &AuthTokens) -> Result<(), BackendError> {
        let request = self
            .request(Method::POST, "/auth/logout", Some(&tokens.access))
            .json(&json!({ "refresh": tokens.refresh }));
        self.send_empty(request).await
    }

    /// Ask the backend to email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), BackendError> {
        let request = self
            .request(Method::POST, "/auth/password/reset", None)
            .json(&json!({ "email": email }));
        self.send_empty(request).await
    }

    /// Fetch the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] if the token is rejected.
    #[instrument(skip_all)]
    pub async fn get_me(&self, access: &str) -> Result<User, BackendError> {
        self.send(self.request(Method::GET, "/users/me", Some(access)))
            .await
    }

    /// Update the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the request fails.
    #[instrument(skip(self, access))]
    pub async fn update_me(&self, access: &str, update: &ProfileUpdate) -> Result<User, BackendError> {
        let request = self
            .request(Method::PATCH, "/users/me", Some(access))
            .json(update);
        self.send(request).await
    }
}
