//! OAuth 2.0 identity provider client for social login.
//!
//! # Flow
//!
//! 1. Generate `state` and `nonce`, store both in the session
//! 2. Redirect to [`IdentityProvider::authorization_url`]
//! 3. Provider redirects back with `code` and `state`
//! 4. Exchange the code with [`IdentityProvider::exchange_code`]
//! 5. Check the `id_token` nonce, then hand the `id_token` to the backend
//!    (`POST /auth/social/{provider}`), which verifies its signature

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::OAuthConfig;

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the code exchange.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Token response had no `id_token`.
    #[error("provider returned no id_token")]
    MissingIdToken,

    /// Callback `state` missing or different from the stored one.
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// `id_token` nonce missing or different from the stored one.
    #[error("OAuth nonce mismatch")]
    NonceMismatch,

    /// Provider redirected back with `error=...`.
    #[error("provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    nonce: Option<String>,
}

/// Client for the configured identity provider.
#[derive(Clone)]
pub struct IdentityProvider {
    inner: Arc<IdentityProviderInner>,
}

struct IdentityProviderInner {
    client: reqwest::Client,
    provider: String,
    authorize_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl IdentityProvider {
    #[must_use]
    pub fn new(config: &OAuthConfig) -> Self {
        Self {
            inner: Arc::new(IdentityProviderInner {
                client: reqwest::Client::new(),
                provider: config.provider.clone(),
                authorize_url: config.authorize_url.clone(),
                token_url: config.token_url.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.expose_secret().to_string(),
            }),
        }
    }

    /// Provider slug, as the backend knows it (e.g., `google`).
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.inner.provider
    }

    /// Generate the authorization URL to redirect the user to.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - The callback URL
    /// * `state` - Random string stored in the session (CSRF protection)
    /// * `nonce` - Random string echoed in the `id_token` (replay protection)
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str, nonce: &str) -> String {
        let separator = if self.inner.authorize_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{separator}\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20profile&\
            state={}&\
            nonce={}",
            self.inner.authorize_url,
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
            urlencoding::encode(nonce)
        )
    }

    /// Exchange an authorization code for the provider's `id_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or no `id_token` is returned.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .inner
            .client
            .post(&self.inner.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange(
                text.chars().take(200).collect(),
            ));
        }

        let token_response: TokenResponse = response.json().await?;
        token_response.id_token.ok_or(OAuthError::MissingIdToken)
    }
}

/// Compare the `nonce` claim of an `id_token` with the stored one.
///
/// Only the payload is decoded; the backend verifies the signature.
///
/// # Errors
///
/// Returns [`OAuthError::NonceMismatch`] if the claim is absent or differs.
pub fn verify_nonce(id_token: &str, expected: &str) -> Result<(), OAuthError> {
    let nonce = id_token
        .split('.')
        .nth(1)
        .and_then(|payload| URL_SAFE_NO_PAD.decode(payload).ok())
        .and_then(|bytes| serde_json::from_slice::<IdTokenClaims>(&bytes).ok())
        .and_then(|claims| claims.nonce);

    match nonce {
        Some(nonce) if nonce == expected => Ok(()),
        _ => Err(OAuthError::NonceMismatch),
    }
}

/// Generate a cryptographically secure random string.
#[must_use]
pub fn random_token(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            char::from(CHARSET.get(idx).copied().unwrap_or(b'x'))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn provider(authorize_url: &str) -> IdentityProvider {
        IdentityProvider::new(&OAuthConfig {
            provider: "google".to_string(),
            authorize_url: authorize_url.to_string(),
            token_url: "https://idp.test/token".to_string(),
            client_id: "client id".to_string(),
            client_secret: SecretString::from("s3cr3t"),
        })
    }

    fn id_token(claims: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn test_authorization_url_encodes_params() {
        let url = provider("https://idp.test/authorize").authorization_url(
            "https://shop.test/auth/social/callback",
            "st",
            "nn",
        );
        assert!(url.starts_with("https://idp.test/authorize?client_id=client%20id&"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fshop.test%2Fauth%2Fsocial%2Fcallback"));
        assert!(url.contains("state=st"));
        assert!(url.ends_with("nonce=nn"));
    }

    #[test]
    fn test_authorization_url_appends_to_existing_query() {
        let url = provider("https://idp.test/authorize?prompt=select_account")
            .authorization_url("https://shop.test/cb", "s", "n");
        assert!(url.starts_with("https://idp.test/authorize?prompt=select_account&client_id="));
    }

    #[test]
    fn test_verify_nonce() {
        let token = id_token(r#"{"sub":"1","nonce":"abc"}"#);
        assert!(verify_nonce(&token, "abc").is_ok());
        assert!(matches!(
            verify_nonce(&token, "xyz"),
            Err(OAuthError::NonceMismatch)
        ));
        assert!(verify_nonce(&id_token(r#"{"sub":"1"}"#), "abc").is_err());
        assert!(verify_nonce("garbage", "abc").is_err());
    }

    #[test]
    fn test_random_token() {
        let a = random_token(32);
        let b = random_token(32);
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
