//! REST client for the brewery backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth for users, catalog, carts, orders,
//!   payments, notifications and reservations. Nothing is synced locally.
//! - Authenticated calls carry `Authorization: Bearer <access>`.
//! - Catalog reads (products, categories) are cached via `moka` (5 minute TTL).
//!   Anything user-scoped is never cached here.
//!
//! # Example
//!
//! ```rust,ignore
//! use brewery_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//! let product = client.get_product("fog-line-hazy-ipa").await?;
//! let cart = client.add_cart_item(&tokens.access, product.id, 2).await?;
//! ```

mod admin;
mod auth;
mod cache;
mod cart;
mod catalog;
mod marketing;
mod notifications;
mod orders;
mod reservations;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::BackendConfig;

use cache::CacheValue;
pub use types::*;

/// Errors that can occur when talking to the brewery backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Access token missing, expired or rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed.
    #[error("Forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("Backend API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl BackendError {
    /// Whether the backend rejected the request as invalid input (4xx other
    /// than auth/not-found), so the message is safe to show to the user.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 400 && *status < 500)
    }

    /// The backend's message for validation errors.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Api { status, message } if *status >= 400 && *status < 500 => {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

/// Error body shapes the backend uses: `{"detail": ".."}` or
/// `{"message": ".."}`, or field errors `{"email": [".."]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detail { detail: String },
    Message { message: String },
    Fields(std::collections::BTreeMap<String, Vec<String>>),
}

impl ErrorBody {
    fn into_message(self) -> String {
        match self {
            Self::Detail { detail } => detail,
            Self::Message { message } => message,
            Self::Fields(fields) => fields
                .into_iter()
                .map(|(field, errors)| format!("{field}: {}", errors.join(" ")))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the brewery REST API.
///
/// Cheap to clone; all clones share the connection pool and catalog cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("brewery-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Base URL of the backend API.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// Start a request, attaching the bearer token when given.
    fn request(&self, method: Method, path: &str, access_token: Option<&str>) -> RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, self.url(path))
            .header("Accept", "application/json");
        match access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode the JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = Self::check(request.send().await?).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// Send a request whose response body is ignored.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), BackendError> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    /// Map non-success statuses onto [`BackendError`].
    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
            StatusCode::FORBIDDEN => Err(BackendError::Forbidden),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(url)),
            _ => {
                let message = serde_json::from_str::<ErrorBody>(&body).map_or_else(
                    |_| body.chars().take(200).collect::<String>(),
                    ErrorBody::into_message,
                );
                if status.is_server_error() {
                    tracing::error!(
                        status = %status,
                        path = %url,
                        body = %body.chars().take(500).collect::<String>(),
                        "Backend returned server error"
                    );
                }
                Err(BackendError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// `GET /health`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), BackendError> {
        self.send_empty(self.request(Method::GET, "/health", None))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_detail() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "Invalid credentials"}"#).unwrap();
        assert_eq!(body.into_message(), "Invalid credentials");
    }

    #[test]
    fn test_error_body_fields() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"email": ["Already registered."], "password": ["Too short."]}"#)
                .unwrap();
        assert_eq!(
            body.into_message(),
            "email: Already registered.; password: Too short."
        );
    }

    #[test]
    fn test_validation_errors_expose_message() {
        let err = BackendError::Api {
            status: 400,
            message: "Out of stock".to_string(),
        };
        assert!(err.is_validation());
        assert_eq!(err.user_message(), Some("Out of stock"));

        let err = BackendError::Api {
            status: 503,
            message: "db down".to_string(),
        };
        assert!(!err.is_validation());
        assert_eq!(err.user_message(), None);
    }

    #[test]
    fn test_url_joins_paths() {
        let client = BackendClient::new(&BackendConfig {
            base_url: "http://backend.test/api/".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(client.url("/products"), "http://backend.test/api/products");
        assert_eq!(client.url("cart/items"), "http://backend.test/api/cart/items");
    }
}
