//! Per-request data every full page layout needs.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::middleware::auth::OptionalAuth;
use crate::middleware::csp::CspNonce;
use crate::models::{CookieConsent, CurrentUser, SessionAuth, session_keys};
use crate::services::cart::LocalCart;
use crate::services::toast::{self, Toast};
use crate::state::AppState;

/// Layout data: header user, cart badge, toasts, consent, analytics.
///
/// Extracting it drains the session's toasts, so use it only for full page
/// renders, never for HTMX fragments.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: u32,
    pub toasts: Vec<Toast>,
    pub nonce: String,
    pub cookie_consent: Option<CookieConsent>,
    /// GA4 ID, only once analytics cookies are accepted.
    pub ga4_id: Option<String>,
    pub social_login: bool,
    pub current_path: String,
}

impl PageContext {
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_staff)
    }

    /// Whether the cookie banner should show.
    #[must_use]
    pub const fn needs_consent(&self) -> bool {
        self.cookie_consent.is_none()
    }

    /// Whether `prefix` is the active nav section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(prefix)
        }
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalAuth(auth) = OptionalAuth::from_request_parts(parts, state).await?;
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;

        let mut context = Self {
            user: auth.as_ref().map(|a: &SessionAuth| a.user.clone()),
            nonce,
            social_login: state.identity_provider().is_some(),
            current_path: parts.uri.path().to_string(),
            ..Self::default()
        };

        if let Some(session) = parts.extensions.get::<Session>() {
            context.cart_count = LocalCart::load(session).await.count();
            context.toasts = toast::drain(session).await;
            context.cookie_consent = session
                .get::<CookieConsent>(session_keys::COOKIE_CONSENT)
                .await
                .ok()
                .flatten();
        }

        if context.cookie_consent.is_some_and(|c| c.analytics) {
            context
                .ga4_id
                .clone_from(&state.config().analytics.ga4_measurement_id);
        }

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_active() {
        let context = PageContext {
            current_path: "/products/fog-line".to_string(),
            ..PageContext::default()
        };
        assert!(context.is_active("/products"));
        assert!(!context.is_active("/"));
        assert!(!context.is_active("/taproom"));
    }

    #[test]
    fn test_needs_consent_until_answered() {
        let mut context = PageContext::default();
        assert!(context.needs_consent());
        context.cookie_consent = Some(CookieConsent {
            analytics: false,
            decided_at: chrono::Utc::now(),
        });
        assert!(!context.needs_consent());
    }
}
