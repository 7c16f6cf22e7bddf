//! Authentication extractors.
//!
//! Every extractor runs [`ensure_fresh`], so handlers always see a usable
//! access token or no user at all. A dead refresh token signs the user out
//! and the request continues as anonymous.

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::SessionAuth;
use crate::services::auth::ensure_fresh;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// Anonymous requests are redirected to the login page (with `next` set to
/// the requested path), or get `401` for `/api/` and HTMX requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(auth): RequireAuth, State(state): State<AppState>) -> Result<..> {
///     let orders = state.backend().get_orders(auth.access(), 1).await?;
///     ...
/// }
/// ```
pub struct RequireAuth(pub SessionAuth);

/// Extractor that requires a signed-in staff user.
pub struct RequireStaff(pub SessionAuth);

/// Extractor that optionally gets the signed-in user.
pub struct OptionalAuth(pub Option<SessionAuth>);

/// Error returned when authentication is required but missing.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin(String),
    /// Unauthorized response (for API and HTMX requests).
    Unauthorized,
    /// Signed in, but not staff.
    Forbidden,
    /// Session store failure.
    SessionUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(next) => {
                Redirect::to(&format!("/auth/login?next={}", urlencoding::encode(&next)))
                    .into_response()
            }
            Self::Unauthorized => {
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                response
                    .headers_mut()
                    .insert("HX-Redirect", HeaderValue::from_static("/auth/login"));
                response
            }
            Self::Forbidden => (StatusCode::FORBIDDEN, "Staff only").into_response(),
            Self::SessionUnavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Whether the caller wants a status code rather than a redirect.
fn wants_status(parts: &Parts) -> bool {
    parts.uri.path().starts_with("/api/") || parts.headers.contains_key("hx-request")
}

fn login_rejection(parts: &Parts) -> AuthRejection {
    if wants_status(parts) {
        AuthRejection::Unauthorized
    } else {
        let next = parts
            .uri
            .path_and_query()
            .map_or("/", |pq| pq.as_str())
            .to_string();
        AuthRejection::RedirectToLogin(next)
    }
}

/// Current auth with a fresh access token, if any.
async fn fresh_auth(parts: &Parts, state: &AppState) -> Result<Option<SessionAuth>, AuthRejection> {
    let Some(session) = parts.extensions.get::<Session>() else {
        tracing::error!("Session not found in request extensions - layer missing");
        return Err(AuthRejection::SessionUnavailable);
    };

    ensure_fresh(session, state.refresher()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read auth from session");
        AuthRejection::SessionUnavailable
    })
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        fresh_auth(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| login_rejection(parts))
    }
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = fresh_auth(parts, state)
            .await?
            .ok_or_else(|| login_rejection(parts))?;

        if !auth.user.is_staff {
            tracing::warn!(user_id = %auth.user.id, path = %parts.uri.path(), "Non-staff user denied");
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(auth))
    }
}

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(fresh_auth(parts, state).await.ok().flatten()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(uri: &str, htmx: bool) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if htmx {
            builder = builder.header("HX-Request", "true");
        }
        builder.body(()).map(|r| r.into_parts().0).unwrap_or_else(|_| {
            Request::new(()).into_parts().0
        })
    }

    #[test]
    fn test_html_requests_redirect_with_next() {
        let response = login_rejection(&parts("/account/orders?page=2", false)).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/auth/login?next=%2Faccount%2Forders%3Fpage%3D2")
        );
    }

    #[test]
    fn test_htmx_and_api_requests_get_401() {
        let response = login_rejection(&parts("/cart/add", true)).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("HX-Redirect"));

        let response = login_rejection(&parts("/api/anything", false)).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
