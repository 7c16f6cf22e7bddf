//! Age gate: visitors confirm the legal drinking age before shopping.
//!
//! Unverified visitors are sent to `/age-verification?next=...`. Probes,
//! static assets, legal pages and the gate itself stay reachable.

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use url::Url;

use crate::models::session_keys;

/// Paths (prefixes) reachable without confirming age.
const EXEMPT_PREFIXES: &[&str] = &[
    "/health",
    "/static/",
    "/age-verification",
    "/consent/",
    "/pages/",
    "/robots.txt",
    "/favicon.ico",
];

/// Whether `path` is reachable without age verification.
#[must_use]
pub fn is_exempt(path: &str) -> bool {
    EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Whether the session has passed the age gate.
pub async fn is_verified(session: &Session) -> bool {
    session
        .get::<bool>(session_keys::AGE_VERIFIED)
        .await
        .ok()
        .flatten()
        .unwrap_or(false)
}

/// Record that the visitor confirmed their age.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn mark_verified(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::AGE_VERIFIED, true).await
}

/// Redirect unverified visitors to the age gate.
pub async fn age_gate_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_exempt(path) {
        return next.run(request).await;
    }

    let verified = match request.extensions().get::<Session>() {
        Some(session) => is_verified(session).await,
        None => {
            tracing::error!("Session not found in request extensions - layer missing");
            false
        }
    };
    if verified {
        return next.run(request).await;
    }

    let target = request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str());
    let location = format!("/age-verification?next={}", urlencoding::encode(target));

    if request.headers().contains_key("hx-request") {
        let mut response = StatusCode::NO_CONTENT.into_response();
        if let Ok(value) = HeaderValue::from_str(&location) {
            response.headers_mut().insert("HX-Redirect", value);
        }
        return response;
    }

    Redirect::to(&location).into_response()
}

/// Only allow local redirect targets after the gate.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => "/",
    }
}

/// Browsers drop tabs and newlines from URLs and read a backslash as `/`, so a
/// target is only local if it resolves against a placeholder origin
/// without changing host.
fn is_local_path(path: &str) -> bool {
    if !path.starts_with('/')
        || path.starts_with("//")
        || path.contains('\\')
        || path.chars().any(|c| c.is_control() || c.is_whitespace())
    {
        return false;
    }
    Url::parse("http://local.invalid/")
        .and_then(|base| base.join(path))
        .is_ok_and(|url| url.host_str() == Some("local.invalid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exempt_paths() {
        for path in ["/health", "/health/ready", "/static/css/main.css", "/pages/terms", "/age-verification"] {
            assert!(is_exempt(path), "{path} should be exempt");
        }
        for path in ["/", "/products", "/products/fog-line", "/cart", "/checkout"] {
            assert!(!is_exempt(path), "{path} should be gated");
        }
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/products?page=2")), "/products?page=2");
        assert_eq!(safe_next(Some("//evil.test")), "/");
        assert_eq!(safe_next(Some("https://evil.test")), "/");
        assert_eq!(safe_next(Some("/\\evil.test")), "/");
        assert_eq!(safe_next(Some("/\t/evil.test")), "/");
        assert_eq!(safe_next(Some("/\r\n/evil.test")), "/");
        assert_eq!(safe_next(Some("/\n/evil.test")), "/");
        assert_eq!(safe_next(Some("/ /evil.test")), "/");
        assert_eq!(safe_next(Some("/%09/evil.test")), "/%09/evil.test");
        assert_eq!(safe_next(None), "/");
    }
}
