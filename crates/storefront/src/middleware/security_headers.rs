//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! The CSP is locked down to this origin plus the third parties the pages
//! actually load: the HTMX CDN, the payment processor's script and frames,
//! the image CDN, the map tile server and (when configured) analytics.
//! Inline scripts must carry the per-request nonce from [`CspNonce`].

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::config::StorefrontConfig;
use crate::middleware::csp::CspNonce;

const HTMX_ORIGIN: &str = "https://unpkg.com";
const PAYMENTS_SCRIPT_ORIGIN: &str = "https://js.stripe.com";
const PAYMENTS_API_ORIGIN: &str = "https://api.stripe.com";
const ANALYTICS_SCRIPT_ORIGIN: &str = "https://www.googletagmanager.com";
const ANALYTICS_CONNECT_ORIGIN: &str = "https://*.google-analytics.com";

/// Content Security Policy sources derived from configuration.
#[derive(Debug, Clone)]
pub struct ContentSecurityPolicy {
    script_src: Vec<String>,
    img_src: Vec<String>,
    connect_src: Vec<String>,
    frame_src: Vec<String>,
}

/// Scheme + host (+ port) of a URL or URL template.
fn origin_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .map(|u| u.origin().ascii_serialization())
        .filter(|origin| origin != "null")
}

impl ContentSecurityPolicy {
    /// Build the policy for this deployment.
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        let mut script_src = vec![HTMX_ORIGIN.to_string(), PAYMENTS_SCRIPT_ORIGIN.to_string()];
        let mut img_src = vec!["data:".to_string()];
        let mut connect_src = vec![PAYMENTS_API_ORIGIN.to_string()];
        let frame_src = vec![PAYMENTS_SCRIPT_ORIGIN.to_string()];

        img_src.extend(origin_of(&config.backend.base_url));
        img_src.extend(origin_of(&config.taproom.map_tile_url));
        if let Some(cdn) = &config.images.base_url {
            img_src.extend(origin_of(cdn));
        }

        if config.analytics.ga4_measurement_id.is_some() {
            script_src.push(ANALYTICS_SCRIPT_ORIGIN.to_string());
            connect_src.push(ANALYTICS_CONNECT_ORIGIN.to_string());
            img_src.push(ANALYTICS_CONNECT_ORIGIN.to_string());
        }

        img_src.dedup();

        Self {
            script_src,
            img_src,
            connect_src,
            frame_src,
        }
    }

    /// Header value, with the request's nonce when there is one.
    #[must_use]
    pub fn header_value(&self, nonce: Option<&str>) -> String {
        let nonce = nonce
            .filter(|n| !n.is_empty())
            .map(|n| format!(" 'nonce-{n}'"))
            .unwrap_or_default();
        format!(
            "default-src 'none'; \
             script-src 'self'{nonce} {}; \
             style-src 'self'; \
             font-src 'self'; \
             img-src 'self' {}; \
             connect-src 'self' {}; \
             frame-src {}; \
             object-src 'none'; \
             base-uri 'self'; \
             form-action 'self'; \
             frame-ancestors 'none'",
            self.script_src.join(" "),
            self.img_src.join(" "),
            self.connect_src.join(" "),
            self.frame_src.join(" "),
        )
    }
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Content-Security-Policy` - see [`ContentSecurityPolicy`]
/// - `Permissions-Policy` - Only `payment` for the checkout frames
/// - `Cache-Control` - `no-store` for pages, short public caching for `/static`
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
/// - `X-DNS-Prefetch-Control: off` - Prevent DNS prefetch leakage
pub async fn security_headers_middleware(
    State(csp): State<Arc<ContentSecurityPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let is_static = request.uri().path().starts_with("/static/");
    let nonce = request.extensions().get::<CspNonce>().cloned();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    let policy = csp.header_value(nonce.as_ref().map(CspNonce::value));
    if let Ok(value) = HeaderValue::from_str(&policy) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), \
             geolocation=(), \
             microphone=(), \
             usb=(), \
             interest-cohort=(), \
             payment=(self \"https://js.stripe.com\")",
        ),
    );

    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static(if is_static {
            "public, max-age=3600"
        } else {
            "no-store, max-age=0"
        }),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_of_tile_template() {
        assert_eq!(
            origin_of("https://tile.openstreetmap.org/{z}/{x}/{y}.png").as_deref(),
            Some("https://tile.openstreetmap.org")
        );
        assert_eq!(origin_of("not a url"), None);
    }

    #[test]
    fn test_header_value_includes_nonce_and_sources() {
        let csp = ContentSecurityPolicy {
            script_src: vec![HTMX_ORIGIN.to_string()],
            img_src: vec!["data:".to_string(), "https://cdn.test".to_string()],
            connect_src: vec![],
            frame_src: vec![PAYMENTS_SCRIPT_ORIGIN.to_string()],
        };
        let value = csp.header_value(Some("abc123"));
        assert!(value.contains("script-src 'self' 'nonce-abc123' https://unpkg.com;"));
        assert!(value.contains("img-src 'self' data: https://cdn.test;"));
        assert!(value.contains("frame-src https://js.stripe.com;"));

        let without = csp.header_value(None);
        assert!(!without.contains("nonce"));
    }
}
