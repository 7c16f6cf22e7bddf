//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, start transactions)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID
//! 4. Session layer (tower-sessions, `PostgreSQL` store)
//! 5. CSP nonce
//! 6. Security headers
//! 7. Age gate
//! 8. Rate limiting (governor, per route group)

pub mod age_gate;
pub mod auth;
pub mod csp;
pub mod page_context;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use age_gate::age_gate_middleware;
pub use auth::{OptionalAuth, RequireAuth, RequireStaff};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use page_context::PageContext;
pub use rate_limit::{auth_rate_limiter, form_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::{ContentSecurityPolicy, security_headers_middleware};
pub use session::{create_session_layer, session_layer};
