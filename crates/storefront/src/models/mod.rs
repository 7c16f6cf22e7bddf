//! Session-held models for the storefront.
//!
//! Domain records (products, orders, reservations) live in
//! [`crate::backend::types`]; these are the storefront's own.

pub mod session;

pub use session::{CookieConsent, CurrentUser, PendingOrder, SessionAuth, keys as session_keys};
