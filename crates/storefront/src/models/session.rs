//! Session-related types.
//!
//! Everything the browser would otherwise keep in local storage lives in the
//! server-side session behind the session cookie.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brewery_core::{OrderId, PaymentId, UserId};

use crate::backend::types::{AuthTokens, User};

/// Session-stored user identity.
///
/// Minimal data needed to render the header and authorize staff pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend user ID.
    pub id: UserId,
    /// User's email address.
    pub email: String,
    /// Name to greet the user with.
    pub display_name: String,
    /// Whether the user may open the admin dashboard.
    pub is_staff: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name(),
            is_staff: user.is_staff,
        }
    }
}

/// Signed-in state: who the user is and the backend tokens acting for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAuth {
    pub user: CurrentUser,
    pub tokens: AuthTokens,
}

impl SessionAuth {
    /// Access token for backend calls.
    #[must_use]
    pub fn access(&self) -> &str {
        &self.tokens.access
    }
}

/// The visitor's answer to the cookie banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieConsent {
    /// Whether analytics cookies may be set.
    pub analytics: bool,
    pub decided_at: DateTime<Utc>,
}

/// Order awaiting payment confirmation between checkout steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub order_id: OrderId,
    pub number: String,
    pub payment_id: PaymentId,
}

/// Session keys.
pub mod keys {
    /// Signed-in user and tokens ([`super::SessionAuth`]).
    pub const AUTH: &str = "auth";

    /// Local cart or the signed-in user's cart mirror.
    pub const CART: &str = "cart";

    /// Recently viewed product slugs, most recent first.
    pub const RECENTLY_VIEWED: &str = "recently_viewed";

    /// Addresses saved at checkout.
    pub const SAVED_ADDRESSES: &str = "saved_addresses";

    /// Set once the visitor confirms the legal drinking age.
    pub const AGE_VERIFIED: &str = "age_verified";

    /// Cookie banner answer.
    pub const COOKIE_CONSENT: &str = "cookie_consent";

    /// One-shot flash messages.
    pub const TOASTS: &str = "toasts";

    /// OAuth state (CSRF protection).
    pub const OAUTH_STATE: &str = "oauth_state";

    /// OAuth nonce (`OpenID` Connect replay protection).
    pub const OAUTH_NONCE: &str = "oauth_nonce";

    /// Order created at checkout, awaiting payment.
    pub const PENDING_ORDER: &str = "pending_order";
}
