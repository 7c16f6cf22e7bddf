//! Business logic layered over the backend client and the session.
//!
//! Services are small structs or free functions over `&BackendClient` and
//! `&Session`, so they can be tested without a router.

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod notifications;
pub mod oauth;
pub mod recently_viewed;
pub mod reservations;
pub mod toast;

pub use auth::{AuthError, TokenRefresher};
pub use cart::{CartService, LocalCart, MAX_LINE_QUANTITY, merge_carts};
pub use notifications::UnreadCounter;
pub use oauth::{IdentityProvider, OAuthError};
pub use toast::{Toast, ToastLevel};
