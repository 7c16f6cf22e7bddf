//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Readiness (database ping)
//! GET  /                               - Home page
//! GET  /age-verification               - Age gate
//! POST /age-verification               - Confirm or decline
//! POST /consent/cookies                - Cookie banner answer
//!
//! # Catalog
//! GET  /products                       - Listing (?category, ?q, ?sort, ?page)
//! GET  /products/{slug}                - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                           - Cart page
//! POST /cart/add                       - Add (returns count badge, triggers cart-updated)
//! POST /cart/update                    - Set quantity (returns cart_items fragment)
//! POST /cart/remove                    - Remove (returns cart_items fragment)
//! POST /cart/clear                     - Empty the cart
//! GET  /cart/count                     - Count badge fragment
//!
//! # Checkout (requires auth)
//! GET  /checkout                       - Shipping address step
//! POST /checkout                       - Create order and payment
//! GET  /checkout/complete              - Payment result
//!
//! # Auth
//! GET  /auth/login, POST /auth/login
//! GET  /auth/register, POST /auth/register
//! POST /auth/logout
//! GET  /auth/password-reset, POST /auth/password-reset
//! GET  /auth/social/login              - Redirect to identity provider
//! GET  /auth/social/callback           - Provider callback
//!
//! # Account (requires auth)
//! GET  /account                        - Overview and profile form
//! POST /account/profile                - Update profile
//! GET  /account/orders                 - Order history
//! GET  /account/orders/{id}            - Order detail
//! GET  /account/addresses              - Saved addresses
//! POST /account/addresses              - Save address
//! POST /account/addresses/{index}/delete
//!
//! # Reservations (requires auth)
//! GET  /reservations, POST /reservations
//! POST /reservations/{id}/cancel
//!
//! # Notifications
//! GET  /notifications                  - List (requires auth)
//! GET  /notifications/unread-count     - Badge fragment (polled)
//! POST /notifications/{id}/read
//! POST /notifications/read-all
//!
//! # Admin (staff only)
//! GET  /admin                          - Dashboard
//! GET  /admin/orders                   - Orders (?status)
//! POST /admin/orders/{id}/status
//! GET  /admin/reservations             - Reservations (?date)
//! POST /admin/reservations/{id}/status
//!
//! # Marketing
//! GET  /taproom                        - Location, hours, map
//! GET  /contact, POST /contact
//! POST /newsletter                     - Newsletter signup (HTMX)
//! GET  /pages/{slug}                   - Markdown pages
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod consent;
pub mod contact;
pub mod health;
pub mod home;
pub mod newsletter;
pub mod notifications;
pub mod pages;
pub mod products;
pub mod reservations;
pub mod social_auth;
pub mod taproom;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, HeaderValue, Request},
    middleware as axum_middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::middleware::{
    ContentSecurityPolicy, age_gate_middleware, auth_rate_limiter, csp_nonce_middleware,
    form_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Whether the request came from HTMX.
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// A response that fires a client-side HTMX event.
pub(crate) fn with_trigger(event: &'static str, body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert("HX-Trigger", HeaderValue::from_static(event));
    response
}

/// Redirect that also works for HTMX requests.
pub(crate) fn redirect(headers: &HeaderMap, location: &str) -> Response {
    if is_htmx(headers) {
        let mut response = axum::http::StatusCode::NO_CONTENT.into_response();
        if let Ok(value) = HeaderValue::from_str(location) {
            response.headers_mut().insert("HX-Redirect", value);
        }
        response
    } else {
        Redirect::to(location).into_response()
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::address_step).post(checkout::place_order))
        .route("/complete", get(checkout::complete))
}

/// Create the auth routes router.
///
/// Credential-accepting POSTs sit behind the strict auth rate limiter.
pub fn auth_routes() -> Router<AppState> {
    let pages = Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/password-reset", get(auth::password_reset_page))
        .route("/logout", post(auth::logout))
        .route("/social/login", get(social_auth::login))
        .route("/social/callback", get(social_auth::callback));

    let submissions = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/password-reset", post(auth::password_reset))
        .layer(auth_rate_limiter());

    pages.merge(submissions)
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/profile", post(account::update_profile))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route(
            "/addresses",
            get(account::addresses).post(account::save_address),
        )
        .route("/addresses/{index}/delete", post(account::delete_address))
}

/// Create the reservation routes router.
pub fn reservation_routes() -> Router<AppState> {
    let pages = Router::new()
        .route("/", get(reservations::index))
        .route("/{id}/cancel", post(reservations::cancel));

    let submissions = Router::new()
        .route("/", post(reservations::create))
        .layer(form_rate_limiter());

    pages.merge(submissions)
}

/// Create the notification routes router.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::index))
        .route("/unread-count", get(notifications::unread_count))
        .route("/{id}/read", post(notifications::mark_read))
        .route("/read-all", post(notifications::mark_all_read))
}

/// Create the staff dashboard routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/orders", get(admin::orders))
        .route("/orders/{id}/status", post(admin::update_order_status))
        .route("/reservations", get(admin::reservations))
        .route(
            "/reservations/{id}/status",
            post(admin::update_reservation_status),
        )
}

/// Create the marketing routes router (taproom, contact, newsletter, pages).
pub fn marketing_routes() -> Router<AppState> {
    let pages = Router::new()
        .route("/taproom", get(taproom::show))
        .route("/contact", get(contact::show))
        .route("/pages/{slug}", get(pages::show));

    let submissions = Router::new()
        .route("/contact", post(contact::submit))
        .route("/newsletter", post(newsletter::subscribe))
        .layer(form_rate_limiter());

    pages.merge(submissions)
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/", get(home::home))
        .route(
            "/age-verification",
            get(consent::age_page).post(consent::age_submit),
        )
        .route("/consent/cookies", post(consent::cookies))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/reservations", reservation_routes())
        .nest("/notifications", notification_routes())
        .nest("/admin", admin_routes())
        .merge(marketing_routes())
}

/// The storefront application with its request middleware.
///
/// The caller adds the session layer (Postgres in production, in-memory in
/// tests) and the Sentry layers on top.
pub fn build_router(state: AppState) -> Router {
    let csp = Arc::new(ContentSecurityPolicy::from_config(state.config()));

    routes()
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .route_service("/robots.txt", ServeFile::new(format!("{STATIC_DIR}/robots.txt")))
        .layer(axum_middleware::from_fn(age_gate_middleware))
        .layer(axum_middleware::from_fn_with_state(
            csp,
            security_headers_middleware,
        ))
        .layer(axum_middleware::from_fn(csp_nonce_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
