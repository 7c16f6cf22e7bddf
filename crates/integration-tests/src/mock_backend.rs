//! In-process stand-in for the brewery REST API.
//!
//! Only the endpoints the end-to-end tests touch are served. Tokens issued at
//! login are already expired so the first authenticated request refreshes.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::Shared;

pub const TEST_EMAIL: &str = "ada@example.com";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Products in the mock catalog: `(id, slug, name, price)`.
const PRODUCTS: [(i64, &str, &str, &str); 2] = [
    (1, "fog-line-hazy-ipa", "Fog Line Hazy IPA", "14.00"),
    (2, "night-shift-stout", "Night Shift Stout", "16.50"),
];

#[derive(Default)]
struct MockState {
    /// Remote cart lines as `(product_id, quantity)`.
    cart: Vec<(i64, u32)>,
    refresh_calls: usize,
    cart_item_posts: usize,
    /// Answer refresh requests with 401, as for a revoked refresh token.
    reject_refresh: bool,
}

/// Handle to a running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    base_url: String,
    state: Shared<MockState>,
}

impl MockBackend {
    /// Serve the mock API on an ephemeral port.
    pub async fn spawn() -> Self {
        let state: Shared<MockState> = Arc::default();

        let app = Router::new()
            .route("/health", get(health))
            .route("/categories", get(empty_list))
            .route("/products/featured", get(empty_list))
            .route("/products/{slug}", get(product))
            .route("/auth/login", post(login))
            .route("/auth/token/refresh", post(refresh))
            .route("/auth/logout", post(no_content))
            .route("/cart", get(cart))
            .route("/cart/items", post(add_cart_item))
            .route("/notifications/unread-count", get(unread_count))
            .with_state(state.clone());

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, state }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Put a line in the test user's remote cart.
    pub fn seed_remote_cart(&self, product_id: i64, quantity: u32) {
        self.state.lock().unwrap().cart.push((product_id, quantity));
    }

    /// Remote cart lines as `(product_id, quantity)`.
    #[must_use]
    pub fn remote_cart(&self) -> Vec<(i64, u32)> {
        self.state.lock().unwrap().cart.clone()
    }

    /// Make every later token refresh fail with 401.
    pub fn reject_refreshes(&self) {
        self.state.lock().unwrap().reject_refresh = true;
    }

    /// How many times `/auth/token/refresh` was called.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.state.lock().unwrap().refresh_calls
    }

    /// How many times `POST /cart/items` was called.
    #[must_use]
    pub fn cart_item_posts(&self) -> usize {
        self.state.lock().unwrap().cart_item_posts
    }
}

fn product_json(id: i64) -> Option<Value> {
    PRODUCTS
        .iter()
        .find(|(pid, ..)| *pid == id)
        .map(|(id, slug, name, price)| {
            json!({
                "id": id,
                "slug": slug,
                "name": name,
                "description": "",
                "price": price,
                "in_stock": true,
            })
        })
}

fn cart_json(lines: &[(i64, u32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .filter_map(|(id, quantity)| {
            PRODUCTS
                .iter()
                .find(|(pid, ..)| pid == id)
                .map(|(id, slug, name, price)| {
                    json!({
                        "product_id": id,
                        "slug": slug,
                        "name": name,
                        "unit_price": price,
                        "quantity": quantity,
                    })
                })
        })
        .collect();
    json!({ "items": items })
}

fn user_json() -> Value {
    json!({
        "id": 7,
        "email": TEST_EMAIL,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "is_staff": false,
    })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn empty_list() -> Json<Value> {
    Json(json!([]))
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn product(Path(slug): Path<String>) -> Response {
    PRODUCTS
        .iter()
        .find(|(_, s, ..)| *s == slug)
        .and_then(|(id, ..)| product_json(*id))
        .map_or_else(
            || (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response(),
            |product| Json(product).into_response(),
        )
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    if body.email != TEST_EMAIL || body.password != TEST_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "No active account found with the given credentials" })),
        )
            .into_response();
    }
    Json(json!({
        "access": "access-initial",
        "refresh": "refresh-initial",
        "access_expires_in": 0,
        "user": user_json(),
    }))
    .into_response()
}

async fn refresh(State(state): State<Shared<MockState>>) -> Response {
    let rejected = {
        let mut state = state.lock().unwrap();
        state.refresh_calls += 1;
        state.reject_refresh
    };
    if rejected {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })),
        )
            .into_response();
    }
    // Hold the exchange open so concurrent callers overlap.
    tokio::time::sleep(Duration::from_millis(200)).await;
    Json(json!({
        "access": "access-refreshed",
        "refresh": "refresh-rotated",
        "access_expires_in": 3600,
    }))
    .into_response()
}

async fn cart(State(state): State<Shared<MockState>>) -> Json<Value> {
    let lines = state.lock().unwrap().cart.clone();
    Json(cart_json(&lines))
}

#[derive(Deserialize)]
struct AddItemBody {
    product_id: i64,
    quantity: u32,
}

async fn add_cart_item(
    State(state): State<Shared<MockState>>,
    Json(body): Json<AddItemBody>,
) -> Json<Value> {
    let lines = {
        let mut state = state.lock().unwrap();
        state.cart_item_posts += 1;
        match state.cart.iter_mut().find(|(id, _)| *id == body.product_id) {
            Some(line) => line.1 += body.quantity,
            None => state.cart.push((body.product_id, body.quantity)),
        }
        state.cart.clone()
    };
    Json(cart_json(&lines))
}

async fn unread_count() -> Json<Value> {
    Json(json!({ "count": 2 }))
}
