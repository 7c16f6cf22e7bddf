//! Records exchanged with the brewery backend.
//!
//! Field names follow the backend's `snake_case` JSON. Prices arrive as
//! decimal strings and stay [`Decimal`] until they are formatted for display.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brewery_core::{
    CategoryId, NotificationId, OrderId, OrderStatus, PaymentId, PaymentStatus, Price, ProductId,
    ReservationId, ReservationStatus, UserId,
};

/// Seconds before expiry at which an access token is treated as expired.
pub const TOKEN_EXPIRY_LEEWAY_SECS: i64 = 60;

/// Lifetime assumed when the backend omits `access_expires_in`.
const DEFAULT_ACCESS_LIFETIME_SECS: i64 = 300;

const fn default_access_lifetime() -> i64 {
    DEFAULT_ACCESS_LIFETIME_SECS
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Access/refresh token pair issued by the backend token service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    /// Bearer token for API requests.
    pub access: String,
    /// Token used to obtain a new access token.
    pub refresh: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_lifetime")]
    pub access_expires_in: i64,
    /// Unix timestamp when the pair was received. Stamped locally.
    #[serde(default)]
    pub obtained_at: i64,
}

impl AuthTokens {
    /// Stamp the receipt time.
    #[must_use]
    pub fn received_now(mut self) -> Self {
        self.obtained_at = Utc::now().timestamp();
        self
    }

    /// Check if the access token is expired (with a 60s buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Expiry check against an explicit clock.
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now >= self.obtained_at + self.access_expires_in - TOKEN_EXPIRY_LEEWAY_SECS
    }
}

/// Response of login, registration and social exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: AuthTokens,
    pub user: User,
}

/// Response of `POST /auth/token/refresh`.
///
/// The backend may or may not rotate the refresh token.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default = "default_access_lifetime")]
    pub access_expires_in: i64,
}

impl RefreshResponse {
    /// Build the new token pair, keeping the old refresh token when not rotated.
    #[must_use]
    pub fn into_tokens(self, previous_refresh: &str) -> AuthTokens {
        AuthTokens {
            access: self.access,
            refresh: self
                .refresh
                .unwrap_or_else(|| previous_refresh.to_string()),
            access_expires_in: self.access_expires_in,
            obtained_at: 0,
        }
        .received_now()
    }
}

/// Credentials for `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub date_of_birth: NaiveDate,
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// A storefront customer or staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
}

impl User {
    /// Get the user's full name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Name to greet the user with, falling back to the email's local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        let first = self.first_name.trim();
        if first.is_empty() {
            self.email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string()
        } else {
            first.to_string()
        }
    }
}

/// Body of `PATCH /users/me`.
#[derive(Debug, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// A product category (e.g., "IPA", "Merch").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A product from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub image: Option<String>,
    /// Alcohol by volume, percent.
    #[serde(default)]
    pub abv: Option<Decimal>,
    /// International bitterness units.
    #[serde(default)]
    pub ibu: Option<u32>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub volume_ml: Option<u32>,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub is_featured: bool,
}

const fn default_true() -> bool {
    true
}

impl Product {
    /// Unit price.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::usd(self.price)
    }
}

/// Paginated list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// An empty page, used as a fallback when the backend is unreachable.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

/// Sort orders offered on the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Featured,
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    /// Every sort option, in menu order.
    pub const ALL: [Self; 5] = [
        Self::Featured,
        Self::Newest,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Name,
    ];

    /// Backend `ordering` parameter.
    #[must_use]
    pub const fn ordering(&self) -> &'static str {
        match self {
            Self::Featured => "-is_featured",
            Self::Newest => "-created_at",
            Self::PriceAsc => "price",
            Self::PriceDesc => "-price",
            Self::Name => "name",
        }
    }

    /// Query-string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Name => "name",
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Name => "Name",
        }
    }
}

/// Filters for `GET /products`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: ProductSort,
    pub page: u32,
    pub page_size: u32,
}

impl ProductQuery {
    /// Query-string pairs for the backend.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ordering", self.sort.ordering().to_string()),
            ("page", self.page.max(1).to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        params
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cart
// ─────────────────────────────────────────────────────────────────────────────

/// A line in a cart, local or remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItem {
    /// Build a line for `quantity` units of a catalog product.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            unit_price: product.price,
            quantity,
            image: product.image.clone(),
        }
    }

    /// Unit price.
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::usd(self.unit_price)
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price().times(self.quantity)
    }
}

/// The backend's copy of a signed-in user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// Body of `POST /cart/items`.
#[derive(Debug, Serialize)]
pub struct AddCartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `PATCH /cart/items/{product_id}`.
#[derive(Debug, Serialize)]
pub struct UpdateCartItem {
    pub quantity: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders & payments
// ─────────────────────────────────────────────────────────────────────────────

/// A shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub full_name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Address {
    /// Format the address as a single line.
    #[must_use]
    pub fn single_line(&self) -> String {
        [
            Some(self.line1.as_str()),
            self.line2.as_deref(),
            Some(self.city.as_str()),
            Some(self.region.as_str()),
            Some(self.postal_code.as_str()),
            Some(self.country.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// A line on a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::usd(self.unit_price)
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        Price::usd(self.unit_price).times(self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Customer-facing order number (e.g., "HW-1042").
    pub number: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub shipping: Decimal,
    pub total: Decimal,
    pub shipping_address: Address,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub const fn subtotal_price(&self) -> Price {
        Price::usd(self.subtotal)
    }

    #[must_use]
    pub const fn shipping_price(&self) -> Price {
        Price::usd(self.shipping)
    }

    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::usd(self.total)
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Serialize)]
pub struct NewOrder {
    pub items: Vec<AddCartItem>,
    pub shipping_address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A payment attempt for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub amount: Decimal,
    /// Secret for client-side payment elements. Only present on creation.
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Body of `POST /payments`.
#[derive(Debug, Serialize)]
pub struct NewPayment {
    pub order_id: OrderId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Notifications
// ─────────────────────────────────────────────────────────────────────────────

/// An in-app notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Response of `GET /notifications/unread-count`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UnreadCount {
    pub count: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Reservations
// ─────────────────────────────────────────────────────────────────────────────

/// A taproom table reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub status: ReservationStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub guest_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /reservations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReservation {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Marketing & admin
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /contact`.
#[derive(Debug, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Body of `PATCH /admin/orders/{id}` and `PATCH /admin/reservations/{id}`.
#[derive(Debug, Serialize)]
pub struct StatusUpdate<S: Serialize> {
    pub status: S,
}

/// Response of `GET /admin/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub orders_today: u32,
    #[serde(default)]
    pub revenue_today: Decimal,
    #[serde(default)]
    pub revenue_month: Decimal,
    #[serde(default)]
    pub open_orders: u32,
    #[serde(default)]
    pub pending_reservations: u32,
    #[serde(default)]
    pub reservations_today: u32,
    #[serde(default)]
    pub new_customers_month: u32,
    #[serde(default)]
    pub low_stock_products: Vec<Product>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_tokens_expire_with_leeway() {
        let tokens = AuthTokens {
            access: "a".to_string(),
            refresh: "r".to_string(),
            access_expires_in: 300,
            obtained_at: 1_000,
        };
        assert!(!tokens.is_expired_at(1_000));
        assert!(!tokens.is_expired_at(1_239));
        assert!(tokens.is_expired_at(1_240));
        assert!(tokens.is_expired_at(2_000));
    }

    #[test]
    fn test_auth_response_flattens_tokens() {
        let json = r#"{
            "access": "acc", "refresh": "ref", "access_expires_in": 900,
            "user": {"id": 3, "email": "ada@example.com", "first_name": "Ada"}
        }"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.tokens.access, "acc");
        assert_eq!(response.tokens.access_expires_in, 900);
        assert_eq!(response.user.id, UserId::new(3));
        assert!(!response.user.is_staff);
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let response: RefreshResponse = serde_json::from_str(r#"{"access": "new"}"#).unwrap();
        let tokens = response.into_tokens("old-refresh");
        assert_eq!(tokens.access, "new");
        assert_eq!(tokens.refresh, "old-refresh");
        assert_eq!(tokens.access_expires_in, DEFAULT_ACCESS_LIFETIME_SECS);
        assert!(tokens.obtained_at > 0);
    }

    #[test]
    fn test_product_decodes_decimal_strings() {
        let json = r#"{"id": 1, "name": "Fog Line Hazy IPA", "slug": "fog-line",
            "price": "16.00", "abv": "6.8", "ibu": 45}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.price, Decimal::from_str("16.00").unwrap());
        assert!(product.in_stock);
        assert_eq!(product.unit_price().to_string(), "$16.00");
    }

    #[test]
    fn test_product_query_params() {
        let query = ProductQuery {
            category: Some("ipa".to_string()),
            search: None,
            sort: ProductSort::PriceDesc,
            page: 0,
            page_size: 12,
        };
        let params = query.to_params();
        assert!(params.contains(&("ordering", "-price".to_string())));
        assert!(params.contains(&("page", "1".to_string())));
        assert!(params.contains(&("category", "ipa".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "search"));
    }

    #[test]
    fn test_address_single_line_skips_blanks() {
        let address = Address {
            full_name: "Ada L".to_string(),
            line1: "1 Main St".to_string(),
            line2: Some("  ".to_string()),
            city: "Portland".to_string(),
            region: "OR".to_string(),
            postal_code: "97209".to_string(),
            country: "US".to_string(),
            phone: None,
        };
        assert_eq!(address.single_line(), "1 Main St, Portland, OR, 97209, US");
    }

    #[test]
    fn test_user_display_name_fallback() {
        let user = User {
            id: UserId::new(1),
            email: "hophead@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone: None,
            date_of_birth: None,
            is_staff: false,
            date_joined: None,
        };
        assert_eq!(user.display_name(), "hophead");
        assert_eq!(user.full_name(), "");
    }
}
