//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart lives in the session; signed-in carts are mirrored against the
//! backend by [`CartService`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use brewery_core::ProductId;

use crate::backend::types::CartItem;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::images::ImageCdn;
use crate::middleware::{OptionalAuth, PageContext};
use crate::routes::{is_htmx, redirect, with_trigger};
use crate::services::cart::{CartService, LocalCart, MAX_LINE_QUANTITY};
use crate::services::toast::{self, Toast};
use crate::state::AppState;

/// HTMX event fired after any cart change.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub slug: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub count: u32,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &LocalCart, images: &ImageCdn) -> Self {
        Self {
            lines: cart
                .items
                .iter()
                .map(|item| CartLineView {
                    product_id: item.product_id,
                    slug: item.slug.clone(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.price().to_string(),
                    line_total: item.line_total().to_string(),
                    image_url: images.url(item.image.as_deref(), 320),
                })
                .collect(),
            subtotal: cart.subtotal().to_string(),
            count: cart.count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub slug: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub max_quantity: u32,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub max_quantity: u32,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Confirmation shown under the add-to-cart button (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/added_to_cart.html")]
pub struct AddedToCartTemplate {
    pub name: String,
    pub count: u32,
}

/// Inline error fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/form_error.html")]
pub struct FormErrorTemplate {
    pub message: String,
}

fn items_fragment(cart: &LocalCart, images: &ImageCdn) -> Response {
    with_trigger(
        CART_UPDATED_EVENT,
        CartItemsTemplate {
            cart: CartView::new(cart, images),
            max_quantity: MAX_LINE_QUANTITY,
        },
    )
}

/// Display cart page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> impl IntoResponse {
    let cart = CartService::new(state.backend(), &session).load().await;

    CartShowTemplate {
        ctx,
        cart: CartView::new(&cart, state.images()),
        max_quantity: MAX_LINE_QUANTITY,
    }
}

/// Add item to cart (HTMX).
///
/// Returns a confirmation with an HTMX trigger so the header badge
/// refreshes. Plain form posts are redirected to the cart page.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip(state, session, auth, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = form.quantity.unwrap_or(1).clamp(1, MAX_LINE_QUANTITY);

    let product = match state.backend().get_product(&form.slug).await {
        Ok(product) if product.in_stock => product,
        Ok(product) => {
            return Ok(add_failed(
                &session,
                &headers,
                &format!("{} is out of stock.", product.name),
            )
            .await);
        }
        Err(e) => {
            tracing::warn!(slug = %form.slug, error = %e, "Failed to look up product for cart");
            return Ok(add_failed(&session, &headers, "Could not add that item. Please try again.").await);
        }
    };

    let cart = CartService::new(state.backend(), &session)
        .add(auth.as_ref(), CartItem::from_product(&product, quantity))
        .await?;

    let product_id = product.id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));

    if is_htmx(&headers) {
        return Ok(with_trigger(
            CART_UPDATED_EVENT,
            AddedToCartTemplate {
                name: product.name.clone(),
                count: cart.count(),
            },
        ));
    }

    toast::push(&session, Toast::success(format!("Added {} to your cart.", product.name))).await;
    Ok(redirect(&headers, "/cart"))
}

async fn add_failed(session: &Session, headers: &HeaderMap, message: &str) -> Response {
    if is_htmx(headers) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            FormErrorTemplate {
                message: message.to_string(),
            },
        )
            .into_response();
    }
    toast::push(session, Toast::error(message)).await;
    redirect(headers, "/cart")
}

/// Update cart item quantity (HTMX). Quantity `0` removes the line.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip(state, session, auth, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let cart = CartService::new(state.backend(), &session)
        .set_quantity(auth.as_ref(), form.product_id, form.quantity)
        .await?;

    if is_htmx(&headers) {
        return Ok(items_fragment(&cart, state.images()));
    }
    Ok(redirect(&headers, "/cart"))
}

/// Remove item from cart (HTMX).
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip(state, session, auth, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let cart = CartService::new(state.backend(), &session)
        .remove(auth.as_ref(), form.product_id)
        .await?;

    if is_htmx(&headers) {
        return Ok(items_fragment(&cart, state.images()));
    }
    Ok(redirect(&headers, "/cart"))
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    headers: HeaderMap,
) -> Result<Response> {
    let cart = CartService::new(state.backend(), &session)
        .clear(auth.as_ref())
        .await?;

    if is_htmx(&headers) {
        return Ok(items_fragment(&cart, state.images()));
    }
    toast::push(&session, Toast::info("Your cart is empty.")).await;
    Ok(redirect(&headers, "/cart"))
}

/// Get cart count badge (HTMX).
#[instrument(skip_all)]
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: LocalCart::load(&session).await.count(),
    }
}
