//! Checkout: shipping address, order creation, payment handoff.
//!
//! The backend creates the order and a payment intent; the browser confirms
//! the payment with the processor's client-side elements (`checkout.js`)
//! using the intent's client secret, then returns to `/checkout/complete`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use brewery_core::PaymentStatus;

use crate::backend::types::{AddCartItem, NewOrder, Order};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::{PendingOrder, session_keys};
use crate::routes::cart::CartView;
use crate::services::addresses::{self, AddressForm, SHIPPING_COUNTRIES};
use crate::services::cart::{CartService, LocalCart};
use crate::services::toast::{self, Toast};
use crate::state::AppState;

const MAX_ORDER_NOTES_LENGTH: usize = 500;

/// Checkout form data: shipping address plus order options.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(flatten)]
    pub address: AddressForm,
    #[serde(default)]
    pub notes: String,
    /// Checkbox: remember the address for next time.
    #[serde(default)]
    pub save_address: Option<String>,
}

/// Address step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/address.html")]
pub struct AddressStepTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub form: AddressForm,
    pub notes: String,
    pub saved: Vec<AddressForm>,
    pub countries: &'static [(&'static str, &'static str)],
    pub errors: Vec<String>,
}

/// Payment step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentStepTemplate {
    pub ctx: PageContext,
    pub order: Order,
    pub publishable_key: Option<String>,
    pub client_secret: String,
    pub return_url: String,
}

/// Completion template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CompleteTemplate {
    pub ctx: PageContext,
    pub number: String,
    pub order: Option<Order>,
    pub status: PaymentStatus,
}

impl CompleteTemplate {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == PaymentStatus::Succeeded
    }

    #[must_use]
    pub fn processing(&self) -> bool {
        self.status == PaymentStatus::Processing
    }
}

/// Display the shipping address step.
///
/// An empty cart goes back to the cart page.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn address_step(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> Response {
    let cart = LocalCart::load(&session).await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let saved: Vec<AddressForm> = addresses::load(&session)
        .await
        .iter()
        .map(AddressForm::from)
        .collect();
    let form = saved.first().cloned().unwrap_or_default();

    AddressStepTemplate {
        ctx,
        cart: CartView::new(&cart, state.images()),
        form,
        notes: String::new(),
        saved,
        countries: &SHIPPING_COUNTRIES,
        errors: Vec::new(),
    }
    .into_response()
}

/// Create the order and payment, then show the payment step.
///
/// # Errors
///
/// Returns an error if the backend rejects the order for a reason other
/// than validation, or the session cannot be written.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn place_order(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = LocalCart::load(&session).await;
    if cart.is_empty() {
        toast::push(&session, Toast::info("Your cart is empty.")).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let notes = form.notes.trim().to_string();
    let (address, mut errors) = match form.address.validate() {
        Ok(address) => (Some(address), Vec::new()),
        Err(errors) => (None, errors),
    };
    if notes.chars().count() > MAX_ORDER_NOTES_LENGTH {
        errors.push(format!(
            "Order notes must be at most {MAX_ORDER_NOTES_LENGTH} characters"
        ));
    }

    let Some(address) = address.filter(|_| errors.is_empty()) else {
        return Ok(address_error(&state, &session, ctx, &cart, form.address, notes, errors).await);
    };

    let new_order = NewOrder {
        items: cart
            .items
            .iter()
            .map(|item| AddCartItem {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
        shipping_address: address.clone(),
        notes: (!notes.is_empty()).then_some(notes.clone()),
    };

    let order = match state.backend().create_order(auth.access(), &new_order).await {
        Ok(order) => order,
        Err(e) if e.is_validation() => {
            let message = e
                .user_message()
                .unwrap_or("We could not place that order.")
                .to_string();
            return Ok(address_error(
                &state,
                &session,
                ctx,
                &cart,
                form.address,
                notes,
                vec![message],
            )
            .await);
        }
        Err(e) => return Err(e.into()),
    };

    if form.save_address.is_some() {
        addresses::save(&session, address).await?;
    }

    let payment = state
        .backend()
        .create_payment(auth.access(), order.id)
        .await?;
    let Some(client_secret) = payment.client_secret.clone() else {
        return Err(AppError::Internal(format!(
            "payment {} for order {} has no client secret",
            payment.id, order.id
        )));
    };

    session
        .insert(
            session_keys::PENDING_ORDER,
            PendingOrder {
                order_id: order.id,
                number: order.number.clone(),
                payment_id: payment.id,
            },
        )
        .await?;

    add_breadcrumb(
        "checkout",
        "Order created",
        Some(&[("order_number", order.number.as_str())]),
    );
    tracing::info!(order_id = %order.id, payment_id = %payment.id, "Order awaiting payment");

    Ok(PaymentStepTemplate {
        ctx,
        order,
        publishable_key: state.config().payments.publishable_key.clone(),
        client_secret,
        return_url: format!("{}/checkout/complete", state.config().base_url),
    }
    .into_response())
}

async fn address_error(
    state: &AppState,
    session: &Session,
    ctx: PageContext,
    cart: &LocalCart,
    form: AddressForm,
    notes: String,
    errors: Vec<String>,
) -> Response {
    let saved = addresses::load(session)
        .await
        .iter()
        .map(AddressForm::from)
        .collect();

    AddressStepTemplate {
        ctx,
        cart: CartView::new(cart, state.images()),
        form,
        notes,
        saved,
        countries: &SHIPPING_COUNTRIES,
        errors,
    }
    .into_response()
}

/// Show the payment result for the pending order.
///
/// A successful (or still processing) payment empties the cart.
///
/// # Errors
///
/// Returns an error if the payment status cannot be fetched.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn complete(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> Result<Response> {
    let Some(pending) = session
        .get::<PendingOrder>(session_keys::PENDING_ORDER)
        .await?
    else {
        return Ok(Redirect::to("/account/orders").into_response());
    };

    let payment = state
        .backend()
        .get_payment(auth.access(), pending.payment_id)
        .await?;

    if payment.status.is_success() {
        CartService::new(state.backend(), &session)
            .clear(Some(&auth))
            .await?;
        session
            .remove::<PendingOrder>(session_keys::PENDING_ORDER)
            .await?;
        tracing::info!(order_id = %pending.order_id, status = %payment.status, "Checkout complete");
    } else {
        tracing::warn!(order_id = %pending.order_id, status = %payment.status, "Payment not completed");
    }

    let order = match state.backend().get_order(auth.access(), pending.order_id).await {
        Ok(order) => Some(order),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch completed order");
            None
        }
    };

    Ok(CompleteTemplate {
        ctx,
        number: pending.number,
        order,
        status: payment.status,
    }
    .into_response())
}
