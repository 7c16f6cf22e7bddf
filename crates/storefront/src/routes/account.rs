//! Account route handlers.
//!
//! All routes require a signed-in user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use brewery_core::OrderId;

use crate::backend::BackendError;
use crate::backend::types::{Order, ProfileUpdate, User};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::{CurrentUser, session_keys};
use crate::services::addresses::{self, AddressForm, SHIPPING_COUNTRIES};
use crate::services::toast::{self, Toast};
use crate::state::AppState;

/// Orders shown on the account overview.
const RECENT_ORDERS: usize = 3;

const MAX_NAME_LENGTH: usize = 80;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
}

impl ProfileForm {
    fn validate(&self) -> std::result::Result<ProfileUpdate, String> {
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err("First name is required.".to_string());
        }
        if first_name.chars().count() > MAX_NAME_LENGTH
            || self.last_name.trim().chars().count() > MAX_NAME_LENGTH
        {
            return Err(format!("Names must be at most {MAX_NAME_LENGTH} characters."));
        }
        let phone = self.phone.trim();
        if !phone.is_empty()
            && !phone
                .chars()
                .all(|c| c.is_ascii_digit() || " +-().".contains(c))
        {
            return Err("Please enter a valid phone number.".to_string());
        }

        Ok(ProfileUpdate {
            first_name: Some(first_name.to_string()),
            last_name: Some(self.last_name.trim().to_string()),
            phone: Some(phone.to_string()),
        })
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Account overview template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub ctx: PageContext,
    pub user: User,
    /// Most recent orders only.
    pub orders: Vec<Order>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<Order>,
    pub current_page: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub ctx: PageContext,
    pub order: Order,
}

/// Saved addresses template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub ctx: PageContext,
    pub addresses: Vec<AddressForm>,
    pub form: AddressForm,
    pub countries: &'static [(&'static str, &'static str)],
    pub errors: Vec<String>,
}

/// Display account overview.
///
/// # Errors
///
/// Returns an error if the profile cannot be fetched.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn index(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let (user, orders) = tokio::join!(
        state.backend().get_me(auth.access()),
        state.backend().get_orders(auth.access(), 1),
    );
    let user = user?;
    let orders = match orders {
        Ok(page) => page.results.into_iter().take(RECENT_ORDERS).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch recent orders");
            Vec::new()
        }
    };

    Ok(AccountIndexTemplate {
        ctx,
        user,
        orders,
    })
}

/// Update the profile.
///
/// # Errors
///
/// Returns an error if the backend fails for a reason other than
/// validation, or the session cannot be written.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn update_profile(
    RequireAuth(mut auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let update = match form.validate() {
        Ok(update) => update,
        Err(message) => {
            toast::push(&session, Toast::error(message)).await;
            return Ok(Redirect::to("/account").into_response());
        }
    };

    match state.backend().update_me(auth.access(), &update).await {
        Ok(user) => {
            auth.user = CurrentUser::from(&user);
            session.insert(session_keys::AUTH, &auth).await?;
            toast::push(&session, Toast::success("Profile updated.")).await;
        }
        Err(e) if e.is_validation() => {
            let message = e.user_message().unwrap_or("Could not update your profile.");
            toast::push(&session, Toast::error(message)).await;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/account").into_response())
}

/// Display order history.
///
/// # Errors
///
/// Returns an error if the orders cannot be fetched.
#[instrument(skip(auth, state, ctx), fields(user_id = %auth.user.id))]
pub async fn orders(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let current_page = query.page.unwrap_or(1).max(1);
    let page = state
        .backend()
        .get_orders(auth.access(), current_page)
        .await?;

    Ok(OrdersTemplate {
        ctx,
        has_previous: page.previous.is_some(),
        has_next: page.next.is_some(),
        orders: page.results,
        current_page,
    })
}

/// Display a single order.
///
/// # Errors
///
/// Returns 404 if the order doesn't exist or belongs to someone else.
#[instrument(skip(auth, state, ctx), fields(user_id = %auth.user.id))]
pub async fn order(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = state
        .backend()
        .get_order(auth.access(), id)
        .await
        .map_err(|e| match e {
            BackendError::NotFound(_) | BackendError::Forbidden => {
                AppError::NotFound(format!("order {id}"))
            }
            other => AppError::Backend(other),
        })?;

    Ok(OrderTemplate { ctx, order })
}

/// Display saved addresses.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn addresses(
    RequireAuth(auth): RequireAuth,
    session: Session,
    ctx: PageContext,
) -> impl IntoResponse {
    AddressesTemplate {
        ctx,
        addresses: address_book(&session).await,
        form: AddressForm::default(),
        countries: &SHIPPING_COUNTRIES,
        errors: Vec::new(),
    }
}

async fn address_book(session: &Session) -> Vec<AddressForm> {
    addresses::load(session)
        .await
        .iter()
        .map(AddressForm::from)
        .collect()
}

/// Save an address.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn save_address(
    RequireAuth(auth): RequireAuth,
    session: Session,
    ctx: PageContext,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    match form.validate() {
        Ok(address) => {
            addresses::save(&session, address).await?;
            toast::push(&session, Toast::success("Address saved.")).await;
            Ok(Redirect::to("/account/addresses").into_response())
        }
        Err(errors) => Ok(AddressesTemplate {
            ctx,
            addresses: address_book(&session).await,
            form,
            countries: &SHIPPING_COUNTRIES,
            errors,
        }
        .into_response()),
    }
}

/// Delete a saved address.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip(auth, session), fields(user_id = %auth.user.id))]
pub async fn delete_address(
    RequireAuth(auth): RequireAuth,
    session: Session,
    Path(index): Path<usize>,
) -> Result<Response> {
    if addresses::delete(&session, index).await? {
        toast::push(&session, Toast::success("Address removed.")).await;
    }
    Ok(Redirect::to("/account/addresses").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(first: &str, phone: &str) -> ProfileForm {
        ProfileForm {
            first_name: first.to_string(),
            last_name: " Lovelace ".to_string(),
            phone: phone.to_string(),
        }
    }

    #[test]
    fn test_profile_form_trims() {
        let update = form(" Ada ", "+1 (503) 555-0100").validate().unwrap();
        assert_eq!(update.first_name.as_deref(), Some("Ada"));
        assert_eq!(update.last_name.as_deref(), Some("Lovelace"));
    }

    #[test]
    fn test_profile_form_rejects_blank_name_and_bad_phone() {
        assert!(form("  ", "").validate().is_err());
        assert!(form("Ada", "call me").validate().is_err());
    }
}
