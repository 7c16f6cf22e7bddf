//! Authentication route handlers.
//!
//! Handles login, registration, logout and password reset against the
//! brewery backend's token API. Social login lives in [`super::social_auth`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use brewery_core::Email;

use crate::backend::types::RegisterRequest;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::middleware::age_gate::safe_next;
use crate::services::auth::{self, AuthError, Registration};
use crate::services::toast::{self, Toast};
use crate::state::AppState;
use crate::taproom;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// `YYYY-MM-DD` from a date input.
    #[serde(default)]
    pub date_of_birth: String,
}

/// Password reset form data.
#[derive(Debug, Deserialize)]
pub struct PasswordResetForm {
    pub email: String,
}

/// Query parameters carrying the post-login destination.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub min_age: u32,
}

/// Password reset page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/password_reset.html")]
pub struct PasswordResetTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub sent_to: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Signed-in users go straight to `next`.
pub async fn login_page(ctx: PageContext, Query(query): Query<NextQuery>) -> Response {
    let next = safe_next(query.next.as_deref()).to_string();
    if ctx.is_signed_in() {
        return Redirect::to(&next).into_response();
    }

    LoginTemplate {
        ctx,
        error: None,
        email: String::new(),
        next,
    }
    .into_response()
}

/// Handle login form submission.
///
/// On success the guest cart is merged into the account cart.
///
/// # Errors
///
/// Returns an error if the session store fails after a successful login.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref()).to_string();
    let rerender = |ctx: PageContext, error: &AuthError, email: String, next: String| {
        LoginTemplate {
            ctx,
            error: Some(error.form_message()),
            email,
            next,
        }
        .into_response()
    };

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => {
            return Ok(rerender(ctx, &AuthError::from(e), form.email, next));
        }
    };

    let response = match state.backend().login(email.as_str(), &form.password).await {
        Ok(response) => response,
        Err(e) => {
            let error = auth::login_error(e);
            tracing::warn!(error = %error, "Login failed");
            return Ok(rerender(ctx, &error, email.to_string(), next));
        }
    };

    let auth = auth::sign_in(&session, state.backend(), response).await?;
    toast::push(
        &session,
        Toast::success(format!("Welcome back, {}!", auth.user.display_name)),
    )
    .await;

    Ok(Redirect::to(&next).into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(State(state): State<AppState>, ctx: PageContext) -> Response {
    if ctx.is_signed_in() {
        return Redirect::to("/account").into_response();
    }

    RegisterTemplate {
        ctx,
        error: None,
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
        date_of_birth: String::new(),
        min_age: state.config().legal_drinking_age,
    }
    .into_response()
}

/// Handle registration form submission.
///
/// Checks the password rules and the legal drinking age before calling the
/// backend, then signs the new user in.
///
/// # Errors
///
/// Returns an error if the session store fails after registering.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let min_age = state.config().legal_drinking_age;
    let date_of_birth = NaiveDate::parse_from_str(form.date_of_birth.trim(), "%Y-%m-%d").ok();

    let registration = Registration {
        email: &form.email,
        password: &form.password,
        password_confirm: &form.password_confirm,
        first_name: &form.first_name,
        last_name: &form.last_name,
        date_of_birth,
    };

    let today = taproom::local_now(&state.config().taproom).date();
    let result = match registration.validate(today, min_age) {
        Ok((email, date_of_birth)) => state
            .backend()
            .register(&RegisterRequest {
                email: email.as_str(),
                password: &form.password,
                first_name: form.first_name.trim(),
                last_name: form.last_name.trim(),
                date_of_birth,
            })
            .await
            .map_err(AuthError::from),
        Err(e) => Err(e),
    };

    let response = match result {
        Ok(response) => response,
        Err(error) => {
            tracing::info!(error = %error, "Registration rejected");
            return Ok(RegisterTemplate {
                ctx,
                error: Some(error.form_message()),
                email: form.email,
                first_name: form.first_name,
                last_name: form.last_name,
                date_of_birth: form.date_of_birth,
                min_age,
            }
            .into_response());
        }
    };

    let auth = auth::sign_in(&session, state.backend(), response).await?;
    toast::push(
        &session,
        Toast::success(format!("Welcome to the brewery, {}!", auth.user.display_name)),
    )
    .await;

    Ok(Redirect::to("/account").into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Response> {
    auth::sign_out(&session, state.backend()).await?;
    toast::push(&session, Toast::info("You have been signed out.")).await;
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Password Reset
// =============================================================================

/// Display the password reset page.
pub async fn password_reset_page(ctx: PageContext) -> impl IntoResponse {
    PasswordResetTemplate {
        ctx,
        error: None,
        sent_to: None,
    }
}

/// Request a password reset email.
///
/// Always reports success for a well-formed address so the form does not
/// reveal which emails have accounts.
#[instrument(skip_all)]
pub async fn password_reset(
    State(state): State<AppState>,
    ctx: PageContext,
    Form(form): Form<PasswordResetForm>,
) -> impl IntoResponse {
    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => {
            return PasswordResetTemplate {
                ctx,
                error: Some(AuthError::from(e).form_message()),
                sent_to: None,
            };
        }
    };

    if let Err(e) = state.backend().request_password_reset(email.as_str()).await {
        tracing::warn!(error = %e, "Password reset request failed");
    }

    PasswordResetTemplate {
        ctx,
        error: None,
        sent_to: Some(email.to_string()),
    }
}
