//! Age verification and cookie consent.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::middleware::age_gate::{is_verified, mark_verified, safe_next};
use crate::models::{CookieConsent, session_keys};
use crate::routes::redirect;
use crate::state::AppState;

/// Where declining visitors are sent.
const DECLINE_URL: &str = "https://www.responsibility.org/";

/// Age gate page template.
#[derive(Template, WebTemplate)]
#[template(path = "age_verification.html")]
pub struct AgeVerificationTemplate {
    pub ctx: PageContext,
    pub min_age: u32,
    pub next: String,
}

/// Query parameters for the age gate.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Age gate form data.
#[derive(Debug, Deserialize)]
pub struct AgeForm {
    /// `yes` to confirm, anything else declines.
    pub answer: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Cookie banner form data.
#[derive(Debug, Deserialize)]
pub struct CookieForm {
    /// `accept` allows analytics cookies; `reject` keeps only essential ones.
    pub choice: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Display the age gate.
#[instrument(skip_all)]
pub async fn age_page(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref()).to_string();
    if is_verified(&session).await {
        return Redirect::to(&next).into_response();
    }

    AgeVerificationTemplate {
        ctx,
        min_age: state.config().legal_drinking_age,
        next,
    }
    .into_response()
}

/// Record the visitor's answer to the age gate.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip_all, fields(answer = %form.answer))]
pub async fn age_submit(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AgeForm>,
) -> Result<Response> {
    if form.answer != "yes" {
        tracing::info!("Visitor declined the age gate");
        return Ok(redirect(&headers, DECLINE_URL));
    }

    mark_verified(&session).await?;
    Ok(redirect(&headers, safe_next(form.next.as_deref())))
}

/// Record the cookie banner answer.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip_all, fields(choice = %form.choice))]
pub async fn cookies(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<CookieForm>,
) -> Result<Response> {
    let analytics = match form.choice.as_str() {
        "accept" => true,
        "reject" => false,
        other => return Err(AppError::BadRequest(format!("unknown choice: {other}"))),
    };

    session
        .insert(
            session_keys::COOKIE_CONSENT,
            CookieConsent {
                analytics,
                decided_at: Utc::now(),
            },
        )
        .await?;

    if crate::routes::is_htmx(&headers) {
        // The banner swaps itself out.
        return Ok(axum::http::StatusCode::OK.into_response());
    }
    Ok(redirect(&headers, safe_next(form.next.as_deref())))
}
