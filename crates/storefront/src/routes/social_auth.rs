//! Social login route handlers.
//!
//! OAuth 2.0 authorization-code flow against the configured identity
//! provider. The provider's `id_token` is exchanged with the backend for
//! storefront tokens, after which the user is signed in like any other.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::services::auth;
use crate::services::oauth::{OAuthError, random_token, verify_nonce};
use crate::services::toast::{self, Toast};
use crate::state::AppState;

/// Length of the generated `state` and `nonce` values.
const OAUTH_TOKEN_LENGTH: usize = 32;

/// Query parameters from the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

fn redirect_uri(state: &AppState) -> String {
    format!("{}/auth/social/callback", state.config().base_url)
}

/// Start social login.
///
/// Generates `state` and `nonce`, stores them in the session, and redirects
/// to the provider's authorization page.
///
/// # Errors
///
/// Returns 404 when social login is not configured.
#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, session: Session) -> Result<Response> {
    let Some(provider) = state.identity_provider() else {
        return Err(AppError::NotFound("social login".to_string()));
    };

    let oauth_state = random_token(OAUTH_TOKEN_LENGTH);
    let nonce = random_token(OAUTH_TOKEN_LENGTH);
    session.insert(session_keys::OAUTH_STATE, &oauth_state).await?;
    session.insert(session_keys::OAUTH_NONCE, &nonce).await?;

    let url = provider.authorization_url(&redirect_uri(&state), &oauth_state, &nonce);
    Ok(Redirect::to(&url).into_response())
}

/// Handle the provider callback.
///
/// Failures send the visitor back to the login page with a toast.
///
/// # Errors
///
/// Returns 404 when social login is not configured, or an error if the
/// session store fails.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    let Some(provider) = state.identity_provider() else {
        return Err(AppError::NotFound("social login".to_string()));
    };

    // One-time use, whatever the outcome.
    let stored_state = session.remove::<String>(session_keys::OAUTH_STATE).await?;
    let stored_nonce = session.remove::<String>(session_keys::OAUTH_NONCE).await?;

    let id_token = match exchange(&state, provider, query, stored_state, stored_nonce).await {
        Ok(id_token) => id_token,
        Err(e) => {
            tracing::warn!(error = %e, "Social login failed");
            toast::push(&session, Toast::error("Social sign-in failed, please try again.")).await;
            return Ok(Redirect::to("/auth/login").into_response());
        }
    };

    let response = match state
        .backend()
        .social_login(provider.provider(), &id_token)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Backend rejected social login");
            toast::push(
                &session,
                Toast::error("We could not sign you in with that account."),
            )
            .await;
            return Ok(Redirect::to("/auth/login").into_response());
        }
    };

    let auth = auth::sign_in(&session, state.backend(), response).await?;
    toast::push(
        &session,
        Toast::success(format!("Welcome, {}!", auth.user.display_name)),
    )
    .await;

    Ok(Redirect::to("/account").into_response())
}

/// Validate the callback and trade the code for an `id_token`.
async fn exchange(
    state: &AppState,
    provider: &crate::services::IdentityProvider,
    query: CallbackQuery,
    stored_state: Option<String>,
    stored_nonce: Option<String>,
) -> std::result::Result<String, OAuthError> {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        return Err(OAuthError::Provider(format!("{error} {description}").trim().to_string()));
    }

    match (query.state, stored_state) {
        (Some(returned), Some(stored)) if returned == stored => {}
        _ => return Err(OAuthError::StateMismatch),
    }

    let code = query
        .code
        .ok_or_else(|| OAuthError::Provider("missing code".to_string()))?;
    let id_token = provider.exchange_code(&code, &redirect_uri(state)).await?;

    let nonce = stored_nonce.ok_or(OAuthError::NonceMismatch)?;
    verify_nonce(&id_token, &nonce)?;

    Ok(id_token)
}
