//! Newsletter subscription route handlers.
//!
//! The footer form posts here via HTMX and swaps in the returned fragment.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use brewery_core::Email;

use crate::backend::BackendError;
use crate::state::AppState;

/// Newsletter subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    pub email: String,
}

/// Success fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_success.html")]
pub struct SubscribeSuccessTemplate {
    pub email: String,
}

/// Error fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_error.html")]
pub struct SubscribeErrorTemplate {
    pub message: String,
    pub email: String,
}

/// Whether the backend refused because the address is already subscribed.
fn already_subscribed(error: &BackendError) -> bool {
    error.user_message().is_some_and(|message| {
        let message = message.to_lowercase();
        message.contains("already subscribed") || message.contains("already exists")
    })
}

/// Subscribe to the newsletter (HTMX).
///
/// An address that is already on the list is reported as a success.
#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    Form(form): Form<SubscribeForm>,
) -> impl IntoResponse {
    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(_) => {
            return SubscribeErrorTemplate {
                message: "Please enter a valid email address.".to_string(),
                email: form.email.trim().to_string(),
            }
            .into_response();
        }
    };

    match state.backend().subscribe_newsletter(email.as_str()).await {
        Ok(()) => {
            tracing::info!("Newsletter subscription successful");
            SubscribeSuccessTemplate {
                email: email.as_str().to_string(),
            }
            .into_response()
        }
        Err(e) if already_subscribed(&e) => SubscribeSuccessTemplate {
            email: email.as_str().to_string(),
        }
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Newsletter subscription failed");
            SubscribeErrorTemplate {
                message: "Something went wrong. Please try again.".to_string(),
                email: email.as_str().to_string(),
            }
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_subscribed() {
        let dup = BackendError::Api {
            status: 400,
            message: "email: This address is already subscribed.".to_string(),
        };
        assert!(already_subscribed(&dup));

        let other = BackendError::Api {
            status: 400,
            message: "email: Enter a valid email address.".to_string(),
        };
        assert!(!already_subscribed(&other));
        assert!(!already_subscribed(&BackendError::Forbidden));
    }
}
