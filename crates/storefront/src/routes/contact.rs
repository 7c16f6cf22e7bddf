//! Contact form route handlers.
//!
//! Messages are forwarded to the backend, which routes them to the team.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use brewery_core::Email;

use crate::backend::types::ContactMessage;
use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;

const MAX_NAME: usize = 100;
const MAX_SUBJECT: usize = 150;
const MAX_MESSAGE: usize = 5000;

/// Contact form data.
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    /// Validate and trim into the message sent to the backend.
    ///
    /// # Errors
    ///
    /// Returns a message suitable for display next to the form.
    pub fn validate(&self) -> Result<ContactMessage, String> {
        let name = self.name.trim();
        let subject = self.subject.trim();
        let message = self.message.trim();

        if name.is_empty() || message.is_empty() {
            return Err("Name and message are required.".to_string());
        }
        if name.chars().count() > MAX_NAME {
            return Err(format!("Name must be at most {MAX_NAME} characters."));
        }
        if subject.chars().count() > MAX_SUBJECT {
            return Err(format!("Subject must be at most {MAX_SUBJECT} characters."));
        }
        if message.chars().count() > MAX_MESSAGE {
            return Err(format!("Message must be at most {MAX_MESSAGE} characters."));
        }
        let email = Email::parse(&self.email).map_err(|_| "Please enter a valid email address.")?;

        Ok(ContactMessage {
            name: name.to_string(),
            email: email.as_str().to_string(),
            subject: if subject.is_empty() {
                "General enquiry".to_string()
            } else {
                subject.to_string()
            },
            message: message.to_string(),
        })
    }
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub ctx: PageContext,
    pub form: ContactForm,
    pub error: Option<String>,
    pub sent: bool,
}

/// Display the contact form, prefilled for signed-in users.
#[instrument(skip_all)]
pub async fn show(ctx: PageContext) -> impl IntoResponse {
    let form = ctx
        .user
        .as_ref()
        .map(|user| ContactForm {
            name: user.display_name.clone(),
            email: user.email.clone(),
            ..ContactForm::default()
        })
        .unwrap_or_default();

    ContactTemplate {
        ctx,
        form,
        error: None,
        sent: false,
    }
}

/// Submit the contact form.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    ctx: PageContext,
    Form(form): Form<ContactForm>,
) -> impl IntoResponse {
    let message = match form.validate() {
        Ok(message) => message,
        Err(error) => {
            return ContactTemplate {
                ctx,
                form,
                error: Some(error),
                sent: false,
            };
        }
    };

    match state.backend().send_contact(&message).await {
        Ok(()) => {
            tracing::info!("Contact message sent");
            ContactTemplate {
                ctx,
                form: ContactForm::default(),
                error: None,
                sent: true,
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to send contact message");
            let error = e
                .user_message()
                .unwrap_or("Something went wrong. Please try again.")
                .to_string();
            ContactTemplate {
                ctx,
                form,
                error: Some(error),
                sent: false,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, subject: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_validate_trims_and_defaults_subject() {
        let message = form(" Ada ", "ada@example.com", "  ", " Do you ship kegs? ")
            .validate()
            .unwrap();
        assert_eq!(message.name, "Ada");
        assert_eq!(message.subject, "General enquiry");
        assert_eq!(message.message, "Do you ship kegs?");
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(form("", "ada@example.com", "", "hi").validate().is_err());
        assert!(form("Ada", "ada@example.com", "", "   ").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let err = form("Ada", "not-an-email", "", "hi").validate().unwrap_err();
        assert!(err.contains("valid email"));
    }

    #[test]
    fn test_validate_rejects_long_message() {
        let long = "a".repeat(MAX_MESSAGE + 1);
        assert!(form("Ada", "ada@example.com", "", &long).validate().is_err());
    }
}
