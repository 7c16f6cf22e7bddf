//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur during sign-in, registration and refresh.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] brewery_core::EmailError),

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Required profile field missing.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Date of birth below the legal drinking age.
    #[error("you must be at least {min_age} to create an account")]
    Underage { min_age: u32 },

    /// Access and refresh token both rejected.
    #[error("session expired")]
    SessionExpired,

    /// Backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session store error.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AuthError {
    /// Message safe to show next to the form.
    #[must_use]
    pub fn form_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
            Self::InvalidCredentials => "Invalid email or password.".to_string(),
            Self::WeakPassword(reason) => reason.clone(),
            Self::MissingField(_) | Self::Underage { .. } => self.to_string(),
            Self::SessionExpired => "Your session expired. Please sign in again.".to_string(),
            Self::Backend(e) => e.user_message().map_or_else(
                || "Something went wrong. Please try again.".to_string(),
                ToString::to_string,
            ),
            Self::Session(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}
