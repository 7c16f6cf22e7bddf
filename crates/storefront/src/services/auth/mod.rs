//! Authentication service.
//!
//! Signs users in against the backend token service, keeps the token pair in
//! the session, and refreshes expired access tokens. Refreshes are
//! single-flight per refresh token: concurrent requests from one session
//! share a single `POST /auth/token/refresh`.

mod error;

pub use error::AuthError;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use brewery_core::{Email, is_of_legal_age};

use crate::backend::types::{AuthResponse, AuthTokens};
use crate::backend::{BackendClient, BackendError};
use crate::models::{CurrentUser, SessionAuth, session_keys};
use crate::services::cart::CartService;
use crate::services::toast::{self, Toast};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 128;

/// How long a refresh result is shared with requests still holding the old
/// refresh token.
const REFRESH_SHARE_WINDOW: Duration = Duration::from_secs(30);

// =============================================================================
// Token refresh
// =============================================================================

/// Single-flight access token refresher.
#[derive(Clone)]
pub struct TokenRefresher {
    backend: BackendClient,
    inflight: Cache<String, AuthTokens>,
}

impl TokenRefresher {
    #[must_use]
    pub fn new(backend: BackendClient) -> Self {
        let inflight = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(REFRESH_SHARE_WINDOW)
            .build();
        Self { backend, inflight }
    }

    /// Exchange a refresh token, joining an in-flight exchange for the same
    /// token if there is one. Failures are not cached.
    ///
    /// # Errors
    ///
    /// Returns the backend error shared by every waiter.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, Arc<BackendError>> {
        let backend = self.backend.clone();
        let token = refresh_token.to_string();
        self.inflight
            .try_get_with(refresh_token.to_string(), async move {
                backend.refresh_token(&token).await
            })
            .await
    }
}

/// The signed-in user, without checking token expiry.
pub async fn current_auth(session: &Session) -> Option<SessionAuth> {
    session
        .get::<SessionAuth>(session_keys::AUTH)
        .await
        .ok()
        .flatten()
}

/// The signed-in user with a usable access token, refreshing if needed.
///
/// A failed refresh signs the user out, queues a toast and yields `None`.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
#[instrument(skip_all)]
pub async fn ensure_fresh(
    session: &Session,
    refresher: &TokenRefresher,
) -> Result<Option<SessionAuth>, tower_sessions::session::Error> {
    let Some(mut auth) = session.get::<SessionAuth>(session_keys::AUTH).await? else {
        return Ok(None);
    };

    if !auth.tokens.is_expired() {
        return Ok(Some(auth));
    }

    match refresher.refresh(&auth.tokens.refresh).await {
        Ok(tokens) => {
            auth.tokens = tokens;
            session.insert(session_keys::AUTH, &auth).await?;
            tracing::debug!(user_id = %auth.user.id, "Access token refreshed");
            Ok(Some(auth))
        }
        Err(e) => {
            warn!(error = %e, user_id = %auth.user.id, "Token refresh failed, signing out");
            session.remove::<SessionAuth>(session_keys::AUTH).await?;
            sentry::configure_scope(|scope| scope.set_user(None));
            toast::push(
                session,
                Toast::warning(AuthError::SessionExpired.form_message()),
            )
            .await;
            Ok(None)
        }
    }
}

// =============================================================================
// Sign in / out
// =============================================================================

/// Store a successful login in the session and merge the guest cart.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip_all, fields(user_id = %response.user.id))]
pub async fn sign_in(
    session: &Session,
    backend: &BackendClient,
    response: AuthResponse,
) -> Result<SessionAuth, AuthError> {
    // New session ID on privilege change.
    session.cycle_id().await?;

    let auth = SessionAuth {
        user: CurrentUser::from(&response.user),
        tokens: response.tokens,
    };
    session.insert(session_keys::AUTH, &auth).await?;

    CartService::new(backend, session)
        .merge_on_login(&auth)
        .await?;

    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(auth.user.id.to_string()),
            email: Some(auth.user.email.clone()),
            ..Default::default()
        }));
    });
    info!("User signed in");

    Ok(auth)
}

/// Sign out: revoke the refresh token and drop account state from the session.
///
/// Age verification and cookie consent survive sign-out.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip_all)]
pub async fn sign_out(session: &Session, backend: &BackendClient) -> Result<(), AuthError> {
    if let Some(auth) = current_auth(session).await {
        if let Err(e) = backend.logout(&auth.tokens).await {
            warn!(error = %e, "Backend logout failed");
        }
        info!(user_id = %auth.user.id, "User signed out");
    }

    session.remove_value(session_keys::AUTH).await?;
    session.remove_value(session_keys::CART).await?;
    session.remove_value(session_keys::PENDING_ORDER).await?;
    session.remove_value(session_keys::SAVED_ADDRESSES).await?;
    session.cycle_id().await?;

    sentry::configure_scope(|scope| scope.set_user(None));
    Ok(())
}

/// Map a login failure: 401/400 from the backend means bad credentials.
#[must_use]
pub fn login_error(error: BackendError) -> AuthError {
    match error {
        BackendError::Unauthorized | BackendError::Api { status: 400, .. } => {
            AuthError::InvalidCredentials
        }
        other => AuthError::Backend(other),
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Check password length bounds.
///
/// # Errors
///
/// Returns [`AuthError::WeakPassword`] describing the failed rule.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Registration form input.
#[derive(Debug)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub date_of_birth: Option<NaiveDate>,
}

impl Registration<'_> {
    /// Validate the form, returning the parsed email and date of birth.
    ///
    /// # Errors
    ///
    /// Returns the first failed rule.
    pub fn validate(&self, today: NaiveDate, min_age: u32) -> Result<(Email, NaiveDate), AuthError> {
        let email = Email::parse(self.email)?;
        if self.first_name.trim().is_empty() {
            return Err(AuthError::MissingField("First name"));
        }
        validate_password(self.password)?;
        if self.password != self.password_confirm {
            return Err(AuthError::WeakPassword("Passwords do not match".to_string()));
        }
        let date_of_birth = self
            .date_of_birth
            .ok_or(AuthError::MissingField("Date of birth"))?;
        if !is_of_legal_age(date_of_birth, today, min_age) {
            return Err(AuthError::Underage { min_age });
        }
        Ok((email, date_of_birth))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn registration(dob: Option<NaiveDate>) -> Registration<'static> {
        Registration {
            email: "Ada@Example.COM",
            password: "hunter2hunter2",
            password_confirm: "hunter2hunter2",
            first_name: "Ada",
            last_name: "Lovelace",
            date_of_birth: dob,
        }
    }

    #[test]
    fn test_password_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_registration_accepts_adult() {
        let (email, dob) = registration(Some(date(1990, 1, 1)))
            .validate(date(2026, 10, 19), 21)
            .unwrap();
        assert_eq!(email.as_str(), "Ada@example.com");
        assert_eq!(dob, date(1990, 1, 1));
    }

    #[test]
    fn test_registration_rejects_underage() {
        let err = registration(Some(date(2006, 10, 20)))
            .validate(date(2026, 10, 19), 21)
            .unwrap_err();
        assert!(matches!(err, AuthError::Underage { min_age: 21 }));
    }

    #[test]
    fn test_registration_requires_dob_and_matching_passwords() {
        let err = registration(None)
            .validate(date(2026, 10, 19), 21)
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingField("Date of birth")));

        let mut form = registration(Some(date(1990, 1, 1)));
        form.password_confirm = "different-password";
        assert!(matches!(
            form.validate(date(2026, 10, 19), 21),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_login_error_mapping() {
        assert!(matches!(
            login_error(BackendError::Unauthorized),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            login_error(BackendError::RateLimited(3)),
            AuthError::Backend(BackendError::RateLimited(3))
        ));
    }
}
