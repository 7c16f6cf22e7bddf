//! One-shot flash messages.
//!
//! Toasts queue in the session and are drained by the next full page render.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A one-shot UI feedback message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }

    /// CSS modifier class for the toast stack.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.level {
            ToastLevel::Success => "toast--success",
            ToastLevel::Info => "toast--info",
            ToastLevel::Warning => "toast--warning",
            ToastLevel::Error => "toast--error",
        }
    }
}

/// Queue a toast for the next page render.
///
/// Session failures are logged; a lost toast never fails the request.
pub async fn push(session: &Session, toast: Toast) {
    let mut toasts: Vec<Toast> = session
        .get(session_keys::TOASTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    toasts.push(toast);

    if let Err(e) = session.insert(session_keys::TOASTS, toasts).await {
        tracing::warn!(error = %e, "Failed to queue toast");
    }
}

/// Remove and return every queued toast.
pub async fn drain(session: &Session) -> Vec<Toast> {
    match session.remove::<Vec<Toast>>(session_keys::TOASTS).await {
        Ok(toasts) => toasts.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to drain toasts");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_toasts_drain_once_in_order() {
        let session = session();
        push(&session, Toast::success("Added to cart")).await;
        push(&session, Toast::error("Out of stock")).await;

        let toasts = drain(&session).await;
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0], Toast::success("Added to cart"));
        assert_eq!(toasts[1].level, ToastLevel::Error);

        assert!(drain(&session).await.is_empty());
    }

    #[test]
    fn test_css_class() {
        assert_eq!(Toast::warning("x").css_class(), "toast--warning");
    }
}
