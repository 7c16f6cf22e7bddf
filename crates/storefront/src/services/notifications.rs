//! Unread notification counter behind the header badge.
//!
//! The badge polls every 30 seconds, so counts are cached per user for the
//! same period. Marking notifications read invalidates the user's entry.

use std::time::Duration;

use moka::future::Cache;
use tracing::warn;

use brewery_core::UserId;

use crate::backend::BackendClient;
use crate::models::SessionAuth;

/// Badge polling interval, also the cache TTL.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// HTMX event fired when the unread count may have changed.
pub const NOTIFICATIONS_UPDATED_EVENT: &str = "notifications-updated";

/// Per-user cache of unread counts.
#[derive(Clone)]
pub struct UnreadCounter {
    cache: Cache<UserId, u32>,
}

impl Default for UnreadCounter {
    fn default() -> Self {
        Self::new(POLL_INTERVAL)
    }
}

impl UnreadCounter {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Unread count for the signed-in user; `0` if the backend fails.
    pub async fn get(&self, backend: &BackendClient, auth: &SessionAuth) -> u32 {
        let user_id = auth.user.id;
        if let Some(count) = self.cache.get(&user_id).await {
            return count;
        }

        match backend.get_unread_count(auth.access()).await {
            Ok(count) => {
                self.cache.insert(user_id, count).await;
                count
            }
            Err(e) => {
                warn!(error = %e, %user_id, "Failed to fetch unread count");
                0
            }
        }
    }

    /// Forget the cached count for a user.
    pub async fn invalidate(&self, user_id: UserId) {
        self.cache.invalidate(&user_id).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::types::AuthTokens;
    use crate::config::BackendConfig;
    use crate::models::CurrentUser;

    fn auth(id: i64) -> SessionAuth {
        SessionAuth {
            user: CurrentUser {
                id: UserId::new(id),
                email: "u@example.com".to_string(),
                display_name: "U".to_string(),
                is_staff: false,
            },
            tokens: AuthTokens {
                access: "a".to_string(),
                refresh: "r".to_string(),
                access_expires_in: 300,
                obtained_at: 0,
            },
        }
    }

    fn unreachable_backend() -> BackendClient {
        BackendClient::new(&BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(200),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_backend_failure_yields_zero() {
        let counter = UnreadCounter::default();
        assert_eq!(counter.get(&unreachable_backend(), &auth(1)).await, 0);
    }

    #[tokio::test]
    async fn test_cached_count_is_served_until_invalidated() {
        let counter = UnreadCounter::default();
        counter.cache.insert(UserId::new(1), 4).await;

        let backend = unreachable_backend();
        assert_eq!(counter.get(&backend, &auth(1)).await, 4);

        counter.invalidate(UserId::new(1)).await;
        assert_eq!(counter.get(&backend, &auth(1)).await, 0);
    }
}
