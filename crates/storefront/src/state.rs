//! Application state shared across handlers.

use std::path::Path;
use std::sync::Arc;

use sqlx::PgPool;

use crate::backend::{BackendClient, BackendError};
use crate::config::StorefrontConfig;
use crate::content::{ContentError, ContentStore};
use crate::images::ImageCdn;
use crate::services::{IdentityProvider, TokenRefresher, UnreadCounter};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("content: {0}")]
    Content(#[from] ContentError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the backend client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    backend: BackendClient,
    refresher: TokenRefresher,
    unread: UnreadCounter,
    identity_provider: Option<IdentityProvider>,
    content: ContentStore,
    images: ImageCdn,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool (session store, readiness probe)
    /// * `content_dir` - Directory holding `pages/*.md`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the content
    /// directory cannot be read.
    pub fn new(
        config: StorefrontConfig,
        pool: PgPool,
        content_dir: &Path,
    ) -> Result<Self, StateError> {
        let backend = BackendClient::new(&config.backend)?;
        let refresher = TokenRefresher::new(backend.clone());
        let identity_provider = config.oauth.as_ref().map(IdentityProvider::new);
        let images = ImageCdn::new(&config.images, &config.base_url);
        let content = ContentStore::load(content_dir, &images)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                refresher,
                unread: UnreadCounter::default(),
                identity_provider,
                content,
                images,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the brewery backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the single-flight token refresher.
    #[must_use]
    pub fn refresher(&self) -> &TokenRefresher {
        &self.inner.refresher
    }

    /// Get a reference to the unread notification counter.
    #[must_use]
    pub fn unread(&self) -> &UnreadCounter {
        &self.inner.unread
    }

    /// The social login provider, if configured.
    #[must_use]
    pub fn identity_provider(&self) -> Option<&IdentityProvider> {
        self.inner.identity_provider.as_ref()
    }

    /// Get a reference to the markdown page store.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Get a reference to the image URL builder.
    #[must_use]
    pub fn images(&self) -> &ImageCdn {
        &self.inner.images
    }
}
