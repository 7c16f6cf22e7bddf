//! Cart held in the session and mirrored against the backend.
//!
//! Guests only ever touch the session copy. For signed-in users every change
//! is applied to the session first and then sent to the backend; the
//! backend's response replaces the mirror, and a failed call leaves the
//! local change in place.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{instrument, warn};

use brewery_core::{Price, ProductId};

use crate::backend::types::{CartItem, RemoteCart};
use crate::backend::{BackendClient, BackendError};
use crate::models::{SessionAuth, session_keys};

/// Upper bound on the quantity of a single line.
pub const MAX_LINE_QUANTITY: u32 = 24;

/// The session cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCart {
    pub items: Vec<CartItem>,
}

impl LocalCart {
    /// Load the cart from the session, empty if absent or unreadable.
    pub async fn load(session: &Session) -> Self {
        session
            .get::<Self>(session_keys::CART)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Store the cart in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::CART, self).await
    }

    /// Add units of a product, incrementing an existing line.
    pub fn add(&mut self, item: CartItem) {
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            line.quantity = line
                .quantity
                .saturating_add(item.quantity)
                .min(MAX_LINE_QUANTITY);
        } else if item.quantity > 0 {
            let quantity = item.quantity.min(MAX_LINE_QUANTITY);
            self.items.push(CartItem { quantity, ..item });
        }
    }

    /// Set a line's quantity; `0` removes it. Returns whether the line existed.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        self.items
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .is_some_and(|line| {
                line.quantity = quantity.min(MAX_LINE_QUANTITY);
                true
            })
    }

    /// Remove a line. Returns whether the line existed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.product_id != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Get a line by product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|line| line.product_id == product_id)
    }

    /// Total number of units.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<RemoteCart> for LocalCart {
    fn from(remote: RemoteCart) -> Self {
        Self {
            items: remote.items,
        }
    }
}

/// Union of the local and remote carts by product.
///
/// A product on both sides takes the remote line as-is. Remote lines come
/// first in remote order, followed by local-only lines in local order, which
/// are also returned separately so they can be pushed to the backend.
#[must_use]
pub fn merge_carts(local: &LocalCart, remote: &RemoteCart) -> (LocalCart, Vec<CartItem>) {
    let local_only: Vec<CartItem> = local
        .items
        .iter()
        .filter(|line| {
            !remote
                .items
                .iter()
                .any(|remote_line| remote_line.product_id == line.product_id)
        })
        .cloned()
        .collect();

    let mut items = remote.items.clone();
    items.extend(local_only.iter().cloned());

    (LocalCart { items }, local_only)
}

// =============================================================================
// CartService
// =============================================================================

/// Cart operations for one request.
pub struct CartService<'a> {
    backend: &'a BackendClient,
    session: &'a Session,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient, session: &'a Session) -> Self {
        Self { backend, session }
    }

    /// The current cart.
    pub async fn load(&self) -> LocalCart {
        LocalCart::load(self.session).await
    }

    /// Add a line (or increment it).
    ///
    /// # Errors
    ///
    /// Returns an error only if the session cannot be written.
    #[instrument(skip(self, auth, item), fields(product_id = %item.product_id, quantity = item.quantity))]
    pub async fn add(
        &self,
        auth: Option<&SessionAuth>,
        item: CartItem,
    ) -> Result<LocalCart, tower_sessions::session::Error> {
        let mut cart = self.load().await;
        let (product_id, quantity) = (item.product_id, item.quantity);
        cart.add(item);
        cart.save(self.session).await?;

        match auth {
            Some(auth) => {
                let remote = self
                    .backend
                    .add_cart_item(auth.access(), product_id, quantity)
                    .await;
                self.reconcile(cart, remote).await
            }
            None => Ok(cart),
        }
    }

    /// Set a line's quantity; `0` removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session cannot be written.
    #[instrument(skip(self, auth))]
    pub async fn set_quantity(
        &self,
        auth: Option<&SessionAuth>,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<LocalCart, tower_sessions::session::Error> {
        if quantity == 0 {
            return self.remove(auth, product_id).await;
        }

        let mut cart = self.load().await;
        cart.set_quantity(product_id, quantity);
        cart.save(self.session).await?;

        match auth {
            Some(auth) => {
                let remote = self
                    .backend
                    .update_cart_item(
                        auth.access(),
                        product_id,
                        quantity.min(MAX_LINE_QUANTITY),
                    )
                    .await;
                self.reconcile(cart, remote).await
            }
            None => Ok(cart),
        }
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session cannot be written.
    #[instrument(skip(self, auth))]
    pub async fn remove(
        &self,
        auth: Option<&SessionAuth>,
        product_id: ProductId,
    ) -> Result<LocalCart, tower_sessions::session::Error> {
        let mut cart = self.load().await;
        cart.remove(product_id);
        cart.save(self.session).await?;

        match auth {
            Some(auth) => {
                let remote = self
                    .backend
                    .remove_cart_item(auth.access(), product_id)
                    .await;
                self.reconcile(cart, remote).await
            }
            None => Ok(cart),
        }
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session cannot be written.
    #[instrument(skip_all)]
    pub async fn clear(
        &self,
        auth: Option<&SessionAuth>,
    ) -> Result<LocalCart, tower_sessions::session::Error> {
        let cart = LocalCart::default();
        cart.save(self.session).await?;

        if let Some(auth) = auth
            && let Err(e) = self.backend.clear_cart(auth.access()).await
        {
            warn!(error = %e, "Failed to clear remote cart, keeping local state");
        }

        Ok(cart)
    }

    /// Merge the session cart into the user's remote cart after sign-in.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session cannot be written.
    #[instrument(skip_all, fields(user_id = %auth.user.id))]
    pub async fn merge_on_login(
        &self,
        auth: &SessionAuth,
    ) -> Result<LocalCart, tower_sessions::session::Error> {
        let local = self.load().await;

        let remote = match self.backend.get_cart(auth.access()).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(error = %e, "Failed to fetch remote cart, keeping local cart");
                return Ok(local);
            }
        };

        let (merged, local_only) = merge_carts(&local, &remote);
        merged.save(self.session).await?;

        let mut pushed: Option<RemoteCart> = None;
        for line in &local_only {
            match self
                .backend
                .add_cart_item(auth.access(), line.product_id, line.quantity)
                .await
            {
                Ok(remote) => pushed = Some(remote),
                Err(e) => {
                    warn!(
                        error = %e,
                        product_id = %line.product_id,
                        "Failed to push local cart line, keeping merged cart"
                    );
                    return Ok(merged);
                }
            }
        }

        match pushed {
            Some(remote) => {
                let cart = LocalCart::from(remote);
                cart.save(self.session).await?;
                Ok(cart)
            }
            None => Ok(merged),
        }
    }

    /// Replace the mirror with the backend's cart, or keep the local change.
    async fn reconcile(
        &self,
        local: LocalCart,
        remote: Result<RemoteCart, BackendError>,
    ) -> Result<LocalCart, tower_sessions::session::Error> {
        match remote {
            Ok(remote) => {
                let cart = LocalCart::from(remote);
                cart.save(self.session).await?;
                Ok(cart)
            }
            Err(e) => {
                warn!(error = %e, "Remote cart update failed, keeping local state");
                Ok(local)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Duration;

    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::BackendConfig;

    fn line(id: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Beer {id}"),
            slug: format!("beer-{id}"),
            unit_price: Decimal::from_str("4.50").unwrap(),
            quantity,
            image: None,
        }
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn unreachable_backend() -> BackendClient {
        BackendClient::new(&BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(200),
        })
        .unwrap()
    }

    #[test]
    fn test_add_increments_existing_line() {
        let mut cart = LocalCart::default();
        cart.add(line(1, 2));
        cart.add(line(2, 1));
        cart.add(line(1, 3));

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 5);
        assert_eq!(cart.count(), 6);
    }

    #[test]
    fn test_quantity_is_capped() {
        let mut cart = LocalCart::default();
        cart.add(line(1, 20));
        cart.add(line(1, 20));
        assert_eq!(cart.count(), MAX_LINE_QUANTITY);

        assert!(cart.set_quantity(ProductId::new(1), 99));
        assert_eq!(cart.count(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = LocalCart::default();
        cart.add(line(1, 2));
        assert!(cart.set_quantity(ProductId::new(1), 0));
        assert!(cart.is_empty());
        assert!(!cart.set_quantity(ProductId::new(1), 3));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_subtotal() {
        let mut cart = LocalCart::default();
        cart.add(line(1, 2));
        cart.add(line(2, 1));
        assert_eq!(cart.subtotal().to_string(), "$13.50");
    }

    #[test]
    fn test_merge_remote_wins_and_orders_lines() {
        let mut local = LocalCart::default();
        local.add(line(3, 1));
        local.add(line(1, 5));
        local.add(line(4, 2));

        let remote = RemoteCart {
            items: vec![line(2, 1), line(1, 2)],
        };

        let (merged, local_only) = merge_carts(&local, &remote);
        let ids: Vec<i64> = merged.items.iter().map(|l| l.product_id.as_i64()).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
        assert_eq!(merged.get(ProductId::new(1)).unwrap().quantity, 2);

        let pushed: Vec<i64> = local_only.iter().map(|l| l.product_id.as_i64()).collect();
        assert_eq!(pushed, vec![3, 4]);
    }

    #[test]
    fn test_merge_with_empty_sides() {
        let local = LocalCart::default();
        let remote = RemoteCart {
            items: vec![line(1, 1)],
        };
        let (merged, local_only) = merge_carts(&local, &remote);
        assert_eq!(merged.items, remote.items);
        assert!(local_only.is_empty());

        let mut local = LocalCart::default();
        local.add(line(5, 2));
        let (merged, local_only) = merge_carts(&local, &RemoteCart::default());
        assert_eq!(merged, local);
        assert_eq!(local_only.len(), 1);
    }

    #[tokio::test]
    async fn test_guest_add_persists_in_session() {
        let backend = unreachable_backend();
        let session = session();
        let service = CartService::new(&backend, &session);

        service.add(None, line(1, 2)).await.unwrap();
        service.add(None, line(1, 1)).await.unwrap();

        let cart = LocalCart::load(&session).await;
        assert_eq!(cart.count(), 3);
    }

    #[tokio::test]
    async fn test_signed_in_update_keeps_local_state_when_backend_fails() {
        use crate::backend::types::AuthTokens;
        use crate::models::CurrentUser;
        use brewery_core::UserId;

        let backend = unreachable_backend();
        let session = session();
        let service = CartService::new(&backend, &session);
        let auth = SessionAuth {
            user: CurrentUser {
                id: UserId::new(1),
                email: "ada@example.com".to_string(),
                display_name: "Ada".to_string(),
                is_staff: false,
            },
            tokens: AuthTokens {
                access: "a".to_string(),
                refresh: "r".to_string(),
                access_expires_in: 300,
                obtained_at: 0,
            },
        };

        let cart = service.add(Some(&auth), line(7, 2)).await.unwrap();
        assert_eq!(cart.count(), 2);
        assert_eq!(LocalCart::load(&session).await.count(), 2);
    }
}
