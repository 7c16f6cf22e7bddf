//! Remote cart endpoints for signed-in users.

use reqwest::Method;
use tracing::instrument;

use brewery_core::ProductId;

use super::{BackendClient, BackendError};
use crate::backend::types::{AddCartItem, RemoteCart, UpdateCartItem};

impl BackendClient {
    /// Get the user's remote cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_cart(&self, access: &str) -> Result<RemoteCart, BackendError> {
        self.send(self.request(Method::GET, "/cart", Some(access)))
            .await
    }

    /// Add units of a product. The backend increments an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access))]
    pub async fn add_cart_item(
        &self,
        access: &str,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<RemoteCart, BackendError> {
        let request = self
            .request(Method::POST, "/cart/items", Some(access))
            .json(&AddCartItem {
                product_id,
                quantity,
            });
        self.send(request).await
    }

    /// Set the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access))]
    pub async fn update_cart_item(
        &self,
        access: &str,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<RemoteCart, BackendError> {
        let request = self
            .request(
                Method::PATCH,
                &format!("/cart/items/{product_id}"),
                Some(access),
            )
            .json(&UpdateCartItem { quantity });
        self.send(request).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access))]
    pub async fn remove_cart_item(
        &self,
        access: &str,
        product_id: ProductId,
    ) -> Result<RemoteCart, BackendError> {
        self.send(self.request(
            Method::DELETE,
            &format!("/cart/items/{product_id}"),
            Some(access),
        ))
        .await
    }

    /// Empty the remote cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn clear_cart(&self, access: &str) -> Result<(), BackendError> {
        self.send_empty(self.request(Method::DELETE, "/cart", Some(access)))
            .await
    }
}
