//! Order and payment endpoints.

use reqwest::Method;
use tracing::instrument;

use brewery_core::{OrderId, PaymentId};

use super::{BackendClient, BackendError};
use crate::backend::types::{NewOrder, NewPayment, Order, Page, Payment};

impl BackendClient {
    /// List the user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access))]
    pub async fn get_orders(&self, access: &str, page: u32) -> Result<Page<Order>, BackendError> {
        let request = self
            .request(Method::GET, "/orders", Some(access))
            .query(&[("page", page.max(1))]);
        self.send(request).await
    }

    /// Get one of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the order is not the user's.
    #[instrument(skip(self, access))]
    pub async fn get_order(&self, access: &str, id: OrderId) -> Result<Order, BackendError> {
        self.send(self.request(Method::GET, &format!("/orders/{id}"), Some(access)))
            .await
    }

    /// Place an order from cart lines.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Api`] if stock or address validation fails.
    #[instrument(skip(self, access, order), fields(lines = order.items.len()))]
    pub async fn create_order(&self, access: &str, order: &NewOrder) -> Result<Order, BackendError> {
        let request = self
            .request(Method::POST, "/orders", Some(access))
            .json(order);
        self.send(request).await
    }

    /// Start a payment for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access))]
    pub async fn create_payment(
        &self,
        access: &str,
        order_id: OrderId,
    ) -> Result<Payment, BackendError> {
        let request = self
            .request(Method::POST, "/payments", Some(access))
            .json(&NewPayment { order_id });
        self.send(request).await
    }

    /// Get a payment's current status.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access))]
    pub async fn get_payment(&self, access: &str, id: PaymentId) -> Result<Payment, BackendError> {
        self.send(self.request(Method::GET, &format!("/payments/{id}"), Some(access)))
            .await
    }
}
