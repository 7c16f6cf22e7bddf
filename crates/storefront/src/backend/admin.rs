//! Staff-only endpoints. The backend enforces staff permission.

use chrono::NaiveDate;
use reqwest::Method;
use tracing::instrument;

use brewery_core::{OrderId, OrderStatus, ReservationId, ReservationStatus};

use super::{BackendClient, BackendError};
use crate::backend::types::{DashboardStats, Order, Page, Reservation, StatusUpdate};

impl BackendClient {
    /// Dashboard figures.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Forbidden`] for non-staff tokens.
    #[instrument(skip_all)]
    pub async fn admin_stats(&self, access: &str) -> Result<DashboardStats, BackendError> {
        self.send(self.request(Method::GET, "/admin/stats", Some(access)))
            .await
    }

    /// All orders, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access))]
    pub async fn admin_orders(
        &self,
        access: &str,
        status: Option<OrderStatus>,
        page: u32,
    ) -> Result<Page<Order>, BackendError> {
        let mut params = vec![("page", page.max(1).to_string())];
        if let Some(status) = status {
            params.push(("status", status.as_str().to_string()));
        }
        let request = self
            .request(Method::GET, "/admin/orders", Some(access))
            .query(&params);
        self.send(request).await
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Api`] if the transition is not allowed.
    #[instrument(skip(self, access))]
    pub async fn admin_update_order_status(
        &self,
        access: &str,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, BackendError> {
        let request = self
            .request(Method::PATCH, &format!("/admin/orders/{id}"), Some(access))
            .json(&StatusUpdate { status });
        self.send(request).await
    }

    /// Reservations, optionally for a single day.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access))]
    pub async fn admin_reservations(
        &self,
        access: &str,
        date: Option<NaiveDate>,
    ) -> Result<Page<Reservation>, BackendError> {
        let mut params = Vec::new();
        if let Some(date) = date {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        let request = self
            .request(Method::GET, "/admin/reservations", Some(access))
            .query(&params);
        self.send(request).await
    }

    /// Move a reservation to a new status.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Api`] if the transition is not allowed.
    #[instrument(skip(self, access))]
    pub async fn admin_update_reservation_status(
        &self,
        access: &str,
        id: ReservationId,
        status: ReservationStatus,
    ) -> Result<Reservation, BackendError> {
        let request = self
            .request(
                Method::PATCH,
                &format!("/admin/reservations/{id}"),
                Some(access),
            )
            .json(&StatusUpdate { status });
        self.send(request).await
    }
}
