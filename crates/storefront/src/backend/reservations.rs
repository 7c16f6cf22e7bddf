//! Taproom reservation endpoints.

use reqwest::Method;
use tracing::instrument;

use brewery_core::ReservationId;

use super::{BackendClient, BackendError};
use crate::backend::types::{NewReservation, Page, Reservation};

impl BackendClient {
    /// List the user's reservations.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_reservations(&self, access: &str) -> Result<Page<Reservation>, BackendError> {
        self.send(self.request(Method::GET, "/reservations", Some(access)))
            .await
    }

    /// Book a table.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Api`] if the slot is full.
    #[instrument(skip(self, access))]
    pub async fn create_reservation(
        &self,
        access: &str,
        reservation: &NewReservation,
    ) -> Result<Reservation, BackendError> {
        let request = self
            .request(Method::POST, "/reservations", Some(access))
            .json(reservation);
        self.send(request).await
    }

    /// Cancel a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access))]
    pub async fn cancel_reservation(
        &self,
        access: &str,
        id: ReservationId,
    ) -> Result<Reservation, BackendError> {
        self.send(self.request(
            Method::POST,
            &format!("/reservations/{id}/cancel"),
            Some(access),
        ))
        .await
    }
}
