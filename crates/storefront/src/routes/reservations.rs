//! Taproom reservation route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use brewery_core::ReservationId;

use crate::backend::types::Reservation;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::SessionAuth;
use crate::services::reservations::{
    BOOKING_HORIZON_DAYS, MAX_PARTY_SIZE, MIN_PARTY_SIZE, OpeningHours, ReservationRequest,
    format_time,
};
use crate::services::toast::{self, Toast};
use crate::state::AppState;
use crate::taproom;

/// Reservation form data. Fields arrive as strings so bad input re-renders
/// the form instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct ReservationForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub party_size: String,
    #[serde(default)]
    pub notes: String,
}

impl ReservationForm {
    fn parse(&self) -> std::result::Result<ReservationRequest, String> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| "Please choose a date.".to_string())?;
        let time = NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .map_err(|_| "Please choose a time.".to_string())?;
        let party_size = self
            .party_size
            .trim()
            .parse::<u32>()
            .map_err(|_| "Please enter the number of guests.".to_string())?;

        Ok(ReservationRequest {
            date,
            time,
            party_size,
            notes: Some(self.notes.clone()),
        })
    }
}

/// Time slot option for the form.
pub struct SlotOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Reservations page template.
#[derive(Template, WebTemplate)]
#[template(path = "reservations/index.html")]
pub struct ReservationsTemplate {
    pub ctx: PageContext,
    pub reservations: Vec<Reservation>,
    pub form: ReservationForm,
    pub slots: Vec<SlotOption>,
    pub min_date: String,
    pub max_date: String,
    pub min_party: u32,
    pub max_party: u32,
    pub hours: String,
    pub error: Option<String>,
}

fn opening_hours(state: &AppState) -> OpeningHours {
    let taproom = &state.config().taproom;
    OpeningHours {
        opens: taproom.opens,
        closes: taproom.closes,
    }
}

async fn render(
    state: &AppState,
    auth: &SessionAuth,
    ctx: PageContext,
    form: ReservationForm,
    error: Option<String>,
) -> ReservationsTemplate {
    let reservations = match state.backend().get_reservations(auth.access()).await {
        Ok(page) => page.results,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch reservations");
            Vec::new()
        }
    };

    let hours = opening_hours(state);
    let slots = hours
        .slots()
        .into_iter()
        .map(|slot| {
            let value = slot.format("%H:%M").to_string();
            SlotOption {
                selected: value == form.time,
                label: format_time(slot),
                value,
            }
        })
        .collect();

    let today = taproom::local_now(&state.config().taproom).date();
    ReservationsTemplate {
        ctx,
        reservations,
        form,
        slots,
        min_date: today.format("%Y-%m-%d").to_string(),
        max_date: (today + Duration::days(BOOKING_HORIZON_DAYS))
            .format("%Y-%m-%d")
            .to_string(),
        min_party: MIN_PARTY_SIZE,
        max_party: MAX_PARTY_SIZE,
        hours: format!(
            "{} to {}",
            format_time(hours.opens),
            format_time(hours.closes)
        ),
        error,
    }
}

/// Display the booking form and the user's reservations.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn index(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    ctx: PageContext,
) -> impl IntoResponse {
    let form = ReservationForm {
        party_size: "2".to_string(),
        ..ReservationForm::default()
    };
    render(&state, &auth, ctx, form, None).await
}

/// Book a table.
///
/// # Errors
///
/// Returns an error if the backend fails for a reason other than
/// validation.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn create(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<ReservationForm>,
) -> Result<Response> {
    let validated = form.parse().and_then(|request| {
        request
            .validate(taproom::local_now(&state.config().taproom), opening_hours(&state))
            .map_err(|e| e.to_string())
    });

    let reservation = match validated {
        Ok(reservation) => reservation,
        Err(message) => {
            return Ok(render(&state, &auth, ctx, form, Some(message))
                .await
                .into_response());
        }
    };

    match state
        .backend()
        .create_reservation(auth.access(), &reservation)
        .await
    {
        Ok(created) => {
            tracing::info!(reservation_id = %created.id, "Reservation created");
            toast::push(
                &session,
                Toast::success(format!(
                    "Table for {} booked on {} at {}.",
                    created.party_size,
                    created.date.format("%a %b %-d"),
                    format_time(created.time)
                )),
            )
            .await;
            Ok(Redirect::to("/reservations").into_response())
        }
        Err(e) if e.is_validation() => {
            let message = e
                .user_message()
                .unwrap_or("That time is not available.")
                .to_string();
            Ok(render(&state, &auth, ctx, form, Some(message))
                .await
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Cancel a reservation.
///
/// # Errors
///
/// Returns an error if the backend call fails for a reason other than
/// validation.
#[instrument(skip(auth, state, session), fields(user_id = %auth.user.id))]
pub async fn cancel(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ReservationId>,
) -> Result<Response> {
    match state.backend().cancel_reservation(auth.access(), id).await {
        Ok(_) => toast::push(&session, Toast::success("Reservation cancelled.")).await,
        Err(e) if e.is_validation() => {
            let message = e
                .user_message()
                .unwrap_or("That reservation can no longer be cancelled.");
            toast::push(&session, Toast::error(message)).await;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/reservations").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_parse() {
        let form = ReservationForm {
            date: "2026-11-01".to_string(),
            time: "18:30".to_string(),
            party_size: " 4 ".to_string(),
            notes: String::new(),
        };
        let request = form.parse().unwrap();
        assert_eq!(request.party_size, 4);
        assert_eq!(request.time, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
    }

    #[test]
    fn test_form_parse_reports_missing_fields() {
        let form = ReservationForm::default();
        assert_eq!(form.parse().unwrap_err(), "Please choose a date.");
    }
}
