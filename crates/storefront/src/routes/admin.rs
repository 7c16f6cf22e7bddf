//! Staff dashboard route handlers.
//!
//! Every route requires a staff account; the backend checks the same
//! permission on its side.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use brewery_core::{OrderId, OrderStatus, Price, ReservationId, ReservationStatus};

use crate::backend::types::{DashboardStats, Order, Reservation};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireStaff};
use crate::services::toast::{self, Toast};
use crate::state::AppState;
use crate::taproom;

/// Orders list filters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
}

/// Reservations list filters.
#[derive(Debug, Deserialize)]
pub struct ReservationsQuery {
    pub date: Option<String>,
}

/// Status change form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Status filter entry.
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub stats: DashboardStats,
    pub revenue_today: String,
    pub revenue_month: String,
    pub todays_reservations: Vec<Reservation>,
}

/// Orders template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<Order>,
    pub filters: Vec<StatusOption>,
    pub statuses: &'static [OrderStatus],
    pub current_page: u32,
    pub has_previous: bool,
    pub has_next: bool,
    pub status_param: String,
}

/// Reservations template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/reservations.html")]
pub struct ReservationsTemplate {
    pub ctx: PageContext,
    pub reservations: Vec<Reservation>,
    pub statuses: &'static [ReservationStatus],
    pub date: String,
}

fn money(amount: Decimal) -> String {
    Price::usd(amount).to_string()
}

/// Parse an optional, possibly blank, query value.
fn parse_filter<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

/// Display the dashboard.
///
/// # Errors
///
/// Returns an error if the stats cannot be fetched.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn dashboard(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let today = taproom::local_now(&state.config().taproom).date();
    let (stats, reservations) = tokio::join!(
        state.backend().admin_stats(auth.access()),
        state.backend().admin_reservations(auth.access(), Some(today)),
    );
    let stats = stats?;
    let todays_reservations = reservations
        .map(|page| page.results)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch today's reservations");
            Vec::new()
        });

    Ok(DashboardTemplate {
        ctx,
        revenue_today: money(stats.revenue_today),
        revenue_month: money(stats.revenue_month),
        stats,
        todays_reservations,
    })
}

/// List orders, optionally by status.
///
/// # Errors
///
/// Returns an error if the orders cannot be fetched.
#[instrument(skip(auth, state, ctx), fields(user_id = %auth.user.id))]
pub async fn orders(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    let status: Option<OrderStatus> = parse_filter(query.status.as_deref());
    let current_page = query.page.unwrap_or(1).max(1);
    let page = state
        .backend()
        .admin_orders(auth.access(), status, current_page)
        .await?;

    Ok(OrdersTemplate {
        ctx,
        has_previous: page.previous.is_some(),
        has_next: page.next.is_some(),
        orders: page.results,
        filters: OrderStatus::ALL
            .iter()
            .map(|s| StatusOption {
                value: s.as_str(),
                label: s.label(),
                selected: Some(*s) == status,
            })
            .collect(),
        statuses: OrderStatus::ALL,
        current_page,
        status_param: status.map(|s| s.as_str().to_string()).unwrap_or_default(),
    })
}

/// Change an order's status.
///
/// # Errors
///
/// Returns 400 for an unknown status, or an error if the backend fails for
/// a reason other than a refused transition.
#[instrument(skip(auth, state, session), fields(user_id = %auth.user.id))]
pub async fn update_order_status(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let status: OrderStatus = form
        .status
        .parse()
        .map_err(|e| AppError::BadRequest(format!("{e}")))?;

    match state
        .backend()
        .admin_update_order_status(auth.access(), id, status)
        .await
    {
        Ok(order) => {
            tracing::info!(order_id = %id, status = %status, "Order status changed");
            toast::push(
                &session,
                Toast::success(format!("Order {} is now {}.", order.number, status.label())),
            )
            .await;
        }
        Err(e) if e.is_validation() => {
            let message = e.user_message().unwrap_or("That status change is not allowed.");
            toast::push(&session, Toast::error(message)).await;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/admin/orders").into_response())
}

/// List reservations, optionally for one day.
///
/// # Errors
///
/// Returns an error if the reservations cannot be fetched.
#[instrument(skip(auth, state, ctx), fields(user_id = %auth.user.id))]
pub async fn reservations(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<ReservationsQuery>,
) -> Result<impl IntoResponse> {
    let date = query
        .date
        .as_deref()
        .map(str::trim)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
    let page = state
        .backend()
        .admin_reservations(auth.access(), date)
        .await?;

    Ok(ReservationsTemplate {
        ctx,
        reservations: page.results,
        statuses: ReservationStatus::ALL,
        date: date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    })
}

/// Change a reservation's status.
///
/// # Errors
///
/// Returns 400 for an unknown status, or an error if the backend fails for
/// a reason other than a refused transition.
#[instrument(skip(auth, state, session), fields(user_id = %auth.user.id))]
pub async fn update_reservation_status(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ReservationId>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let status: ReservationStatus = form
        .status
        .parse()
        .map_err(|e| AppError::BadRequest(format!("{e}")))?;

    match state
        .backend()
        .admin_update_reservation_status(auth.access(), id, status)
        .await
    {
        Ok(reservation) => {
            tracing::info!(reservation_id = %id, status = %status, "Reservation status changed");
            toast::push(
                &session,
                Toast::success(format!(
                    "Reservation for {} marked {}.",
                    reservation.date.format("%b %-d"),
                    status.label()
                )),
            )
            .await;
        }
        Err(e) if e.is_validation() => {
            let message = e.user_message().unwrap_or("That status change is not allowed.");
            toast::push(&session, Toast::error(message)).await;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/admin/reservations").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_ignores_blank_and_unknown() {
        assert_eq!(
            parse_filter::<OrderStatus>(Some("shipped")),
            Some(OrderStatus::Shipped)
        );
        assert_eq!(parse_filter::<OrderStatus>(Some("  ")), None);
        assert_eq!(parse_filter::<OrderStatus>(Some("lost")), None);
        assert_eq!(parse_filter::<OrderStatus>(None), None);
    }
}
