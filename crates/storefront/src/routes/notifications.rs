//! Notification route handlers.
//!
//! The header badge polls `/notifications/unread-count` and also refreshes
//! on the `notifications-updated` HTMX event, which the read endpoints fire.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use brewery_core::NotificationId;

use crate::backend::types::Notification;
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext, RequireAuth};
use crate::routes::{is_htmx, redirect, with_trigger};
use crate::services::notifications::{NOTIFICATIONS_UPDATED_EVENT, POLL_INTERVAL};
use crate::state::AppState;

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Notifications page template.
#[derive(Template, WebTemplate)]
#[template(path = "notifications/index.html")]
pub struct NotificationsTemplate {
    pub ctx: PageContext,
    pub notifications: Vec<Notification>,
    pub current_page: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl NotificationsTemplate {
    #[must_use]
    pub fn has_unread(&self) -> bool {
        self.notifications.iter().any(|n| !n.is_read)
    }
}

/// Unread badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/notification_badge.html")]
pub struct NotificationBadgeTemplate {
    pub signed_in: bool,
    pub count: u32,
    pub poll_secs: u64,
}

/// List notifications.
///
/// Backend failures render an empty list.
#[instrument(skip(auth, state, ctx), fields(user_id = %auth.user.id))]
pub async fn index(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let current_page = query.page.unwrap_or(1).max(1);
    let (notifications, has_previous, has_next) = match state
        .backend()
        .get_notifications(auth.access(), current_page)
        .await
    {
        Ok(page) => (page.results, page.previous.is_some(), page.next.is_some()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch notifications");
            (Vec::new(), false, false)
        }
    };

    NotificationsTemplate {
        ctx,
        notifications,
        current_page,
        has_previous,
        has_next,
    }
}

/// Unread count badge (HTMX, polled).
///
/// Anonymous visitors and backend failures get an empty badge.
#[instrument(skip_all)]
pub async fn unread_count(
    OptionalAuth(auth): OptionalAuth,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let count = match &auth {
        Some(auth) => state.unread().get(state.backend(), auth).await,
        None => 0,
    };

    NotificationBadgeTemplate {
        signed_in: auth.is_some(),
        count,
        poll_secs: POLL_INTERVAL.as_secs(),
    }
}

/// Mark one notification read.
///
/// # Errors
///
/// Returns an error if the backend call fails.
#[instrument(skip(auth, state, headers), fields(user_id = %auth.user.id))]
pub async fn mark_read(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<NotificationId>,
) -> Result<Response> {
    state
        .backend()
        .mark_notification_read(auth.access(), id)
        .await?;
    state.unread().invalidate(auth.user.id).await;

    Ok(read_response(&headers))
}

/// Mark every notification read.
///
/// # Errors
///
/// Returns an error if the backend call fails.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn mark_all_read(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    state
        .backend()
        .mark_all_notifications_read(auth.access())
        .await?;
    state.unread().invalidate(auth.user.id).await;

    Ok(read_response(&headers))
}

/// HTMX callers get an empty swap plus the badge refresh event.
fn read_response(headers: &HeaderMap) -> Response {
    if is_htmx(headers) {
        with_trigger(NOTIFICATIONS_UPDATED_EVENT, StatusCode::OK)
    } else {
        redirect(headers, "/notifications")
    }
}
