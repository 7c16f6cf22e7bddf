//! Taproom page: location map, hours and directions.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::middleware::PageContext;
use crate::services::reservations::format_time;
use crate::state::AppState;
use crate::taproom::{TILE_SIZE, directions_url, taproom_tile};

/// Taproom template.
#[derive(Template, WebTemplate)]
#[template(path = "taproom.html")]
pub struct TaproomTemplate {
    pub ctx: PageContext,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub opens: String,
    pub closes: String,
    pub tile_url: String,
    pub tile_size: u32,
    pub marker_left: u32,
    pub marker_top: u32,
    pub directions_url: String,
}

/// Display the taproom page.
#[instrument(skip_all)]
pub async fn show(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let taproom = &state.config().taproom;
    let tile = taproom_tile(taproom);

    TaproomTemplate {
        ctx,
        name: taproom.name.clone(),
        address: taproom.address.clone(),
        phone: taproom.phone.clone(),
        opens: format_time(taproom.opens),
        closes: format_time(taproom.closes),
        tile_url: tile.url(&taproom.map_tile_url),
        tile_size: TILE_SIZE,
        marker_left: tile.marker_left,
        marker_top: tile.marker_top,
        directions_url: directions_url(taproom),
    }
}
