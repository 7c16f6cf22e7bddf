//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::middleware::PageContext;
use crate::routes::products::ProductCard;
use crate::services::reservations::format_time;
use crate::state::AppState;

/// How many featured products the home page shows.
const FEATURED_LIMIT: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub featured: Vec<ProductCard>,
    pub taproom_name: String,
    pub opens: String,
    pub closes: String,
}

/// Display the home page.
///
/// A backend outage renders the page without the featured grid.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let featured = match state.backend().get_featured_products().await {
        Ok(products) => products
            .iter()
            .take(FEATURED_LIMIT)
            .map(|product| ProductCard::new(product, state.images()))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch featured products");
            Vec::new()
        }
    };

    let taproom = &state.config().taproom;
    HomeTemplate {
        ctx,
        featured,
        taproom_name: taproom.name.clone(),
        opens: format_time(taproom.opens),
        closes: format_time(taproom.closes),
    }
}
