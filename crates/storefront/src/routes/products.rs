//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use brewery_core::ProductId;

use crate::backend::types::{Category, Page, Product, ProductQuery, ProductSort};
use crate::error::{AppError, Result};
use crate::filters;
use crate::images::ImageCdn;
use crate::middleware::PageContext;
use crate::services::cart::MAX_LINE_QUANTITY;
use crate::services::recently_viewed;
use crate::state::AppState;

/// Products per listing page.
pub const PAGE_SIZE: u32 = 12;

/// How many recently viewed products the detail page shows.
const RECENT_LIMIT: usize = 4;

/// Product summary for grids.
#[derive(Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub style: Option<String>,
    pub abv: Option<String>,
    pub price: String,
    pub image_url: String,
    pub image_srcset: String,
    pub in_stock: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, images: &ImageCdn) -> Self {
        Self {
            id: product.id,
            slug: product.slug.clone(),
            name: product.name.clone(),
            style: product.style.clone(),
            abv: product.abv.map(|abv| format!("{abv}% ABV")),
            price: product.unit_price().to_string(),
            image_url: images.url(product.image.as_deref(), 640),
            image_srcset: images.srcset(product.image.as_deref()),
            in_stock: product.in_stock,
        }
    }
}

/// Full product display data.
pub struct ProductDetail {
    pub card: ProductCard,
    pub description: String,
    pub category: Option<Category>,
    pub ibu: Option<u32>,
    pub volume: Option<String>,
    pub hero_url: String,
}

impl ProductDetail {
    fn new(product: &Product, images: &ImageCdn) -> Self {
        Self {
            card: ProductCard::new(product, images),
            description: product.description.clone(),
            category: product.category.clone(),
            ibu: product.ibu,
            volume: product.volume_ml.map(|ml| format!("{ml} ml")),
            hero_url: images.url(product.image.as_deref(), 1024),
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
}

impl ListingQuery {
    /// Normalized backend query; unknown sort values fall back to the default.
    fn to_product_query(&self) -> ProductQuery {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        ProductQuery {
            category: non_empty(&self.category),
            search: non_empty(&self.q),
            sort: parse_sort(self.sort.as_deref()),
            page: self.page.unwrap_or(1).max(1),
            page_size: PAGE_SIZE,
        }
    }
}

fn parse_sort(value: Option<&str>) -> ProductSort {
    value
        .and_then(|v| ProductSort::ALL.into_iter().find(|s| s.as_str() == v))
        .unwrap_or_default()
}

/// Listing URL for `page`, keeping the active filters.
fn listing_href(query: &ProductQuery, page: u32) -> String {
    let mut params = Vec::new();
    if let Some(category) = &query.category {
        params.push(format!("category={}", urlencoding::encode(category)));
    }
    if let Some(search) = &query.search {
        params.push(format!("q={}", urlencoding::encode(search)));
    }
    if query.sort != ProductSort::default() {
        params.push(format!("sort={}", query.sort.as_str()));
    }
    if page > 1 {
        params.push(format!("page={page}"));
    }
    if params.is_empty() {
        "/products".to_string()
    } else {
        format!("/products?{}", params.join("&"))
    }
}

fn total_pages(count: u64) -> u32 {
    u32::try_from(count.div_ceil(u64::from(PAGE_SIZE)))
        .unwrap_or(u32::MAX)
        .max(1)
}

/// Sort menu entry.
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductCard>,
    pub categories: Vec<Category>,
    pub category: String,
    pub search: String,
    pub sort_options: Vec<SortOption>,
    pub total: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: ProductDetail,
    pub max_quantity: u32,
    pub recently_viewed: Vec<ProductCard>,
}

/// Display product listing page.
///
/// Backend failures render an empty listing.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<ListingQuery>,
) -> impl IntoResponse {
    let product_query = query.to_product_query();

    let (products, categories) = tokio::join!(
        state.backend().get_products(&product_query),
        state.backend().get_categories(),
    );
    let products = products.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch products");
        Page::empty()
    });
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch categories");
        Vec::new()
    });

    let current_page = product_query.page;
    let total_pages = total_pages(products.count);

    ProductsIndexTemplate {
        ctx,
        products: products
            .results
            .iter()
            .map(|p| ProductCard::new(p, state.images()))
            .collect(),
        categories,
        category: product_query.category.clone().unwrap_or_default(),
        search: product_query.search.clone().unwrap_or_default(),
        sort_options: ProductSort::ALL
            .iter()
            .map(|sort| SortOption {
                value: sort.as_str(),
                label: sort.label(),
                selected: *sort == product_query.sort,
            })
            .collect(),
        total: products.count,
        current_page,
        total_pages,
        prev_href: (current_page > 1).then(|| listing_href(&product_query, current_page - 1)),
        next_href: (current_page < total_pages)
            .then(|| listing_href(&product_query, current_page + 1)),
    }
}

/// Display product detail page and record the view.
///
/// # Errors
///
/// Returns 404 if the product doesn't exist, 502 if the backend is down.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = state
        .backend()
        .get_product(&slug)
        .await
        .map_err(|e| match e {
            crate::backend::BackendError::NotFound(_) => {
                AppError::NotFound(format!("product {slug}"))
            }
            other => AppError::Backend(other),
        })?;

    let previous = recently_viewed::load(&session).await;
    recently_viewed::track(&session, &product.slug).await;

    let mut recent = Vec::new();
    for other in previous
        .iter()
        .filter(|s| **s != product.slug)
        .take(RECENT_LIMIT)
    {
        match state.backend().get_product(other).await {
            Ok(p) => recent.push(ProductCard::new(&p, state.images())),
            Err(e) => tracing::debug!(slug = %other, error = %e, "Skipping recently viewed product"),
        }
    }

    Ok(ProductShowTemplate {
        ctx,
        product: ProductDetail::new(&product, state.images()),
        max_quantity: MAX_LINE_QUANTITY,
        recently_viewed: recent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_sort_falls_back_to_default() {
        assert_eq!(parse_sort(Some("price_desc")), ProductSort::PriceDesc);
        assert_eq!(parse_sort(Some("cheapest")), ProductSort::Featured);
        assert_eq!(parse_sort(None), ProductSort::Featured);
    }

    #[test]
    fn test_listing_query_ignores_blank_filters() {
        let query = ListingQuery {
            category: Some("  ".to_string()),
            q: Some(" hazy ".to_string()),
            sort: None,
            page: Some(0),
        }
        .to_product_query();
        assert_eq!(query.category, None);
        assert_eq!(query.search.as_deref(), Some("hazy"));
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, PAGE_SIZE);
    }

    #[test]
    fn test_listing_href_keeps_filters() {
        let query = ProductQuery {
            category: Some("ipa".to_string()),
            search: Some("fog line".to_string()),
            sort: ProductSort::PriceAsc,
            page: 1,
            page_size: PAGE_SIZE,
        };
        assert_eq!(
            listing_href(&query, 2),
            "/products?category=ipa&q=fog%20line&sort=price_asc&page=2"
        );
        assert_eq!(listing_href(&ProductQuery::default(), 1), "/products");
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0), 1);
        assert_eq!(total_pages(12), 1);
        assert_eq!(total_pages(13), 2);
    }
}
