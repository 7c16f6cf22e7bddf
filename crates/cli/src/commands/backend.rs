//! Backend connectivity check.
//!
//! # Environment Variables
//!
//! - `BACKEND_API_URL`
//! - `BACKEND_TIMEOUT_SECS` (default 10)

use brewery_storefront::backend::BackendClient;
use brewery_storefront::config::BackendConfig;

/// Call `GET /health` on the configured backend.
///
/// # Errors
///
/// Returns an error if the backend is not configured, unreachable, or
/// unhealthy.
pub async fn check() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = BackendConfig::from_env()?;
    tracing::info!(url = %config.base_url, "Checking backend...");

    let client = BackendClient::new(&config)?;
    client.health().await?;

    tracing::info!("Backend is healthy");
    Ok(())
}
