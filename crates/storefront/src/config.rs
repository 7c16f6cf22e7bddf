//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for the session store
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `BACKEND_API_URL` - Base URL of the brewery REST backend
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `LEGAL_DRINKING_AGE` - Minimum age for the age gate and sign-up (default: 21)
//! - `OAUTH_PROVIDER` - Social login provider slug (default: google)
//! - `OAUTH_AUTHORIZE_URL` / `OAUTH_TOKEN_URL` - Provider endpoints (default: Google)
//! - `OAUTH_CLIENT_ID` / `OAUTH_CLIENT_SECRET` - Social login is enabled when both are set
//! - `PAYMENTS_PUBLISHABLE_KEY` - Payment processor publishable key (browser-safe)
//! - `IMAGE_CDN_URL` - Image CDN fetch prefix
//! - `TAPROOM_NAME`, `TAPROOM_ADDRESS`, `TAPROOM_PHONE`
//! - `TAPROOM_LATITUDE`, `TAPROOM_LONGITUDE`, `TAPROOM_MAP_ZOOM`
//! - `TAPROOM_OPENS`, `TAPROOM_CLOSES` - Opening hours as `HH:MM` (default: 12:00-22:00)
//! - `TAPROOM_TIMEZONE` - IANA zone the opening hours are in (default: America/Los_Angeles)
//! - `MAP_TILE_URL` - Slippy map tile template with `{z}`, `{x}`, `{y}`
//! - `GA4_MEASUREMENT_ID` - Google Analytics 4 measurement ID
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//! - `LOG_FORMAT` - `json` for structured log lines (default: human readable)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Minimum age to browse the shop and create an account
    pub legal_drinking_age: u32,
    /// Brewery REST backend
    pub backend: BackendConfig,
    /// Social login provider, when configured
    pub oauth: Option<OAuthConfig>,
    /// Payment processor browser keys
    pub payments: PaymentsConfig,
    /// Image CDN prefix
    pub images: ImageCdnConfig,
    /// Taproom details for marketing pages and reservations
    pub taproom: TaproomConfig,
    /// Analytics tracking configuration
    pub analytics: AnalyticsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Brewery backend configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL without trailing slash (e.g., `https://api.hopwright.beer/v1`)
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

/// OAuth identity provider configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct OAuthConfig {
    /// Provider slug forwarded to the backend (e.g., `google`)
    pub provider: String,
    /// Authorization endpoint
    pub authorize_url: String,
    /// Token endpoint
    pub token_url: String,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("provider", &self.provider)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Payment processor configuration.
#[derive(Debug, Clone, Default)]
pub struct PaymentsConfig {
    /// Publishable key (safe to expose in browser)
    pub publishable_key: Option<String>,
}

/// Image CDN configuration.
#[derive(Debug, Clone, Default)]
pub struct ImageCdnConfig {
    /// Fetch prefix, e.g. `https://res.cloudinary.com/hopwright/image/fetch`
    pub base_url: Option<String>,
}

/// Taproom location and opening hours.
#[derive(Debug, Clone)]
pub struct TaproomConfig {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub map_zoom: u8,
    pub map_tile_url: String,
    pub opens: NaiveTime,
    pub closes: NaiveTime,
    /// Zone for reservation times and the admin's "today".
    pub timezone: Tz,
}

impl Default for TaproomConfig {
    fn default() -> Self {
        Self {
            name: "Hopwright Taproom".to_string(),
            address: "412 Foundry Street, Portland, OR 97209".to_string(),
            phone: None,
            latitude: 45.5266,
            longitude: -122.6847,
            map_zoom: 15,
            map_tile_url: OSM_TILE_URL.to_string(),
            opens: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN),
            closes: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            timezone: chrono_tz::America::Los_Angeles,
        }
    }
}

/// Analytics tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsConfig {
    /// Google Analytics 4 measurement ID
    pub ga4_measurement_id: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            legal_drinking_age: parse_env("LEGAL_DRINKING_AGE", "21")?,
            backend: BackendConfig::from_env()?,
            oauth: OAuthConfig::from_env()?,
            payments: PaymentsConfig {
                publishable_key: get_optional_env("PAYMENTS_PUBLISHABLE_KEY"),
            },
            images: ImageCdnConfig {
                base_url: get_optional_env("IMAGE_CDN_URL")
                    .map(|url| url.trim_end_matches('/').to_string()),
            },
            taproom: TaproomConfig::from_env()?,
            analytics: AnalyticsConfig {
                ga4_measurement_id: get_optional_env("GA4_MEASUREMENT_ID"),
            },
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    /// Load `BACKEND_API_URL` and `BACKEND_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("BACKEND_API_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), e.to_string())
        })?;
        let timeout_secs: u64 = parse_env("BACKEND_TIMEOUT_SECS", "10")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl OAuthConfig {
    /// Social login is optional: absent credentials disable it.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(client_id), Some(_)) = (
            get_optional_env("OAUTH_CLIENT_ID"),
            get_optional_env("OAUTH_CLIENT_SECRET"),
        ) else {
            return Ok(None);
        };

        Ok(Some(Self {
            provider: get_env_or_default("OAUTH_PROVIDER", "google"),
            authorize_url: get_env_or_default("OAUTH_AUTHORIZE_URL", GOOGLE_AUTHORIZE_URL),
            token_url: get_env_or_default("OAUTH_TOKEN_URL", GOOGLE_TOKEN_URL),
            client_id,
            client_secret: get_validated_secret("OAUTH_CLIENT_SECRET")?,
        }))
    }
}

impl TaproomConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let opens = parse_time("TAPROOM_OPENS", defaults.opens)?;
        let closes = parse_time("TAPROOM_CLOSES", defaults.closes)?;
        if closes <= opens {
            return Err(ConfigError::InvalidEnvVar(
                "TAPROOM_CLOSES".to_string(),
                "closing time must be after opening time".to_string(),
            ));
        }

        Ok(Self {
            name: get_optional_env("TAPROOM_NAME").unwrap_or(defaults.name),
            address: get_optional_env("TAPROOM_ADDRESS").unwrap_or(defaults.address),
            phone: get_optional_env("TAPROOM_PHONE"),
            latitude: parse_optional("TAPROOM_LATITUDE")?.unwrap_or(defaults.latitude),
            longitude: parse_optional("TAPROOM_LONGITUDE")?.unwrap_or(defaults.longitude),
            map_zoom: parse_optional("TAPROOM_MAP_ZOOM")?.unwrap_or(defaults.map_zoom),
            map_tile_url: get_optional_env("MAP_TILE_URL").unwrap_or(defaults.map_tile_url),
            opens,
            closes,
            timezone: parse_timezone("TAPROOM_TIMEZONE", defaults.timezone)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to a default literal.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an optional environment variable.
fn parse_optional<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Parse an `HH:MM` time.
fn parse_time(key: &str, default: NaiveTime) -> Result<NaiveTime, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |v| {
        NaiveTime::parse_from_str(&v, "%H:%M")
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse an IANA zone name such as `Europe/Berlin`.
fn parse_timezone(key: &str, default: Tz) -> Result<Tz, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |v| {
        v.parse::<Tz>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-api-key-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let err =
            validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "S").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(32)), "S").is_ok());
    }

    #[test]
    fn test_oauth_config_debug_redacts_secret() {
        let config = OAuthConfig {
            provider: "google".to_string(),
            authorize_url: GOOGLE_AUTHORIZE_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            client_id: "client_id_value".to_string(),
            client_secret: SecretString::from("super_secret_client_value"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("client_id_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_client_value"));
    }

    #[test]
    fn test_taproom_default_hours() {
        let taproom = TaproomConfig::default();
        assert!(taproom.opens < taproom.closes);
        assert_eq!(taproom.opens.format("%H:%M").to_string(), "12:00");
    }
}
