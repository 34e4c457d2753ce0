//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_API_URL` - Base URL of the storefront backend (e.g. `http://localhost:4000`)
//!
//! ## Optional
//! - `STOREFRONT_API_TIMEOUT_SECS` - Request timeout (default: 30)
//! - `STOREFRONT_CACHE_TTL_SECS` - Product detail cache TTL (default: 300)
//! - `STOREFRONT_CACHE_CAPACITY` - Product detail cache size (default: 1000)
//! - `STOREFRONT_CURRENCY` - Display and checkout currency (default: USD)
//! - `STOREFRONT_TAX_RATE` - Tax as a fraction of the subtotal (default: 0)
//! - `STOREFRONT_SHIPPING_FLAT` - Flat shipping charge (default: 0)
//! - `STOREFRONT_FREE_SHIPPING_OVER` - Subtotal above which shipping is free
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use storefront_sync_core::CurrencyCode;
use thiserror::Error;
use url::Url;

use crate::checkout::PricingPolicy;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, always ending in `/`
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Product detail cache TTL
    pub cache_ttl: Duration,
    /// Product detail cache capacity
    pub cache_capacity: u64,
    /// Currency for display and payment intents
    pub currency: CurrencyCode,
    /// Tax and shipping rules for checkout
    pub pricing: PricingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Defaults for everything except the backend URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("STOREFRONT_API_URL", base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            currency: CurrencyCode::default(),
            pricing: PricingPolicy::default(),
            sentry_dsn: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let base_url = env.required("STOREFRONT_API_URL")?;
        let mut config = Self::new(&base_url)?;

        config.timeout = Duration::from_secs(
            env.parsed("STOREFRONT_API_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );
        config.cache_ttl = Duration::from_secs(
            env.parsed("STOREFRONT_CACHE_TTL_SECS")?
                .unwrap_or(DEFAULT_CACHE_TTL_SECS),
        );
        config.cache_capacity = env
            .parsed("STOREFRONT_CACHE_CAPACITY")?
            .unwrap_or(DEFAULT_CACHE_CAPACITY);
        config.currency = env.parsed("STOREFRONT_CURRENCY")?.unwrap_or_default();
        config.pricing = PricingPolicy {
            tax_rate: env.decimal("STOREFRONT_TAX_RATE")?.unwrap_or_default(),
            flat_shipping: env.decimal("STOREFRONT_SHIPPING_FLAT")?.unwrap_or_default(),
            free_shipping_over: env.decimal("STOREFRONT_FREE_SHIPPING_OVER")?,
        };
        config.sentry_dsn = env.optional("SENTRY_DSN");

        Ok(config)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse an optional variable with `FromStr`.
    fn parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .map(|v| {
                v.trim()
                    .parse::<T>()
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }

    /// Parse an optional non-negative decimal.
    fn decimal(&self, key: &str) -> Result<Option<Decimal>, ConfigError> {
        match self.parsed::<Decimal>(key)? {
            Some(value) if value.is_sign_negative() => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must not be negative".to_string(),
            )),
            other => Ok(other),
        }
    }
}

/// Parse a base URL and make sure its path ends in `/` so relative joins
/// keep any path prefix.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
