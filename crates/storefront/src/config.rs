//! Storefront configuration loaded from environment variables.
//!
//! Every variable is optional; [`StorefrontConfig::default`] is what a page
//! gets with an empty environment.
//!
//! # Environment Variables
//!
//! - `ZAPMARKET_API_BASE_URL` - Payment backend base URL (default: <http://127.0.0.1:5000>)
//! - `ZAPMARKET_STOREFRONT_URL` - Public storefront URL used to resolve relative links
//!   (default: the API base URL)
//! - `ZAPMARKET_CART_STORAGE_KEY` - Storage slot holding the cart (default: `zapmarket_cart`)
//! - `ZAPMARKET_CART_STORAGE_DIR` - Directory for file-backed storage (default: in-memory)
//! - `ZAPMARKET_PRODUCT_IMAGE_BASE` - Path prefix for product images
//!   (default: `/static/images/products/`)
//! - `ZAPMARKET_POLL_INTERVAL_MS` - Payment status poll interval (default: 2000)
//! - `ZAPMARKET_REDIRECT_DELAY_MS` - Delay before leaving the success view (default: 3000)
//! - `ZAPMARKET_CONFIRMATION_PATH` - Where to go after payment (default: `/order-confirmation`)
//! - `ZAPMARKET_REQUEST_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_CART_STORAGE_KEY: &str = "zapmarket_cart";
const DEFAULT_PRODUCT_IMAGE_BASE: &str = "/static/images/products/";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_REDIRECT_DELAY_MS: u64 = 3_000;
const DEFAULT_CONFIRMATION_PATH: &str = "/order-confirmation";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Payment backend base URL
    pub api_base_url: Url,
    /// Public storefront URL; relative links on the page resolve against it
    pub storefront_url: Url,
    /// Cart persistence settings
    pub cart: CartConfig,
    /// Checkout polling settings
    pub checkout: CheckoutConfig,
    /// Timings of transient UI feedback
    pub feedback: FeedbackTimings,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Cart persistence settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Storage slot holding the serialized cart
    pub storage_key: String,
    /// Directory for file-backed storage; `None` keeps the cart in memory
    pub storage_dir: Option<PathBuf>,
    /// Path prefix prepended to line item image names
    pub image_base: String,
}

/// Checkout polling settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Delay between payment status checks
    pub poll_interval: Duration,
    /// Delay between showing the success view and navigating away
    pub redirect_delay: Duration,
    /// Destination after a settled payment
    pub confirmation_path: String,
    /// Timeout for each backend request
    pub request_timeout: Duration,
}

/// Timings of transient UI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackTimings {
    /// How long an "added to cart" notice stays before fading
    pub notice_hold: Duration,
    /// Fade-out time before the notice is removed
    pub notice_fade: Duration,
    /// How long the copy control shows "Copied!"
    pub copy_feedback: Duration,
    /// How long a toggled icon stays toggled
    pub icon_feedback: Duration,
}

impl Default for FeedbackTimings {
    fn default() -> Self {
        Self {
            notice_hold: Duration::from_millis(2_500),
            notice_fade: Duration::from_millis(300),
            copy_feedback: Duration::from_millis(2_000),
            icon_feedback: Duration::from_millis(1_000),
        }
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_CART_STORAGE_KEY.to_string(),
            storage_dir: None,
            image_base: DEFAULT_PRODUCT_IMAGE_BASE.to_string(),
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            redirect_delay: Duration::from_millis(DEFAULT_REDIRECT_DELAY_MS),
            confirmation_path: DEFAULT_CONFIRMATION_PATH.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        let base = default_base_url();
        Self {
            api_base_url: base.clone(),
            storefront_url: base,
            cart: CartConfig::default(),
            checkout: CheckoutConfig::default(),
            feedback: FeedbackTimings::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = match get("ZAPMARKET_API_BASE_URL") {
            Some(raw) => parse_url("ZAPMARKET_API_BASE_URL", &raw)?,
            None => default_base_url(),
        };
        let storefront_url = match get("ZAPMARKET_STOREFRONT_URL") {
            Some(raw) => parse_url("ZAPMARKET_STOREFRONT_URL", &raw)?,
            None => api_base_url.clone(),
        };

        let cart = CartConfig {
            storage_key: get("ZAPMARKET_CART_STORAGE_KEY")
                .unwrap_or_else(|| DEFAULT_CART_STORAGE_KEY.to_string()),
            storage_dir: get("ZAPMARKET_CART_STORAGE_DIR").map(PathBuf::from),
            image_base: get("ZAPMARKET_PRODUCT_IMAGE_BASE")
                .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE_BASE.to_string()),
        };

        let checkout = CheckoutConfig {
            poll_interval: Duration::from_millis(parse_u64(
                "ZAPMARKET_POLL_INTERVAL_MS",
                get("ZAPMARKET_POLL_INTERVAL_MS"),
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            redirect_delay: Duration::from_millis(parse_u64(
                "ZAPMARKET_REDIRECT_DELAY_MS",
                get("ZAPMARKET_REDIRECT_DELAY_MS"),
                DEFAULT_REDIRECT_DELAY_MS,
            )?),
            confirmation_path: get("ZAPMARKET_CONFIRMATION_PATH")
                .unwrap_or_else(|| DEFAULT_CONFIRMATION_PATH.to_string()),
            request_timeout: Duration::from_secs(parse_u64(
                "ZAPMARKET_REQUEST_TIMEOUT_SECS",
                get("ZAPMARKET_REQUEST_TIMEOUT_SECS"),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
        };

        if checkout.poll_interval.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "ZAPMARKET_POLL_INTERVAL_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_base_url,
            storefront_url,
            cart,
            checkout,
            feedback: FeedbackTimings::default(),
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE_URL).expect("default API base URL is a valid absolute URL")
}

/// Parse an absolute URL from a variable.
fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an unsigned integer variable, falling back to `default` when unset.
fn parse_u64(key: &str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    raw.map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_empty_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(config.storefront_url, config.api_base_url);
        assert_eq!(config.cart, CartConfig::default());
        assert_eq!(config.checkout, CheckoutConfig::default());
        assert_eq!(config.checkout.poll_interval, Duration::from_secs(2));
        assert_eq!(config.checkout.redirect_delay, Duration::from_secs(3));
        assert_eq!(config.checkout.confirmation_path, "/order-confirmation");
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ZAPMARKET_API_BASE_URL", "https://pay.example.org"),
            ("ZAPMARKET_STOREFRONT_URL", "https://shop.example.org"),
            ("ZAPMARKET_CART_STORAGE_KEY", "other_cart"),
            ("ZAPMARKET_CART_STORAGE_DIR", "/tmp/zapmarket"),
            ("ZAPMARKET_POLL_INTERVAL_MS", "500"),
            ("ZAPMARKET_CONFIRMATION_PATH", "/thanks"),
        ])
        .unwrap();

        assert_eq!(config.api_base_url.host_str(), Some("pay.example.org"));
        assert_eq!(config.storefront_url.host_str(), Some("shop.example.org"));
        assert_eq!(config.cart.storage_key, "other_cart");
        assert_eq!(
            config.cart.storage_dir,
            Some(PathBuf::from("/tmp/zapmarket"))
        );
        assert_eq!(config.checkout.poll_interval, Duration::from_millis(500));
        assert_eq!(config.checkout.confirmation_path, "/thanks");
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("ZAPMARKET_CART_STORAGE_KEY", "  ")]).unwrap();
        assert_eq!(config.cart.storage_key, "zapmarket_cart");
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = config_from(&[("ZAPMARKET_POLL_INTERVAL_MS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "ZAPMARKET_POLL_INTERVAL_MS"));

        let err = config_from(&[("ZAPMARKET_API_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "ZAPMARKET_API_BASE_URL"));

        let err = config_from(&[("ZAPMARKET_POLL_INTERVAL_MS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_feedback_timings() {
        let timings = FeedbackTimings::default();
        assert_eq!(timings.notice_hold, Duration::from_millis(2_500));
        assert_eq!(timings.notice_fade, Duration::from_millis(300));
        assert_eq!(timings.copy_feedback, Duration::from_secs(2));
        assert_eq!(timings.icon_feedback, Duration::from_secs(1));
    }
}
