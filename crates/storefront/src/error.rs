//! Unified error handling with Sentry integration.
//!
//! Each module reports its own `thiserror` enum; `AppError` gathers them for
//! callers that wire the storefront together. Failures worth alerting on are
//! captured to Sentry before being logged. Without a DSN, capture is a no-op.

use thiserror::Error;

use crate::cart::CartError;
use crate::checkout::api::ApiError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cart could not be persisted.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Payment backend call failed.
    #[error("Payment API error: {0}")]
    Api(#[from] ApiError),
}

impl AppError {
    /// Capture to Sentry (unless the backend merely rejected a request) and log.
    pub fn report(&self) {
        if matches!(self, Self::Api(ApiError::Rejected(_))) {
            tracing::warn!(error = %self, "Request rejected");
        } else {
            capture(self, "Storefront error");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Capture an error to Sentry and log it with the event id.
pub fn capture<E>(err: &E, message: &str) -> sentry::types::Uuid
where
    E: std::error::Error + ?Sized,
{
    let event_id = sentry::capture_error(err);
    tracing::error!(
        error = %err,
        sentry_event_id = %event_id,
        "{message}"
    );
    event_id
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::from(ConfigError::InvalidEnvVar(
            "ZAPMARKET_POLL_INTERVAL_MS".to_string(),
            "must be greater than zero".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid environment variable ZAPMARKET_POLL_INTERVAL_MS: must be greater than zero"
        );

        let err = AppError::from(ApiError::Rejected("Out of stock".to_string()));
        assert_eq!(err.to_string(), "Payment API error: Out of stock");
    }

    #[test]
    fn test_cart_error_converts() {
        let err: AppError = CartError::from(StorageError::InvalidKey("../x".to_string())).into();
        assert!(matches!(err, AppError::Cart(CartError::Storage(_))));
    }

    #[test]
    fn test_report_without_client_is_noop() {
        AppError::from(ApiError::Parse("bad body".to_string())).report();
        AppError::from(ApiError::Rejected("nope".to_string())).report();
        add_breadcrumb("checkout", "Requested invoice", Some(&[("product_id", "p")]));
    }
}
