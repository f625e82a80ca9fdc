//! Payment backend client.
//!
//! Two JSON calls:
//!
//! - `POST {base}/api/create-invoice` with `{product_id, quantity}`
//! - `GET {base}/api/check-payment/{payment_hash}`
//!
//! The backend reports failures as `{"error": "..."}` with any HTTP status,
//! so the body decides success rather than the status line.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;
use zapmarket_core::{PaymentHash, PaymentSession, PaymentStatus, ProductId};

/// Errors that can occur when talking to the payment backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an `error` body.
    #[error("{0}")]
    Rejected(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured base URL cannot carry a path.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// The backend's own message when it rejected the request.
    #[must_use]
    pub fn rejection(&self) -> Option<&str> {
        match self {
            Self::Rejected(message) => Some(message),
            _ => None,
        }
    }
}

/// Body of a create-invoice request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The calls the checkout makes against the payment backend.
pub trait PaymentApi: Send + Sync + 'static {
    /// Create an invoice for `quantity` units of a product.
    fn create_invoice(
        &self,
        request: &InvoiceRequest,
    ) -> impl Future<Output = Result<PaymentSession, ApiError>> + Send;

    /// Check whether the invoice behind `hash` has been paid.
    fn check_payment(
        &self,
        hash: &PaymentHash,
    ) -> impl Future<Output = Result<PaymentStatus, ApiError>> + Send;
}

/// Success or `{error}` body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Failure { error: String },
    Success(T),
}

#[derive(Debug, Deserialize)]
struct CheckPaymentResponse {
    paid: bool,
}

/// [`PaymentApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPaymentApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpPaymentApi {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the URL cannot be a base.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// `base_url` with `segments` appended, each percent-encoded as one segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(Envelope::Success(value)) => Ok(value),
            Ok(Envelope::Failure { error }) => Err(ApiError::Rejected(error)),
            Err(e) => Err(ApiError::Parse(format!("{status}: {e}"))),
        }
    }
}

impl PaymentApi for HttpPaymentApi {
    #[instrument(skip(self), fields(product_id = %request.product_id, quantity = request.quantity))]
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<PaymentSession, ApiError> {
        let url = self.endpoint(&["api", "create-invoice"])?;
        let response = self.client.post(url).json(request).send().await?;
        let session: PaymentSession = Self::read(response).await?;

        debug!(payment_hash = %session.payment_hash, "Invoice created");
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn check_payment(&self, hash: &PaymentHash) -> Result<PaymentStatus, ApiError> {
        let url = self.endpoint(&["api", "check-payment", hash.as_str()])?;
        let response = self.client.get(url).send().await?;
        let body: CheckPaymentResponse = Self::read(response).await?;

        Ok(PaymentStatus::from_paid(body.paid))
    }
}
