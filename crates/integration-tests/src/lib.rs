//! Integration tests for ZapMarket.
//!
//! The tests run the storefront against [`StubBackend`], an in-process axum
//! server that speaks the payment backend's two JSON endpoints on an
//! ephemeral local port. No external services are needed:
//!
//! ```bash
//! cargo test -p zapmarket-integration-tests
//! ```

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// Hash the stub hands out for successful invoices.
pub const STUB_PAYMENT_HASH: &str = "f00dcafe";
/// Payment request the stub hands out for successful invoices.
pub const STUB_PAYMENT_REQUEST: &str = "lnbc1stubinvoice";

/// How the stub answers create-invoice.
#[derive(Debug, Clone)]
pub enum InvoiceReply {
    /// A session for [`STUB_PAYMENT_HASH`].
    Session,
    /// `{"error": message}` with the given status.
    Error(StatusCode, String),
    /// A body that is not JSON.
    Garbage,
}

#[derive(Debug)]
struct StubState {
    reply: Mutex<InvoiceReply>,
    paid: AtomicBool,
    failing_checks: AtomicUsize,
    invoice_requests: Mutex<Vec<Value>>,
    checked_hashes: Mutex<Vec<String>>,
}

/// In-process payment backend.
pub struct StubBackend {
    base_url: Url,
    state: Arc<StubState>,
    server: JoinHandle<()>,
}

impl StubBackend {
    /// Bind to an ephemeral port on 127.0.0.1 and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> io::Result<Self> {
        let state = Arc::new(StubState {
            reply: Mutex::new(InvoiceReply::Session),
            paid: AtomicBool::new(false),
            failing_checks: AtomicUsize::new(0),
            invoice_requests: Mutex::new(Vec::new()),
            checked_hashes: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/create-invoice", post(create_invoice))
            .route("/api/check-payment/{hash}", get(check_payment))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}"))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        Ok(Self {
            base_url,
            state,
            server,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Change how create-invoice answers.
    pub fn set_invoice_reply(&self, reply: InvoiceReply) {
        *lock(&self.state.reply) = reply;
    }

    /// Mark the stub invoice as paid.
    pub fn mark_paid(&self) {
        self.state.paid.store(true, Ordering::SeqCst);
    }

    /// Make the next `count` payment checks answer 502 with a non-JSON body.
    pub fn fail_next_checks(&self, count: usize) {
        self.state.failing_checks.store(count, Ordering::SeqCst);
    }

    /// Bodies received by create-invoice, oldest first.
    #[must_use]
    pub fn invoice_requests(&self) -> Vec<Value> {
        lock(&self.state.invoice_requests).clone()
    }

    /// Hashes received by check-payment, oldest first.
    #[must_use]
    pub fn checked_hashes(&self) -> Vec<String> {
        lock(&self.state.checked_hashes).clone()
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn create_invoice(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    lock(&state.invoice_requests).push(body);

    let reply = lock(&state.reply).clone();
    match reply {
        InvoiceReply::Session => Json(json!({
            "payment_hash": STUB_PAYMENT_HASH,
            "payment_request": STUB_PAYMENT_REQUEST,
            "amount_sats": 3000,
        }))
        .into_response(),
        InvoiceReply::Error(status, message) => {
            (status, Json(json!({ "error": message }))).into_response()
        }
        InvoiceReply::Garbage => (StatusCode::BAD_GATEWAY, "upstream timeout").into_response(),
    }
}

async fn check_payment(State(state): State<Arc<StubState>>, Path(hash): Path<String>) -> Response {
    lock(&state.checked_hashes).push(hash.clone());

    let failing = state
        .failing_checks
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return (StatusCode::BAD_GATEWAY, "upstream timeout").into_response();
    }

    if hash != STUB_PAYMENT_HASH {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Invoice not found" })),
        )
            .into_response();
    }

    Json(json!({ "paid": state.paid.load(Ordering::SeqCst) })).into_response()
}

/// Route storefront logs to the test harness output.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("zapmarket_storefront=debug")
        .with_test_writer()
        .try_init();
}

/// Check `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
