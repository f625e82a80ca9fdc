//! Lightning checkout for a single product.
//!
//! `Idle → InvoiceRequested → AwaitingPayment → Settled`. A failed invoice
//! request returns to `Idle` with the generate control re-armed; unloading
//! the page while a request or payment is outstanding ends in `Abandoned` and
//! anything that arrives afterwards is discarded.

pub mod api;
pub mod poller;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info, instrument, warn};
use zapmarket_core::{CheckoutState, PaymentSession, ProductId, Sats};

use crate::config::{CheckoutConfig, FeedbackTimings};
use crate::page::input::quantity_or_one;
use crate::page::{BindingTable, PageEvent, Selector, SharedPage, Trigger};
use crate::{error, timer};

use api::{ApiError, InvoiceRequest, PaymentApi};
use poller::{PollHandle, spawn_poll};

pub const QUANTITY_INPUT: &str = "quantity";
pub const TOTAL_SATS: &str = "total-sats";
pub const GENERATE_BUTTON: &str = "generate-invoice-btn";
pub const PAYMENT_PANEL: &str = "payment-panel";
pub const ORDER_SUMMARY_CLASS: &str = "order-summary";
pub const QR_CODE: &str = "qr-code";
pub const INVOICE_TEXT: &str = "invoice-text";
pub const PAYMENT_STATUS: &str = "payment-status";
pub const PAYMENT_SUCCESS: &str = "payment-success";
pub const COPY_BUTTON: &str = "copy-invoice-btn";

const QR_SIZE: u32 = 256;
const GENERATE_LABEL: &str = "Generate Lightning Invoice";
const GENERATING_LABEL: &str = "Generating Invoice...";
const COPIED_LABEL: &str = "Copied!";

/// Actions reachable from checkout controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutAction {
    QuantityChanged,
    RequestInvoice,
    CopyInvoice,
    Unload,
}

/// Checkout page controller.
pub struct CheckoutController<A> {
    inner: Arc<CheckoutInner<A>>,
}

impl<A> Clone for CheckoutController<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CheckoutInner<A> {
    api: Arc<A>,
    page: SharedPage,
    product_id: ProductId,
    unit_price: Sats,
    config: CheckoutConfig,
    timings: FeedbackTimings,
    session: Mutex<SessionSlot>,
    copy: Mutex<Option<String>>,
    copy_generation: AtomicU64,
}

#[derive(Default)]
struct SessionSlot {
    state: CheckoutState,
    session: Option<PaymentSession>,
    poller: Option<PollHandle>,
}

impl SessionSlot {
    fn transition(&mut self, next: CheckoutState) -> bool {
        if self.state.can_transition_to(next) {
            debug!(from = ?self.state, to = ?next, "Checkout transition");
            self.state = next;
            true
        } else {
            false
        }
    }
}

impl<A: PaymentApi> CheckoutController<A> {
    /// Create a controller for `product_id` priced at `unit_price` per unit.
    #[must_use]
    pub fn new(
        api: Arc<A>,
        page: SharedPage,
        product_id: ProductId,
        unit_price: Sats,
        config: CheckoutConfig,
        timings: FeedbackTimings,
    ) -> Self {
        Self {
            inner: Arc::new(CheckoutInner {
                api,
                page,
                product_id,
                unit_price,
                config,
                timings,
                session: Mutex::new(SessionSlot::default()),
                copy: Mutex::new(None),
                copy_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Controls the checkout responds to.
    #[must_use]
    pub fn bindings() -> BindingTable<CheckoutAction> {
        BindingTable::new()
            .bind(
                Selector::Id(QUANTITY_INPUT),
                Trigger::Input,
                CheckoutAction::QuantityChanged,
            )
            .bind(
                Selector::Id(GENERATE_BUTTON),
                Trigger::Click,
                CheckoutAction::RequestInvoice,
            )
            .bind(
                Selector::Id(COPY_BUTTON),
                Trigger::Click,
                CheckoutAction::CopyInvoice,
            )
            .bind(Selector::Window, Trigger::Unload, CheckoutAction::Unload)
    }

    /// Report missing controls.
    pub fn init(&self) {
        Self::bindings().validate(self.inner.page.as_ref());
    }

    /// Dispatch a page event through the binding table.
    pub async fn handle_event(&self, event: &PageEvent) {
        let Some(action) = Self::bindings().resolve(self.inner.page.as_ref(), event) else {
            return;
        };

        match action {
            CheckoutAction::QuantityChanged => self.on_quantity_input(),
            CheckoutAction::RequestInvoice => {
                self.request_invoice().await;
            }
            CheckoutAction::CopyInvoice => self.copy_invoice(),
            CheckoutAction::Unload => self.on_unload(),
        }
    }

    /// Current checkout state.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.slot().state
    }

    /// The session being paid, once an invoice exists.
    #[must_use]
    pub fn session(&self) -> Option<PaymentSession> {
        self.slot().session.clone()
    }

    /// Whether a poll loop is currently running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.slot()
            .poller
            .as_ref()
            .is_some_and(|poller| !poller.is_finished())
    }

    /// Recompute the running total from the quantity field.
    pub fn on_quantity_input(&self) {
        let page = self.inner.page.as_ref();
        let quantity = quantity_or_one(page.value(QUANTITY_INPUT).as_deref());
        let total = self.inner.unit_price.times(quantity);
        page.set_text(TOTAL_SATS, &total.as_u64().to_string());
    }

    /// Ask the backend for an invoice and start waiting for payment.
    ///
    /// Only acts from `Idle`. Returns the state reached.
    #[instrument(skip(self), fields(product_id = %self.inner.product_id))]
    pub async fn request_invoice(&self) -> CheckoutState {
        {
            let mut slot = self.slot();
            if !slot.transition(CheckoutState::InvoiceRequested) {
                debug!(state = ?slot.state, "Invoice already requested");
                return slot.state;
            }
        }

        let page = self.inner.page.as_ref();
        let quantity = quantity_or_one(page.value(QUANTITY_INPUT).as_deref());
        error::add_breadcrumb(
            "checkout",
            "Invoice requested",
            Some(&[("product_id", self.inner.product_id.as_str())]),
        );
        page.set_enabled(GENERATE_BUTTON, false);
        page.set_text(GENERATE_BUTTON, GENERATING_LABEL);

        let request = InvoiceRequest {
            product_id: self.inner.product_id.clone(),
            quantity,
        };
        let result = self.inner.api.create_invoice(&request).await;

        let mut slot = self.slot();
        if slot.state != CheckoutState::InvoiceRequested {
            debug!(state = ?slot.state, "Discarding invoice response after unload");
            return slot.state;
        }

        match result {
            Ok(session) => {
                info!(payment_hash = %session.payment_hash, quantity, "Awaiting payment");
                self.show_payment_panel(&session);

                let weak = Arc::downgrade(&self.inner);
                slot.poller = Some(spawn_poll(
                    Arc::clone(&self.inner.api),
                    session.payment_hash.clone(),
                    self.inner.config.poll_interval,
                    move || on_settled(&weak),
                ));
                slot.session = Some(session);
                slot.transition(CheckoutState::AwaitingPayment);
                slot.state
            }
            Err(e) => {
                slot.transition(CheckoutState::Idle);
                drop(slot);
                self.report_invoice_failure(&e);
                CheckoutState::Idle
            }
        }
    }

    /// Copy the payment string and briefly confirm on the control.
    pub fn copy_invoice(&self) {
        let page = self.inner.page.as_ref();
        let payment_request = self
            .slot()
            .session
            .as_ref()
            .map(|session| session.payment_request.clone())
            .or_else(|| page.value(INVOICE_TEXT));
        let Some(payment_request) = payment_request else {
            return;
        };
        page.copy_to_clipboard(&payment_request);

        if !page.exists(COPY_BUTTON) {
            return;
        }

        // Keep the first label seen so repeated clicks never restore "Copied!".
        {
            let mut saved = self.inner.copy.lock().unwrap_or_else(PoisonError::into_inner);
            if saved.is_none() {
                *saved = page.text(COPY_BUTTON);
            }
        }
        page.set_text(COPY_BUTTON, COPIED_LABEL);

        let generation = self.inner.copy_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let weak = Arc::downgrade(&self.inner);
        timer::after(self.inner.timings.copy_feedback, move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.copy_generation.load(Ordering::SeqCst) != generation {
                return;
            }
            let label = inner
                .copy
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(label) = label {
                inner.page.set_text(COPY_BUTTON, &label);
            }
        });
    }

    /// Stop polling and abandon an outstanding checkout.
    pub fn on_unload(&self) {
        let mut slot = self.slot();
        if slot.transition(CheckoutState::Abandoned) {
            info!("Checkout abandoned");
        }
        if let Some(poller) = slot.poller.take() {
            poller.stop();
        }
    }

    fn show_payment_panel(&self, session: &PaymentSession) {
        let page = self.inner.page.as_ref();
        page.set_visible(PAYMENT_PANEL, true);
        for id in page.elements_with_class(ORDER_SUMMARY_CLASS) {
            page.set_visible(&id, false);
        }
        page.render_qr(QR_CODE, &session.payment_request, QR_SIZE);
        page.set_value(INVOICE_TEXT, &session.payment_request);
    }

    fn report_invoice_failure(&self, e: &ApiError) {
        let page = self.inner.page.as_ref();
        if let Some(message) = e.rejection() {
            warn!(error = %message, "Invoice request rejected");
            page.alert(&format!("Error: {message}"));
        } else {
            error::capture(e, "Invoice request failed");
            page.alert(&format!("Failed to generate invoice. Please try again.\n{e}"));
        }
        page.set_enabled(GENERATE_BUTTON, true);
        page.set_text(GENERATE_BUTTON, GENERATE_LABEL);
    }

    fn slot(&self) -> MutexGuard<'_, SessionSlot> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs on the poll task once the payment is seen as paid.
fn on_settled<A>(weak: &Weak<CheckoutInner<A>>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };

    {
        let mut slot = inner.session.lock().unwrap_or_else(PoisonError::into_inner);
        if !slot.transition(CheckoutState::Settled) {
            return;
        }
        // The loop ends on its own after this callback.
        slot.poller = None;
    }

    let page = Arc::clone(&inner.page);
    page.set_visible(PAYMENT_STATUS, false);
    page.set_visible(PAYMENT_SUCCESS, true);

    let destination = inner.config.confirmation_path.clone();
    timer::after(inner.config.redirect_delay, move || {
        page.navigate(&destination);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use zapmarket_core::{PaymentHash, PaymentStatus};

    use super::poller::tests::FakeApi;
    use super::*;
    use crate::page::{Element, MemoryPage, Page};

    fn checkout_page() -> MemoryPage {
        MemoryPage::new()
            .with(QUANTITY_INPUT, Element::new().with_value("1"))
            .with(TOTAL_SATS, Element::new().with_text("1000"))
            .with(GENERATE_BUTTON, Element::new().with_text(GENERATE_LABEL))
            .with(PAYMENT_PANEL, Element::new().hidden())
            .with("summary", Element::new().with_class(ORDER_SUMMARY_CLASS))
            .with(QR_CODE, Element::new())
            .with(INVOICE_TEXT, Element::new())
            .with(PAYMENT_STATUS, Element::new())
            .with(PAYMENT_SUCCESS, Element::new().hidden())
            .with(COPY_BUTTON, Element::new().with_text("Copy Invoice"))
    }

    fn session() -> PaymentSession {
        PaymentSession {
            payment_hash: PaymentHash::new("hash123"),
            payment_request: "lnbc30u1pexample".to_string(),
            amount_sats: Some(Sats::new(3_000)),
            expires_at: None,
        }
    }

    fn controller(api: FakeApi) -> (Arc<FakeApi>, Arc<MemoryPage>, CheckoutController<FakeApi>) {
        let api = Arc::new(api);
        let page = Arc::new(checkout_page());
        let controller = CheckoutController::new(
            Arc::clone(&api),
            page.clone(),
            ProductId::new("prod_001"),
            Sats::new(1_000),
            CheckoutConfig::default(),
            FeedbackTimings::default(),
        );
        (api, page, controller)
    }

    fn with_invoice(result: Result<PaymentSession, ApiError>) -> FakeApi {
        let api = FakeApi::default();
        *api.invoice.lock().unwrap() = Some(result);
        api
    }

    #[tokio::test]
    async fn test_quantity_input_updates_total() {
        let (_, page, checkout) = controller(FakeApi::default());

        for (raw, expected) in [("3", "3000"), ("abc", "1000"), ("", "1000"), ("-2", "1000"), ("7x", "7000")] {
            page.set_value(QUANTITY_INPUT, raw);
            checkout.handle_event(&PageEvent::input(QUANTITY_INPUT)).await;
            assert_eq!(page.text(TOTAL_SATS).as_deref(), Some(expected), "{raw}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_invoice_shows_payment_panel() {
        let (api, page, checkout) = controller(with_invoice(Ok(session())));
        page.set_value(QUANTITY_INPUT, "3");

        let state = checkout.request_invoice().await;
        assert_eq!(state, CheckoutState::AwaitingPayment);
        assert!(checkout.is_polling());

        let calls = api.invoice_calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![InvoiceRequest {
                product_id: ProductId::new("prod_001"),
                quantity: 3,
            }]
        );

        assert!(page.element(PAYMENT_PANEL).unwrap().visible);
        assert!(!page.element("summary").unwrap().visible);
        assert_eq!(
            page.element(QR_CODE).unwrap().qr,
            Some(("lnbc30u1pexample".to_string(), 256))
        );
        assert_eq!(page.value(INVOICE_TEXT).as_deref(), Some("lnbc30u1pexample"));
        assert_eq!(page.text(GENERATE_BUTTON).as_deref(), Some(GENERATING_LABEL));
        assert!(!page.element(GENERATE_BUTTON).unwrap().enabled);
        assert_eq!(checkout.session(), Some(session()));
    }

    #[tokio::test]
    async fn test_rejected_invoice_rearms_control() {
        let (_, page, checkout) =
            controller(with_invoice(Err(ApiError::Rejected("Out of stock".to_string()))));

        checkout
            .handle_event(&PageEvent::click(GENERATE_BUTTON))
            .await;

        assert_eq!(checkout.state(), CheckoutState::Idle);
        assert_eq!(page.alerts(), vec!["Error: Out of stock".to_string()]);
        assert_eq!(page.text(GENERATE_BUTTON).as_deref(), Some(GENERATE_LABEL));
        assert!(page.element(GENERATE_BUTTON).unwrap().enabled);
        assert!(!page.element(PAYMENT_PANEL).unwrap().visible);
        assert!(!checkout.is_polling());
        assert_eq!(checkout.session(), None);
    }

    #[tokio::test]
    async fn test_transport_failure_rearms_control() {
        let (_, page, checkout) =
            controller(with_invoice(Err(ApiError::Parse("connection reset".to_string()))));

        let state = checkout.request_invoice().await;

        assert_eq!(state, CheckoutState::Idle);
        let alerts = page.alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Failed to generate invoice. Please try again.\n"));
        assert!(alerts[0].contains("connection reset"));
        assert!(page.element(GENERATE_BUTTON).unwrap().enabled);
        assert!(!page.element(PAYMENT_PANEL).unwrap().visible);
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let (api, _, checkout) =
            controller(with_invoice(Err(ApiError::Rejected("try later".to_string()))));
        checkout.request_invoice().await;

        *api.invoice.lock().unwrap() = Some(Ok(session()));
        let state = checkout.request_invoice().await;
        assert_eq!(state, CheckoutState::AwaitingPayment);
        assert_eq!(api.invoice_calls.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_is_ignored_while_awaiting() {
        let (api, _, checkout) = controller(with_invoice(Ok(session())));
        checkout.request_invoice().await;
        let state = checkout.request_invoice().await;

        assert_eq!(state, CheckoutState::AwaitingPayment);
        assert_eq!(api.invoice_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paid_shows_success_once_and_redirects() {
        let api = with_invoice(Ok(session()));
        api.statuses.lock().unwrap().extend([
            Ok(PaymentStatus::Pending),
            Ok(PaymentStatus::Settled),
            Ok(PaymentStatus::Settled),
        ]);
        let (api, page, checkout) = controller(api);

        checkout.request_invoice().await;
        tokio::time::sleep(Duration::from_millis(4_100)).await;

        assert_eq!(checkout.state(), CheckoutState::Settled);
        assert!(!checkout.is_polling());
        assert!(!page.element(PAYMENT_STATUS).unwrap().visible);
        assert!(page.element(PAYMENT_SUCCESS).unwrap().visible);
        assert!(page.navigations().is_empty());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(page.navigations(), vec!["/order-confirmation".to_string()]);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.checks(), 2);
        assert_eq!(page.navigations().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unload_stops_polling_and_abandons() {
        let (api, page, checkout) = controller(with_invoice(Ok(session())));
        checkout.request_invoice().await;
        tokio::time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(api.checks(), 1);

        checkout.handle_event(&PageEvent::unload()).await;
        assert_eq!(checkout.state(), CheckoutState::Abandoned);
        assert!(!checkout.is_polling());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.checks(), 1);
        assert!(page.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_unload_when_idle_keeps_idle() {
        let (_, _, checkout) = controller(FakeApi::default());
        checkout.on_unload();
        assert_eq!(checkout.state(), CheckoutState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_invoice_feedback() {
        let (_, page, checkout) = controller(with_invoice(Ok(session())));
        checkout.request_invoice().await;

        checkout.handle_event(&PageEvent::click(COPY_BUTTON)).await;
        assert_eq!(page.clipboard().as_deref(), Some("lnbc30u1pexample"));
        assert_eq!(page.text(COPY_BUTTON).as_deref(), Some(COPIED_LABEL));

        // A second click while "Copied!" is showing must not capture it.
        tokio::time::sleep(Duration::from_secs(1)).await;
        checkout.copy_invoice();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(page.text(COPY_BUTTON).as_deref(), Some(COPIED_LABEL));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(page.text(COPY_BUTTON).as_deref(), Some("Copy Invoice"));
    }

    #[tokio::test]
    async fn test_missing_markup_is_tolerated() {
        let api = Arc::new(with_invoice(Err(ApiError::Rejected("nope".to_string()))));
        let page = Arc::new(MemoryPage::new());
        let checkout = CheckoutController::new(
            api,
            page.clone(),
            ProductId::new("p"),
            Sats::new(10),
            CheckoutConfig::default(),
            FeedbackTimings::default(),
        );
        checkout.init();
        checkout.on_quantity_input();
        checkout.copy_invoice();

        assert_eq!(checkout.request_invoice().await, CheckoutState::Idle);
        assert_eq!(page.alerts().len(), 1);
        assert_eq!(page.clipboard(), None);
    }
}
