//! Payment status polling.
//!
//! One interval task per payment session. The first check runs one interval
//! after start and checks never overlap: a slow check delays the next tick.
//! Settlement flips a one-way flag, so the settled callback runs at most once
//! no matter how many checks are in flight or how the task ends.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{Instrument, debug, info, info_span, warn};
use zapmarket_core::{PaymentHash, PaymentStatus};

use super::api::PaymentApi;

/// One-way settlement marker.
#[derive(Debug, Default)]
pub struct SettledFlag(AtomicBool);

impl SettledFlag {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Mark as settled. Returns true only for the call that flipped it.
    pub fn settle(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle to a running poll loop. Dropping it cancels the loop.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
    settled: Arc<SettledFlag>,
}

impl PollHandle {
    /// Cancel the loop if it is still running.
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Whether the loop has ended (settled or cancelled).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Whether the payment has been seen as paid.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled.is_settled()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Start polling `hash` every `period` until it is paid.
///
/// `on_settled` runs once, on the first check that reports the payment as
/// paid. Failed checks are logged and polling continues. A zero `period` is
/// raised to one millisecond.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn spawn_poll<A, F>(
    api: Arc<A>,
    hash: PaymentHash,
    period: Duration,
    on_settled: F,
) -> PollHandle
where
    A: PaymentApi,
    F: FnOnce() + Send + 'static,
{
    let settled = Arc::new(SettledFlag::new());
    let flag = Arc::clone(&settled);
    let span = info_span!("payment_poll", payment_hash = %hash);
    let period = period.max(MIN_PERIOD);

    let task = tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match api.check_payment(&hash).await {
                    Ok(PaymentStatus::Settled) => {
                        if flag.settle() {
                            info!("Payment settled");
                            on_settled();
                        }
                        break;
                    }
                    Ok(PaymentStatus::Pending) => debug!("Payment pending"),
                    Err(e) => warn!(error = %e, "Payment check failed; will retry"),
                }
            }
        }
        .instrument(span),
    );

    PollHandle { task, settled }
}
