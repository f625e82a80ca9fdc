//! One-shot delayed callbacks for transient UI feedback.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Run `f` once after `delay` on the current tokio runtime.
///
/// Returns `None` (and never runs `f`) when called outside a runtime; the
/// feedback then simply stays in its changed state.
pub fn after<F>(delay: Duration, f: F) -> Option<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        tracing::debug!(?delay, "No runtime available; delayed callback dropped");
        return None;
    };

    Some(handle.spawn(async move {
        tokio::time::sleep(delay).await;
        f();
    }))
}
