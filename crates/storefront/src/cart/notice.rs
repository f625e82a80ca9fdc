//! Transient "added to cart" notification.
//!
//! A notice enters, holds, fades, and is removed. Showing a new notice
//! replaces the current one; the replaced notice's pending timers see a newer
//! generation and leave the page alone.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::FeedbackTimings;
use crate::page::SharedPage;
use crate::timer;

#[derive(Clone)]
pub struct Notifier {
    page: SharedPage,
    timings: FeedbackTimings,
    generation: Arc<AtomicU64>,
}

impl Notifier {
    #[must_use]
    pub fn new(page: SharedPage, timings: FeedbackTimings) -> Self {
        Self {
            page,
            timings,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Show `message`, replacing any notice already on the page.
    pub fn show(&self, message: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.page.show_notice(message);

        let page = Arc::clone(&self.page);
        let current = Arc::clone(&self.generation);
        let fade = self.timings.notice_fade;
        timer::after(self.timings.notice_hold, move || {
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            page.fade_notice();

            let fading_page = Arc::clone(&page);
            timer::after(fade, move || {
                if current.load(Ordering::SeqCst) == generation {
                    fading_page.remove_notice();
                }
            });
        });
    }
}
