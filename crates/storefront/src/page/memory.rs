//! Headless in-memory page.
//!
//! Holds a flat set of elements keyed by id plus the window-level state
//! (scroll lock, location, dialogs, clipboard, notification). Used by the
//! test suites and anywhere page behaviour has to run without a browser.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::Page;

/// One element of a [`MemoryPage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub text: String,
    pub html: String,
    pub value: String,
    pub attributes: BTreeMap<String, String>,
    pub classes: BTreeSet<String>,
    pub visible: bool,
    pub enabled: bool,
    /// Data rendered as a scannable code, with its pixel size.
    pub qr: Option<(String, u32)>,
}

impl Default for Element {
    fn default() -> Self {
        Self {
            text: String::new(),
            html: String::new(),
            value: String::new(),
            attributes: BTreeMap::new(),
            classes: BTreeSet::new(),
            visible: true,
            enabled: true,
            qr: None,
        }
    }
}

impl Element {
    /// Create an empty, visible, enabled element.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.insert(class.to_string());
        self
    }

    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// The transient notification currently mounted on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeSnapshot {
    pub message: String,
    /// False once the notice has started fading out.
    pub shown: bool,
}

#[derive(Default)]
struct Document {
    elements: HashMap<String, Element>,
    order: Vec<String>,
    scroll_locked: bool,
    location_hash: Option<String>,
    navigations: Vec<String>,
    alerts: Vec<String>,
    confirm_response: bool,
    clipboard: Option<String>,
    notice: Option<NoticeSnapshot>,
    notices_shown: usize,
    scrolled_to: Vec<String>,
}

/// A page held entirely in memory.
#[derive(Default)]
pub struct MemoryPage {
    document: Mutex<Document>,
}

impl MemoryPage {
    /// Create an empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn doc(&self) -> MutexGuard<'_, Document> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_element(&self, id: &str, f: impl FnOnce(&mut Element)) {
        if let Some(element) = self.doc().elements.get_mut(id) {
            f(element);
        }
    }

    /// Add an element, replacing any element with the same id.
    pub fn insert(&self, id: &str, element: Element) {
        let mut doc = self.doc();
        if doc.elements.insert(id.to_string(), element).is_none() {
            doc.order.push(id.to_string());
        }
    }

    /// Builder form of [`MemoryPage::insert`].
    #[must_use]
    pub fn with(self, id: &str, element: Element) -> Self {
        self.insert(id, element);
        self
    }

    /// Snapshot of an element.
    #[must_use]
    pub fn element(&self, id: &str) -> Option<Element> {
        self.doc().elements.get(id).cloned()
    }

    /// Set the fragment of the current location (without `#`).
    pub fn set_location_hash(&self, hash: &str) {
        self.doc().location_hash = Some(hash.to_string());
    }

    /// Answer given to the next confirmation prompts.
    pub fn set_confirm_response(&self, accept: bool) {
        self.doc().confirm_response = accept;
    }

    #[must_use]
    pub fn is_scroll_locked(&self) -> bool {
        self.doc().scroll_locked
    }

    /// Every URL navigated to, oldest first.
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.doc().navigations.clone()
    }

    /// Every alert shown, oldest first.
    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.doc().alerts.clone()
    }

    #[must_use]
    pub fn clipboard(&self) -> Option<String> {
        self.doc().clipboard.clone()
    }

    /// The notification currently mounted, if any.
    #[must_use]
    pub fn notice(&self) -> Option<NoticeSnapshot> {
        self.doc().notice.clone()
    }

    /// How many notifications have been mounted in total.
    #[must_use]
    pub fn notices_shown(&self) -> usize {
        self.doc().notices_shown
    }

    /// Ids scrolled into view, oldest first.
    #[must_use]
    pub fn scrolled_to(&self) -> Vec<String> {
        self.doc().scrolled_to.clone()
    }
}

impl Page for MemoryPage {
    fn exists(&self, id: &str) -> bool {
        self.doc().elements.contains_key(id)
    }

    fn elements_with_class(&self, class: &str) -> Vec<String> {
        let doc = self.doc();
        doc.order
            .iter()
            .filter(|id| {
                doc.elements
                    .get(id.as_str())
                    .is_some_and(|el| el.classes.contains(class))
            })
            .cloned()
            .collect()
    }

    fn text(&self, id: &str) -> Option<String> {
        self.doc().elements.get(id).map(|el| el.text.clone())
    }

    fn set_text(&self, id: &str, text: &str) {
        self.with_element(id, |el| text.clone_into(&mut el.text));
    }

    fn set_html(&self, id: &str, html: &str) {
        self.with_element(id, |el| html.clone_into(&mut el.html));
    }

    fn value(&self, id: &str) -> Option<String> {
        self.doc().elements.get(id).map(|el| el.value.clone())
    }

    fn set_value(&self, id: &str, value: &str) {
        self.with_element(id, |el| value.clone_into(&mut el.value));
    }

    fn attribute(&self, id: &str, name: &str) -> Option<String> {
        self.doc()
            .elements
            .get(id)
            .and_then(|el| el.attributes.get(name).cloned())
    }

    fn set_attribute(&self, id: &str, name: &str, value: &str) {
        self.with_element(id, |el| {
            el.attributes.insert(name.to_string(), value.to_string());
        });
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.doc()
            .elements
            .get(id)
            .is_some_and(|el| el.classes.contains(class))
    }

    fn add_class(&self, id: &str, class: &str) {
        self.with_element(id, |el| {
            el.classes.insert(class.to_string());
        });
    }

    fn remove_class(&self, id: &str, class: &str) {
        self.with_element(id, |el| {
            el.classes.remove(class);
        });
    }

    fn set_visible(&self, id: &str, visible: bool) {
        self.with_element(id, |el| el.visible = visible);
    }

    fn set_enabled(&self, id: &str, enabled: bool) {
        self.with_element(id, |el| el.enabled = enabled);
    }

    fn set_scroll_locked(&self, locked: bool) {
        self.doc().scroll_locked = locked;
    }

    fn scroll_into_view(&self, id: &str) {
        let mut doc = self.doc();
        if doc.elements.contains_key(id) {
            doc.scrolled_to.push(id.to_string());
        }
    }

    fn location_hash(&self) -> Option<String> {
        self.doc().location_hash.clone()
    }

    fn navigate(&self, url: &str) {
        self.doc().navigations.push(url.to_string());
    }

    fn alert(&self, message: &str) {
        self.doc().alerts.push(message.to_string());
    }

    fn confirm(&self, _message: &str) -> bool {
        self.doc().confirm_response
    }

    fn copy_to_clipboard(&self, text: &str) {
        self.doc().clipboard = Some(text.to_string());
    }

    fn render_qr(&self, id: &str, data: &str, size: u32) {
        self.with_element(id, |el| el.qr = Some((data.to_string(), size)));
    }

    fn show_notice(&self, message: &str) {
        let mut doc = self.doc();
        doc.notice = Some(NoticeSnapshot {
            message: message.to_string(),
            shown: true,
        });
        doc.notices_shown += 1;
    }

    fn fade_notice(&self) {
        if let Some(notice) = self.doc().notice.as_mut() {
            notice.shown = false;
        }
    }

    fn remove_notice(&self) {
        self.doc().notice = None;
    }
}
