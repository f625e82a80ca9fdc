//! The page document driven by the storefront controllers.
//!
//! Controllers never own markup. They read and write a [`Page`], which stands
//! in for the rendered template: elements addressed by id or class, the body
//! scroll lock, navigation, dialogs, clipboard and the notification slot.
//!
//! Every element the controllers touch is optional. Reading an absent element
//! yields `None`, and writing to one does nothing, so a page template that
//! omits part of the markup simply loses that behaviour.

pub mod bindings;
pub mod input;
pub mod memory;

use std::sync::Arc;

pub use bindings::{Binding, BindingTable, PageEvent, Selector, Target, Trigger};
pub use input::parse_int;
pub use memory::{Element, MemoryPage, NoticeSnapshot};

/// Shared handle to a page.
pub type SharedPage = Arc<dyn Page>;

/// A document the storefront controllers read from and write to.
///
/// Implementations use interior mutability: controllers hold a shared handle
/// and call these methods from event handlers and timer tasks.
pub trait Page: Send + Sync {
    /// Whether an element with this id exists.
    fn exists(&self, id: &str) -> bool;

    /// Ids of all elements carrying `class`, in document order.
    fn elements_with_class(&self, class: &str) -> Vec<String>;

    /// Text content of an element.
    fn text(&self, id: &str) -> Option<String>;

    /// Replace the text content of an element.
    fn set_text(&self, id: &str, text: &str);

    /// Replace the inner markup of an element.
    fn set_html(&self, id: &str, html: &str);

    /// Current value of a form control.
    fn value(&self, id: &str) -> Option<String>;

    /// Set the value of a form control.
    fn set_value(&self, id: &str, value: &str);

    /// Read an attribute (including `data-*` attributes and `href`/`src`).
    fn attribute(&self, id: &str, name: &str) -> Option<String>;

    /// Write an attribute.
    fn set_attribute(&self, id: &str, name: &str, value: &str);

    /// Whether an element carries `class`. False for absent elements.
    fn has_class(&self, id: &str, class: &str) -> bool;

    /// Add `class` to an element.
    fn add_class(&self, id: &str, class: &str);

    /// Remove `class` from an element.
    fn remove_class(&self, id: &str, class: &str);

    /// Show or hide an element.
    fn set_visible(&self, id: &str, visible: bool);

    /// Enable or disable a control.
    fn set_enabled(&self, id: &str, enabled: bool);

    /// Lock or restore scrolling of the page body.
    fn set_scroll_locked(&self, locked: bool);

    /// Scroll an element into view.
    fn scroll_into_view(&self, id: &str);

    /// Fragment identifier of the current location, without the leading `#`.
    fn location_hash(&self) -> Option<String>;

    /// Navigate away to `url`.
    fn navigate(&self, url: &str);

    /// Show a blocking message to the user.
    fn alert(&self, message: &str);

    /// Ask the user to confirm an action.
    fn confirm(&self, message: &str) -> bool;

    /// Put text on the clipboard.
    fn copy_to_clipboard(&self, text: &str);

    /// Render a scannable code of `data` into the element, `size` pixels square.
    fn render_qr(&self, id: &str, data: &str, size: u32);

    /// Mount a notification, replacing any notification already shown.
    fn show_notice(&self, message: &str);

    /// Start fading the current notification out.
    fn fade_notice(&self);

    /// Remove the current notification.
    fn remove_notice(&self);
}

/// Toggle `class` on an element and report whether it is now present.
pub fn toggle_class(page: &dyn Page, id: &str, class: &str) -> bool {
    if page.has_class(id, class) {
        page.remove_class(id, class);
        false
    } else {
        page.add_class(id, class);
        page.has_class(id, class)
    }
}
