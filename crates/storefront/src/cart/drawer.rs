//! Cart drawer and count badge rendering.

use askama::Template;
use zapmarket_core::{LineItem, Sats};

use crate::page::{Page, toggle_class};

pub const CART_COUNT: &str = "cart-count";
pub const CART_ICON: &str = "cart-icon";
pub const DRAWER: &str = "cart-drawer";
pub const OVERLAY: &str = "cart-overlay";
pub const DRAWER_CLOSE: &str = "cart-drawer-close";
pub const DRAWER_ITEMS: &str = "cart-drawer-items";
pub const DRAWER_TOTAL: &str = "cart-drawer-total";
pub const DRAWER_EMPTY: &str = "cart-drawer-empty";
pub const DRAWER_FOOTER: &str = "cart-drawer-footer";
pub const CLEAR_BUTTON: &str = "cart-clear-btn";
pub const QTY_BUTTON_CLASS: &str = "qty-btn";
pub const REMOVE_BUTTON_CLASS: &str = "cart-remove-btn";

const OPEN_CLASS: &str = "open";
const HAS_ITEMS_CLASS: &str = "has-items";

/// Line item display data for the drawer template.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub price: String,
    pub quantity: u32,
    /// Quantity the "−" stepper sets (zero removes the line).
    pub decrease_to: u32,
    /// Quantity the "+" stepper sets.
    pub increase_to: u32,
}

impl CartItemView {
    #[must_use]
    pub fn from_line(item: &LineItem, image_base: &str) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            image_url: format!("{image_base}{}", item.image),
            price: item.unit_price.to_string(),
            quantity: item.quantity,
            decrease_to: item.quantity.saturating_sub(1),
            increase_to: item.quantity.saturating_add(1),
        }
    }
}

/// Drawer line items fragment.
#[derive(Template)]
#[template(path = "partials/cart_drawer_items.html")]
pub struct CartDrawerItemsTemplate {
    pub items: Vec<CartItemView>,
}

/// Update the count badge.
pub fn render_count(page: &dyn Page, count: u64) {
    if !page.exists(CART_COUNT) {
        return;
    }
    page.set_text(CART_COUNT, &count.to_string());
    if count > 0 {
        page.add_class(CART_COUNT, HAS_ITEMS_CLASS);
    } else {
        page.remove_class(CART_COUNT, HAS_ITEMS_CLASS);
    }
}

/// Re-render the drawer contents.
///
/// A template failure leaves the previous contents in place.
pub fn render_drawer(page: &dyn Page, items: &[LineItem], total: Sats, image_base: &str) {
    if !page.exists(DRAWER_ITEMS) {
        return;
    }

    if items.is_empty() {
        page.set_html(DRAWER_ITEMS, "");
        page.set_visible(DRAWER_EMPTY, true);
        page.set_visible(DRAWER_FOOTER, false);
        return;
    }

    page.set_visible(DRAWER_EMPTY, false);
    page.set_visible(DRAWER_FOOTER, true);

    let template = CartDrawerItemsTemplate {
        items: items
            .iter()
            .map(|item| CartItemView::from_line(item, image_base))
            .collect(),
    };
    match template.render() {
        Ok(html) => page.set_html(DRAWER_ITEMS, &html),
        Err(e) => tracing::error!(error = %e, "Failed to render cart drawer"),
    }

    page.set_text(DRAWER_TOTAL, &total.to_string());
}

/// Whether the drawer is currently open.
#[must_use]
pub fn is_open(page: &dyn Page) -> bool {
    page.has_class(DRAWER, OPEN_CLASS)
}

/// Flip the drawer between open and closed.
///
/// Needs both the drawer and its backdrop; otherwise nothing happens.
pub fn toggle(page: &dyn Page) {
    if !(page.exists(DRAWER) && page.exists(OVERLAY)) {
        return;
    }
    let open = toggle_class(page, DRAWER, OPEN_CLASS);
    if open {
        page.add_class(OVERLAY, OPEN_CLASS);
    } else {
        page.remove_class(OVERLAY, OPEN_CLASS);
    }
    page.set_scroll_locked(open);
}

/// Close the drawer and restore page scrolling.
pub fn close(page: &dyn Page) {
    if !(page.exists(DRAWER) && page.exists(OVERLAY)) {
        return;
    }
    page.remove_class(DRAWER, OPEN_CLASS);
    page.remove_class(OVERLAY, OPEN_CLASS);
    page.set_scroll_locked(false);
}
