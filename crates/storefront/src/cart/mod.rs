//! Persisted shopping cart.
//!
//! The cart is an ordered list of line items serialized as one JSON array in
//! a single storage slot. Every mutation re-reads the slot, applies the
//! change, writes the whole list back, and re-renders the count badge and
//! drawer. There is no locking between writers: two pages sharing a slot can
//! overwrite each other's changes.

pub mod drawer;
pub mod notice;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument, warn};
use zapmarket_core::{LineItem, NewLineItem, ProductId, Sats};

use crate::config::{CartConfig, FeedbackTimings};
use crate::page::{BindingTable, PageEvent, SharedPage, Selector, Trigger, parse_int};
use crate::storage::{SharedStorage, StorageError};

use notice::Notifier;

/// Errors from cart mutations.
///
/// Reads never fail; only persisting a changed cart can.
#[derive(Debug, Error)]
pub enum CartError {
    /// Storage write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cart could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Actions reachable from cart controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    /// Cart icon: re-render and toggle the drawer.
    ToggleDrawer,
    /// Backdrop or close control.
    CloseDrawer,
    /// Clear control (asks for confirmation).
    Clear,
    /// Drawer stepper carrying `data-id` and `data-quantity`.
    StepQuantity,
    /// Drawer remove control carrying `data-id`.
    RemoveLine,
    /// Page load: sync the badge with storage.
    Init,
}

/// Client-side cart bound to one storage slot and one page.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage: SharedStorage,
    page: SharedPage,
    storage_key: String,
    image_base: String,
    notifier: Notifier,
}

impl CartStore {
    /// Create a cart store.
    #[must_use]
    pub fn new(
        storage: SharedStorage,
        page: SharedPage,
        config: &CartConfig,
        timings: FeedbackTimings,
    ) -> Self {
        let notifier = Notifier::new(Arc::clone(&page), timings);
        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                page,
                storage_key: config.storage_key.clone(),
                image_base: config.image_base.clone(),
                notifier,
            }),
        }
    }

    /// Controls the cart responds to.
    #[must_use]
    pub fn bindings() -> BindingTable<CartAction> {
        BindingTable::new()
            .bind(Selector::Id(drawer::CART_ICON), Trigger::Click, CartAction::ToggleDrawer)
            .bind(Selector::Id(drawer::OVERLAY), Trigger::Click, CartAction::CloseDrawer)
            .bind(Selector::Id(drawer::DRAWER_CLOSE), Trigger::Click, CartAction::CloseDrawer)
            .bind(Selector::Id(drawer::CLEAR_BUTTON), Trigger::Click, CartAction::Clear)
            .bind(
                Selector::Class(drawer::QTY_BUTTON_CLASS),
                Trigger::Click,
                CartAction::StepQuantity,
            )
            .bind(
                Selector::Class(drawer::REMOVE_BUTTON_CLASS),
                Trigger::Click,
                CartAction::RemoveLine,
            )
            .bind(Selector::Window, Trigger::Load, CartAction::Init)
    }

    /// Bring the page in line with storage and report missing controls.
    pub fn init(&self) {
        Self::bindings().validate(self.inner.page.as_ref());
        self.update_cart_count();
    }

    /// Dispatch a page event through the binding table.
    ///
    /// Events with no binding are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the action changed the cart and persisting it failed.
    pub fn handle_event(&self, event: &PageEvent) -> Result<(), CartError> {
        let page = self.inner.page.as_ref();
        let Some(action) = Self::bindings().resolve(page, event) else {
            return Ok(());
        };
        debug!(?action, "Cart action");

        match action {
            CartAction::Init => self.init(),
            CartAction::ToggleDrawer => {
                self.render_cart_drawer();
                drawer::toggle(page);
            }
            CartAction::CloseDrawer => drawer::close(page),
            CartAction::Clear => {
                if page.confirm("Clear all items from your cart?") {
                    self.clear()?;
                }
            }
            CartAction::StepQuantity => {
                let Some(target) = event.element_id() else {
                    return Ok(());
                };
                let id = page.attribute(target, "data-id");
                let quantity = page
                    .attribute(target, "data-quantity")
                    .and_then(|raw| parse_int(&raw));
                if let (Some(id), Some(quantity)) = (id, quantity) {
                    self.update_quantity(&ProductId::new(id), quantity)?;
                }
            }
            CartAction::RemoveLine => {
                if let Some(id) = event
                    .element_id()
                    .and_then(|target| page.attribute(target, "data-id"))
                {
                    self.remove_item(&ProductId::new(id))?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current line items in order.
    ///
    /// A missing, unreadable or unparseable slot reads as an empty cart.
    #[must_use]
    pub fn get_items(&self) -> Vec<LineItem> {
        let raw = match self.inner.storage.get_item(&self.inner.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, key = %self.inner.storage_key, "Failed to read cart; treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Option<Vec<LineItem>>>(&raw) {
            Ok(items) => normalize(items.unwrap_or_default()),
            Err(e) => {
                warn!(error = %e, key = %self.inner.storage_key, "Corrupt cart data; treating as empty");
                Vec::new()
            }
        }
    }

    /// Sum of quantities.
    #[must_use]
    pub fn get_count(&self) -> u64 {
        self.get_items()
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    /// Sum of `quantity × unit_price`.
    #[must_use]
    pub fn get_total(&self) -> Sats {
        self.get_items().iter().map(LineItem::line_total).sum()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add an item, merging with an existing line for the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    #[instrument(skip(self, item), fields(id = %item.id))]
    pub fn add_item(&self, item: NewLineItem) -> Result<(), CartError> {
        let mut items = self.get_items();
        let quantity = item.effective_quantity();
        let name = item.name.clone();

        if let Some(existing) = items.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            items.push(item.into_line_item());
        }

        self.save_items(&items)?;
        self.inner.notifier.show(&format!("{name} added to cart!"));
        Ok(())
    }

    /// Remove the line for `id`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    #[instrument(skip(self))]
    pub fn remove_item(&self, id: &ProductId) -> Result<(), CartError> {
        let mut items = self.get_items();
        items.retain(|line| &line.id != id);
        self.save_items(&items)
    }

    /// Set the quantity of the line for `id`; zero or less removes it.
    ///
    /// Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    #[instrument(skip(self))]
    pub fn update_quantity(&self, id: &ProductId, quantity: i64) -> Result<(), CartError> {
        let mut items = self.get_items();
        let Some(line) = items.iter_mut().find(|line| &line.id == id) else {
            return Ok(());
        };

        if quantity <= 0 {
            return self.remove_item(id);
        }

        line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.save_items(&items)
    }

    /// Delete every line.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage slot could not be removed.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), CartError> {
        self.inner.storage.remove_item(&self.inner.storage_key)?;
        self.refresh();
        Ok(())
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Update the count badge from storage.
    pub fn update_cart_count(&self) {
        drawer::render_count(self.inner.page.as_ref(), self.get_count());
    }

    /// Re-render the drawer from storage.
    pub fn render_cart_drawer(&self) {
        let items = self.get_items();
        let total = items.iter().map(LineItem::line_total).sum();
        drawer::render_drawer(
            self.inner.page.as_ref(),
            &items,
            total,
            &self.inner.image_base,
        );
    }

    /// Toggle the drawer open or closed.
    pub fn toggle_drawer(&self) {
        drawer::toggle(self.inner.page.as_ref());
    }

    /// Close the drawer.
    pub fn close_drawer(&self) {
        drawer::close(self.inner.page.as_ref());
    }

    /// Whether the drawer is open.
    #[must_use]
    pub fn is_drawer_open(&self) -> bool {
        drawer::is_open(self.inner.page.as_ref())
    }

    fn save_items(&self, items: &[LineItem]) -> Result<(), CartError> {
        let json = serde_json::to_string(items)?;
        self.inner
            .storage
            .set_item(&self.inner.storage_key, &json)?;
        self.refresh();
        Ok(())
    }

    fn refresh(&self) {
        self.update_cart_count();
        self.render_cart_drawer();
    }
}

/// Restore the cart invariants on data read from storage.
///
/// Zero-quantity lines are dropped and repeated ids are merged into the
/// first occurrence.
fn normalize(items: Vec<LineItem>) -> Vec<LineItem> {
    let mut out: Vec<LineItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            continue;
        }
        match out.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => out.push(item),
        }
    }
    out
}
