//! Product detail page: quantity stepper, running total, checkout link,
//! gallery, tabs, icon feedback and add-to-cart.

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;
use zapmarket_core::{NewLineItem, ProductId, Sats};

use crate::cart::{CartError, CartStore};
use crate::config::FeedbackTimings;
use crate::page::input::quantity_or_one;
use crate::page::{BindingTable, Page, PageEvent, Selector, SharedPage, Trigger, parse_int};
use crate::timer;

pub const QUANTITY_INPUT: &str = "quantityInput";
pub const DECREASE_BUTTON: &str = "decreaseQty";
pub const INCREASE_BUTTON: &str = "increaseQty";
pub const TOTAL_PRICE: &str = "totalPrice";
pub const CHECKOUT_BUTTON: &str = "checkoutBtn";
pub const MAIN_IMAGE: &str = "mainImage";
pub const THUMBNAIL_CLASS: &str = "thumbnail";
pub const TAB_BUTTON_CLASS: &str = "tab-btn";
pub const TAB_PANEL_CLASS: &str = "tab-panel";
pub const ICON_BUTTON_CLASS: &str = "icon-btn";
pub const ADD_TO_CART_BUTTON: &str = "addToCartBtn";

const ACTIVE_CLASS: &str = "active";
const HEART: &str = "❤️";
const SPARKLING_HEART: &str = "💖";

/// Per-product values rendered into the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSettings {
    pub unit_price: Sats,
    /// Upper bound of the quantity stepper.
    pub max_stock: u32,
    /// Base that relative checkout links resolve against.
    pub storefront_url: Url,
}

impl ProductSettings {
    /// Stepper bound; a product with no stock still allows one unit.
    fn max_quantity(&self) -> i64 {
        i64::from(self.max_stock.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductAction {
    Decrease,
    Increase,
    QuantityChanged,
    SelectThumbnail,
    SelectTab,
    IconFeedback,
    AddToCart,
    PageLoad,
}

/// Product detail page controller.
#[derive(Clone)]
pub struct ProductDetail {
    inner: Arc<ProductDetailInner>,
}

struct ProductDetailInner {
    page: SharedPage,
    cart: CartStore,
    settings: ProductSettings,
    timings: FeedbackTimings,
}

impl ProductDetail {
    #[must_use]
    pub fn new(
        page: SharedPage,
        cart: CartStore,
        settings: ProductSettings,
        timings: FeedbackTimings,
    ) -> Self {
        Self {
            inner: Arc::new(ProductDetailInner {
                page,
                cart,
                settings,
                timings,
            }),
        }
    }

    /// Controls the product page responds to.
    #[must_use]
    pub fn bindings() -> BindingTable<ProductAction> {
        BindingTable::new()
            .bind(Selector::Id(DECREASE_BUTTON), Trigger::Click, ProductAction::Decrease)
            .bind(Selector::Id(INCREASE_BUTTON), Trigger::Click, ProductAction::Increase)
            .bind(
                Selector::Id(QUANTITY_INPUT),
                Trigger::Change,
                ProductAction::QuantityChanged,
            )
            .bind(
                Selector::Class(THUMBNAIL_CLASS),
                Trigger::Click,
                ProductAction::SelectThumbnail,
            )
            .bind(
                Selector::Class(TAB_BUTTON_CLASS),
                Trigger::Click,
                ProductAction::SelectTab,
            )
            .bind(
                Selector::Class(ICON_BUTTON_CLASS),
                Trigger::Click,
                ProductAction::IconFeedback,
            )
            .bind(
                Selector::Id(ADD_TO_CART_BUTTON),
                Trigger::Click,
                ProductAction::AddToCart,
            )
            .bind(Selector::Window, Trigger::Load, ProductAction::PageLoad)
    }

    /// Report missing controls.
    pub fn init(&self) {
        Self::bindings().validate(self.page());
    }

    /// Dispatch a page event through the binding table.
    ///
    /// # Errors
    ///
    /// Returns an error if adding to the cart failed to persist.
    pub fn handle_event(&self, event: &PageEvent) -> Result<(), CartError> {
        let Some(action) = Self::bindings().resolve(self.page(), event) else {
            return Ok(());
        };
        debug!(?action, "Product action");

        let target = event.element_id();
        match action {
            ProductAction::Decrease => self.decrease_quantity(),
            ProductAction::Increase => self.increase_quantity(),
            ProductAction::QuantityChanged => self.validate_quantity(),
            ProductAction::SelectThumbnail => {
                if let Some(id) = target {
                    self.change_image(id);
                }
            }
            ProductAction::SelectTab => {
                if let Some(id) = target {
                    self.switch_tab(id);
                }
            }
            ProductAction::IconFeedback => {
                if let Some(id) = target {
                    self.handle_icon_click(id);
                }
            }
            ProductAction::AddToCart => self.add_to_cart()?,
            ProductAction::PageLoad => self.handle_page_load(),
        }
        Ok(())
    }

    // =========================================================================
    // Quantity
    // =========================================================================

    /// Step down by one, never below 1. Non-numeric values are left alone.
    pub fn decrease_quantity(&self) {
        let Some(current) = self.raw_quantity() else {
            return;
        };
        if current > 1 {
            self.set_quantity(current - 1);
        }
    }

    /// Step up by one, never above the stock limit. Non-numeric values are left alone.
    pub fn increase_quantity(&self) {
        let Some(current) = self.raw_quantity() else {
            return;
        };
        if current < self.inner.settings.max_quantity() {
            self.set_quantity(current + 1);
        }
    }

    /// Clamp a typed quantity into `[1, max_stock]`.
    pub fn validate_quantity(&self) {
        let max = self.inner.settings.max_quantity();
        match self.raw_quantity() {
            Some(q) if q > max => self.page().set_value(QUANTITY_INPUT, &max.to_string()),
            Some(q) if q >= 1 => {}
            _ => self.page().set_value(QUANTITY_INPUT, "1"),
        }
        self.update_total();
    }

    /// Current stepper quantity, defaulting to one.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        quantity_or_one(self.page().value(QUANTITY_INPUT).as_deref())
    }

    /// Refresh the running total and the checkout link.
    pub fn update_total(&self) {
        let page = self.page();
        let quantity = self.quantity();
        let total = self.inner.settings.unit_price.times(quantity);
        page.set_text(TOTAL_PRICE, &total.to_string());

        let Some(href) = page.attribute(CHECKOUT_BUTTON, "href") else {
            return;
        };
        match checkout_link(&self.inner.settings.storefront_url, &href, quantity) {
            Ok(url) => page.set_attribute(CHECKOUT_BUTTON, "href", url.as_str()),
            Err(e) => warn!(error = %e, %href, "Unparseable checkout link"),
        }
    }

    fn raw_quantity(&self) -> Option<i64> {
        self.page()
            .value(QUANTITY_INPUT)
            .and_then(|raw| parse_int(&raw))
    }

    fn set_quantity(&self, quantity: i64) {
        self.page().set_value(QUANTITY_INPUT, &quantity.to_string());
        self.update_total();
    }

    // =========================================================================
    // Gallery, tabs, icons
    // =========================================================================

    /// Show the image named by a thumbnail's `data-image` and mark it active.
    pub fn change_image(&self, thumbnail: &str) {
        let page = self.page();
        let Some(src) = page.attribute(thumbnail, "data-image") else {
            return;
        };
        if src.is_empty() || !page.exists(MAIN_IMAGE) {
            return;
        }

        page.set_attribute(MAIN_IMAGE, "src", &src);
        for id in page.elements_with_class(THUMBNAIL_CLASS) {
            page.remove_class(&id, ACTIVE_CLASS);
        }
        page.add_class(thumbnail, ACTIVE_CLASS);
    }

    /// Activate a tab button and the panel named by its `data-tab`.
    pub fn switch_tab(&self, button: &str) {
        let page = self.page();
        for id in page
            .elements_with_class(TAB_BUTTON_CLASS)
            .into_iter()
            .chain(page.elements_with_class(TAB_PANEL_CLASS))
        {
            page.remove_class(&id, ACTIVE_CLASS);
        }

        page.add_class(button, ACTIVE_CLASS);
        if let Some(panel) = page.attribute(button, "data-tab") {
            page.add_class(&panel, ACTIVE_CLASS);
        }
    }

    /// Briefly swap a heart icon for a sparkling one.
    pub fn handle_icon_click(&self, button: &str) {
        let page = self.page();
        if page.text(button).as_deref() != Some(HEART) {
            return;
        }
        page.set_text(button, SPARKLING_HEART);

        let page = Arc::clone(&self.inner.page);
        let button = button.to_string();
        timer::after(self.inner.timings.icon_feedback, move || {
            page.set_text(&button, HEART);
        });
    }

    // =========================================================================
    // Cart and navigation
    // =========================================================================

    /// Add the product described by the add-to-cart control, at the stepper quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    pub fn add_to_cart(&self) -> Result<(), CartError> {
        let page = self.page();
        let attr = |name: &str| page.attribute(ADD_TO_CART_BUTTON, name);

        let Some(id) = attr("data-id").filter(|id| !id.is_empty()) else {
            return Ok(());
        };
        let Some(unit_price) = attr("data-price")
            .and_then(|raw| parse_int(&raw))
            .and_then(|price| u64::try_from(price).ok())
        else {
            warn!(product_id = %id, "Add to cart control has no usable price");
            return Ok(());
        };

        self.inner.cart.add_item(NewLineItem {
            id: ProductId::new(id),
            name: attr("data-name").unwrap_or_default(),
            unit_price: Sats::new(unit_price),
            image: attr("data-image").unwrap_or_default(),
            quantity: Some(self.quantity()),
        })
    }

    /// Scroll the element named by the location fragment into view.
    pub fn handle_page_load(&self) {
        let page = self.page();
        if let Some(fragment) = page.location_hash().filter(|f| !f.is_empty())
            && page.exists(&fragment)
        {
            page.scroll_into_view(&fragment);
        }
    }

    fn page(&self) -> &dyn Page {
        self.inner.page.as_ref()
    }
}

/// Resolve a checkout link and set its `quantity` parameter.
///
/// An existing `quantity` keeps its position; otherwise it is appended.
///
/// # Errors
///
/// Returns an error if `href` cannot be resolved against `base`.
pub fn checkout_link(base: &Url, href: &str, quantity: u32) -> Result<Url, url::ParseError> {
    let mut url = base.join(href)?;
    let quantity = quantity.to_string();

    let mut replaced = false;
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter_map(|(key, value)| {
            if key != "quantity" {
                return Some((key.into_owned(), value.into_owned()));
            }
            if replaced {
                return None;
            }
            replaced = true;
            Some((key.into_owned(), quantity.clone()))
        })
        .collect();
    if !replaced {
        pairs.push(("quantity".to_string(), quantity));
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
    Ok(url)
}
