//! Page-level state shared by the storefront controllers.

use std::sync::Arc;

use tracing::info;
use zapmarket_core::{ProductId, Sats};

use crate::cart::CartStore;
use crate::checkout::CheckoutController;
use crate::checkout::api::HttpPaymentApi;
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::page::SharedPage;
use crate::product::{ProductDetail, ProductSettings};
use crate::storage::{FileStorage, MemoryStorage, SharedStorage};

/// Everything one page needs: configuration, storage, the page itself and
/// the payment backend client.
///
/// This struct is cheaply cloneable via `Arc`. Controllers handed out by it
/// share its storage and page.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    storage: SharedStorage,
    page: SharedPage,
    api: Arc<HttpPaymentApi>,
    cart: CartStore,
}

impl Storefront {
    /// Create the state for `page`.
    ///
    /// Uses file-backed storage when `cart.storage_dir` is set, in-memory
    /// storage otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, page: SharedPage) -> Result<Self> {
        let storage: SharedStorage = match &config.cart.storage_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "Using file-backed cart storage");
                Arc::new(FileStorage::new(dir))
            }
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(config, page, storage)
    }

    /// Create the state over an existing storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(
        config: StorefrontConfig,
        page: SharedPage,
        storage: SharedStorage,
    ) -> Result<Self> {
        let api = Arc::new(HttpPaymentApi::new(
            config.api_base_url.clone(),
            config.checkout.request_timeout,
        )?);
        let cart = CartStore::new(
            Arc::clone(&storage),
            Arc::clone(&page),
            &config.cart,
            config.feedback,
        );

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                storage,
                page,
                api,
                cart,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn storage(&self) -> &SharedStorage {
        &self.inner.storage
    }

    #[must_use]
    pub fn page(&self) -> &SharedPage {
        &self.inner.page
    }

    /// The page's cart. Every call returns a handle to the same store.
    #[must_use]
    pub fn cart(&self) -> CartStore {
        self.inner.cart.clone()
    }

    /// Product detail controller for a product page.
    #[must_use]
    pub fn product_detail(&self, unit_price: Sats, max_stock: u32) -> ProductDetail {
        ProductDetail::new(
            Arc::clone(&self.inner.page),
            self.cart(),
            ProductSettings {
                unit_price,
                max_stock,
                storefront_url: self.inner.config.storefront_url.clone(),
            },
            self.inner.config.feedback,
        )
    }

    /// Checkout controller for `product_id`.
    #[must_use]
    pub fn checkout(
        &self,
        product_id: ProductId,
        unit_price: Sats,
    ) -> CheckoutController<HttpPaymentApi> {
        CheckoutController::new(
            Arc::clone(&self.inner.api),
            Arc::clone(&self.inner.page),
            product_id,
            unit_price,
            self.inner.config.checkout.clone(),
            self.inner.config.feedback,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use zapmarket_core::NewLineItem;

    use super::*;
    use crate::page::MemoryPage;
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_controllers_share_one_cart() {
        let storefront =
            Storefront::new(StorefrontConfig::default(), Arc::new(MemoryPage::new())).unwrap();

        storefront
            .cart()
            .add_item(NewLineItem {
                id: ProductId::new("a"),
                name: "A".to_string(),
                unit_price: Sats::new(5),
                image: "a.jpg".to_string(),
                quantity: Some(2),
            })
            .unwrap();

        assert_eq!(storefront.cart().get_count(), 2);
        assert!(storefront.storage().get_item("zapmarket_cart").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_storage_when_directory_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorefrontConfig::default();
        config.cart.storage_dir = Some(dir.path().join("carts"));

        let storefront = Storefront::new(config, Arc::new(MemoryPage::new())).unwrap();
        storefront
            .cart()
            .add_item(NewLineItem {
                id: ProductId::new("a"),
                name: "A".to_string(),
                unit_price: Sats::new(5),
                image: "a.jpg".to_string(),
                quantity: None,
            })
            .unwrap();

        assert!(dir.path().join("carts").join("zapmarket_cart.json").exists());
    }

    #[test]
    fn test_checkout_starts_idle() {
        let storefront =
            Storefront::new(StorefrontConfig::default(), Arc::new(MemoryPage::new())).unwrap();
        let checkout = storefront.checkout(ProductId::new("p"), Sats::new(100));
        assert_eq!(checkout.state(), zapmarket_core::CheckoutState::Idle);
    }
}
