//! Cart persistence through file storage and the product page.

use std::fs;
use std::sync::Arc;

use zapmarket_core::{NewLineItem, ProductId, Sats};
use zapmarket_integration_tests::init_test_tracing;
use zapmarket_storefront::cart::drawer;
use zapmarket_storefront::config::StorefrontConfig;
use zapmarket_storefront::page::{Element, MemoryPage, Page, PageEvent};
use zapmarket_storefront::product;
use zapmarket_storefront::state::Storefront;

fn storefront_in(dir: &std::path::Path, page: Arc<MemoryPage>) -> Storefront {
    init_test_tracing();
    let mut config = StorefrontConfig::default();
    config.cart.storage_dir = Some(dir.to_path_buf());
    Storefront::new(config, page).expect("Failed to build storefront")
}

fn mug(quantity: Option<u32>) -> NewLineItem {
    NewLineItem {
        id: ProductId::new("mug"),
        name: "Zap Mug".to_string(),
        unit_price: Sats::new(1_000),
        image: "mug.jpg".to_string(),
        quantity,
    }
}

#[tokio::test]
async fn test_cart_survives_a_new_page() {
    let dir = tempfile::tempdir().expect("tempdir");

    let first = storefront_in(dir.path(), Arc::new(MemoryPage::new()));
    first.cart().add_item(mug(Some(2))).expect("add mug");
    first
        .cart()
        .add_item(NewLineItem {
            id: ProductId::new("hat"),
            name: "Sats Hat".to_string(),
            unit_price: Sats::new(500),
            image: "hat.jpg".to_string(),
            quantity: None,
        })
        .expect("add hat");

    let page = Arc::new(
        MemoryPage::new().with(drawer::CART_COUNT, Element::new().with_text("0")),
    );
    let second = storefront_in(dir.path(), page.clone());
    second.cart().handle_event(&PageEvent::load()).expect("load");

    assert_eq!(second.cart().get_total(), Sats::new(2_500));
    assert_eq!(second.cart().get_count(), 3);
    assert_eq!(page.text(drawer::CART_COUNT).as_deref(), Some("3"));
}

#[tokio::test]
async fn test_corrupt_file_reads_as_empty_and_is_replaced() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("zapmarket_cart.json"), "{oops").expect("write");

    let storefront = storefront_in(dir.path(), Arc::new(MemoryPage::new()));
    assert!(storefront.cart().get_items().is_empty());

    storefront.cart().add_item(mug(None)).expect("add mug");
    let raw = fs::read_to_string(dir.path().join("zapmarket_cart.json")).expect("read");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(json[0]["price_sats"], 1000);
    assert_eq!(json[0]["quantity"], 1);
}

#[tokio::test]
async fn test_product_page_adds_to_persisted_cart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let page = Arc::new(
        MemoryPage::new()
            .with(product::QUANTITY_INPUT, Element::new().with_value("2"))
            .with(product::INCREASE_BUTTON, Element::new())
            .with(product::TOTAL_PRICE, Element::new())
            .with(
                product::ADD_TO_CART_BUTTON,
                Element::new()
                    .with_attr("data-id", "mug")
                    .with_attr("data-name", "Zap Mug")
                    .with_attr("data-price", "1000")
                    .with_attr("data-image", "mug.jpg"),
            )
            .with(drawer::CART_COUNT, Element::new())
            .with(drawer::DRAWER_ITEMS, Element::new())
            .with(drawer::DRAWER_TOTAL, Element::new())
            .with(drawer::DRAWER_EMPTY, Element::new())
            .with(drawer::DRAWER_FOOTER, Element::new().hidden()),
    );
    let storefront = storefront_in(dir.path(), page.clone());
    let detail = storefront.product_detail(Sats::new(1_000), 5);

    detail
        .handle_event(&PageEvent::click(product::INCREASE_BUTTON))
        .expect("increase");
    detail
        .handle_event(&PageEvent::click(product::ADD_TO_CART_BUTTON))
        .expect("add to cart");
    detail
        .handle_event(&PageEvent::click(product::ADD_TO_CART_BUTTON))
        .expect("add to cart again");

    assert_eq!(page.text(product::TOTAL_PRICE).as_deref(), Some("3,000 sats"));
    assert_eq!(storefront.cart().get_count(), 6);
    assert_eq!(storefront.cart().get_items().len(), 1);
    assert_eq!(page.text(drawer::CART_COUNT).as_deref(), Some("6"));
    assert_eq!(
        page.text(drawer::DRAWER_TOTAL).as_deref(),
        Some("6,000 sats")
    );
    assert!(
        page.element(drawer::DRAWER_ITEMS)
            .is_some_and(|items| items.html.contains("Zap Mug"))
    );

    let reopened = storefront_in(dir.path(), Arc::new(MemoryPage::new()));
    assert_eq!(reopened.cart().get_count(), 6);
}
