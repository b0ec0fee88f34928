//! Integration tests for the cart store against a local products/stock API.
//!
//! Each test starts its own `FakeShop` on an ephemeral port and keeps the
//! cart in a temporary storage file, so tests are independent.

use std::sync::Arc;

use rocketshoes_cart::notifier::messages;
use rocketshoes_cart::{
    ApiClient, ApiConfig, ApiError, CART_STORAGE_KEY, CartError, CartPorts, CartStorage,
    CartStore, JsonFileStorage, NotificationLevel, ToastQueue,
};
use rocketshoes_core::{Price, ProductId};
use rocketshoes_integration_tests::{FakeShop, serve};
use tempfile::TempDir;

struct TestCart {
    store: CartStore,
    toasts: Arc<ToastQueue>,
    storage: Arc<JsonFileStorage>,
}

fn open_store(base_url: &str, dir: &TempDir) -> TestCart {
    let api = Arc::new(
        ApiClient::new(&ApiConfig::new(base_url).expect("Invalid base URL"))
            .expect("Failed to build API client"),
    );
    let storage = Arc::new(JsonFileStorage::new(dir.path().join("storage.json")));
    let toasts = Arc::new(ToastQueue::new());

    let store = CartStore::initialize(CartPorts {
        stock: api.clone(),
        catalog: api,
        storage: storage.clone(),
        notifier: toasts.clone(),
    });

    TestCart {
        store,
        toasts,
        storage,
    }
}

fn last_error(toasts: &ToastQueue) -> Option<String> {
    toasts
        .drain()
        .into_iter()
        .filter(|n| n.level == NotificationLevel::Error)
        .map(|n| n.message)
        .next_back()
}

async fn shop_with_catalog() -> (Arc<FakeShop>, String) {
    let shop = FakeShop::new();
    shop.add_product(1, "Tênis de Caminhada Leve Confortável", 179.9, 3);
    shop.add_product(2, "Tênis VR Caminhada Confortável Detalhes Couro Masculino", 139.9, 5);
    shop.add_product(42, "Tênis Adidas Duramo Lite 2.0", 219.9, 10);
    let base_url = serve(shop.clone(), "").await;
    (shop, base_url)
}

// ============================================================================
// Add Product Tests
// ============================================================================

#[tokio::test]
async fn test_add_product_to_empty_cart() {
    let (_shop, base_url) = shop_with_catalog().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut cart = open_store(&base_url, &dir);

    let snapshot = cart
        .store
        .add_product(ProductId::new(42))
        .await
        .expect("Add should succeed")
        .clone();

    assert_eq!(snapshot.len(), 1);
    let line = snapshot.get(ProductId::new(42)).expect("Line missing");
    assert_eq!(line.amount.get(), 1);
    assert_eq!(line.name, "Tênis Adidas Duramo Lite 2.0");
    assert_eq!(line.price, Price::from_cents(21_990));
    assert!(line.image_url.ends_with("/42.jpg"));

    let stored = cart.storage.load().expect("Load failed");
    assert_eq!(stored, Some(snapshot));
}

#[tokio::test]
async fn test_add_same_product_twice_increments_and_rechecks_stock() {
    let (shop, base_url) = shop_with_catalog().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut cart = open_store(&base_url, &dir);

    cart.store.add_product(ProductId::new(2)).await.expect("First add");
    cart.store.add_product(ProductId::new(2)).await.expect("Second add");

    assert_eq!(cart.store.cart().amount_of(ProductId::new(2)), Some(2));
    // Stock is checked on every add, product details only once
    assert_eq!(shop.stock_hits(), 2);
    assert_eq!(shop.product_hits(), 1);
}

#[tokio::test]
async fn test_add_up_to_stock_then_rejected() {
    let (_shop, base_url) = shop_with_catalog().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut cart = open_store(&base_url, &dir);

    for _ in 0..3 {
        cart.store.add_product(ProductId::new(1)).await.expect("Within stock");
    }

    let err = cart
        .store
        .add_product(ProductId::new(1))
        .await
        .expect_err("Fourth unit exceeds stock of 3");

    assert!(matches!(err, CartError::ProductOutOfStock { .. }));
    assert_eq!(cart.store.cart().amount_of(ProductId::new(1)), Some(3));
    assert_eq!(last_error(&cart.toasts).as_deref(), Some(messages::OUT_OF_STOCK));
}

#[tokio::test]
async fn test_add_unknown_product_reports_generic_failure() {
    let (_shop, base_url) = shop_with_catalog().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut cart = open_store(&base_url, &dir);

    let err = cart
        .store
        .add_product(ProductId::new(404))
        .await
        .expect_err("Unknown product");

    assert!(matches!(err, CartError::Api(ApiError::NotFound(_))));
    assert!(cart.store.is_empty());
    assert_eq!(last_error(&cart.toasts).as_deref(), Some(messages::ADD_FAILED));
    assert!(!dir.path().join("storage.json").exists());
}

// ============================================================================
// Update & Remove Tests
// ============================================================================

#[tokio::test]
async fn test_update_beyond_stock_leaves_cart_unchanged() {
    let (shop, base_url) = shop_with_catalog().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut cart = open_store(&base_url, &dir);

    cart.store.add_product(ProductId::new(1)).await.expect("Add");
    cart.store.add_product(ProductId::new(1)).await.expect("Add");
    shop.set_stock(1, 2);

    let err = cart
        .store
        .update_product_amount(ProductId::new(1), 5)
        .await
        .expect_err("2 < 5 + 2");

    assert!(matches!(err, CartError::ProductOutOfStock { .. }));
    assert_eq!(cart.store.cart().amount_of(ProductId::new(1)), Some(2));
    let stored = cart.storage.load().expect("Load failed").expect("Stored cart");
    assert_eq!(stored.amount_of(ProductId::new(1)), Some(2));
}

#[tokio::test]
async fn test_update_decrease_and_remove() {
    let (_shop, base_url) = shop_with_catalog().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut cart = open_store(&base_url, &dir);

    for _ in 0..3 {
        cart.store.add_product(ProductId::new(2)).await.expect("Add");
    }
    cart.store.add_product(ProductId::new(42)).await.expect("Add");

    cart.store
        .update_product_amount(ProductId::new(2), 1)
        .await
        .expect("Decrease within stock");
    assert_eq!(cart.store.cart().amount_of(ProductId::new(2)), Some(1));

    cart.store
        .remove_product(ProductId::new(2))
        .expect("Remove present product");

    let ids: Vec<_> = cart.store.cart().iter().map(|p| p.id.as_i32()).collect();
    assert_eq!(ids, vec![42]);
    assert_eq!(cart.store.total(), Price::from_cents(21_990));
}

#[tokio::test]
async fn test_update_to_zero_is_invalid() {
    let (shop, base_url) = shop_with_catalog().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut cart = open_store(&base_url, &dir);

    let err = cart
        .store
        .update_product_amount(ProductId::new(1), 0)
        .await
        .expect_err("Zero is invalid");

    assert!(matches!(err, CartError::InvalidAmount { amount: 0 }));
    // Rejected before any stock lookup
    assert_eq!(shop.stock_hits(), 0);
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_cart_survives_restart() {
    let (_shop, base_url) = shop_with_catalog().await;
    let dir = TempDir::new().expect("Failed to create temp dir");

    {
        let mut cart = open_store(&base_url, &dir);
        cart.store.add_product(ProductId::new(1)).await.expect("Add");
        cart.store.add_product(ProductId::new(2)).await.expect("Add");
        cart.store.add_product(ProductId::new(2)).await.expect("Add");
    }

    let cart = open_store(&base_url, &dir);
    let ids: Vec<_> = cart.store.cart().iter().map(|p| p.id.as_i32()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(cart.store.cart().amount_of(ProductId::new(2)), Some(2));
    // 179.90 + 2 * 139.90
    assert_eq!(cart.store.total(), Price::from_cents(45_970));
}

#[tokio::test]
async fn test_malformed_storage_starts_empty_and_is_replaced_on_commit() {
    let (_shop, base_url) = shop_with_catalog().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("storage.json");
    std::fs::write(&path, format!(r#"{{"{CART_STORAGE_KEY}":"[{{broken"}}"#))
        .expect("Failed to seed storage");

    let mut cart = open_store(&base_url, &dir);
    assert!(cart.store.is_empty());

    cart.store.add_product(ProductId::new(42)).await.expect("Add");

    let reopened = open_store(&base_url, &dir);
    assert_eq!(reopened.store.cart().amount_of(ProductId::new(42)), Some(1));
}
