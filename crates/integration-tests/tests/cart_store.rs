//! Cart store behaviour against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use sheshape_client::{AuthState, ClientError, Notice};
use sheshape_core::ProductId;
use sheshape_integration_tests::{Method, MockBackend, TOKEN, USER_ID};
use tokio::sync::mpsc::UnboundedReceiver;

fn drain(notices: &mut UnboundedReceiver<Notice>) -> Vec<String> {
    let mut messages = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        messages.push(notice.message);
    }
    messages
}

#[tokio::test]
async fn test_add_item_updates_totals() {
    let backend = MockBackend::spawn().await;
    let (storefront, mut notices) = backend.storefront(Some(TOKEN));
    storefront.resolve_session().await;

    let cart = storefront.cart().add_item(ProductId::new(7), 2).await.unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_items, 2);
    assert_eq!(cart.total_price.display(), "$59.98");
    let snapshot = storefront.cart().snapshot();
    assert_eq!(snapshot.total_items(), 2);
    assert_eq!(snapshot.cart, cart);
    assert!(!snapshot.is_loading);
    assert_eq!(backend.cart_quantity(USER_ID, 7), Some(2));
    assert_eq!(drain(&mut notices), vec!["Item added to cart"]);
}

#[tokio::test]
async fn test_update_quantity_zero_removes_line() {
    let backend = MockBackend::spawn().await;
    backend.seed_cart(USER_ID, &[(7, 2), (8, 1)]);
    let (storefront, _notices) = backend.storefront(Some(TOKEN));
    storefront.resolve_session().await;

    let cart = storefront
        .cart()
        .update_quantity(ProductId::new(7), 0)
        .await
        .unwrap();

    assert!(cart.item(ProductId::new(7)).is_none());
    assert_eq!(cart.items.len(), 1);
    assert_eq!(backend.count(&Method::DELETE, "/api/cart/items/7"), 1);
    assert_eq!(backend.count(&Method::PUT, "/api/cart/items/7"), 0);
}

#[tokio::test]
async fn test_update_quantity_sets_line() {
    let backend = MockBackend::spawn().await;
    backend.seed_cart(USER_ID, &[(8, 1)]);
    let (storefront, notices) = backend.storefront(Some(TOKEN));
    storefront.resolve_session().await;

    let cart = storefront
        .cart()
        .update_quantity(ProductId::new(8), 3)
        .await
        .unwrap();

    assert_eq!(cart.item(ProductId::new(8)).unwrap().quantity, 3);
    assert_eq!(backend.cart_quantity(USER_ID, 8), Some(3));
    // Quantity changes are silent
    assert!(notices.is_empty());
}

#[tokio::test]
async fn test_add_then_remove_round_trip() {
    let backend = MockBackend::spawn().await;
    let (storefront, mut notices) = backend.storefront(Some(TOKEN));
    storefront.resolve_session().await;

    storefront.cart().add_item(ProductId::new(9), 1).await.unwrap();
    let cart = storefront.cart().remove_item(ProductId::new(9)).await.unwrap();

    assert!(cart.is_empty());
    assert!(storefront.cart().cart().is_empty());
    assert_eq!(storefront.cart().snapshot().total_items(), 0);
    assert_eq!(
        drain(&mut notices),
        vec!["Item added to cart", "Item removed from cart"]
    );
}

#[tokio::test]
async fn test_clear_cart() {
    let backend = MockBackend::spawn().await;
    backend.seed_cart(USER_ID, &[(7, 1), (9, 4)]);
    let (storefront, mut notices) = backend.storefront(Some(TOKEN));
    storefront.resolve_session().await;
    assert_eq!(storefront.cart().snapshot().total_items(), 5);

    storefront.cart().clear_cart().await.unwrap();

    assert!(storefront.cart().cart().is_empty());
    assert_eq!(backend.cart_quantity(USER_ID, 7), None);
    assert_eq!(drain(&mut notices), vec!["Cart cleared"]);
}

#[tokio::test]
async fn test_signed_out_refresh_sends_nothing() {
    let backend = MockBackend::spawn().await;
    let (storefront, mut notices) = backend.storefront(None);

    assert_eq!(storefront.resolve_session().await, AuthState::Anonymous);
    storefront.cart().refresh_cart().await;

    assert!(backend.requests().is_empty());
    assert!(storefront.cart().cart().is_empty());
    assert!(drain(&mut notices).is_empty());
}

#[tokio::test]
async fn test_signed_out_mutations_are_refused() {
    let backend = MockBackend::spawn().await;
    let (storefront, mut notices) = backend.storefront(None);
    storefront.resolve_session().await;

    let err = storefront
        .cart()
        .add_item(ProductId::new(7), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthenticated));
    let err = storefront.cart().clear_cart().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthenticated));

    assert!(backend.requests().is_empty());
    assert_eq!(
        drain(&mut notices),
        vec![
            "Please log in to add items to cart",
            "Please log in to manage your cart"
        ]
    );
}

#[tokio::test]
async fn test_server_error_on_refresh_is_silent() {
    let backend = MockBackend::spawn().await;
    backend.seed_cart(USER_ID, &[(7, 1)]);
    backend.fail(Method::GET, "/api/cart", 500, None);
    let (storefront, mut notices) = backend.storefront(Some(TOKEN));

    assert!(storefront.resolve_session().await.is_authenticated());

    assert!(storefront.cart().cart().is_empty());
    assert!(!storefront.cart().is_loading());
    assert!(drain(&mut notices).is_empty());

    backend.clear_failures();
    storefront.cart().refresh_cart().await;
    assert_eq!(storefront.cart().snapshot().total_items(), 1);
}

#[tokio::test]
async fn test_forbidden_refresh_reports_failure() {
    let backend = MockBackend::spawn().await;
    backend.seed_cart(USER_ID, &[(7, 1)]);
    let (storefront, mut notices) = backend.storefront(Some(TOKEN));
    assert!(storefront.resolve_session().await.is_authenticated());
    drain(&mut notices);

    backend.fail(Method::GET, "/api/cart", 403, None);
    storefront.cart().refresh_cart().await;

    assert!(storefront.cart().cart().is_empty());
    assert_eq!(drain(&mut notices), vec!["Failed to load cart"]);
}

#[tokio::test]
async fn test_missing_cart_is_empty() {
    let backend = MockBackend::spawn().await;
    let (storefront, mut notices) = backend.storefront(Some(TOKEN));

    storefront.resolve_session().await;

    assert_eq!(backend.count(&Method::GET, "/api/cart"), 1);
    assert!(storefront.cart().cart().is_empty());
    assert!(drain(&mut notices).is_empty());
}

#[tokio::test]
async fn test_failed_mutation_reports_server_message_and_resyncs() {
    let backend = MockBackend::spawn().await;
    backend.seed_cart(USER_ID, &[(7, 1)]);
    let (storefront, mut notices) = backend.storefront(Some(TOKEN));
    storefront.resolve_session().await;
    drain(&mut notices);

    let err = storefront
        .cart()
        .add_item(ProductId::new(999), 1)
        .await
        .unwrap_err();

    assert!(err.api().unwrap().is_not_found());
    assert_eq!(
        drain(&mut notices),
        vec!["Product not found with id: 999"]
    );
    // One load at sign-in, one resync after the failure
    assert_eq!(backend.count(&Method::GET, "/api/cart"), 2);
    assert_eq!(storefront.cart().snapshot().total_items(), 1);
}

#[tokio::test]
async fn test_failed_mutation_without_message_uses_fallback() {
    let backend = MockBackend::spawn().await;
    backend.fail(Method::POST, "/api/cart/items", 503, None);
    let (storefront, mut notices) = backend.storefront(Some(TOKEN));
    storefront.resolve_session().await;

    let err = storefront
        .cart()
        .add_item(ProductId::new(7), 1)
        .await
        .unwrap_err();

    assert_eq!(err.api().unwrap().status, Some(503));
    assert_eq!(drain(&mut notices), vec!["Failed to add item to cart"]);
}

#[tokio::test]
async fn test_concurrent_mutations_run_one_at_a_time() {
    let backend = MockBackend::spawn().await;
    let (storefront, _notices) = backend.storefront(Some(TOKEN));
    storefront.resolve_session().await;
    backend.set_delay(Duration::from_millis(40));

    let cart = storefront.cart();
    let (a, b, c) = tokio::join!(
        cart.add_item(ProductId::new(7), 1),
        cart.add_item(ProductId::new(8), 2),
        cart.add_item(ProductId::new(9), 3),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    assert_eq!(backend.cart_max_in_flight(), 1);
    let order: Vec<i64> = cart
        .cart()
        .items
        .iter()
        .map(|item| item.product_id.as_i64())
        .collect();
    assert_eq!(order, vec![7, 8, 9]);
    assert_eq!(cart.snapshot().total_items(), 6);
    assert!(!cart.is_loading());
}

#[tokio::test]
async fn test_loading_flag_visible_while_in_flight() {
    let backend = MockBackend::spawn().await;
    let (storefront, _notices) = backend.storefront(Some(TOKEN));
    storefront.resolve_session().await;
    backend.set_delay(Duration::from_millis(100));

    let cart = storefront.cart().clone();
    let task = tokio::spawn(async move { cart.add_item(ProductId::new(7), 1).await });

    let mut rx = storefront.cart().subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.is_loading))
        .await
        .unwrap()
        .unwrap();

    task.await.unwrap().unwrap();
    assert!(!storefront.cart().is_loading());
}

#[tokio::test]
async fn test_validate_cart_flags_unavailable_items() {
    let backend = MockBackend::spawn().await;
    backend.seed_cart(USER_ID, &[(7, 1), (8, 1)]);
    backend.mark_unavailable(8);
    let (storefront, mut notices) = backend.storefront(Some(TOKEN));
    storefront.resolve_session().await;

    assert!(!storefront.cart().validate_cart().await);

    let cart = storefront.cart().cart();
    let unavailable: Vec<_> = cart.unavailable_items().map(|i| i.product_id).collect();
    assert_eq!(unavailable, vec![ProductId::new(8)]);
    assert_eq!(
        drain(&mut notices),
        vec!["Some items in your cart are no longer available. Please review your cart."]
    );
}

#[tokio::test]
async fn test_drawer_toggle() {
    let backend = MockBackend::spawn().await;
    let (storefront, _notices) = backend.storefront(Some(TOKEN));
    storefront.resolve_session().await;

    assert!(storefront.cart().toggle_cart());
    assert!(storefront.cart().is_open());
    assert!(!storefront.cart().toggle_cart());
    assert!(!storefront.cart().is_open());
}
