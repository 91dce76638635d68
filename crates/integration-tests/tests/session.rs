//! Session resolution and the cart's reaction to it.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use sheshape_client::AuthState;
use sheshape_core::UserId;
use sheshape_integration_tests::{Method, MockBackend, TOKEN, USER_ID};

#[tokio::test]
async fn test_resolve_with_valid_token() {
    let backend = MockBackend::spawn().await;
    let (storefront, _notices) = backend.storefront(Some(TOKEN));

    let state = storefront.session().resolve(storefront.account()).await;

    let identity = state.identity().unwrap();
    assert_eq!(identity.id, UserId::new(USER_ID));
    assert_eq!(identity.username, "jane");
    assert_eq!(
        identity.email.as_ref().unwrap().as_str(),
        "jane@sheshape.test"
    );
    let me = backend
        .requests()
        .into_iter()
        .find(|r| r.path == "/api/auth/me")
        .unwrap();
    assert_eq!(me.authorization.as_deref(), Some("Bearer token-42"));
}

#[tokio::test]
async fn test_rejected_token_is_cleared() {
    let backend = MockBackend::spawn().await;
    let (storefront, _notices) = backend.storefront(Some("expired-token"));

    let state = storefront.resolve_session().await;

    assert_eq!(state, AuthState::Anonymous);
    assert!(!storefront.api().has_token());
    assert_eq!(backend.count(&Method::GET, "/api/cart"), 0);
}

#[tokio::test]
async fn test_server_error_keeps_token() {
    let backend = MockBackend::spawn().await;
    backend.fail(Method::GET, "/api/auth/me", 502, None);
    let (storefront, _notices) = backend.storefront(Some(TOKEN));

    assert_eq!(storefront.resolve_session().await, AuthState::Anonymous);
    assert!(storefront.api().has_token());

    backend.clear_failures();
    assert!(storefront.resolve_session().await.is_authenticated());
}

#[tokio::test]
async fn test_incomplete_identity_is_anonymous() {
    let backend = MockBackend::spawn().await;
    backend.add_user("nameless", 43, "");
    let (storefront, _notices) = backend.storefront(Some("nameless"));

    assert_eq!(storefront.resolve_session().await, AuthState::Anonymous);
    assert_eq!(backend.count(&Method::GET, "/api/cart"), 0);
}

#[tokio::test]
async fn test_auth_sync_follows_session() {
    let backend = MockBackend::spawn().await;
    backend.seed_cart(USER_ID, &[(7, 2)]);
    let (storefront, _notices) = backend.storefront(Some(TOKEN));
    let sync = storefront.cart().spawn_auth_sync();
    let mut snapshots = storefront.cart().subscribe();

    storefront.session().resolve(storefront.account()).await;
    tokio::time::timeout(
        Duration::from_secs(5),
        snapshots.wait_for(|s| s.total_items() == 2),
    )
    .await
    .unwrap()
    .unwrap();

    storefront.session().sign_out(storefront.account()).unwrap();
    tokio::time::timeout(
        Duration::from_secs(5),
        snapshots.wait_for(|s| s.cart.is_empty()),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(!storefront.api().has_token());

    sync.abort();
}
