//! Cart operations against the fake shop. Every server response replaces
//! the local line list wholesale; aggregates follow the lines.

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::json;
use storefront_sync_client::{Entity, ErrorInfo, Operation, Outcome};
use storefront_sync_core::{LineId, ProductId};
use storefront_sync_integration_tests::{Shop, TestServer, credentials};

// =============================================================================
// Fetch
// =============================================================================

#[tokio::test]
async fn test_fetch_cart_populated_product() {
    let router = Router::new().route(
        "/api/v1/cart",
        get(|| async {
            Json(json!({
                "cart": {
                    "items": [{
                        "_id": "a",
                        "product": { "_id": "p1", "name": "Shoe", "image": [], "stock": 3 },
                        "quantity": 2,
                        "price": 50,
                    }]
                }
            }))
        }),
    );
    let server = TestServer::spawn(router).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let outcome = dispatcher.fetch_cart(scope.token()).await;
    assert_eq!(outcome, Outcome::Fulfilled);

    let cart = dispatcher.store().read(|s| s.cart.cart.clone());
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.item_count(), 2);
    assert_eq!(cart.total(), Decimal::new(100, 0));

    let line = cart.line_for(&ProductId::new("p1")).expect("line for p1");
    assert_eq!(line.line_id.as_str(), "a");
    assert_eq!(line.name, "Shoe");
    assert_eq!(line.stock, 3);
    assert!(line.image.is_none());
}

#[tokio::test]
async fn test_success_false_envelope_rejects() {
    let router = Router::new().route(
        "/api/v1/cart",
        get(|| async { Json(json!({ "success": false, "message": "Cart is locked" })) }),
    );
    let server = TestServer::spawn(router).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let outcome = dispatcher.fetch_cart(scope.token()).await;
    assert_eq!(outcome, Outcome::Rejected(ErrorInfo::new("Cart is locked")));
}

#[tokio::test]
async fn test_unreadable_error_body_uses_fallback() {
    let router = Router::new().route(
        "/api/v1/cart",
        get(|| async { (StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>") }),
    );
    let server = TestServer::spawn(router).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let outcome = dispatcher.fetch_cart(scope.token()).await;
    assert_eq!(
        outcome,
        Outcome::Rejected(ErrorInfo::new(Operation::FetchCart.fallback_message()))
    );
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_add_update_remove_clear() {
    let server = TestServer::spawn(Shop::default().router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();
    dispatcher.login(&credentials(), scope.token()).await;

    // Adding the same product twice merges into one line.
    dispatcher.add_to_cart(&ProductId::new("p2"), 2, scope.token()).await;
    dispatcher.add_to_cart(&ProductId::new("p2"), 3, scope.token()).await;
    dispatcher.add_to_cart(&ProductId::new("p1"), 1, scope.token()).await;

    let cart = dispatcher.store().read(|s| s.cart.cart.clone());
    assert_eq!(cart.lines().len(), 2);
    assert_eq!(cart.item_count(), 6);
    assert_eq!(cart.total(), Decimal::new(75, 0));

    let sock_line = cart
        .line_for(&ProductId::new("p2"))
        .map(|l| l.line_id.clone())
        .expect("line for p2");

    let outcome = dispatcher
        .update_cart_item(&sock_line, 1, scope.token())
        .await;
    assert_eq!(outcome, Outcome::Fulfilled);
    assert_eq!(dispatcher.store().read(|s| s.cart.cart.item_count()), 2);
    assert_eq!(
        dispatcher.store().read(|s| s.cart.notice.message.clone()),
        Some("Cart updated".to_string())
    );

    dispatcher.remove_from_cart(&sock_line, scope.token()).await;
    let cart = dispatcher.store().read(|s| s.cart.cart.clone());
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.total(), Decimal::new(50, 0));

    dispatcher.clear_cart(scope.token()).await;
    let cart = dispatcher.store().read(|s| s.cart.cart.clone());
    assert!(cart.is_empty());
    assert_eq!(cart.item_count(), 0);
    assert!(cart.total().is_zero());
}

#[tokio::test]
async fn test_insufficient_stock_keeps_lines() {
    let server = TestServer::spawn(Shop::default().router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();
    dispatcher.login(&credentials(), scope.token()).await;

    dispatcher.add_to_cart(&ProductId::new("p1"), 2, scope.token()).await;
    let outcome = dispatcher
        .add_to_cart(&ProductId::new("p1"), 5, scope.token())
        .await;
    assert_eq!(outcome, Outcome::Rejected(ErrorInfo::new("Insufficient stock")));

    let state = dispatcher.store().snapshot();
    assert_eq!(state.cart.cart.item_count(), 2);
    assert_eq!(
        state.error(Entity::Cart).map(|e| e.message.as_str()),
        Some("Insufficient stock")
    );
    assert!(!state.loading(Entity::Cart));
}

#[tokio::test]
async fn test_zero_quantity_rejected_locally() {
    let server = TestServer::spawn(Shop::default().router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();
    dispatcher.login(&credentials(), scope.token()).await;

    let outcome = dispatcher
        .update_cart_item(&LineId::new("line-1"), 0, scope.token())
        .await;
    assert!(matches!(outcome, Outcome::Rejected(_)));
}

#[tokio::test]
async fn test_server_response_overrides_local_edits() {
    let server = TestServer::spawn(Shop::default().router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();
    dispatcher.login(&credentials(), scope.token()).await;

    let guest_line = storefront_sync_client::backend::CartLine {
        line_id: LineId::new("local"),
        product_id: ProductId::new("p4"),
        name: "Road Shoe".to_string(),
        unit_price: Decimal::new(80, 0),
        quantity: 1,
        stock: 5,
        image: None,
    };
    dispatcher.store().add_local(guest_line, 4);
    assert_eq!(dispatcher.store().read(|s| s.cart.cart.item_count()), 4);

    dispatcher.fetch_cart(scope.token()).await;
    assert!(dispatcher.store().read(|s| s.cart.cart.is_empty()));
}

#[tokio::test]
async fn test_line_id_cannot_reach_other_endpoints() {
    let server = TestServer::spawn(Shop::default().router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    dispatcher.login(&credentials(), scope.token()).await;
    dispatcher
        .add_to_cart(&ProductId::new("p1"), 1, scope.token())
        .await;

    // Sent as one escaped segment of `cart/remove/{id}`, not as `cart/clear`.
    let outcome = dispatcher
        .remove_from_cart(&LineId::new("../clear"), scope.token())
        .await;
    assert_eq!(outcome, Outcome::Fulfilled);
    assert_eq!(dispatcher.store().read(|s| s.cart.cart.item_count()), 1);

    let outcome = dispatcher
        .remove_from_cart(&LineId::new(".."), scope.token())
        .await;
    assert!(matches!(outcome, Outcome::Rejected(_)));
    assert_eq!(dispatcher.store().read(|s| s.cart.cart.item_count()), 1);
}
