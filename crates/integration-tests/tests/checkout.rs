//! Checkout against the fake shop: payment key, intent amount and order
//! verification built from the cart.

use storefront_sync_client::checkout::{PaymentInfo, ShippingInfo};
use storefront_sync_client::{Entity, Outcome};
use storefront_sync_core::ProductId;
use storefront_sync_integration_tests::{Shop, TestServer, credentials};

fn shipping() -> ShippingInfo {
    ShippingInfo {
        address: "12 Analytical Way".to_string(),
        city: "London".to_string(),
        state: "Greater London".to_string(),
        country: "GB".to_string(),
        pin_code: "N1 9GU".to_string(),
        phone_no: "02079460000".to_string(),
    }
}

#[tokio::test]
async fn test_checkout_flow() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    dispatcher.login(&credentials(), scope.token()).await;
    dispatcher
        .add_to_cart(&ProductId::new("p1"), 2, scope.token())
        .await;

    assert_eq!(dispatcher.fetch_payment_key(scope.token()).await, Outcome::Fulfilled);
    assert_eq!(
        dispatcher.store().read(|s| s.checkout.publishable_key.clone()),
        Some("pk_test_fake".to_string())
    );

    assert_eq!(
        dispatcher.create_payment_intent(scope.token()).await,
        Outcome::Fulfilled
    );
    let intent = shop.last_intent().expect("intent body");
    assert_eq!(intent["amount"], 10_000);
    assert_eq!(intent["currency"], "usd");
    assert_eq!(
        dispatcher.store().read(|s| s.checkout.client_secret.clone()),
        Some("pi_fake_secret_123".to_string())
    );

    let payment = PaymentInfo {
        id: "pi_fake".to_string(),
        status: "succeeded".to_string(),
    };
    let outcome = dispatcher
        .verify_payment(payment, shipping(), scope.token())
        .await;
    assert_eq!(outcome, Outcome::Fulfilled);

    let body = shop.last_verification().expect("verification body");
    assert_eq!(body["paymentIntentId"], "pi_fake");
    assert_eq!(body["PaymentInfo"]["status"], "succeeded");
    assert_eq!(body["orderItems"][0]["product"], "p1");
    assert_eq!(body["orderItems"][0]["quantity"], 2);
    assert_eq!(body["prices"]["totalPrice"], 100.0);
    assert_eq!(body["shippingInfo"]["pinCode"], "N1 9GU");

    let state = dispatcher.store().snapshot();
    assert!(state.cart.cart.is_empty());
    assert_eq!(
        state.checkout.order_id.as_ref().map(|id| id.as_str()),
        Some("order-1")
    );
    assert!(state.checkout.notice.success);
    assert!(state.error(Entity::Checkout).is_none());
}

#[tokio::test]
async fn test_checkout_with_empty_cart_is_rejected() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();
    dispatcher.login(&credentials(), scope.token()).await;

    let outcome = dispatcher.create_payment_intent(scope.token()).await;
    assert!(matches!(outcome, Outcome::Rejected(_)));
    assert!(shop.last_intent().is_none());
}
