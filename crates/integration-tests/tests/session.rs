//! Session lifecycle against the fake shop: cookies, authentication state
//! and the special handling of `loadSession` rejections.

use secrecy::SecretString;
use storefront_sync_client::backend::{AvatarUpload, Credentials, Registration};
use storefront_sync_client::{Entity, ErrorInfo, Operation, Outcome};
use storefront_sync_core::{Phase, ProductId};
use storefront_sync_integration_tests::{
    Shop, TestServer, USER_EMAIL, USER_NAME, credentials,
};

// =============================================================================
// Login / Profile
// =============================================================================

#[tokio::test]
async fn test_login_sets_cookie_and_loads_profile() {
    let server = TestServer::spawn(Shop::default().router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let outcome = dispatcher.login(&credentials(), scope.token()).await;
    assert_eq!(outcome, Outcome::Fulfilled);

    let state = dispatcher.store().snapshot();
    assert!(state.session.is_authenticated());
    let user = state.session.user.as_ref().expect("user after login");
    assert_eq!(user.name, USER_NAME);
    assert_eq!(user.email, USER_EMAIL);
    assert_eq!(state.lifecycle.phase(Operation::Login), Phase::Fulfilled);

    // The cookie from the login response authenticates the next request.
    let outcome = dispatcher.load_session(scope.token()).await;
    assert_eq!(outcome, Outcome::Fulfilled);
    assert!(dispatcher.store().read(|s| s.session.is_authenticated()));
}

#[tokio::test]
async fn test_wrong_password_is_sticky_until_removed() {
    let server = TestServer::spawn(Shop::default().router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let outcome = dispatcher
        .login(&Credentials::new(USER_EMAIL, "wrong"), scope.token())
        .await;
    assert_eq!(
        outcome,
        Outcome::Rejected(ErrorInfo::new("Invalid email or password"))
    );

    // An unrelated operation does not clear the session error.
    dispatcher
        .get_product_detail(&ProductId::new("p1"), scope.token())
        .await;
    let state = dispatcher.store().snapshot();
    assert!(!state.session.is_authenticated());
    assert_eq!(
        state.error(Entity::Session).map(|e| e.message.as_str()),
        Some("Invalid email or password")
    );

    dispatcher.store().remove_error(Entity::Session);
    assert!(dispatcher.store().read(|s| s.error(Entity::Session).is_none()));
}

#[tokio::test]
async fn test_load_session_without_cookie_rejects() {
    let server = TestServer::spawn(Shop::default().router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let outcome = dispatcher.load_session(scope.token()).await;
    assert_eq!(
        outcome,
        Outcome::Rejected(ErrorInfo::new("Please login to access this resource"))
    );
    let state = dispatcher.store().snapshot();
    assert!(state.session.user.is_none());
    assert!(!state.loading(Entity::Session));
}

#[tokio::test]
async fn test_load_session_rejection_clears_prior_login() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    dispatcher.login(&credentials(), scope.token()).await;
    assert!(dispatcher.store().read(|s| s.session.is_authenticated()));

    shop.expire_sessions();
    let outcome = dispatcher.load_session(scope.token()).await;
    assert!(matches!(outcome, Outcome::Rejected(_)));

    let state = dispatcher.store().snapshot();
    assert!(!state.session.is_authenticated());
    assert!(state.session.user.is_none());
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_clears_session_and_cart() {
    let server = TestServer::spawn(Shop::default().router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    dispatcher.login(&credentials(), scope.token()).await;
    let outcome = dispatcher
        .add_to_cart(&ProductId::new("p1"), 2, scope.token())
        .await;
    assert_eq!(outcome, Outcome::Fulfilled);
    assert_eq!(dispatcher.store().read(|s| s.cart.cart.item_count()), 2);

    let outcome = dispatcher.logout(scope.token()).await;
    assert_eq!(outcome, Outcome::Fulfilled);

    let state = dispatcher.store().snapshot();
    assert!(!state.session.is_authenticated());
    assert!(state.session.user.is_none());
    assert_eq!(state.cart.cart.item_count(), 0);
    assert!(state.cart.cart.total().is_zero());
    assert_eq!(state.session.notice.message.as_deref(), Some("Logged out"));

    // The session cookie was expired, so the cart is no longer reachable.
    let outcome = dispatcher.fetch_cart(scope.token()).await;
    assert!(matches!(outcome, Outcome::Rejected(_)));
}

// =============================================================================
// Registration / Password
// =============================================================================

#[tokio::test]
async fn test_register_uploads_avatar() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let registration = Registration {
        name: "Grace Hopper".to_string(),
        email: "grace@example.com".to_string(),
        password: SecretString::from("cobol-forever-1959".to_string()),
        avatar: Some(AvatarUpload {
            file_name: "avatar.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }),
    };

    let outcome = dispatcher.register(&registration, scope.token()).await;
    assert_eq!(outcome, Outcome::Fulfilled);
    assert_eq!(shop.registered_avatar().as_deref(), Some("avatar.png"));

    let name = dispatcher
        .store()
        .read(|s| s.session.user.as_ref().map(|u| u.name.clone()));
    assert_eq!(name.as_deref(), Some("Grace Hopper"));
}

#[tokio::test]
async fn test_register_rejects_malformed_email_locally() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let registration = Registration {
        name: "Nobody".to_string(),
        email: "not an email".to_string(),
        password: SecretString::from("irrelevant".to_string()),
        avatar: Some(AvatarUpload {
            file_name: "avatar.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: Vec::new(),
        }),
    };

    let outcome = dispatcher.register(&registration, scope.token()).await;
    assert!(matches!(outcome, Outcome::Rejected(_)));
    // Nothing reached the backend.
    assert!(shop.registered_avatar().is_none());
}

#[tokio::test]
async fn test_forgot_password_reports_message() {
    let server = TestServer::spawn(Shop::default().router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let outcome = dispatcher.forgot_password(USER_EMAIL, scope.token()).await;
    assert_eq!(outcome, Outcome::Fulfilled);

    let notice = dispatcher.store().read(|s| s.session.notice.clone());
    assert!(notice.success);
    assert_eq!(
        notice.message,
        Some(format!("Email sent to {USER_EMAIL}"))
    );

    dispatcher.store().remove_success(Entity::Session);
    assert!(!dispatcher.store().read(|s| s.session.notice.success));
}
