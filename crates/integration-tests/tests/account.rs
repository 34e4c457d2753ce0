//! Account maintenance against the fake shop: profile edits, password
//! changes and resets, and the admin product listing.

use secrecy::SecretString;
use serde_json::json;
use storefront_sync_client::backend::{PasswordChange, PasswordReset, ProfileUpdate};
use storefront_sync_client::{Entity, ErrorInfo, Operation, Outcome};
use storefront_sync_core::Phase;
use storefront_sync_integration_tests::{
    RESET_TOKEN, Shop, TestServer, USER_EMAIL, USER_NAME, USER_PASSWORD, credentials,
};

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

fn change(old: &str, new: &str, confirm: &str) -> PasswordChange {
    PasswordChange {
        old_password: secret(old),
        new_password: secret(new),
        confirm_password: secret(confirm),
    }
}

fn reset(password: &str, confirm: &str) -> PasswordReset {
    PasswordReset {
        password: secret(password),
        confirm_password: secret(confirm),
    }
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_update_profile_merges_user() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();
    dispatcher.login(&credentials(), scope.token()).await;

    let update = ProfileUpdate {
        name: "Augusta King".to_string(),
        email: "augusta@example.com".to_string(),
    };
    let outcome = dispatcher.update_profile(&update, scope.token()).await;
    assert_eq!(outcome, Outcome::Fulfilled);

    assert_eq!(
        shop.received("profile/update"),
        Some(json!({ "name": "Augusta King", "email": "augusta@example.com" }))
    );
    let state = dispatcher.store().snapshot();
    let user = state.session.user.as_ref().expect("user after update");
    assert_eq!(user.name, "Augusta King");
    assert_eq!(user.email, "augusta@example.com");
    assert!(state.session.notice.success);
    assert_eq!(state.session.notice.message.as_deref(), Some("Profile updated"));
    assert_eq!(state.lifecycle.phase(Operation::UpdateProfile), Phase::Fulfilled);
}

#[tokio::test]
async fn test_update_profile_requires_session() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let update = ProfileUpdate {
        name: USER_NAME.to_string(),
        email: USER_EMAIL.to_string(),
    };
    let outcome = dispatcher.update_profile(&update, scope.token()).await;
    assert_eq!(
        outcome,
        Outcome::Rejected(ErrorInfo::new("Please login to access this resource"))
    );
    assert!(shop.received("profile/update").is_none());
    assert!(dispatcher.store().read(|s| s.session.user.is_none()));
}

// =============================================================================
// Passwords
// =============================================================================

#[tokio::test]
async fn test_update_password_sends_all_fields() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();
    dispatcher.login(&credentials(), scope.token()).await;

    let outcome = dispatcher
        .update_password(&change(USER_PASSWORD, "new secret", "new secret"), scope.token())
        .await;
    assert_eq!(outcome, Outcome::Fulfilled);

    assert_eq!(
        shop.received("password/update"),
        Some(json!({
            "oldPassword": USER_PASSWORD,
            "newPassword": "new secret",
            "confirmPassword": "new secret",
        }))
    );
    let state = dispatcher.store().snapshot();
    assert_eq!(
        state.session.user.as_ref().map(|u| u.email.as_str()),
        Some(USER_EMAIL)
    );
    assert!(state.error(Entity::Session).is_none());
    assert_eq!(state.lifecycle.phase(Operation::UpdatePassword), Phase::Fulfilled);
}

#[tokio::test]
async fn test_update_password_wrong_old_password() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();
    dispatcher.login(&credentials(), scope.token()).await;

    let outcome = dispatcher
        .update_password(&change("guess", "new secret", "new secret"), scope.token())
        .await;
    assert_eq!(
        outcome,
        Outcome::Rejected(ErrorInfo::new("Old password is incorrect"))
    );

    // The user stays signed in with the error on the session entity.
    let state = dispatcher.store().snapshot();
    assert!(state.session.is_authenticated());
    assert_eq!(
        state.error(Entity::Session).map(|e| e.message.as_str()),
        Some("Old password is incorrect")
    );
}

#[tokio::test]
async fn test_reset_password_signs_in() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let outcome = dispatcher
        .reset_password(RESET_TOKEN, &reset("fresh start", "fresh start"), scope.token())
        .await;
    assert_eq!(outcome, Outcome::Fulfilled);

    assert_eq!(
        shop.received("password/reset"),
        Some(json!({ "password": "fresh start", "confirmPassword": "fresh start" }))
    );
    let state = dispatcher.store().snapshot();
    assert_eq!(
        state.session.user.as_ref().map(|u| u.name.as_str()),
        Some(USER_NAME)
    );

    // The reset response carries the session cookie.
    let outcome = dispatcher.load_session(scope.token()).await;
    assert_eq!(outcome, Outcome::Fulfilled);
}

#[tokio::test]
async fn test_reset_password_expired_token() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();

    let outcome = dispatcher
        .reset_password("stale", &reset("fresh start", "fresh start"), scope.token())
        .await;
    assert_eq!(
        outcome,
        Outcome::Rejected(ErrorInfo::new(
            "Reset password token is invalid or has expired"
        ))
    );
    assert!(dispatcher.store().read(|s| s.session.user.is_none()));
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn test_admin_products_requires_role() {
    let shop = Shop::default();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();
    dispatcher.login(&credentials(), scope.token()).await;

    let outcome = dispatcher.list_admin_products(scope.token()).await;
    assert_eq!(
        outcome,
        Outcome::Rejected(ErrorInfo::new(
            "Role: user is not allowed to access this resource"
        ))
    );
    let state = dispatcher.store().snapshot();
    assert!(state.catalog.admin_products.is_empty());
    assert!(state.error(Entity::Catalog).is_some());
}

#[tokio::test]
async fn test_admin_products_lists_catalog() {
    let shop = Shop::default();
    shop.grant_admin();
    let server = TestServer::spawn(shop.router()).await;
    let dispatcher = server.dispatcher();
    let scope = dispatcher.scope();
    dispatcher.login(&credentials(), scope.token()).await;

    let outcome = dispatcher.list_admin_products(scope.token()).await;
    assert_eq!(outcome, Outcome::Fulfilled);

    let state = dispatcher.store().snapshot();
    let ids: Vec<&str> = state
        .catalog
        .admin_products
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(ids, ["p1", "p2", "p3", "p4", "p5"]);
    assert_eq!(
        state.lifecycle.phase(Operation::ListAdminProducts),
        Phase::Fulfilled
    );
}
