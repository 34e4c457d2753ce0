//! Integration test harness for storefront sync.
//!
//! Serves a small in-memory storefront backend with `axum` on an ephemeral
//! port and points a real [`Dispatcher`] at it, so tests exercise the whole
//! path: cookies, JSON envelopes, status classification, lifecycle and store.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-sync-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let shop = Shop::default();
//! let server = TestServer::spawn(shop.router()).await;
//! let dispatcher = server.dispatcher();
//! let scope = dispatcher.scope();
//!
//! dispatcher.login(&credentials(), scope.token()).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use storefront_sync_client::backend::Credentials;
use storefront_sync_client::{ClientConfig, Dispatcher, Store};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const SESSION_COOKIE: &str = "token";
pub const SESSION_TOKEN: &str = "session-abc123";
pub const USER_ID: &str = "u1";
pub const USER_NAME: &str = "Ada Lovelace";
pub const USER_EMAIL: &str = "ada@example.com";
pub const USER_PASSWORD: &str = "correct horse battery";
/// Token the fake shop emails for password resets.
pub const RESET_TOKEN: &str = "reset-7f3a";

/// Products per listing page.
pub const PAGE_SIZE: usize = 2;

// =============================================================================
// Server
// =============================================================================

/// A backend served on `127.0.0.1` until dropped.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve `router` on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("test listener address");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Self { addr, handle }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A dispatcher with a fresh store and cookie jar.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        let config = ClientConfig::new(&self.base_url()).expect("test config");
        Dispatcher::from_config(&config, Store::new()).expect("test dispatcher")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Credentials the fake shop accepts.
#[must_use]
pub fn credentials() -> Credentials {
    Credentials::new(USER_EMAIL, USER_PASSWORD)
}

// =============================================================================
// Fake shop
// =============================================================================

struct CatalogItem {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    price: f64,
    stock: u32,
}

static CATALOG: [CatalogItem; 5] = [
    CatalogItem {
        id: "p1",
        name: "Trail Shoe",
        category: "Footwear",
        price: 50.0,
        stock: 3,
    },
    CatalogItem {
        id: "p2",
        name: "Wool Sock",
        category: "Apparel",
        price: 5.0,
        stock: 10,
    },
    CatalogItem {
        id: "p3",
        name: "Sun Hat",
        category: "Apparel",
        price: 20.0,
        stock: 0,
    },
    CatalogItem {
        id: "p4",
        name: "Road Shoe",
        category: "Footwear",
        price: 80.0,
        stock: 5,
    },
    CatalogItem {
        id: "p5",
        name: "Rain Jacket",
        category: "Apparel",
        price: 120.0,
        stock: 2,
    },
];

fn find_item(id: &str) -> Option<&'static CatalogItem> {
    CATALOG.iter().find(|item| item.id == id)
}

#[derive(Debug, Clone)]
struct Line {
    id: String,
    product_id: &'static str,
    quantity: u32,
}

#[derive(Debug, Default)]
struct ShopState {
    lines: Vec<Line>,
    next_line: u32,
    sessions_expired: bool,
    admin: bool,
    registered_avatar: Option<String>,
    received: HashMap<&'static str, Value>,
    last_intent: Option<Value>,
    last_verification: Option<Value>,
}

/// In-memory storefront backend speaking the `/api/v1` JSON API.
#[derive(Debug, Clone, Default)]
pub struct Shop {
    state: Arc<Mutex<ShopState>>,
}

impl Shop {
    /// Routes for every endpoint the client calls.
    pub fn router(&self) -> Router {
        let api = Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/profile", get(profile))
            .route("/profile/update", put(update_profile))
            .route("/password/update", put(update_password))
            .route("/password/forgot", post(forgot_password))
            .route("/password/reset/{token}", put(reset_password))
            .route("/products", get(list_products))
            .route("/admin/products", get(admin_products))
            .route("/products/{id}", get(product_detail))
            .route("/review", put(review))
            .route("/cart", get(cart))
            .route("/cart/add", post(add_to_cart))
            .route("/cart/update/{id}", put(update_cart_item))
            .route("/cart/remove/{id}", delete(remove_cart_item))
            .route("/cart/clear", delete(clear_cart))
            .route("/payment/stripe/key", get(payment_key))
            .route("/payment/stripe/create-payment-intent", post(payment_intent))
            .route("/payment/stripe/verify", post(verify_payment))
            .with_state(self.clone());

        Router::new().nest("/api/v1", api)
    }

    /// Make every existing session cookie invalid.
    pub fn expire_sessions(&self) {
        self.lock().sessions_expired = true;
    }

    /// Grant the signed-in user the admin role.
    pub fn grant_admin(&self) {
        self.lock().admin = true;
    }

    /// JSON body last received on `route` (e.g. `"password/update"`).
    #[must_use]
    pub fn received(&self, route: &str) -> Option<Value> {
        self.lock().received.get(route).cloned()
    }

    /// File name of the avatar sent with the last registration.
    #[must_use]
    pub fn registered_avatar(&self) -> Option<String> {
        self.lock().registered_avatar.clone()
    }

    /// Body of the last payment intent request.
    #[must_use]
    pub fn last_intent(&self) -> Option<Value> {
        self.lock().last_intent.clone()
    }

    /// Body of the last payment verification request.
    #[must_use]
    pub fn last_verification(&self) -> Option<Value> {
        self.lock().last_verification.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ShopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn signed_in(&self, headers: &HeaderMap) -> bool {
        let expected = format!("{SESSION_COOKIE}={SESSION_TOKEN}");
        !self.lock().sessions_expired
            && headers
                .get_all(header::COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .flat_map(|v| v.split(';'))
                .any(|c| c.trim() == expected)
    }
}

// =============================================================================
// Responses
// =============================================================================

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn unauthorized() -> Response {
    fail(
        StatusCode::UNAUTHORIZED,
        "Please login to access this resource",
    )
}

fn user_json(name: &str, email: &str) -> Value {
    json!({
        "_id": USER_ID,
        "name": name,
        "email": email,
        "avatar": { "url": "https://cdn.example.com/avatars/u1.png" },
        "role": "user",
        "createdAt": "2024-03-01T12:00:00Z",
    })
}

fn with_session_cookie(body: Value) -> Response {
    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={SESSION_TOKEN}; Path=/; HttpOnly"),
        )],
        Json(body),
    )
        .into_response()
}

fn image_json(id: &str) -> Value {
    json!([{ "url": format!("https://cdn.example.com/products/{id}.jpg") }])
}

fn product_json(item: &CatalogItem) -> Value {
    json!({
        "_id": item.id,
        "name": item.name,
        "description": format!("The {} you have been looking for.", item.name),
        "price": item.price,
        "stock": item.stock,
        "ratings": 4.5,
        "numOfReviews": 1,
        "category": item.category,
        "images": image_json(item.id),
        "reviews": [{
            "_id": format!("r-{}", item.id),
            "user": USER_ID,
            "name": USER_NAME,
            "rating": 4.5,
            "comment": "Fits well",
        }],
    })
}

fn cart_json(lines: &[Line], message: Option<&str>) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .filter_map(|line| {
            let item = find_item(line.product_id)?;
            Some(json!({
                "_id": line.id,
                "product": {
                    "_id": item.id,
                    "name": item.name,
                    "image": image_json(item.id),
                    "stock": item.stock,
                },
                "quantity": line.quantity,
                "price": item.price,
            }))
        })
        .collect();

    let mut body = json!({ "success": true, "cart": { "items": items } });
    if let Some(message) = message {
        body["message"] = json!(message);
    }
    body
}

// =============================================================================
// Session handlers
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn register(State(shop): State<Shop>, mut multipart: Multipart) -> Response {
    let mut name = String::new();
    let mut email = String::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => name = field.text().await.unwrap_or_default(),
            Some("email") => email = field.text().await.unwrap_or_default(),
            Some("avatar") => {
                shop.lock().registered_avatar = field.file_name().map(str::to_string);
            }
            _ => {}
        }
    }

    if email == USER_EMAIL {
        return fail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    with_session_cookie(json!({ "success": true, "user": user_json(&name, &email) }))
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    if body.email != USER_EMAIL || body.password != USER_PASSWORD {
        return fail(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    with_session_cookie(json!({ "success": true, "user": user_json(USER_NAME, USER_EMAIL) }))
}

async fn logout() -> Response {
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}=; Path=/; Max-Age=0"))],
        Json(json!({ "success": true, "message": "Logged out" })),
    )
        .into_response()
}

async fn profile(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    Json(json!({ "success": true, "user": user_json(USER_NAME, USER_EMAIL) })).into_response()
}

#[derive(Deserialize)]
struct ForgotBody {
    email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordUpdate {
    old_password: String,
    new_password: String,
    confirm_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResetBody {
    password: String,
    confirm_password: String,
}

#[derive(Deserialize)]
struct ProfileBody {
    name: String,
    email: String,
}

async fn update_profile(
    State(shop): State<Shop>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    shop.lock().received.insert("profile/update", body.clone());
    let Ok(profile) = serde_json::from_value::<ProfileBody>(body) else {
        return fail(StatusCode::BAD_REQUEST, "Name and email are required");
    };
    Json(json!({
        "success": true,
        "message": "Profile updated",
        "user": user_json(&profile.name, &profile.email),
    }))
    .into_response()
}

async fn update_password(
    State(shop): State<Shop>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    shop.lock().received.insert("password/update", body.clone());
    let Ok(change) = serde_json::from_value::<PasswordUpdate>(body) else {
        return fail(StatusCode::BAD_REQUEST, "Missing password fields");
    };
    if change.old_password != USER_PASSWORD {
        return fail(StatusCode::BAD_REQUEST, "Old password is incorrect");
    }
    if change.new_password != change.confirm_password {
        return fail(StatusCode::BAD_REQUEST, "Passwords do not match");
    }
    with_session_cookie(json!({ "success": true, "user": user_json(USER_NAME, USER_EMAIL) }))
}

async fn reset_password(
    State(shop): State<Shop>,
    Path(token): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    shop.lock().received.insert("password/reset", body.clone());
    if token != RESET_TOKEN {
        return fail(
            StatusCode::BAD_REQUEST,
            "Reset password token is invalid or has expired",
        );
    }
    let Ok(reset) = serde_json::from_value::<PasswordResetBody>(body) else {
        return fail(StatusCode::BAD_REQUEST, "Missing password fields");
    };
    if reset.password != reset.confirm_password {
        return fail(StatusCode::BAD_REQUEST, "Passwords do not match");
    }
    with_session_cookie(json!({ "success": true, "user": user_json(USER_NAME, USER_EMAIL) }))
}

async fn forgot_password(Json(body): Json<ForgotBody>) -> Response {
    if body.email != USER_EMAIL {
        return fail(StatusCode::NOT_FOUND, "User not found");
    }
    Json(json!({ "success": true, "message": format!("Email sent to {}", body.email) }))
        .into_response()
}

// =============================================================================
// Catalog handlers
// =============================================================================

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    keyword: String,
    page: Option<usize>,
    category: Option<String>,
}

async fn list_products(Query(params): Query<ListParams>) -> Response {
    let keyword = params.keyword.to_lowercase();
    let matching: Vec<&CatalogItem> = CATALOG
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&keyword))
        .filter(|item| {
            params
                .category
                .as_deref()
                .is_none_or(|c| item.category.eq_ignore_ascii_case(c))
        })
        .collect();

    let page = params.page.unwrap_or(1).max(1);
    let products: Vec<Value> = matching
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .map(|item| product_json(item))
        .collect();

    Json(json!({
        "success": true,
        "products": products,
        "productsCount": CATALOG.len(),
        "filteredProductsCount": matching.len(),
        "resultPerPage": PAGE_SIZE,
    }))
    .into_response()
}

async fn product_detail(Path(id): Path<String>) -> Response {
    match find_item(&id) {
        Some(item) => {
            Json(json!({ "success": true, "product": product_json(item) })).into_response()
        }
        None => fail(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn admin_products(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    if !shop.lock().admin {
        return fail(
            StatusCode::FORBIDDEN,
            "Role: user is not allowed to access this resource",
        );
    }
    let products: Vec<Value> = CATALOG.iter().map(product_json).collect();
    Json(json!({ "success": true, "products": products })).into_response()
}

async fn review(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    Json(json!({ "success": true, "message": "Review submitted" })).into_response()
}

// =============================================================================
// Cart handlers
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddBody {
    product_id: String,
    quantity: u32,
}

#[derive(Deserialize)]
struct QuantityBody {
    quantity: u32,
}

async fn cart(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    Json(cart_json(&shop.lock().lines, None)).into_response()
}

async fn add_to_cart(
    State(shop): State<Shop>,
    headers: HeaderMap,
    Json(body): Json<AddBody>,
) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    let Some(item) = find_item(&body.product_id) else {
        return fail(StatusCode::NOT_FOUND, "Product not found");
    };

    let mut state = shop.lock();
    let existing = state
        .lines
        .iter()
        .find(|l| l.product_id == item.id)
        .map_or(0, |l| l.quantity);
    if existing + body.quantity > item.stock {
        return fail(StatusCode::BAD_REQUEST, "Insufficient stock");
    }

    if let Some(line) = state.lines.iter_mut().find(|l| l.product_id == item.id) {
        line.quantity += body.quantity;
    } else {
        state.next_line += 1;
        let id = format!("line-{}", state.next_line);
        state.lines.push(Line {
            id,
            product_id: item.id,
            quantity: body.quantity,
        });
    }
    Json(cart_json(&state.lines, Some("Item added to cart"))).into_response()
}

async fn update_cart_item(
    State(shop): State<Shop>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<QuantityBody>,
) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    let mut state = shop.lock();
    let Some(line) = state.lines.iter_mut().find(|l| l.id == id) else {
        return fail(StatusCode::NOT_FOUND, "Cart item not found");
    };
    line.quantity = body.quantity;
    Json(cart_json(&state.lines, Some("Cart updated"))).into_response()
}

async fn remove_cart_item(
    State(shop): State<Shop>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    let mut state = shop.lock();
    state.lines.retain(|l| l.id != id);
    Json(cart_json(&state.lines, Some("Item removed from cart"))).into_response()
}

async fn clear_cart(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    let mut state = shop.lock();
    state.lines.clear();
    Json(cart_json(&state.lines, Some("Cart cleared"))).into_response()
}

// =============================================================================
// Payment handlers
// =============================================================================

async fn payment_key() -> Response {
    Json(json!({ "success": true, "stripeApiKey": "pk_test_fake" })).into_response()
}

async fn payment_intent(
    State(shop): State<Shop>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    shop.lock().last_intent = Some(body);
    Json(json!({ "success": true, "client_secret": "pi_fake_secret_123" })).into_response()
}

async fn verify_payment(
    State(shop): State<Shop>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !shop.signed_in(&headers) {
        return unauthorized();
    }
    let mut state = shop.lock();
    state.last_verification = Some(body);
    state.lines.clear();
    Json(json!({
        "success": true,
        "message": "Order placed",
        "order": { "_id": "order-1" },
    }))
    .into_response()
}
