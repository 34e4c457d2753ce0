//! Wire representation of backend requests and responses.
//!
//! Field names follow the backend's JSON exactly (`_id`, camelCase). Only
//! [`super::conversions`] should look inside these types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Envelope
// =============================================================================

/// `{ success, message?, ...entityData }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

const fn default_success() -> bool {
    true
}

/// Payload for endpoints that only return `success`/`message`.
#[derive(Debug, Deserialize)]
pub struct Empty {}

/// Pull a human-readable message out of an error body.
///
/// Error bodies are not guaranteed to be envelopes (proxies return HTML,
/// frameworks return `{ error: "..." }`), so this never fails.
pub fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .map(str::to_string)
        .filter(|m| !m.trim().is_empty())
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WireImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: Option<WireImage>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub user: WireUser,
}

#[derive(Debug, Deserialize)]
pub struct MaybeUserPayload {
    #[serde(default)]
    pub user: Option<WireUser>,
}

#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ProfileBody<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdateBody<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
    pub confirm_password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordBody<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody<'a> {
    pub password: &'a str,
    pub confirm_password: &'a str,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WireReview {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default, alias = "Stock")]
    pub stock: u32,
    #[serde(default)]
    pub ratings: f64,
    #[serde(default)]
    pub num_of_reviews: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<WireImage>,
    #[serde(default)]
    pub reviews: Vec<WireReview>,
}

/// Product listing. The backend has shipped several names for the counts,
/// so each is read independently rather than as aliases of one field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsPayload {
    #[serde(default)]
    pub products: Vec<WireProduct>,
    #[serde(default)]
    pub products_count: Option<u64>,
    #[serde(default)]
    pub product_count: Option<u64>,
    #[serde(default)]
    pub filtered_products_count: Option<u64>,
    #[serde(default)]
    pub result_per_page: Option<u32>,
    #[serde(default)]
    pub results_per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub product: WireProduct,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody<'a> {
    pub rating: u8,
    pub comment: &'a str,
    pub product_id: &'a str,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WireCartProductDoc {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "images")]
    pub image: Vec<WireImage>,
    #[serde(default, alias = "Stock")]
    pub stock: u32,
}

/// `cart.items[].product` is either populated or a bare id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireCartProduct {
    Populated(WireCartProductDoc),
    Id(String),
}

#[derive(Debug, Deserialize)]
pub struct WireCartItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub product: WireCartProduct,
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct WireCart {
    #[serde(default)]
    pub items: Vec<WireCartItem>,
}

#[derive(Debug, Deserialize)]
pub struct CartPayload {
    #[serde(default)]
    pub cart: Option<WireCart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartBody<'a> {
    pub product_id: &'a str,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct QuantityBody {
    pub quantity: u32,
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentKeyPayload {
    #[serde(default)]
    pub stripe_api_key: Option<String>,
    #[serde(default)]
    pub publishable_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntentPayload {
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default, rename = "clientSecret")]
    pub client_secret_camel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentIntentBody<'a> {
    pub amount: i64,
    pub currency: String,
    pub metadata: &'a BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct WireOrder {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPayload {
    #[serde(default)]
    pub order: Option<WireOrder>,
}
