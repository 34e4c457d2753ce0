//! Domain types for the storefront backend.
//!
//! These types provide a clean, ergonomic API separate from the raw wire
//! representation (`_id` fields, camelCase names, populated references).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use storefront_sync_core::{LineId, OrderId, ProductId, ReviewId, UserId};

// =============================================================================
// Image Types
// =============================================================================

/// Product, cart line or avatar image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
}

// =============================================================================
// Session Types
// =============================================================================

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub avatar: Option<Image>,
    /// Backend role (e.g. "user", "admin").
    pub role: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Whether the backend granted admin access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

/// Login form input.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials from raw form input.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Avatar image uploaded with a registration.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    /// MIME type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Registration form input.
#[derive(Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub avatar: Option<AvatarUpload>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("avatar", &self.avatar.as_ref().map(|a| &a.file_name))
            .finish()
    }
}

/// Profile update form input.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
}

/// Password change form input (signed-in user).
#[derive(Clone)]
pub struct PasswordChange {
    pub old_password: SecretString,
    pub new_password: SecretString,
    pub confirm_password: SecretString,
}

impl std::fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordChange([REDACTED])")
    }
}

/// Password reset form input (from an emailed token).
#[derive(Clone)]
pub struct PasswordReset {
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl PasswordReset {
    /// Whether both entries match. The backend re-checks this.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.password.expose_secret() == self.confirm_password.expose_secret()
    }
}

impl std::fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordReset([REDACTED])")
    }
}

/// Result of a session mutation that may return a refreshed user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub user: Option<UserProfile>,
    pub message: Option<String>,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// A product review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Option<ReviewId>,
    pub user_id: Option<UserId>,
    /// Reviewer display name.
    pub name: String,
    pub rating: f64,
    pub comment: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: u32,
    pub rating_average: f64,
    pub review_count: u32,
    pub category: Option<String>,
    pub images: Vec<Image>,
    pub reviews: Vec<Review>,
}

impl Product {
    /// First image, used for thumbnails and cart lines.
    #[must_use]
    pub fn primary_image(&self) -> Option<&Image> {
        self.images.first()
    }

    /// Whether any stock remains.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Review form input.
#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub product_id: ProductId,
    /// Star rating, 1 to 5.
    pub rating: u8,
    pub comment: String,
}

// =============================================================================
// Cart Types
// =============================================================================

/// One product + quantity record in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub line_id: LineId,
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Stock available when the line was last fetched.
    pub stock: u32,
    pub image: Option<Image>,
}

impl CartLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Build a local line for a product before the server has assigned a
    /// line id. The product id doubles as the line id.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            line_id: LineId::new(product.id.as_str()),
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
            stock: product.stock,
            image: product.primary_image().cloned(),
        }
    }
}

/// The authoritative cart returned by a cart endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartUpdate {
    pub lines: Vec<CartLine>,
    pub message: Option<String>,
}

// =============================================================================
// Payment Types
// =============================================================================

/// Result of a verified payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub order_id: Option<OrderId>,
    pub message: Option<String>,
}
