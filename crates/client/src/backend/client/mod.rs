//! Storefront backend client implementation.
//!
//! Uses `reqwest` with a cookie store for HTTP and `serde` for the JSON
//! envelopes. Caches product detail responses using `moka`.

mod cache;
mod conversions;
mod wire;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use storefront_sync_core::{Email, LineId, ProductId};
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::backend::ApiError;
use crate::backend::types::{
    CartUpdate, Credentials, PasswordChange, PasswordReset, PaymentConfirmation, Product,
    ProfileUpdate, Registration, ReviewInput, SessionUpdate, UserProfile,
};
use crate::catalog::{CatalogQuery, ProductPage};
use crate::checkout::{PaymentIntentRequest, PaymentVerification};
use crate::config::ClientConfig;

use cache::{CacheKey, CacheValue};
use conversions::{
    convert_cart, convert_order_id, convert_product, convert_product_page, convert_products,
    convert_user,
};
use wire::{
    AddToCartBody, CartPayload, Empty, Envelope, ForgotPasswordBody, LoginBody,
    MaybeUserPayload, PasswordUpdateBody, PaymentIntentBody, PaymentIntentPayload,
    PaymentKeyPayload, ProductPayload, ProductsPayload, ProfileBody, QuantityBody,
    ResetPasswordBody, ReviewBody, UserPayload, VerifyPayload, extract_message,
};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Prefix every endpoint path is joined onto.
const API_PREFIX: &str = "api/v1/";

/// Longest body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront backend REST API.
///
/// Cheap to clone; all clones share one connection pool, one cookie jar
/// (the session) and one product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("cached_entries", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Network)?;

        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Base URL all endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve an endpoint from its path segments.
    ///
    /// Each segment is percent-encoded, so ids and tokens can never climb out
    /// of their position in the path or add a query string.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| matches!(s.trim(), "" | "." | ".."))
        {
            return Err(ApiError::InvalidInput(format!("invalid path segment: {bad:?}")));
        }

        let mut url = self.inner.base_url.join(API_PREFIX)?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, path: &[&str]) -> Result<RequestBuilder, ApiError> {
        Ok(self.inner.client.request(method, self.endpoint(path)?))
    }

    /// Send a request and decode the response envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(request_id = %request_id, "Sending backend request");

        let response = request
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await
            .map_err(ApiError::Network)?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await.map_err(ApiError::Network)?;

        if !status.is_success() {
            let message = extract_message(&body);
            tracing::warn!(
                request_id = %request_id,
                status = %status,
                message = message.as_deref().unwrap_or(""),
                "Backend returned non-success status"
            );
            return Err(ApiError::from_status(status.as_u16(), message));
        }

        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                body = %excerpt(&body),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })?;

        // A `success: false` envelope is a rejection even on a 2xx status; the
        // payload is not decoded since it is usually absent.
        if value.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
            let message = value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string);
            return Err(ApiError::Validation {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_value(value).map_err(|e| {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                body = %excerpt(&body),
                "Backend response did not match the expected shape"
            );
            ApiError::Parse(e)
        })
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &[&str],
        body: &B,
    ) -> Result<Envelope<T>, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, path)?.json(body);
        self.execute(request).await
    }

    // =========================================================================
    // Session Methods
    // =========================================================================

    /// Register a new account. The backend signs the new user in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] for a malformed email or avatar
    /// MIME type, otherwise any request or envelope error.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<UserProfile, ApiError> {
        let email = parse_email(&registration.email)?;

        let mut form = Form::new()
            .text("name", registration.name.clone())
            .text("email", email.into_inner())
            .text(
                "password",
                registration.password.expose_secret().to_string(),
            );

        if let Some(avatar) = &registration.avatar {
            let part = Part::bytes(avatar.bytes.clone())
                .file_name(avatar.file_name.clone())
                .mime_str(&avatar.content_type)
                .map_err(|e| ApiError::InvalidInput(format!("avatar: {e}")))?;
            form = form.part("avatar", part);
        }

        let request = self.request(Method::POST, &["register"])?.multipart(form);
        let envelope: Envelope<UserPayload> = self.execute(request).await?;
        Ok(convert_user(envelope.data.user))
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] for a malformed email, otherwise
    /// any request or envelope error.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, ApiError> {
        let email = parse_email(&credentials.email)?;
        let body = LoginBody {
            email: email.as_str(),
            password: credentials.password.expose_secret(),
        };

        let envelope: Envelope<UserPayload> =
            self.send_json(Method::POST, &["login"], &body).await?;
        Ok(convert_user(envelope.data.user))
    }

    /// Load the profile of the current session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Auth`] when there is no valid session.
    #[instrument(skip(self))]
    pub async fn load_profile(&self) -> Result<UserProfile, ApiError> {
        let request = self.request(Method::GET, &["profile"])?;
        let envelope: Envelope<UserPayload> = self.execute(request).await?;
        Ok(convert_user(envelope.data.user))
    }

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<Option<String>, ApiError> {
        let request = self.request(Method::POST, &["logout"])?;
        let envelope: Envelope<Empty> = self.execute(request).await?;
        Ok(envelope.message)
    }

    /// Update the signed-in user's name and email.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] for a malformed email, otherwise
    /// any request or envelope error.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<SessionUpdate, ApiError> {
        let email = parse_email(&update.email)?;
        let body = ProfileBody {
            name: &update.name,
            email: email.as_str(),
        };

        let envelope: Envelope<MaybeUserPayload> =
            self.send_json(Method::PUT, &["profile", "update"], &body).await?;
        Ok(SessionUpdate {
            user: envelope.data.user.map(convert_user),
            message: envelope.message,
        })
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, change))]
    pub async fn update_password(
        &self,
        change: &PasswordChange,
    ) -> Result<SessionUpdate, ApiError> {
        let body = PasswordUpdateBody {
            old_password: change.old_password.expose_secret(),
            new_password: change.new_password.expose_secret(),
            confirm_password: change.confirm_password.expose_secret(),
        };

        let envelope: Envelope<MaybeUserPayload> =
            self.send_json(Method::PUT, &["password", "update"], &body).await?;
        Ok(SessionUpdate {
            user: envelope.data.user.map(convert_user),
            message: envelope.message,
        })
    }

    /// Ask the backend to email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] for a malformed email, otherwise
    /// any request or envelope error.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, ApiError> {
        let email = parse_email(email)?;
        let body = ForgotPasswordBody {
            email: email.as_str(),
        };

        let envelope: Envelope<Empty> = self
            .send_json(Method::POST, &["password", "forgot"], &body)
            .await?;
        Ok(envelope.message)
    }

    /// Set a new password using an emailed reset token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] for an empty token, otherwise any
    /// request or envelope error.
    #[instrument(skip(self, token, reset))]
    pub async fn reset_password(
        &self,
        token: &str,
        reset: &PasswordReset,
    ) -> Result<SessionUpdate, ApiError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ApiError::InvalidInput(
                "reset token cannot be empty".to_string(),
            ));
        }

        let body = ResetPasswordBody {
            password: reset.password.expose_secret(),
            confirm_password: reset.confirm_password.expose_secret(),
        };

        let envelope: Envelope<MaybeUserPayload> = self
            .send_json(Method::PUT, &["password", "reset", token], &body)
            .await?;
        Ok(SessionUpdate {
            user: envelope.data.user.map(convert_user),
            message: envelope.message,
        })
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get a page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(page = query.page()))]
    pub async fn list_products(&self, query: &CatalogQuery) -> Result<ProductPage, ApiError> {
        let mut url = self.endpoint(&["products"])?;
        query.apply_to(&mut url);

        let request = self.inner.client.get(url);
        let envelope: Envelope<ProductsPayload> = self.execute(request).await?;
        Ok(convert_product_page(envelope.data))
    }

    /// Get a product with its images and reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let request = self.request(Method::GET, &["products", id.as_str()])?;
        let envelope: Envelope<ProductPayload> = self.execute(request).await?;
        let product = convert_product(envelope.data.product);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Create or replace the signed-in user's review of a product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] for a rating outside 1-5, otherwise
    /// any request or envelope error.
    #[instrument(
        skip(self, review),
        fields(product_id = %review.product_id, rating = review.rating)
    )]
    pub async fn submit_review(&self, review: &ReviewInput) -> Result<Option<String>, ApiError> {
        if !(1..=5).contains(&review.rating) {
            return Err(ApiError::InvalidInput(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let body = ReviewBody {
            rating: review.rating,
            comment: review.comment.trim(),
            product_id: review.product_id.as_str(),
        };

        let envelope: Envelope<Empty> = self.send_json(Method::PUT, &["review"], &body).await?;

        // The cached detail no longer reflects the rating and review list
        self.invalidate_product(&review.product_id).await;

        Ok(envelope.message)
    }

    /// Get every product (admin view, unpaginated).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Auth`] for non-admin sessions, otherwise any
    /// request or envelope error.
    #[instrument(skip(self))]
    pub async fn list_admin_products(&self) -> Result<Vec<Product>, ApiError> {
        let request = self.request(Method::GET, &["admin", "products"])?;
        let envelope: Envelope<ProductsPayload> = self.execute(request).await?;
        Ok(convert_products(envelope.data.products))
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Get the signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<CartUpdate, ApiError> {
        let request = self.request(Method::GET, &["cart"])?;
        let envelope: Envelope<CartPayload> = self.execute(request).await?;
        Ok(cart_update(envelope))
    }

    /// Add a product to the cart; the backend merges quantities per product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] for a zero quantity, otherwise any
    /// request or envelope error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartUpdate, ApiError> {
        if quantity == 0 {
            return Err(ApiError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }

        let body = AddToCartBody {
            product_id: product_id.as_str(),
            quantity,
        };
        let envelope: Envelope<CartPayload> =
            self.send_json(Method::POST, &["cart", "add"], &body).await?;
        Ok(cart_update(envelope))
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] for a zero quantity (use
    /// [`Self::remove_cart_item`]), otherwise any request or envelope error.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn update_cart_item(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<CartUpdate, ApiError> {
        if quantity == 0 {
            return Err(ApiError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }

        let envelope: Envelope<CartPayload> = self
            .send_json(
                Method::PUT,
                &["cart", "update", line_id.as_str()],
                &QuantityBody { quantity },
            )
            .await?;
        Ok(cart_update(envelope))
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn remove_cart_item(&self, line_id: &LineId) -> Result<CartUpdate, ApiError> {
        let request = self.request(Method::DELETE, &["cart", "remove", line_id.as_str()])?;
        let envelope: Envelope<CartPayload> = self.execute(request).await?;
        Ok(cart_update(envelope))
    }

    /// Remove every cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<CartUpdate, ApiError> {
        let request = self.request(Method::DELETE, &["cart", "clear"])?;
        let envelope: Envelope<CartPayload> = self.execute(request).await?;
        Ok(cart_update(envelope))
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Get the payment processor's publishable key.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the response carries no key, otherwise
    /// any request or envelope error.
    #[instrument(skip(self))]
    pub async fn payment_key(&self) -> Result<String, ApiError> {
        let request = self.request(Method::GET, &["payment", "stripe", "key"])?;
        let envelope: Envelope<PaymentKeyPayload> = self.execute(request).await?;
        envelope
            .data
            .stripe_api_key
            .or(envelope.data.publishable_key)
            .ok_or_else(|| missing_field("stripeApiKey"))
    }

    /// Create a payment intent; returns its client secret.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] for a non-positive amount,
    /// [`ApiError::Parse`] if no client secret is returned, otherwise any
    /// request or envelope error.
    #[instrument(
        skip(self, intent),
        fields(amount = intent.amount, currency = %intent.currency.code())
    )]
    pub async fn create_payment_intent(
        &self,
        intent: &PaymentIntentRequest,
    ) -> Result<String, ApiError> {
        if intent.amount <= 0 {
            return Err(ApiError::InvalidInput(
                "payment amount must be positive".to_string(),
            ));
        }

        let body = PaymentIntentBody {
            amount: intent.amount,
            currency: intent.currency.code().to_ascii_lowercase(),
            metadata: &intent.metadata,
        };
        let envelope: Envelope<PaymentIntentPayload> = self
            .send_json(Method::POST, &["payment", "stripe", "create-payment-intent"], &body)
            .await?;
        envelope
            .data
            .client_secret
            .or(envelope.data.client_secret_camel)
            .ok_or_else(|| missing_field("client_secret"))
    }

    /// Verify a confirmed payment and place the order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the backend rejects the
    /// payment.
    #[instrument(
        skip(self, verification),
        fields(payment_intent_id = %verification.payment_intent_id)
    )]
    pub async fn verify_payment(
        &self,
        verification: &PaymentVerification,
    ) -> Result<PaymentConfirmation, ApiError> {
        let envelope: Envelope<VerifyPayload> = self
            .send_json(Method::POST, &["payment", "stripe", "verify"], verification)
            .await?;
        Ok(PaymentConfirmation {
            order_id: convert_order_id(envelope.data.order),
            message: envelope.message,
        })
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, id: &ProductId) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

fn cart_update(envelope: Envelope<CartPayload>) -> CartUpdate {
    CartUpdate {
        lines: convert_cart(envelope.data.cart),
        message: envelope.message,
    }
}

fn parse_email(raw: &str) -> Result<Email, ApiError> {
    Email::parse(raw).map_err(|e| ApiError::InvalidInput(e.to_string()))
}

fn missing_field(field: &'static str) -> ApiError {
    ApiError::Parse(<serde_json::Error as serde::de::Error>::missing_field(field))
}

fn excerpt(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}
