//! Operation orchestration.
//!
//! Each [`Dispatcher`] method marks its operation pending, performs the
//! request raced against a [`CancellationToken`], then records exactly one of
//! fulfilled, rejected or cancelled in the store. Request failures are never
//! returned as `Err`: they are normalized to [`ErrorInfo`], stored, and
//! reported through [`Outcome`].
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_sync_client::{ClientConfig, Dispatcher, Store};
//! use storefront_sync_client::catalog::CatalogQuery;
//!
//! let dispatcher = Dispatcher::from_config(&ClientConfig::from_env()?, Store::new())?;
//!
//! // One scope per screen; dropping it drops that screen's late responses.
//! let scope = dispatcher.scope();
//! dispatcher
//!     .list_products(&CatalogQuery::new().keyword("shoe"), scope.token())
//!     .await;
//! ```

use std::future::Future;

use storefront_sync_core::{CurrencyCode, LineId, ProductId};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, instrument, warn};

use crate::backend::types::{
    Credentials, PasswordChange, PasswordReset, ProfileUpdate, Registration, ReviewInput,
};
use crate::backend::{ApiClient, ApiError};
use crate::catalog::CatalogQuery;
use crate::checkout::{
    PaymentInfo, PaymentIntentRequest, PaymentVerification, PricingPolicy, ShippingInfo,
};
use crate::config::ClientConfig;
use crate::lifecycle::{ErrorInfo, Operation};
use crate::store::{Action, Fulfillment, Store};

/// How a dispatched operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Fulfilled,
    Rejected(ErrorInfo),
    /// The token was cancelled; nothing was merged.
    Cancelled,
}

impl Outcome {
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled)
    }
}

/// Cancellation scope for one screen or component.
///
/// Dropping the scope cancels its token, so responses that land afterwards
/// are discarded.
#[derive(Debug)]
pub struct DispatchScope {
    token: CancellationToken,
    _guard: DropGuard,
}

impl DispatchScope {
    /// Token to pass to dispatcher operations.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel now instead of on drop.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Runs operations against the backend and records them in a [`Store`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    api: ApiClient,
    store: Store,
    root: CancellationToken,
    currency: CurrencyCode,
    pricing: PricingPolicy,
}

impl Dispatcher {
    /// Dispatcher with default currency and no tax or shipping.
    #[must_use]
    pub fn new(api: ApiClient, store: Store) -> Self {
        Self {
            api,
            store,
            root: CancellationToken::new(),
            currency: CurrencyCode::default(),
            pricing: PricingPolicy::default(),
        }
    }

    /// Build the API client from config and take currency and pricing from it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig, store: Store) -> Result<Self, ApiError> {
        Ok(Self::new(ApiClient::new(config)?, store).with_pricing(config.currency, config.pricing))
    }

    #[must_use]
    pub fn with_pricing(mut self, currency: CurrencyCode, pricing: PricingPolicy) -> Self {
        self.currency = currency;
        self.pricing = pricing;
        self
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Currency used for display and payment intents.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// A new scope, cancelled when dropped or on [`shutdown`](Self::shutdown).
    #[must_use]
    pub fn scope(&self) -> DispatchScope {
        let token = self.root.child_token();
        DispatchScope {
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    /// Cancel every operation dispatched through this dispatcher's scopes.
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    fn is_cancelled(&self, cancel: &CancellationToken) -> bool {
        cancel.is_cancelled() || self.root.is_cancelled()
    }

    async fn run<T, Fut>(
        &self,
        operation: Operation,
        cancel: &CancellationToken,
        request: Fut,
        fulfill: impl FnOnce(T) -> Fulfillment,
    ) -> Outcome
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.store.dispatch(Action::Pending(operation));

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            () = self.root.cancelled() => None,
            result = request => Some(result),
        };

        // A response can land in the same poll as the cancellation.
        let result = match result {
            Some(result) if !self.is_cancelled(cancel) => result,
            _ => {
                debug!(operation = operation.name(), "dropping cancelled operation");
                self.store.dispatch(Action::Cancelled(operation));
                return Outcome::Cancelled;
            }
        };

        match result {
            Ok(value) => {
                self.store.dispatch(Action::Fulfilled(fulfill(value)));
                Outcome::Fulfilled
            }
            Err(err) => {
                let error = ErrorInfo::from_api_error(&err, operation);
                warn!(operation = operation.name(), error = %err, "operation rejected");
                self.store.dispatch(Action::Rejected {
                    operation,
                    error: error.clone(),
                });
                Outcome::Rejected(error)
            }
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    #[instrument(skip(self, registration, cancel))]
    pub async fn register(
        &self,
        registration: &Registration,
        cancel: &CancellationToken,
    ) -> Outcome {
        self.run(
            Operation::Register,
            cancel,
            self.api.register(registration),
            Fulfillment::Register,
        )
        .await
    }

    #[instrument(skip(self, credentials, cancel))]
    pub async fn login(&self, credentials: &Credentials, cancel: &CancellationToken) -> Outcome {
        self.run(
            Operation::Login,
            cancel,
            self.api.login(credentials),
            Fulfillment::Login,
        )
        .await
    }

    /// Restore the session from the cookie. Rejection signs the user out.
    #[instrument(skip(self, cancel))]
    pub async fn load_session(&self, cancel: &CancellationToken) -> Outcome {
        self.run(
            Operation::LoadSession,
            cancel,
            self.api.load_profile(),
            Fulfillment::LoadSession,
        )
        .await
    }

    /// Sign out. Fulfillment also resets the cart and checkout.
    #[instrument(skip(self, cancel))]
    pub async fn logout(&self, cancel: &CancellationToken) -> Outcome {
        self.run(Operation::Logout, cancel, self.api.logout(), |message| {
            Fulfillment::Logout { message }
        })
        .await
    }

    #[instrument(skip(self, update, cancel))]
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
        cancel: &CancellationToken,
    ) -> Outcome {
        self.run(
            Operation::UpdateProfile,
            cancel,
            self.api.update_profile(update),
            Fulfillment::UpdateProfile,
        )
        .await
    }

    #[instrument(skip(self, change, cancel))]
    pub async fn update_password(
        &self,
        change: &PasswordChange,
        cancel: &CancellationToken,
    ) -> Outcome {
        self.run(
            Operation::UpdatePassword,
            cancel,
            self.api.update_password(change),
            Fulfillment::UpdatePassword,
        )
        .await
    }

    #[instrument(skip(self, email, cancel))]
    pub async fn forgot_password(&self, email: &str, cancel: &CancellationToken) -> Outcome {
        self.run(
            Operation::ForgotPassword,
            cancel,
            self.api.forgot_password(email),
            |message| Fulfillment::ForgotPassword { message },
        )
        .await
    }

    #[instrument(skip(self, token, reset, cancel))]
    pub async fn reset_password(
        &self,
        token: &str,
        reset: &PasswordReset,
        cancel: &CancellationToken,
    ) -> Outcome {
        self.run(
            Operation::ResetPassword,
            cancel,
            self.api.reset_password(token, reset),
            Fulfillment::ResetPassword,
        )
        .await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    #[instrument(skip(self, cancel))]
    pub async fn fetch_cart(&self, cancel: &CancellationToken) -> Outcome {
        self.run(
            Operation::FetchCart,
            cancel,
            self.api.get_cart(),
            Fulfillment::FetchCart,
        )
        .await
    }

    #[instrument(skip(self, cancel), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        product_id: &ProductId,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> Outcome {
        self.run(
            Operation::AddToCart,
            cancel,
            self.api.add_to_cart(product_id, quantity),
            Fulfillment::AddToCart,
        )
        .await
    }

    #[instrument(skip(self, cancel), fields(line_id = %line_id))]
    pub async fn update_cart_item(
        &self,
        line_id: &LineId,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> Outcome {
        self.run(
            Operation::UpdateCartItem,
            cancel,
            self.api.update_cart_item(line_id, quantity),
            Fulfillment::UpdateCartItem,
        )
        .await
    }

    #[instrument(skip(self, cancel), fields(line_id = %line_id))]
    pub async fn remove_from_cart(&self, line_id: &LineId, cancel: &CancellationToken) -> Outcome {
        self.run(
            Operation::RemoveFromCart,
            cancel,
            self.api.remove_cart_item(line_id),
            Fulfillment::RemoveFromCart,
        )
        .await
    }

    #[instrument(skip(self, cancel))]
    pub async fn clear_cart(&self, cancel: &CancellationToken) -> Outcome {
        self.run(
            Operation::ClearCart,
            cancel,
            self.api.clear_cart(),
            Fulfillment::ClearCart,
        )
        .await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    #[instrument(skip(self, cancel), fields(page = query.page()))]
    pub async fn list_products(&self, query: &CatalogQuery, cancel: &CancellationToken) -> Outcome {
        let current_page = query.page();
        self.run(
            Operation::ListProducts,
            cancel,
            self.api.list_products(query),
            |page| Fulfillment::ListProducts { page, current_page },
        )
        .await
    }

    #[instrument(skip(self, cancel), fields(product_id = %id))]
    pub async fn get_product_detail(&self, id: &ProductId, cancel: &CancellationToken) -> Outcome {
        self.run(
            Operation::GetProductDetail,
            cancel,
            self.api.get_product(id),
            |product| Fulfillment::GetProductDetail(Box::new(product)),
        )
        .await
    }

    #[instrument(skip(self, review, cancel), fields(product_id = %review.product_id))]
    pub async fn submit_review(&self, review: &ReviewInput, cancel: &CancellationToken) -> Outcome {
        self.run(
            Operation::SubmitReview,
            cancel,
            self.api.submit_review(review),
            |message| Fulfillment::SubmitReview { message },
        )
        .await
    }

    #[instrument(skip(self, cancel))]
    pub async fn list_admin_products(&self, cancel: &CancellationToken) -> Outcome {
        self.run(
            Operation::ListAdminProducts,
            cancel,
            self.api.list_admin_products(),
            Fulfillment::ListAdminProducts,
        )
        .await
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    #[instrument(skip(self, cancel))]
    pub async fn fetch_payment_key(&self, cancel: &CancellationToken) -> Outcome {
        self.run(
            Operation::FetchPaymentKey,
            cancel,
            self.api.payment_key(),
            Fulfillment::FetchPaymentKey,
        )
        .await
    }

    /// Open a payment intent for the current cart total.
    #[instrument(skip(self, cancel))]
    pub async fn create_payment_intent(&self, cancel: &CancellationToken) -> Outcome {
        let cart = self.store.read(|s| s.cart.cart.clone());
        let intent = PaymentIntentRequest::for_cart(&cart, self.currency, &self.pricing);

        let request = async {
            if cart.is_empty() {
                return Err(ApiError::InvalidInput("Your cart is empty".to_string()));
            }
            self.api.create_payment_intent(&intent).await
        };
        self.run(
            Operation::CreatePaymentIntent,
            cancel,
            request,
            Fulfillment::CreatePaymentIntent,
        )
        .await
    }

    /// Record a confirmed payment and create the order from the current cart.
    #[instrument(skip(self, payment, shipping, cancel), fields(payment_intent_id = %payment.id))]
    pub async fn verify_payment(
        &self,
        payment: PaymentInfo,
        shipping: ShippingInfo,
        cancel: &CancellationToken,
    ) -> Outcome {
        let cart = self.store.read(|s| s.cart.cart.clone());
        let verification = PaymentVerification::from_cart(&cart, payment, shipping, &self.pricing);

        let request = async {
            if cart.is_empty() {
                return Err(ApiError::InvalidInput("Your cart is empty".to_string()));
            }
            self.api.verify_payment(&verification).await
        };
        self.run(
            Operation::VerifyPayment,
            cancel,
            request,
            Fulfillment::VerifyPayment,
        )
        .await
    }
}
