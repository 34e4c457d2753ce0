//! Per-operation request lifecycle.
//!
//! Every named operation has its own [`OperationState`], keyed by
//! [`Operation`]. Loading flags are derived from those entries, so two
//! operations pending at the same time never clobber each other's indicator.

use std::collections::HashMap;
use std::fmt;

use storefront_sync_core::Phase;

use crate::backend::ApiError;

/// The state slice an operation writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Session,
    Cart,
    Catalog,
    Checkout,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Session => "session",
            Self::Cart => "cart",
            Self::Catalog => "catalog",
            Self::Checkout => "checkout",
        })
    }
}

/// A named asynchronous request-and-response flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Register,
    Login,
    LoadSession,
    Logout,
    UpdateProfile,
    UpdatePassword,
    ForgotPassword,
    ResetPassword,
    FetchCart,
    AddToCart,
    UpdateCartItem,
    RemoveFromCart,
    ClearCart,
    ListProducts,
    GetProductDetail,
    SubmitReview,
    ListAdminProducts,
    FetchPaymentKey,
    CreatePaymentIntent,
    VerifyPayment,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 20] = [
        Self::Register,
        Self::Login,
        Self::LoadSession,
        Self::Logout,
        Self::UpdateProfile,
        Self::UpdatePassword,
        Self::ForgotPassword,
        Self::ResetPassword,
        Self::FetchCart,
        Self::AddToCart,
        Self::UpdateCartItem,
        Self::RemoveFromCart,
        Self::ClearCart,
        Self::ListProducts,
        Self::GetProductDetail,
        Self::SubmitReview,
        Self::ListAdminProducts,
        Self::FetchPaymentKey,
        Self::CreatePaymentIntent,
        Self::VerifyPayment,
    ];

    /// The entity whose fields this operation owns.
    #[must_use]
    pub const fn entity(self) -> Entity {
        match self {
            Self::Register
            | Self::Login
            | Self::LoadSession
            | Self::Logout
            | Self::UpdateProfile
            | Self::UpdatePassword
            | Self::ForgotPassword
            | Self::ResetPassword => Entity::Session,
            Self::FetchCart
            | Self::AddToCart
            | Self::UpdateCartItem
            | Self::RemoveFromCart
            | Self::ClearCart => Entity::Cart,
            Self::ListProducts
            | Self::GetProductDetail
            | Self::SubmitReview
            | Self::ListAdminProducts => Entity::Catalog,
            Self::FetchPaymentKey | Self::CreatePaymentIntent | Self::VerifyPayment => {
                Entity::Checkout
            }
        }
    }

    /// Stable name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::LoadSession => "loadSession",
            Self::Logout => "logout",
            Self::UpdateProfile => "updateProfile",
            Self::UpdatePassword => "updatePassword",
            Self::ForgotPassword => "forgotPassword",
            Self::ResetPassword => "resetPassword",
            Self::FetchCart => "fetchCart",
            Self::AddToCart => "addToCart",
            Self::UpdateCartItem => "updateCartItem",
            Self::RemoveFromCart => "removeFromCart",
            Self::ClearCart => "clearCart",
            Self::ListProducts => "listProducts",
            Self::GetProductDetail => "getProductDetail",
            Self::SubmitReview => "submitReview",
            Self::ListAdminProducts => "listAdminProducts",
            Self::FetchPaymentKey => "fetchPaymentKey",
            Self::CreatePaymentIntent => "createPaymentIntent",
            Self::VerifyPayment => "verifyPayment",
        }
    }

    /// Message shown when a failure carries no server message.
    ///
    /// Displayed verbatim to users; each operation has its own.
    #[must_use]
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Register => "Registration failed. Please try again.",
            Self::Login => "Login failed. Please check your email and password.",
            Self::LoadSession => "Failed to load user profile.",
            Self::Logout => "Logout failed. Please try again.",
            Self::UpdateProfile => "Profile update failed. Please try again later.",
            Self::UpdatePassword => "Password update failed.",
            Self::ForgotPassword => "Could not send the password reset email.",
            Self::ResetPassword => "Password reset failed.",
            Self::FetchCart => "Failed to fetch cart items.",
            Self::AddToCart => "Failed to add item to cart.",
            Self::UpdateCartItem => "Failed to update cart item.",
            Self::RemoveFromCart => "Failed to remove item from cart.",
            Self::ClearCart => "Failed to clear cart.",
            Self::ListProducts => "Failed to load products.",
            Self::GetProductDetail => "Failed to load product details.",
            Self::SubmitReview => "Failed to submit review.",
            Self::ListAdminProducts => "Failed to fetch admin products.",
            Self::FetchPaymentKey => "Failed to load payment configuration.",
            Self::CreatePaymentIntent => "Failed to start payment.",
            Self::VerifyPayment => "Payment verification failed.",
        }
    }

    /// Whether fulfillment raises a success notification.
    ///
    /// Plain reads (session restore, cart and catalog fetches) do not.
    #[must_use]
    pub const fn reports_success(self) -> bool {
        !matches!(
            self,
            Self::LoadSession
                | Self::FetchCart
                | Self::ListProducts
                | Self::GetProductDetail
                | Self::ListAdminProducts
                | Self::FetchPaymentKey
                | Self::CreatePaymentIntent
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure normalized for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
}

impl ErrorInfo {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The server's message when it sent one, else the operation's fallback.
    #[must_use]
    pub fn from_api_error(err: &ApiError, operation: Operation) -> Self {
        Self::new(
            err.server_message()
                .unwrap_or_else(|| operation.fallback_message()),
        )
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Lifecycle of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationState {
    pub phase: Phase,
    /// Requests of this operation not yet settled.
    pub in_flight: u32,
    /// Error from the most recent rejection, until dismissed or redispatched.
    pub error: Option<ErrorInfo>,
}

/// Lifecycle entries for every operation dispatched so far.
///
/// Entries are created at first dispatch. The phase of an operation only
/// settles once none of its requests remain in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lifecycle {
    operations: HashMap<Operation, OperationState>,
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for an operation; `None` if it was never dispatched.
    #[must_use]
    pub fn get(&self, operation: Operation) -> Option<&OperationState> {
        self.operations.get(&operation)
    }

    /// Current phase; `Idle` if never dispatched.
    #[must_use]
    pub fn phase(&self, operation: Operation) -> Phase {
        self.get(operation).map_or(Phase::Idle, |s| s.phase)
    }

    /// Whether any request of this operation is in flight.
    #[must_use]
    pub fn is_loading(&self, operation: Operation) -> bool {
        self.get(operation).is_some_and(|s| s.in_flight > 0)
    }

    /// Whether any operation of the entity is in flight.
    #[must_use]
    pub fn entity_loading(&self, entity: Entity) -> bool {
        self.operations
            .iter()
            .any(|(op, s)| op.entity() == entity && s.in_flight > 0)
    }

    /// Error recorded for the operation.
    #[must_use]
    pub fn error(&self, operation: Operation) -> Option<&ErrorInfo> {
        self.get(operation).and_then(|s| s.error.as_ref())
    }

    pub(crate) fn begin(&mut self, operation: Operation) {
        let state = self.operations.entry(operation).or_default();
        state.in_flight = state.in_flight.saturating_add(1);
        state.phase = Phase::Pending;
        state.error = None;
    }

    pub(crate) fn fulfill(&mut self, operation: Operation) {
        self.settle(operation, Phase::Fulfilled);
    }

    pub(crate) fn reject(&mut self, operation: Operation, error: ErrorInfo) {
        self.operations.entry(operation).or_default().error = Some(error);
        self.settle(operation, Phase::Rejected);
    }

    /// A dropped request. Returns to `Idle` once nothing else is in flight.
    pub(crate) fn cancel(&mut self, operation: Operation) {
        self.settle(operation, Phase::Idle);
    }

    /// Clear errors of the entity's operations, resetting rejected ones to `Idle`.
    pub(crate) fn dismiss_errors(&mut self, entity: Entity) {
        for (op, state) in &mut self.operations {
            if op.entity() != entity {
                continue;
            }
            state.error = None;
            if state.phase == Phase::Rejected {
                state.phase = Phase::Idle;
            }
        }
    }

    /// Reset the entity's fulfilled operations to `Idle`.
    pub(crate) fn dismiss_success(&mut self, entity: Entity) {
        for (op, state) in &mut self.operations {
            if op.entity() == entity && state.phase == Phase::Fulfilled {
                state.phase = Phase::Idle;
            }
        }
    }

    fn settle(&mut self, operation: Operation, phase: Phase) {
        let state = self.operations.entry(operation).or_default();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight == 0 {
            state.phase = phase;
            // An overlapping request that failed earlier is superseded.
            if phase != Phase::Rejected {
                state.error = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_fallback_messages_are_distinct() {
        let messages: HashSet<&str> = Operation::ALL
            .iter()
            .map(|op| op.fallback_message())
            .collect();
        assert_eq!(messages.len(), Operation::ALL.len());
        assert!(messages.iter().all(|m| !m.trim().is_empty()));
    }

    #[test]
    fn test_error_info_prefers_server_message() {
        let err = ApiError::from_status(500, Some("Server error".to_string()));
        assert_eq!(
            ErrorInfo::from_api_error(&err, Operation::ListProducts).message,
            "Server error"
        );

        let err = ApiError::from_status(500, None);
        assert_eq!(
            ErrorInfo::from_api_error(&err, Operation::ListProducts).message,
            Operation::ListProducts.fallback_message()
        );

        let err = ApiError::from_status(400, Some("   ".to_string()));
        assert_eq!(
            ErrorInfo::from_api_error(&err, Operation::Login).message,
            Operation::Login.fallback_message()
        );
    }

    #[test]
    fn test_phases() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.phase(Operation::Login), Phase::Idle);

        lifecycle.begin(Operation::Login);
        assert_eq!(lifecycle.phase(Operation::Login), Phase::Pending);
        assert!(lifecycle.is_loading(Operation::Login));

        lifecycle.reject(Operation::Login, ErrorInfo::new("nope"));
        assert_eq!(lifecycle.phase(Operation::Login), Phase::Rejected);
        assert!(!lifecycle.is_loading(Operation::Login));
        assert_eq!(lifecycle.error(Operation::Login), Some(&ErrorInfo::new("nope")));

        lifecycle.begin(Operation::Login);
        assert!(lifecycle.error(Operation::Login).is_none());
        lifecycle.fulfill(Operation::Login);
        assert_eq!(lifecycle.phase(Operation::Login), Phase::Fulfilled);
    }

    #[test]
    fn test_operations_are_isolated() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.begin(Operation::FetchCart);
        lifecycle.begin(Operation::UpdateProfile);
        lifecycle.fulfill(Operation::UpdateProfile);

        assert!(lifecycle.is_loading(Operation::FetchCart));
        assert!(!lifecycle.is_loading(Operation::UpdateProfile));
        assert!(lifecycle.entity_loading(Entity::Cart));
        assert!(!lifecycle.entity_loading(Entity::Session));
    }

    #[test]
    fn test_phase_settles_after_last_request() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.begin(Operation::UpdateCartItem);
        lifecycle.begin(Operation::UpdateCartItem);

        lifecycle.fulfill(Operation::UpdateCartItem);
        assert_eq!(lifecycle.phase(Operation::UpdateCartItem), Phase::Pending);
        assert!(lifecycle.is_loading(Operation::UpdateCartItem));

        lifecycle.fulfill(Operation::UpdateCartItem);
        assert_eq!(lifecycle.phase(Operation::UpdateCartItem), Phase::Fulfilled);
    }

    #[test]
    fn test_overlapping_error_cleared_by_later_success() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.begin(Operation::AddToCart);
        lifecycle.begin(Operation::AddToCart);

        lifecycle.reject(Operation::AddToCart, ErrorInfo::new("first failed"));
        assert_eq!(lifecycle.phase(Operation::AddToCart), Phase::Pending);
        assert!(lifecycle.error(Operation::AddToCart).is_some());

        lifecycle.fulfill(Operation::AddToCart);
        assert_eq!(lifecycle.phase(Operation::AddToCart), Phase::Fulfilled);
        assert!(lifecycle.error(Operation::AddToCart).is_none());
    }

    #[test]
    fn test_overlapping_error_kept_when_last_rejects() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.begin(Operation::AddToCart);
        lifecycle.begin(Operation::AddToCart);

        lifecycle.fulfill(Operation::AddToCart);
        lifecycle.reject(Operation::AddToCart, ErrorInfo::new("second failed"));
        assert_eq!(lifecycle.phase(Operation::AddToCart), Phase::Rejected);
        assert_eq!(
            lifecycle.error(Operation::AddToCart),
            Some(&ErrorInfo::new("second failed"))
        );
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.begin(Operation::ListProducts);
        lifecycle.cancel(Operation::ListProducts);
        assert_eq!(lifecycle.phase(Operation::ListProducts), Phase::Idle);
        assert!(!lifecycle.entity_loading(Entity::Catalog));
    }

    #[test]
    fn test_dismiss_only_touches_entity() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.begin(Operation::AddToCart);
        lifecycle.reject(Operation::AddToCart, ErrorInfo::new("out of stock"));
        lifecycle.begin(Operation::Login);
        lifecycle.reject(Operation::Login, ErrorInfo::new("bad password"));

        lifecycle.dismiss_errors(Entity::Cart);
        assert_eq!(lifecycle.phase(Operation::AddToCart), Phase::Idle);
        assert!(lifecycle.error(Operation::AddToCart).is_none());
        assert_eq!(lifecycle.phase(Operation::Login), Phase::Rejected);

        lifecycle.begin(Operation::ClearCart);
        lifecycle.fulfill(Operation::ClearCart);
        lifecycle.dismiss_success(Entity::Cart);
        assert_eq!(lifecycle.phase(Operation::ClearCart), Phase::Idle);
    }
}
