//! State transitions.
//!
//! `reduce` is the only place `StoreState` changes. Each action is applied
//! as one synchronous step.

use storefront_sync_core::ProductId;

use crate::backend::types::{
    CartLine, CartUpdate, PaymentConfirmation, Product, SessionUpdate, UserProfile,
};
use crate::catalog::ProductPage;
use crate::lifecycle::{Entity, ErrorInfo, Operation};

use super::{CartState, CheckoutState, EntityError, StoreState};

/// Something that happened to the state.
#[derive(Debug, Clone)]
pub enum Action {
    /// An operation was dispatched.
    Pending(Operation),
    /// An operation's request succeeded.
    Fulfilled(Fulfillment),
    /// An operation's request failed.
    Rejected {
        operation: Operation,
        error: ErrorInfo,
    },
    /// An operation's request was dropped before it was applied.
    Cancelled(Operation),
    /// The UI displayed the entity's error.
    RemoveError(Entity),
    /// The UI displayed the entity's success notification.
    RemoveSuccess(Entity),
    /// A local cart edit with no server round trip.
    LocalCart(CartEdit),
}

/// Local (guest) cart edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEdit {
    Add { line: CartLine, quantity: u32 },
    /// Remove by line id or product id.
    Remove(String),
    SetQuantity { product_id: ProductId, quantity: u32 },
    Clear,
}

/// A successful response, carrying the payload to merge.
#[derive(Debug, Clone)]
pub enum Fulfillment {
    Register(UserProfile),
    Login(UserProfile),
    LoadSession(UserProfile),
    Logout { message: Option<String> },
    UpdateProfile(SessionUpdate),
    UpdatePassword(SessionUpdate),
    ForgotPassword { message: Option<String> },
    ResetPassword(SessionUpdate),
    FetchCart(CartUpdate),
    AddToCart(CartUpdate),
    UpdateCartItem(CartUpdate),
    RemoveFromCart(CartUpdate),
    ClearCart(CartUpdate),
    ListProducts { page: ProductPage, current_page: u32 },
    GetProductDetail(Box<Product>),
    SubmitReview { message: Option<String> },
    ListAdminProducts(Vec<Product>),
    FetchPaymentKey(String),
    CreatePaymentIntent(String),
    VerifyPayment(PaymentConfirmation),
}

impl Fulfillment {
    /// The operation this response answers.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Register(_) => Operation::Register,
            Self::Login(_) => Operation::Login,
            Self::LoadSession(_) => Operation::LoadSession,
            Self::Logout { .. } => Operation::Logout,
            Self::UpdateProfile(_) => Operation::UpdateProfile,
            Self::UpdatePassword(_) => Operation::UpdatePassword,
            Self::ForgotPassword { .. } => Operation::ForgotPassword,
            Self::ResetPassword(_) => Operation::ResetPassword,
            Self::FetchCart(_) => Operation::FetchCart,
            Self::AddToCart(_) => Operation::AddToCart,
            Self::UpdateCartItem(_) => Operation::UpdateCartItem,
            Self::RemoveFromCart(_) => Operation::RemoveFromCart,
            Self::ClearCart(_) => Operation::ClearCart,
            Self::ListProducts { .. } => Operation::ListProducts,
            Self::GetProductDetail(_) => Operation::GetProductDetail,
            Self::SubmitReview { .. } => Operation::SubmitReview,
            Self::ListAdminProducts(_) => Operation::ListAdminProducts,
            Self::FetchPaymentKey(_) => Operation::FetchPaymentKey,
            Self::CreatePaymentIntent(_) => Operation::CreatePaymentIntent,
            Self::VerifyPayment(_) => Operation::VerifyPayment,
        }
    }
}

/// Apply an action to the state.
pub fn reduce(state: &mut StoreState, action: Action) {
    match action {
        Action::Pending(operation) => {
            state.lifecycle.begin(operation);
            clear_own_error(state, operation);
        }
        Action::Fulfilled(fulfillment) => {
            let operation = fulfillment.operation();
            state.lifecycle.fulfill(operation);
            if !state.lifecycle.is_loading(operation) {
                clear_own_error(state, operation);
            }
            let message = merge(state, fulfillment);
            if operation.reports_success() {
                let notice = state.notice_mut(operation.entity());
                notice.success = true;
                notice.message = message;
            }
        }
        Action::Rejected { operation, error } => {
            state.lifecycle.reject(operation, error.clone());
            match operation {
                Operation::LoadSession => state.session.user = None,
                Operation::ListProducts => {
                    state.catalog.products.clear();
                    state.catalog.total_count = 0;
                    state.catalog.page_size = 0;
                }
                Operation::GetProductDetail => state.catalog.product = None,
                _ => {}
            }
            state.notice_mut(operation.entity()).error = Some(EntityError {
                operation,
                info: error,
            });
        }
        Action::Cancelled(operation) => {
            state.lifecycle.cancel(operation);
            if !state.lifecycle.is_loading(operation) {
                clear_own_error(state, operation);
            }
        }
        Action::RemoveError(entity) => {
            state.notice_mut(entity).error = None;
            state.lifecycle.dismiss_errors(entity);
        }
        Action::RemoveSuccess(entity) => {
            let notice = state.notice_mut(entity);
            notice.success = false;
            notice.message = None;
            state.lifecycle.dismiss_success(entity);
        }
        Action::LocalCart(edit) => {
            let cart = &mut state.cart.cart;
            match edit {
                CartEdit::Add { line, quantity } => cart.add(line, quantity),
                CartEdit::Remove(id) => cart.remove(&id),
                CartEdit::SetQuantity {
                    product_id,
                    quantity,
                } => cart.set_quantity(&product_id, quantity),
                CartEdit::Clear => cart.clear(),
            }
        }
    }
}

/// Drop the entity's error if `operation` raised it.
fn clear_own_error(state: &mut StoreState, operation: Operation) {
    let notice = state.notice_mut(operation.entity());
    if notice
        .error
        .as_ref()
        .is_some_and(|e| e.operation == operation)
    {
        notice.error = None;
    }
}

/// Merge a response payload into the owning entity. Returns the server's
/// message, if any.
fn merge(state: &mut StoreState, fulfillment: Fulfillment) -> Option<String> {
    match fulfillment {
        Fulfillment::Register(user) | Fulfillment::Login(user) | Fulfillment::LoadSession(user) => {
            state.session.user = Some(user);
            None
        }
        Fulfillment::Logout { message } => {
            state.session.user = None;
            state.cart = CartState::default();
            state.checkout = CheckoutState::default();
            message
        }
        Fulfillment::UpdateProfile(update)
        | Fulfillment::UpdatePassword(update)
        | Fulfillment::ResetPassword(update) => {
            if let Some(user) = update.user {
                state.session.user = Some(user);
            }
            update.message
        }
        Fulfillment::ForgotPassword { message } | Fulfillment::SubmitReview { message } => {
            message
        }
        Fulfillment::FetchCart(update)
        | Fulfillment::AddToCart(update)
        | Fulfillment::UpdateCartItem(update)
        | Fulfillment::RemoveFromCart(update)
        | Fulfillment::ClearCart(update) => {
            state.cart.cart.replace_from_server(update.lines);
            update.message
        }
        Fulfillment::ListProducts { page, current_page } => {
            let catalog = &mut state.catalog;
            catalog.products = page.products;
            catalog.total_count = page.total_count;
            catalog.page_size = page.page_size;
            catalog.current_page = current_page;
            None
        }
        Fulfillment::GetProductDetail(product) => {
            state.catalog.product = Some(*product);
            None
        }
        Fulfillment::ListAdminProducts(products) => {
            state.catalog.admin_products = products;
            None
        }
        Fulfillment::FetchPaymentKey(key) => {
            state.checkout.publishable_key = Some(key);
            None
        }
        Fulfillment::CreatePaymentIntent(secret) => {
            state.checkout.client_secret = Some(secret);
            None
        }
        Fulfillment::VerifyPayment(confirmation) => {
            state.checkout.order_id = confirmation.order_id;
            state.checkout.client_secret = None;
            state.cart.cart.clear();
            confirmation.message
        }
    }
}
