//! Injectable state container.
//!
//! A [`Store`] owns one [`StoreState`] behind a `tokio::sync::watch`
//! channel. Every transition goes through [`reduce`] inside `send_modify`,
//! so subscribers only ever observe fully-applied transitions. Stores are
//! plain values: create one per app (or per test) and pass it around.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_sync_client::store::Store;
//! use storefront_sync_client::lifecycle::Entity;
//!
//! let store = Store::new();
//! let mut updates = store.subscribe();
//!
//! // ... dispatch operations elsewhere ...
//! updates.changed().await?;
//! let count = store.read(|s| s.cart.cart.item_count());
//! if let Some(err) = store.read(|s| s.error(Entity::Cart).cloned()) {
//!     show_toast(&err.message);
//!     store.remove_error(Entity::Cart);
//! }
//! ```

mod reducer;

use std::sync::Arc;

use storefront_sync_core::{OrderId, ProductId};
use tokio::sync::watch;
use tracing::debug;

use crate::backend::types::{CartLine, Product, UserProfile};
use crate::cart::Cart;
use crate::catalog::total_pages;
use crate::lifecycle::{Entity, ErrorInfo, Lifecycle, Operation};

pub use reducer::{Action, CartEdit, Fulfillment, reduce};

// =============================================================================
// State
// =============================================================================

/// An error together with the operation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityError {
    pub operation: Operation,
    pub info: ErrorInfo,
}

/// Sticky notifications for one entity, cleared only by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notice {
    pub error: Option<EntityError>,
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub notice: Notice,
}

impl SessionState {
    /// True exactly when a user is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub cart: Cart,
    pub notice: Notice,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogState {
    /// Current listing page.
    pub products: Vec<Product>,
    pub total_count: u64,
    pub page_size: u32,
    /// Page number of `products` (1-based; 0 before the first listing).
    pub current_page: u32,
    /// Product detail view.
    pub product: Option<Product>,
    pub admin_products: Vec<Product>,
    pub notice: Notice,
}

impl CatalogState {
    /// `ceil(total_count / page_size)`.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutState {
    /// Payment processor publishable key.
    pub publishable_key: Option<String>,
    /// Client secret of the open payment intent.
    pub client_secret: Option<String>,
    /// Order created by the last verified payment.
    pub order_id: Option<OrderId>,
    pub notice: Notice,
}

/// Everything the UI reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub session: SessionState,
    pub cart: CartState,
    pub catalog: CatalogState,
    pub checkout: CheckoutState,
    pub lifecycle: Lifecycle,
}

impl StoreState {
    #[must_use]
    pub const fn notice(&self, entity: Entity) -> &Notice {
        match entity {
            Entity::Session => &self.session.notice,
            Entity::Cart => &self.cart.notice,
            Entity::Catalog => &self.catalog.notice,
            Entity::Checkout => &self.checkout.notice,
        }
    }

    pub(crate) fn notice_mut(&mut self, entity: Entity) -> &mut Notice {
        match entity {
            Entity::Session => &mut self.session.notice,
            Entity::Cart => &mut self.cart.notice,
            Entity::Catalog => &mut self.catalog.notice,
            Entity::Checkout => &mut self.checkout.notice,
        }
    }

    /// Whether any of the entity's operations is in flight.
    #[must_use]
    pub fn loading(&self, entity: Entity) -> bool {
        self.lifecycle.entity_loading(entity)
    }

    /// The entity's sticky error.
    #[must_use]
    pub fn error(&self, entity: Entity) -> Option<&ErrorInfo> {
        self.notice(entity).error.as_ref().map(|e| &e.info)
    }
}

// =============================================================================
// Store
// =============================================================================

/// Shared handle to the state. Clones refer to the same state.
#[derive(Debug, Clone)]
pub struct Store {
    tx: Arc<watch::Sender<StoreState>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// A store with empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(StoreState::default())
    }

    /// A store starting from the given state.
    #[must_use]
    pub fn with_state(state: StoreState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx: Arc::new(tx) }
    }

    /// Apply an action and notify subscribers.
    pub fn dispatch(&self, action: Action) {
        debug!(?action, "dispatch");
        self.tx.send_modify(|state| reduce(state, action));
    }

    /// A receiver that is notified after every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.tx.subscribe()
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.tx.borrow().clone()
    }

    /// Read the current state without cloning it.
    ///
    /// Do not dispatch from inside `f`.
    pub fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn remove_error(&self, entity: Entity) {
        self.dispatch(Action::RemoveError(entity));
    }

    pub fn remove_success(&self, entity: Entity) {
        self.dispatch(Action::RemoveSuccess(entity));
    }

    // =========================================================================
    // Local cart edits
    // =========================================================================

    /// Add to the local cart, merging with an existing line for the product.
    pub fn add_local(&self, line: CartLine, quantity: u32) {
        self.dispatch(Action::LocalCart(CartEdit::Add { line, quantity }));
    }

    /// Remove a local line by line id or product id.
    pub fn remove_local(&self, id: impl Into<String>) {
        self.dispatch(Action::LocalCart(CartEdit::Remove(id.into())));
    }

    pub fn set_local_quantity(&self, product_id: ProductId, quantity: u32) {
        self.dispatch(Action::LocalCart(CartEdit::SetQuantity {
            product_id,
            quantity,
        }));
    }

    pub fn clear_local(&self) {
        self.dispatch(Action::LocalCart(CartEdit::Clear));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::tests::line;

    #[test]
    fn test_stores_are_isolated() {
        let a = Store::new();
        let b = Store::new();
        a.add_local(line("p1", 100, 1), 2);

        assert_eq!(a.read(|s| s.cart.cart.item_count()), 2);
        assert_eq!(b.read(|s| s.cart.cart.item_count()), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let store = Store::new();
        let handle = store.clone();
        handle.add_local(line("p1", 100, 1), 1);
        assert_eq!(store.snapshot().cart.cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let store = Store::new();
        let mut rx = store.subscribe();

        store.dispatch(Action::Pending(Operation::FetchCart));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().loading(Entity::Cart));

        store.dispatch(Action::Rejected {
            operation: Operation::FetchCart,
            error: ErrorInfo::new("Failed"),
        });
        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert!(!state.loading(Entity::Cart));
        assert_eq!(state.error(Entity::Cart), Some(&ErrorInfo::new("Failed")));
    }

    #[test]
    fn test_local_edits_and_remove_notices() {
        let store = Store::new();
        store.add_local(line("p1", 250, 1), 2);
        store.set_local_quantity(ProductId::new("p1"), 4);
        assert_eq!(store.read(|s| s.cart.cart.total()), rust_decimal::Decimal::new(1000, 2));

        store.remove_local("p1");
        assert!(store.read(|s| s.cart.cart.is_empty()));

        store.add_local(line("p2", 100, 1), 1);
        store.clear_local();
        assert!(store.read(|s| s.cart.cart.is_empty()));

        store.dispatch(Action::Rejected {
            operation: Operation::Login,
            error: ErrorInfo::new("bad"),
        });
        store.remove_error(Entity::Session);
        assert!(store.read(|s| s.error(Entity::Session).is_none()));
    }

    #[test]
    fn test_catalog_total_pages() {
        let catalog = CatalogState {
            total_count: 17,
            page_size: 8,
            ..CatalogState::default()
        };
        assert_eq!(catalog.total_pages(), 3);
    }
}
