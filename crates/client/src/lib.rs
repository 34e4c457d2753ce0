//! Storefront client state sync.
//!
//! Talks to the storefront backend's REST API and keeps a local, observable
//! copy of the session, cart and catalog in sync with it.
//!
//! - [`backend`]: HTTP client, wire types and error taxonomy
//! - [`store`]: injectable state container and reducer
//! - [`dispatch`]: runs named operations against the backend and records
//!   their lifecycle in a store, with per-operation cancellation
//! - [`cart`], [`catalog`], [`pagination`], [`checkout`]: pure projections
//!   over the state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod dispatch;
pub mod lifecycle;
pub mod pagination;
pub mod store;

pub use backend::{ApiClient, ApiError};
pub use cart::Cart;
pub use config::{ClientConfig, ConfigError};
pub use dispatch::{DispatchScope, Dispatcher, Outcome};
pub use lifecycle::{Entity, ErrorInfo, Operation};
pub use store::{Store, StoreState};
