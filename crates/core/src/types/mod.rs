//! Core types for storefront-sync.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod phase;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use phase::Phase;
pub use price::{CurrencyCode, CurrencyCodeError, Price};
