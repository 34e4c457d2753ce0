//! storefront-sync core - shared types library.
//!
//! This crate provides common types used across all storefront-sync components:
//! - `client` - HTTP client, state store and request lifecycle for the storefront backend
//! - `cli` - Command-line front end that drives the client against a live backend
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and lifecycle phases

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
