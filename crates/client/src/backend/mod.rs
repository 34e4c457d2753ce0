//! Storefront backend REST client.
//!
//! # Architecture
//!
//! - `reqwest` with a cookie store, so the backend's session cookie is sent
//!   with every request (credential inclusion)
//! - The backend is the source of truth - cart mutations return the full
//!   cart, which replaces local state wholesale
//! - Product detail responses are cached via `moka` (5 minute TTL by default)
//!
//! # Envelope
//!
//! Every response is a JSON envelope `{ success, message?, ...entityData }`.
//! Non-success status codes and `success: false` bodies are classified into
//! [`ApiError`] variants; the server's `message` is preserved so the state
//! store can show it verbatim.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_sync_client::backend::{ApiClient, Credentials};
//!
//! let client = ApiClient::new(&config)?;
//! let user = client.login(&Credentials::new("a@b.co", password)).await?;
//! let lines = client.add_to_cart(&product_id, 2).await?.lines;
//! ```

mod client;
pub mod types;

pub use client::{ApiClient, REQUEST_ID_HEADER};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, timeout, ...).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The backend rejected the request (4xx, or a `success: false` envelope).
    #[error("Validation failed (HTTP {status}): {}", describe(.message.as_deref()))]
    Validation {
        /// HTTP status code.
        status: u16,
        /// Message from the response envelope, if any.
        message: Option<String>,
    },

    /// The session is missing or not allowed to perform the request (401/403).
    #[error("Not authorized (HTTP {status}): {}", describe(.message.as_deref()))]
    Auth {
        /// HTTP status code.
        status: u16,
        /// Message from the response envelope, if any.
        message: Option<String>,
    },

    /// The backend failed (5xx).
    #[error("Server error (HTTP {status}): {}", describe(.message.as_deref()))]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the response envelope, if any.
        message: Option<String>,
    },

    /// The response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Input was rejected locally before any request was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Classify a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 | 403 => Self::Auth { status, message },
            500..=599 => Self::Server { status, message },
            _ => Self::Validation { status, message },
        }
    }

    /// The user-facing message supplied with the failure, if any.
    ///
    /// Transport and decoding failures carry no server message; callers fall
    /// back to an operation-specific default.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Validation { message, .. }
            | Self::Auth { message, .. }
            | Self::Server { message, .. } => {
                message.as_deref().filter(|m| !m.trim().is_empty())
            }
            Self::InvalidInput(message) => Some(message),
            Self::Network(_) | Self::Parse(_) | Self::Url(_) => None,
        }
    }

    /// Whether the backend considers the session invalid.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

fn describe(message: Option<&str>) -> &str {
    message.unwrap_or("(no message)")
}
