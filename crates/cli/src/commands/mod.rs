//! CLI command implementations.

pub mod cart;
pub mod products;
pub mod session;

use storefront_sync_client::{ApiError, ConfigError, Outcome};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The backend rejected the operation.
    #[error("{0}")]
    Rejected(String),

    /// Interrupted before the response arrived.
    #[error("Cancelled")]
    Cancelled,
}

/// Turn a dispatch outcome into a command result.
fn settle(outcome: Outcome) -> Result<(), CliError> {
    match outcome {
        Outcome::Fulfilled => Ok(()),
        Outcome::Rejected(error) => Err(CliError::Rejected(error.message)),
        Outcome::Cancelled => Err(CliError::Cancelled),
    }
}
