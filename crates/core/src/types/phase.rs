//! Request lifecycle phase.
//!
//! Every named backend operation moves through
//! `Idle -> Pending -> (Fulfilled | Rejected)`. Explicit dismissal by the UI
//! returns a settled operation to `Idle`.

use serde::{Deserialize, Serialize};

/// Phase of a named asynchronous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Never dispatched, cancelled, or dismissed.
    #[default]
    Idle,
    /// A request is in flight.
    Pending,
    /// The last request completed successfully.
    Fulfilled,
    /// The last request failed.
    Rejected,
}

impl Phase {
    /// Whether the operation has completed (either way).
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Fulfilled | Self::Rejected)
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Pending => write!(f, "pending"),
            Self::Fulfilled => write!(f, "fulfilled"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(Phase::default(), Phase::Idle);
    }

    #[test]
    fn test_settled_phases() {
        assert!(!Phase::Idle.is_settled());
        assert!(!Phase::Pending.is_settled());
        assert!(Phase::Fulfilled.is_settled());
        assert!(Phase::Rejected.is_settled());
    }

    #[test]
    fn test_display() {
        assert_eq!(Phase::Pending.to_string(), "pending");
        assert_eq!(Phase::Rejected.to_string(), "rejected");
    }
}
