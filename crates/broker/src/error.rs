//! Broker error type.
//!
//! Discriminates transient transport failures (retryable with backoff) from
//! terminal rejections (never auto-retried).

use thiserror::Error;

/// Errors from the broker execution service.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Network failure reaching the broker.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Broker rejected the order terminally (bad parameters, margin).
    #[error("order rejected: {0}")]
    Rejected(String),

    /// Order id unknown to the broker.
    #[error("order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// Instrument unknown to the broker (no quote available).
    #[error("instrument not found: {0}")]
    InstrumentNotFound(String),
}

impl BrokerError {
    /// Returns true if the failure should be retried with backoff.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

/// Result type alias for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_transient() {
        assert!(BrokerError::Network("connection refused".into()).is_transient());
        assert!(BrokerError::Timeout("deadline exceeded".into()).is_transient());
    }

    #[test]
    fn rejections_are_terminal() {
        assert!(!BrokerError::Rejected("insufficient margin".into()).is_transient());
        assert!(!BrokerError::OrderNotFound {
            order_id: "X1".into()
        }
        .is_transient());
    }
}
