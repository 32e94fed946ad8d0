//! Error types for the execution engine.
//!
//! The taxonomy follows the recovery policy of the engine:
//!
//! - [`ConfigError`] - fatal, rejected at order creation
//! - [`QuoteError`] - recovered locally; a venue that fails to quote is
//!   excluded, and routing proceeds with the remaining venues
//! - [`ExecutionError`] - recovered locally; the affected slice is marked
//!   failed and the parent order continues
//!
//! Per-slice errors never abort a parent order. Only configuration
//! errors surface as hard failures to the caller.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Symbol, VenueId};

/// Configuration error - rejected at order creation time.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    /// A required configuration field was not provided.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Total quantity must be positive.
    #[error("total quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    /// Execution duration must be positive.
    #[error("execution duration must be positive")]
    NonPositiveDuration,

    /// The minimum slice size cannot be satisfied by the slice count.
    #[error("min slice size {min} x {count} slices exceeds total quantity {total}")]
    InfeasibleMinSliceSize {
        /// Configured minimum per-slice size.
        min: Decimal,
        /// Number of slices.
        count: u32,
        /// Total order quantity.
        total: Decimal,
    },

    /// The maximum slice size cannot cover the total quantity.
    #[error("max slice size {max} x {count} slices cannot cover total quantity {total}")]
    InfeasibleMaxSliceSize {
        /// Configured maximum per-slice size.
        max: Decimal,
        /// Number of slices.
        count: u32,
        /// Total order quantity.
        total: Decimal,
    },

    /// Min slice size exceeds max slice size.
    #[error("min slice size {min} exceeds max slice size {max}")]
    MinExceedsMax {
        /// Configured minimum per-slice size.
        min: Decimal,
        /// Configured maximum per-slice size.
        max: Decimal,
    },

    /// Volume participation must be a fraction in (0, 1].
    #[error("volume participation must be in (0, 1], got {0}")]
    InvalidParticipation(Decimal),
}

/// Quote provider error - recovered locally during routing.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteError {
    /// A single venue failed to quote; it is excluded from routing.
    #[error("venue {venue} failed to quote {symbol}: {reason}")]
    VenueUnavailable {
        /// Venue that failed.
        venue: VenueId,
        /// Symbol that was requested.
        symbol: Symbol,
        /// Failure description.
        reason: String,
    },

    /// No venue produced a usable quote.
    #[error("no liquidity for {symbol}: no venue returned a usable quote")]
    NoLiquidity {
        /// Symbol that was requested.
        symbol: Symbol,
    },

    /// The quote fetch timed out.
    #[error("quote fetch for {symbol} timed out after {timeout_ms}ms")]
    Timeout {
        /// Symbol that was requested.
        symbol: Symbol,
        /// Timeout that elapsed in milliseconds.
        timeout_ms: u64,
    },
}

/// Execution adapter error - recovered locally per slice.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionError {
    /// The venue rejected the child order.
    #[error("venue {venue} rejected order: {reason}")]
    Rejected {
        /// Venue that rejected.
        venue: VenueId,
        /// Rejection reason.
        reason: String,
    },

    /// The order placement timed out.
    #[error("order placement at {venue} timed out after {timeout_ms}ms")]
    Timeout {
        /// Venue the order was sent to.
        venue: VenueId,
        /// Timeout that elapsed in milliseconds.
        timeout_ms: u64,
    },

    /// The venue reported insufficient liquidity at placement time.
    #[error("venue {venue} has insufficient liquidity")]
    InsufficientLiquidity {
        /// Venue without liquidity.
        venue: VenueId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InfeasibleMinSliceSize {
            min: dec!(5),
            count: 10,
            total: dec!(20),
        };
        let msg = err.to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains("10"));
        assert!(msg.contains("20"));
    }

    #[test]
    fn test_quote_error_display() {
        let err = QuoteError::NoLiquidity {
            symbol: Symbol::new_unchecked("BTC-USDT"),
        };
        assert!(err.to_string().contains("no liquidity"));
    }

    #[test]
    fn test_execution_error_serde_roundtrip() {
        let err = ExecutionError::Rejected {
            venue: VenueId::new_unchecked("kraken"),
            reason: "post-only would cross".to_string(),
        };
        let json = serde_json::to_string(&err).unwrap();
        let parsed: ExecutionError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, parsed);
    }
}
