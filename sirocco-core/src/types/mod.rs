//! NewType wrappers for financial primitives.
//!
//! This module provides type-safe wrappers around decimal values
//! to prevent mixing incompatible types at compile time.
//!
//! # Types
//!
//! - [`Price`] - Asset price values
//! - [`Quantity`] - Order quantities
//! - [`Symbol`] - Tradeable asset identifiers
//! - [`VenueId`] - Liquidity venue identifiers
//! - [`OrderId`] - Parent order identifiers
//! - [`Timestamp`] - Unix millisecond timestamps

mod order_id;
mod price;
mod quantity;
mod symbol;
mod timestamp;
mod venue_id;

pub use order_id::OrderId;
pub use price::Price;
pub use quantity::Quantity;
pub use symbol::Symbol;
pub use timestamp::Timestamp;
pub use venue_id::VenueId;

/// Validation error for `NewType` construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Price value is negative
    #[error("price cannot be negative: {0}")]
    NegativePrice(rust_decimal::Decimal),

    /// Quantity value is negative
    #[error("quantity cannot be negative: {0}")]
    NegativeQuantity(rust_decimal::Decimal),

    /// Symbol format is invalid
    #[error("invalid symbol format: {0}")]
    InvalidSymbol(String),

    /// Symbol is empty
    #[error("symbol cannot be empty")]
    EmptySymbol,

    /// Venue ID is empty
    #[error("venue ID cannot be empty")]
    EmptyVenueId,

    /// Order ID is empty
    #[error("order ID cannot be empty")]
    EmptyOrderId,

    /// Timestamp is invalid (negative)
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}
