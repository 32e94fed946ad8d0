//! Venue quote - a single venue's quote for a requested quantity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::OrderSide;
use crate::types::{Price, Quantity, VenueId};

/// A single venue's quote for a requested symbol/side/quantity.
///
/// Quotes are ephemeral value objects: they are fetched fresh for each
/// routing decision and must never be cached across slices, since
/// prices move between slices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueQuote {
    /// Venue the quote came from.
    pub venue: VenueId,
    /// Side-adjusted price (ask for buys, bid for sells).
    pub price: Price,
    /// Quantity available at this price.
    pub available_quantity: Quantity,
    /// Taker fee rate as a fraction (0.001 = 10 bps).
    pub fee_rate: Decimal,
    /// Estimated round-trip latency to the venue.
    pub latency_ms: u64,
}

impl VenueQuote {
    /// Creates a new venue quote.
    #[must_use]
    pub fn new(
        venue: VenueId,
        price: Price,
        available_quantity: Quantity,
        fee_rate: Decimal,
        latency_ms: u64,
    ) -> Self {
        Self {
            venue,
            price,
            available_quantity,
            fee_rate,
            latency_ms,
        }
    }

    /// Returns the fee-adjusted price for the given side.
    ///
    /// For buys the fee increases the effective cost; for sells it
    /// decreases the effective proceeds.
    #[must_use]
    pub fn effective_price(&self, side: OrderSide) -> Decimal {
        let raw = self.price.as_decimal();
        match side {
            OrderSide::Buy => raw * (Decimal::ONE + self.fee_rate),
            OrderSide::Sell => raw * (Decimal::ONE - self.fee_rate),
        }
    }

    /// Returns true if the venue has any usable depth.
    #[must_use]
    pub fn has_depth(&self) -> bool {
        !self.available_quantity.is_zero()
    }
}
