//! Fill - the result of a child order placement.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, Quantity, VenueId};

/// The result of a child order placement at a venue.
///
/// Returned by the execution adapter; the executed quantity may be
/// less than requested if the venue could only partially fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Venue the order executed at.
    pub venue: VenueId,
    /// Quantity actually executed.
    pub executed_quantity: Quantity,
    /// Price the quantity executed at.
    pub executed_price: Price,
}

impl Fill {
    /// Creates a new fill.
    #[must_use]
    pub fn new(venue: VenueId, executed_quantity: Quantity, executed_price: Price) -> Self {
        Self {
            venue,
            executed_quantity,
            executed_price,
        }
    }

    /// Returns the notional value of the fill (quantity x price).
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.executed_quantity.as_decimal() * self.executed_price.as_decimal()
    }
}
