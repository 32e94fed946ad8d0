//! Routing plan data model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sirocco_core::types::{Price, Quantity, VenueId};

/// A venue allocation within a routing plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSegment {
    /// Venue the quantity is routed to.
    pub venue: VenueId,
    /// Quantity routed to the venue.
    pub quantity: Quantity,
    /// Limit price for the child order.
    pub price: Price,
    /// Fee-adjusted price used for plan accounting.
    pub effective_price: Price,
}

impl RouteSegment {
    /// Effective notional of the segment.
    #[must_use]
    pub fn effective_notional(&self) -> Decimal {
        self.effective_price.as_decimal() * self.quantity.as_decimal()
    }

    /// Fee charged for the segment. The effective price already folds
    /// the fee into the raw price, so the fee is the gap between the
    /// two notionals.
    #[must_use]
    pub fn fee(&self) -> Decimal {
        (self.effective_price.as_decimal() - self.price.as_decimal()).abs()
            * self.quantity.as_decimal()
    }
}

/// Venue allocation for one slice.
///
/// The routed quantity may fall short of the requested quantity when
/// aggregate venue depth is insufficient; the plan is still executable
/// and the shortfall surfaces as a partial fill on the slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPlan {
    /// Per-venue allocations, in routing order.
    pub segments: Vec<RouteSegment>,
    /// Total routed quantity (sum over segments, depth-capped).
    pub total_quantity: Quantity,
    /// Quantity-weighted average effective price of the plan.
    pub average_price: Price,
    /// Worst effective price among the quotes considered.
    pub worst_quote_price: Price,
    /// Estimated savings versus executing everything at the worst
    /// quote: `|average - worst| * routed quantity`, never negative.
    pub estimated_savings: Decimal,
    /// Total venue fees across segments.
    pub total_fees: Decimal,
}

impl RoutingPlan {
    /// Assembles a plan from its segments and the worst considered
    /// quote, deriving the aggregate figures.
    #[must_use]
    pub fn from_segments(segments: Vec<RouteSegment>, worst_quote_price: Price) -> Self {
        let total: Decimal = segments.iter().map(|s| s.quantity.as_decimal()).sum();
        let average = if total.is_zero() {
            Decimal::ZERO
        } else {
            segments.iter().map(RouteSegment::effective_notional).sum::<Decimal>() / total
        };
        let savings = (average - worst_quote_price.as_decimal()).abs() * total;
        let fees = segments.iter().map(RouteSegment::fee).sum();
        Self {
            segments,
            total_quantity: Quantity::new_unchecked(total),
            average_price: Price::new_unchecked(average),
            worst_quote_price,
            estimated_savings: savings,
            total_fees: fees,
        }
    }

    /// Returns true if the plan routes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() || self.total_quantity.is_zero()
    }

    /// Returns the venue carrying the largest allocation.
    #[must_use]
    pub fn primary_venue(&self) -> Option<&VenueId> {
        self.segments
            .iter()
            .max_by_key(|s| s.quantity)
            .map(|s| &s.venue)
    }
}
