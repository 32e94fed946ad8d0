//! Market data collaborator traits.

use async_trait::async_trait;
use std::time::Duration;

use crate::data::{OrderSide, VenueQuote};
use crate::error::QuoteError;
use crate::types::{Quantity, Symbol};

/// Venue quote provider.
///
/// Given a symbol, side, and quantity, returns the venues able to fill
/// it along with price, depth, fee, and latency estimates.
///
/// # Contract
///
/// - May return a subset of known venues on partial failure; a venue
///   that errors is simply omitted.
/// - Must never block indefinitely; implementations apply a bounded
///   timeout and return [`QuoteError::Timeout`] when it elapses.
/// - Quotes are fetched fresh per routing decision and must not be
///   cached by the implementation across calls.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across per-order
/// tasks.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetches quotes for all venues able to trade the symbol.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError` only when the fetch fails as a whole (for
    /// example a timeout); individual venue failures are expressed by
    /// omission from the result.
    async fn venue_quotes(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        quantity: Quantity,
    ) -> Result<Vec<VenueQuote>, QuoteError>;
}

/// Recent-volume estimator.
///
/// Used by volume-participation capping: before routing a slice the
/// coordinator shrinks the slice's target to at most
/// `estimated volume x participation rate`, protecting thin markets
/// from outsized child orders.
///
/// This is an external collaborator contract; the engine makes no
/// assumption about how the estimate is produced.
#[async_trait]
pub trait VolumeEstimator: Send + Sync {
    /// Estimates the traded volume for the symbol over the trailing
    /// window.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError` if no estimate is available; the caller
    /// falls back to the unshrunk slice quantity.
    async fn recent_volume(
        &self,
        symbol: &Symbol,
        window: Duration,
    ) -> Result<Quantity, QuoteError>;
}
