//! Order execution collaborator trait.

use async_trait::async_trait;

use crate::data::{Fill, OrderSide};
use crate::error::ExecutionError;
use crate::types::{Price, Quantity, Symbol, VenueId};

/// Execution adapter - places child orders at venues.
///
/// # Contract
///
/// - A successful placement returns a [`Fill`]; the executed quantity
///   may be less than requested (partial fill).
/// - Placement must complete within a bounded timeout and return
///   [`ExecutionError::Timeout`] when it elapses.
/// - Errors are per-placement; the engine records the affected slice as
///   failed and continues with the rest of the order.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across per-order
/// tasks.
#[async_trait]
pub trait ExecutionAdapter: Send + Sync {
    /// Submits a child order to a venue.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError` if the venue rejects the order, times
    /// out, or has no liquidity at placement time.
    async fn submit_order(
        &self,
        venue: &VenueId,
        symbol: &Symbol,
        side: OrderSide,
        quantity: Quantity,
        price: Price,
    ) -> Result<Fill, ExecutionError>;
}
