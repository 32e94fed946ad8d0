//! External collaborator traits.
//!
//! The execution engine consumes two external interfaces and one
//! optional one:
//! - [`QuoteProvider`] - fetches venue quotes for a symbol/side/quantity
//! - [`ExecutionAdapter`] - places child orders at venues
//! - [`VolumeEstimator`] - estimates recent traded volume, used by
//!   volume-participation capping
//!
//! Implementations wrap real exchange/DEX connectivity, which is out of
//! scope for the engine itself. All calls are expected to complete
//! within a bounded timeout; the engine never holds a per-order lock
//! while awaiting any of them.

mod execution;
mod market;

pub use execution::ExecutionAdapter;
pub use market::{QuoteProvider, VolumeEstimator};
