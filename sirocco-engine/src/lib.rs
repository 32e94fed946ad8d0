//! # Sirocco Engine
//!
//! Order execution engine for the Sirocco trading system.
//!
//! Large orders moved through a single venue in one shot pay for it
//! twice: market impact from the size and adverse price from ignoring
//! better-priced liquidity elsewhere. This crate breaks a parent order
//! into a timed slice schedule and routes each slice across venues by
//! fee-adjusted price.
//!
//! This crate provides:
//! - Slice scheduling with urgency scaling, size/time jitter, and
//!   exact quantity conservation
//! - Smart order routing over live venue quotes (best-price, split,
//!   time-sliced, volume-sliced, iceberg, fastest-venue)
//! - An execution coordinator driving each order on a tick loop with
//!   pause/resume/cancel
//! - Progress tracking and execution event notification
//!
//! # Entry Point
//!
//! [`ExecutionEngine`] is the facade: construct it over a
//! [`QuoteProvider`](sirocco_core::traits::QuoteProvider) and an
//! [`ExecutionAdapter`](sirocco_core::traits::ExecutionAdapter), create
//! orders from an [`OrderConfig`], and drive them through
//! `start`/`pause`/`resume`/`cancel` while watching progress snapshots
//! or subscribing to [`ExecutionEvent`]s.
//!
//! # Determinism
//!
//! All randomization (schedule jitter, iceberg venue scatter, limit
//! price variance) flows through a per-order seeded RNG. Two orders
//! with the same configuration and seed produce the same schedule and
//! the same routing decisions against the same quotes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::must_use_candidate)]

mod coordinator;
mod engine;
pub mod notifier;
pub mod order;
pub mod progress;
pub mod router;
pub mod scheduler;

pub use engine::{EngineError, ExecutionEngine, ExecutionEngineBuilder};
pub use notifier::{EventBus, ExecutionEvent};
pub use order::{
    ExecutionStrategy, FailReason, OrderConfig, OrderConfigBuilder, OrderStatus, ParentOrder,
    SkipReason, Slice, SliceStatus, Urgency,
};
pub use progress::{ExecutionSummary, ProgressSnapshot, ProgressTracker};
pub use router::{RouteSegment, RoutingPlan, SmartRouter};
