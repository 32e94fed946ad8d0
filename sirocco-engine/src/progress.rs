//! Execution progress tracking.
//!
//! A [`ProgressTracker`] lives inside an order's state and accumulates
//! figures that cannot be recomputed from the slices alone (estimated
//! routing savings). Everything else in a [`ProgressSnapshot`] is
//! derived from the parent order at snapshot time, so a snapshot is
//! always consistent with the order it was taken from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sirocco_core::data::OrderSide;
use sirocco_core::types::{OrderId, Price, Quantity, Symbol, Timestamp};

use crate::order::{ExecutionStrategy, OrderStatus, ParentOrder, SliceStatus};

/// Point-in-time view of a parent order's execution progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Order identity.
    pub order_id: OrderId,
    /// Traded symbol.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Execution strategy.
    pub strategy: ExecutionStrategy,
    /// Order lifecycle status.
    pub status: OrderStatus,
    /// Total quantity the order wants executed.
    pub total_quantity: Quantity,
    /// Quantity executed so far.
    pub executed_quantity: Quantity,
    /// Quantity still outstanding.
    pub remaining_quantity: Quantity,
    /// Executed fraction as a percentage in `[0, 100]`.
    pub completion_pct: Decimal,
    /// Quantity-weighted average executed price, if anything executed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_price: Option<Price>,
    /// Total number of slices.
    pub slices_total: u32,
    /// Slices that completed.
    pub slices_completed: u32,
    /// Slices that failed.
    pub slices_failed: u32,
    /// Slices that were skipped.
    pub slices_skipped: u32,
    /// Slices still pending or executing.
    pub slices_open: u32,
    /// Cumulative estimated routing savings versus worst quotes.
    pub estimated_savings: Decimal,
    /// Cumulative venue fees charged.
    pub total_fees: Decimal,
    /// Order creation time.
    pub created_at: Timestamp,
    /// When execution started, once it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// Latest scheduled time among open slices; `None` once nothing
    /// remains to execute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<Timestamp>,
    /// Snapshot time.
    pub taken_at: Timestamp,
}

/// Terminal report for a finished order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Order identity.
    pub order_id: OrderId,
    /// Final status.
    pub status: OrderStatus,
    /// Traded symbol.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Execution strategy.
    pub strategy: ExecutionStrategy,
    /// Requested quantity.
    pub total_quantity: Quantity,
    /// Quantity actually executed.
    pub executed_quantity: Quantity,
    /// Quantity-weighted average executed price, if anything executed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_price: Option<Price>,
    /// Total venue fees charged.
    pub total_fees: Decimal,
    /// Cumulative estimated routing savings.
    pub estimated_savings: Decimal,
    /// Slices that completed.
    pub slices_completed: u32,
    /// Slices that failed.
    pub slices_failed: u32,
    /// Slices that were skipped.
    pub slices_skipped: u32,
    /// When execution started, if it ever did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// When the order reached its terminal state, if it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
}

/// Accumulates per-order execution figures and produces snapshots.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    estimated_savings: Decimal,
    total_fees: Decimal,
}

impl ProgressTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a routing plan's estimated savings to the running total.
    pub fn record_savings(&mut self, amount: Decimal) {
        self.estimated_savings += amount;
    }

    /// Adds venue fees to the running total.
    pub fn record_fees(&mut self, amount: Decimal) {
        self.total_fees += amount;
    }

    /// Cumulative estimated savings so far.
    #[must_use]
    pub fn estimated_savings(&self) -> Decimal {
        self.estimated_savings
    }

    /// Takes a snapshot of the order's progress.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn snapshot(&self, order: &ParentOrder) -> ProgressSnapshot {
        let executed = order.executed_quantity();
        let total = order.config.total_quantity;
        let remaining = total.saturating_sub(executed);

        let completion_pct = if total.is_zero() {
            Decimal::ZERO
        } else {
            (executed.as_decimal() / total.as_decimal() * Decimal::ONE_HUNDRED)
                .min(Decimal::ONE_HUNDRED)
        };

        let mut notional = Decimal::ZERO;
        let mut filled = Decimal::ZERO;
        let mut completed = 0u32;
        let mut failed = 0u32;
        let mut skipped = 0u32;
        let mut open = 0u32;
        for slice in &order.slices {
            match slice.status {
                SliceStatus::Completed => completed += 1,
                SliceStatus::Failed => failed += 1,
                SliceStatus::Skipped => skipped += 1,
                SliceStatus::Pending | SliceStatus::Executing => open += 1,
            }
            if let Some(price) = slice.executed_price {
                notional += price.as_decimal() * slice.executed_quantity.as_decimal();
                filled += slice.executed_quantity.as_decimal();
            }
        }
        let average_price = if filled.is_zero() {
            None
        } else {
            Some(Price::new_unchecked(notional / filled))
        };

        let estimated_completion = order
            .slices
            .iter()
            .filter(|s| !s.status.is_terminal())
            .map(|s| s.scheduled_time)
            .max();

        ProgressSnapshot {
            order_id: order.id.clone(),
            symbol: order.config.symbol.clone(),
            side: order.config.side,
            strategy: order.config.strategy,
            status: order.status,
            total_quantity: total,
            executed_quantity: executed,
            remaining_quantity: remaining,
            completion_pct,
            average_price,
            slices_total: order.slices.len() as u32,
            slices_completed: completed,
            slices_failed: failed,
            slices_skipped: skipped,
            slices_open: open,
            estimated_savings: self.estimated_savings,
            total_fees: self.total_fees,
            created_at: order.created_at,
            started_at: order.started_at,
            estimated_completion,
            taken_at: Timestamp::now(),
        }
    }

    /// Builds the terminal report for the order.
    #[must_use]
    pub fn summary(&self, order: &ParentOrder) -> ExecutionSummary {
        let snap = self.snapshot(order);
        ExecutionSummary {
            order_id: snap.order_id,
            status: snap.status,
            symbol: snap.symbol,
            side: snap.side,
            strategy: snap.strategy,
            total_quantity: snap.total_quantity,
            executed_quantity: snap.executed_quantity,
            average_price: snap.average_price,
            total_fees: snap.total_fees,
            estimated_savings: snap.estimated_savings,
            slices_completed: snap.slices_completed,
            slices_failed: snap.slices_failed,
            slices_skipped: snap.slices_skipped,
            started_at: order.started_at,
            finished_at: order.finished_at,
        }
    }
}
