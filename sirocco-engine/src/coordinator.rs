//! Execution coordination.
//!
//! One coordinator drives every order owned by an engine. Each started
//! order gets its own tick loop (default 1s) that claims due slices in
//! schedule order and executes them: fetch fresh quotes, apply the
//! price limit, cap by volume participation, build a routing plan, and
//! submit child orders venue by venue.
//!
//! Locking discipline: the order lock is held only to claim a slice,
//! to build the routing plan, and to commit an outcome. Quote fetches
//! and order submission happen with the lock released, so progress
//! queries and cancellation never wait on venue I/O.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use sirocco_core::data::{Fill, OrderSide, VenueQuote};
use sirocco_core::error::ExecutionError;
use sirocco_core::traits::{ExecutionAdapter, QuoteProvider, VolumeEstimator};
use sirocco_core::types::{Price, Quantity, Symbol, Timestamp, VenueId};

use crate::engine::EngineError;
use crate::notifier::{EventBus, ExecutionEvent};
use crate::order::{
    ExecutionStrategy, FailReason, OrderStatus, ParentOrder, SkipReason, SliceStatus,
};
use crate::progress::{ExecutionSummary, ProgressSnapshot, ProgressTracker};
use crate::router::SmartRouter;

/// Mutable runtime state of one order, guarded by a single lock.
pub(crate) struct OrderState {
    pub(crate) order: ParentOrder,
    pub(crate) tracker: ProgressTracker,
    pub(crate) rng: ChaCha8Rng,
}

/// Shared handle to one order's state.
pub(crate) struct OrderHandle {
    state: Mutex<OrderState>,
}

impl OrderHandle {
    pub(crate) fn new(order: ParentOrder, rng: ChaCha8Rng) -> Self {
        Self {
            state: Mutex::new(OrderState {
                order,
                tracker: ProgressTracker::new(),
                rng,
            }),
        }
    }
}

/// Everything needed to execute one claimed slice without holding the
/// order lock.
struct SliceClaim {
    index: usize,
    target: Quantity,
    symbol: Symbol,
    side: OrderSide,
    strategy: ExecutionStrategy,
    price_limit: Option<Price>,
    max_slippage: Option<Price>,
    participation: Option<Decimal>,
    participation_window: Duration,
    venues: Option<Vec<VenueId>>,
}

enum StepOutcome {
    Continue,
    Finished,
}

/// Drives slice execution for the engine's orders.
pub(crate) struct ExecutionCoordinator {
    quotes: Arc<dyn QuoteProvider>,
    adapter: Arc<dyn ExecutionAdapter>,
    volume: Option<Arc<dyn VolumeEstimator>>,
    router: SmartRouter,
    events: Arc<EventBus>,
    tick_interval: Duration,
}

impl ExecutionCoordinator {
    pub(crate) fn new(
        quotes: Arc<dyn QuoteProvider>,
        adapter: Arc<dyn ExecutionAdapter>,
        volume: Option<Arc<dyn VolumeEstimator>>,
        events: Arc<EventBus>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            quotes,
            adapter,
            volume,
            router: SmartRouter::new(),
            events,
            tick_interval,
        }
    }

    /// Starts an order: transitions it to active and re-anchors pending
    /// slice times so the schedule begins now rather than at creation.
    pub(crate) fn start(&self, handle: &OrderHandle) -> Result<(), EngineError> {
        let mut st = handle.state.lock();
        transition(&mut st.order, OrderStatus::Active)?;
        let delta = Timestamp::now().millis_since(st.order.created_at);
        if delta > 0 {
            for slice in &mut st.order.slices {
                if slice.status == SliceStatus::Pending {
                    slice.scheduled_time = slice.scheduled_time.add_millis(delta);
                }
            }
        }
        let order_id = st.order.id.clone();
        drop(st);
        info!(%order_id, "order started");
        self.events.publish(&ExecutionEvent::OrderStarted { order_id });
        Ok(())
    }

    /// Pauses an active order. In-flight slice submission completes;
    /// no new slice is claimed until resume.
    pub(crate) fn pause(&self, handle: &OrderHandle) -> Result<(), EngineError> {
        let mut st = handle.state.lock();
        transition(&mut st.order, OrderStatus::Paused)?;
        let order_id = st.order.id.clone();
        drop(st);
        info!(%order_id, "order paused");
        self.events.publish(&ExecutionEvent::OrderPaused { order_id });
        Ok(())
    }

    /// Resumes a paused order. Slices that became due during the pause
    /// all execute on the next tick.
    pub(crate) fn resume(&self, handle: &OrderHandle) -> Result<(), EngineError> {
        let mut st = handle.state.lock();
        transition(&mut st.order, OrderStatus::Active)?;
        let order_id = st.order.id.clone();
        drop(st);
        info!(%order_id, "order resumed");
        self.events.publish(&ExecutionEvent::OrderResumed { order_id });
        Ok(())
    }

    /// Cancels an order. Idempotent: cancelling a terminal order is a
    /// no-op. Pending slices are skipped; executed slices keep their
    /// fills, and an in-flight slice finishes its submission.
    pub(crate) fn cancel(&self, handle: &OrderHandle) -> Result<(), EngineError> {
        let mut st = handle.state.lock();
        if st.order.status.is_terminal() {
            return Ok(());
        }
        transition(&mut st.order, OrderStatus::Cancelled)?;
        for slice in &mut st.order.slices {
            if slice.status == SliceStatus::Pending {
                // Pending slices always accept the skip.
                let _ = slice.mark_skipped(SkipReason::CancelledByUser);
            }
        }
        let order_id = st.order.id.clone();
        drop(st);
        info!(%order_id, "order cancelled");
        self.events.publish(&ExecutionEvent::OrderCancelled { order_id });
        Ok(())
    }

    /// Takes a progress snapshot.
    pub(crate) fn progress(&self, handle: &OrderHandle) -> ProgressSnapshot {
        let st = handle.state.lock();
        st.tracker.snapshot(&st.order)
    }

    /// Builds the terminal report for the order.
    pub(crate) fn summary(&self, handle: &OrderHandle) -> ExecutionSummary {
        let st = handle.state.lock();
        st.tracker.summary(&st.order)
    }

    /// Tick loop for one started order. Runs until the order reaches a
    /// terminal state. The first tick fires immediately, so a slice due
    /// at start executes without waiting an interval.
    pub(crate) async fn run(self: Arc<Self>, handle: Arc<OrderHandle>) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.step(&handle).await {
                StepOutcome::Continue => {}
                StepOutcome::Finished => break,
            }
        }
    }

    /// One tick: executes every due slice in schedule order, so a
    /// backlog accumulated during a pause drains in a single tick.
    async fn step(&self, handle: &OrderHandle) -> StepOutcome {
        loop {
            let claim = {
                let mut st = handle.state.lock();
                if st.order.status.is_terminal() {
                    return StepOutcome::Finished;
                }
                if st.order.status != OrderStatus::Active {
                    return StepOutcome::Continue;
                }
                if st.order.all_slices_terminal() {
                    let completion = self.complete(&mut st);
                    drop(st);
                    if let Some(event) = completion {
                        self.events.publish(&event);
                    }
                    return StepOutcome::Finished;
                }
                // FIFO among due slices: only the earliest pending
                // slice may execute, and only once its time has passed.
                let now = Timestamp::now();
                let Some(index) = st
                    .order
                    .slices
                    .iter()
                    .position(|s| s.status == SliceStatus::Pending)
                else {
                    return StepOutcome::Continue;
                };
                if !st.order.slices[index].is_due(now) {
                    return StepOutcome::Continue;
                }
                if let Err(err) = st.order.slices[index].mark_executing() {
                    // Unreachable while this loop is the only claimer.
                    error!(order_id = %st.order.id, %err, "slice claim failed");
                    let _ = st.order.transition(OrderStatus::Error);
                    return StepOutcome::Finished;
                }
                let config = &st.order.config;
                let count = config.resolved_slice_count();
                SliceClaim {
                    index,
                    target: st.order.slices[index].target_quantity,
                    symbol: config.symbol.clone(),
                    side: config.side,
                    strategy: config.strategy,
                    price_limit: config.price_limit,
                    max_slippage: config.max_slippage,
                    participation: config.volume_participation,
                    participation_window: config.duration / count,
                    venues: config.venues.clone(),
                }
            };
            self.execute_slice(handle, claim).await;
        }
    }

    /// Executes one claimed slice end to end.
    async fn execute_slice(&self, handle: &OrderHandle, claim: SliceClaim) {
        let quotes = match self
            .quotes
            .venue_quotes(&claim.symbol, claim.side, claim.target)
            .await
        {
            Ok(quotes) => restrict_venues(quotes, claim.venues.as_deref()),
            Err(err) => {
                warn!(symbol = %claim.symbol, slice = claim.index, %err, "quote fetch failed");
                self.fail_slice(handle, claim.index, FailReason::NoLiquidity, &[]);
                return;
            }
        };

        if let Some(limit) = claim.price_limit {
            if let Some(market) = best_market_price(claim.side, &quotes) {
                let breached = match claim.side {
                    OrderSide::Buy => market > limit,
                    OrderSide::Sell => market < limit,
                };
                if breached {
                    info!(
                        symbol = %claim.symbol,
                        slice = claim.index,
                        %market,
                        %limit,
                        "price limit breached, skipping slice"
                    );
                    self.skip_slice(handle, claim.index, SkipReason::PriceLimit);
                    return;
                }
            }
        }

        let quantity = self.participation_cap(&claim).await;
        if quantity.is_zero() {
            self.fail_slice(handle, claim.index, FailReason::NoLiquidity, &[]);
            return;
        }

        // Plan construction mutates the order RNG, so it runs under the
        // lock; it is pure computation, no I/O.
        let plan = {
            let mut st = handle.state.lock();
            self.router.plan(
                &claim.symbol,
                claim.side,
                quantity,
                claim.strategy,
                &quotes,
                &mut st.rng,
            )
        };
        let plan = match plan {
            Ok(plan) => plan,
            Err(err) => {
                warn!(symbol = %claim.symbol, slice = claim.index, %err, "routing failed");
                self.fail_slice(handle, claim.index, FailReason::NoLiquidity, &[]);
                return;
            }
        };

        if let Some(bound) = claim.max_slippage {
            let breached = match claim.side {
                OrderSide::Buy => plan.average_price > bound,
                OrderSide::Sell => plan.average_price < bound,
            };
            if breached {
                info!(
                    symbol = %claim.symbol,
                    slice = claim.index,
                    plan_avg = %plan.average_price,
                    %bound,
                    "slippage bound breached, skipping slice"
                );
                self.skip_slice(handle, claim.index, SkipReason::PriceLimit);
                return;
            }
        }

        let mut fills: Vec<Fill> = Vec::with_capacity(plan.segments.len());
        let mut failure: Option<ExecutionError> = None;
        for segment in &plan.segments {
            match self
                .adapter
                .submit_order(
                    &segment.venue,
                    &claim.symbol,
                    claim.side,
                    segment.quantity,
                    segment.price,
                )
                .await
            {
                Ok(fill) => fills.push(fill),
                Err(err) => {
                    warn!(
                        venue = %segment.venue,
                        slice = claim.index,
                        %err,
                        "child order failed"
                    );
                    failure = Some(err);
                    break;
                }
            }
        }

        match failure {
            None => {
                let mut st = handle.state.lock();
                let (executed, avg) = aggregate_fills(&fills);
                let venue = fills
                    .iter()
                    .max_by_key(|f| f.executed_quantity)
                    .map(|f| f.venue.clone())
                    .unwrap_or_else(|| VenueId::new_unchecked("unknown"));
                let order_id = st.order.id.clone();
                if let Err(err) = st.order.slices[claim.index].mark_completed(
                    executed,
                    avg.unwrap_or(Price::ZERO),
                    venue.clone(),
                ) {
                    error!(%order_id, slice = claim.index, %err, "commit failed");
                    return;
                }
                st.tracker.record_savings(plan.estimated_savings);
                if !plan.total_quantity.is_zero() {
                    // Fees prorated by the filled fraction of the plan.
                    let filled_fraction =
                        executed.as_decimal() / plan.total_quantity.as_decimal();
                    st.tracker.record_fees(plan.total_fees * filled_fraction);
                }
                debug!(
                    %order_id,
                    slice = claim.index,
                    %executed,
                    venue = %venue,
                    "slice completed"
                );
                let completion = self.check_completion(&mut st);
                drop(st);
                // The final slice event goes out before the order-level
                // completion event.
                self.events.publish(&ExecutionEvent::SliceCompleted {
                    order_id,
                    slice_index: claim.index as u32,
                    executed_quantity: executed,
                    executed_price: avg.unwrap_or(Price::ZERO),
                    venue,
                });
                if let Some(event) = completion {
                    self.events.publish(&event);
                }
            }
            Some(err) => {
                self.fail_slice(
                    handle,
                    claim.index,
                    FailReason::Adapter {
                        message: err.to_string(),
                    },
                    &fills,
                );
            }
        }
    }

    /// Applies the volume-participation cap to the slice target.
    async fn participation_cap(&self, claim: &SliceClaim) -> Quantity {
        let (Some(rate), Some(volume)) = (claim.participation, self.volume.as_ref()) else {
            return claim.target;
        };
        match volume
            .recent_volume(&claim.symbol, claim.participation_window)
            .await
        {
            Ok(recent) => {
                let cap = Quantity::new_unchecked(recent.as_decimal() * rate);
                claim.target.min(cap)
            }
            Err(err) => {
                // Degrade to the uncapped target rather than stall.
                warn!(symbol = %claim.symbol, %err, "volume estimate failed");
                claim.target
            }
        }
    }

    /// Marks a slice failed, recording any fills collected first.
    fn fail_slice(&self, handle: &OrderHandle, index: usize, reason: FailReason, fills: &[Fill]) {
        let mut st = handle.state.lock();
        let (executed, avg) = aggregate_fills(fills);
        let order_id = st.order.id.clone();
        if let Err(err) = st.order.slices[index].mark_failed(reason.clone(), executed, avg) {
            error!(%order_id, slice = index, %err, "commit failed");
            return;
        }
        let completion = self.check_completion(&mut st);
        drop(st);
        self.events.publish(&ExecutionEvent::SliceFailed {
            order_id,
            slice_index: index as u32,
            reason,
        });
        if let Some(event) = completion {
            self.events.publish(&event);
        }
    }

    /// Marks a slice skipped.
    fn skip_slice(&self, handle: &OrderHandle, index: usize, reason: SkipReason) {
        let mut st = handle.state.lock();
        let order_id = st.order.id.clone();
        if let Err(err) = st.order.slices[index].mark_skipped(reason) {
            error!(%order_id, slice = index, %err, "commit failed");
            return;
        }
        let completion = self.check_completion(&mut st);
        drop(st);
        self.events.publish(&ExecutionEvent::SliceSkipped {
            order_id,
            slice_index: index as u32,
            reason,
        });
        if let Some(event) = completion {
            self.events.publish(&event);
        }
    }

    /// Completes the order if it is active and every slice is terminal.
    /// Returns the completion event for the caller to publish after the
    /// lock is released, so it trails the triggering slice event.
    fn check_completion(&self, st: &mut OrderState) -> Option<ExecutionEvent> {
        if st.order.status == OrderStatus::Active && st.order.all_slices_terminal() {
            self.complete(st)
        } else {
            None
        }
    }

    fn complete(&self, st: &mut OrderState) -> Option<ExecutionEvent> {
        if st.order.transition(OrderStatus::Completed).is_ok() {
            let order_id = st.order.id.clone();
            info!(
                %order_id,
                executed = %st.order.executed_quantity(),
                savings = %st.tracker.estimated_savings(),
                "order completed"
            );
            Some(ExecutionEvent::OrderCompleted { order_id })
        } else {
            None
        }
    }
}

fn transition(order: &mut ParentOrder, to: OrderStatus) -> Result<(), EngineError> {
    order
        .transition(to)
        .map_err(|(from, to)| EngineError::InvalidTransition { from, to })
}

/// Keeps only quotes from the allowed venue set, if one is configured.
fn restrict_venues(quotes: Vec<VenueQuote>, allowed: Option<&[VenueId]>) -> Vec<VenueQuote> {
    match allowed {
        Some(venues) => quotes
            .into_iter()
            .filter(|q| venues.contains(&q.venue))
            .collect(),
        None => quotes,
    }
}

/// Best raw market price across quotes: lowest for buys, highest for
/// sells. Fee adjustment is a routing concern; the price limit compares
/// against the quoted market.
fn best_market_price(side: OrderSide, quotes: &[VenueQuote]) -> Option<Price> {
    let prices = quotes.iter().filter(|q| q.has_depth()).map(|q| q.price);
    match side {
        OrderSide::Buy => prices.min(),
        OrderSide::Sell => prices.max(),
    }
}

/// Total executed quantity and quantity-weighted average price.
fn aggregate_fills(fills: &[Fill]) -> (Quantity, Option<Price>) {
    let executed: Decimal = fills.iter().map(|f| f.executed_quantity.as_decimal()).sum();
    if executed.is_zero() {
        return (Quantity::ZERO, None);
    }
    let notional: Decimal = fills.iter().map(Fill::notional).sum();
    (
        Quantity::new_unchecked(executed),
        Some(Price::new_unchecked(notional / executed)),
    )
}
