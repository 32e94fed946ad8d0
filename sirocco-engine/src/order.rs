//! Parent order domain model.
//!
//! This module defines the parent order, its configuration, its slices,
//! and the state machines both move through:
//!
//! ```text
//! order:  idle -> active -> { paused, completed, cancelled, error }
//!                 paused -> active
//! slice:  pending -> executing -> { completed, failed, skipped }
//! ```
//!
//! A slice transitions out of `pending` at most once, and only the
//! execution coordinator mutates an order after construction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use sirocco_core::data::OrderSide;
use sirocco_core::error::ConfigError;
use sirocco_core::types::{OrderId, Price, Quantity, Symbol, Timestamp, VenueId};

/// Interval used to derive the default slice count (one slice per five
/// minutes of execution horizon, before urgency scaling).
const DEFAULT_SLICE_INTERVAL: Duration = Duration::from_secs(300);

/// Bounds on the number of slices per order.
const MIN_SLICES: u32 = 3;
const MAX_SLICES: u32 = 100;

/// Execution strategy for a parent order.
///
/// The strategy decides how routed quantity is allocated across venues;
/// see the router module for the per-strategy allocation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStrategy {
    /// Route everything to the single best-priced venue.
    BestPrice,
    /// Divide evenly across the top three venues.
    Split,
    /// Time-sliced execution (TWAP); spread the slice over the ranked
    /// venues with small synthetic limit-price variance.
    TimeSliced,
    /// Volume-sliced execution (VWAP); routed like `TimeSliced`, paced
    /// by the volume-participation cap instead of time alone.
    VolumeSliced,
    /// Fragment into small chunks over pseudo-random top venues to hide
    /// the total size.
    Iceberg,
    /// Route to the two lowest-latency venues.
    FastestVenue,
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BestPrice => write!(f, "best-price"),
            Self::Split => write!(f, "split"),
            Self::TimeSliced => write!(f, "time-sliced"),
            Self::VolumeSliced => write!(f, "volume-sliced"),
            Self::Iceberg => write!(f, "iceberg"),
            Self::FastestVenue => write!(f, "fastest-venue"),
        }
    }
}

/// Urgency level - scales the default slice count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Half the default slice count (patient execution).
    Low,
    /// The default slice count.
    #[default]
    Medium,
    /// Twice the default slice count (aggressive execution).
    High,
}

impl Urgency {
    /// Scales a base slice count by the urgency multiplier
    /// (low 0.5, medium 1, high 2).
    #[must_use]
    pub const fn scale(&self, base: u32) -> u32 {
        match self {
            Self::Low => base.div_ceil(2),
            Self::Medium => base,
            Self::High => base.saturating_mul(2),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Parent order configuration.
///
/// Built through [`OrderConfig::builder`]; validation happens at build
/// time, so a constructed config is always executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Tradeable asset.
    pub symbol: Symbol,
    /// Buy or sell.
    pub side: OrderSide,
    /// Total quantity to execute.
    pub total_quantity: Quantity,
    /// Execution horizon.
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// Venue allocation strategy.
    pub strategy: ExecutionStrategy,
    /// Explicit slice count; derived from duration and urgency if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice_count: Option<u32>,
    /// Minimum per-slice quantity, applied before normalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_slice_size: Option<Quantity>,
    /// Maximum per-slice quantity, applied before normalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_slice_size: Option<Quantity>,
    /// Apply +/-15% jitter to slice schedule offsets.
    #[serde(default)]
    pub randomize_time: bool,
    /// Apply +/-10% jitter to slice sizes (all but the last slice).
    #[serde(default)]
    pub randomize_size: bool,
    /// Urgency level.
    #[serde(default)]
    pub urgency: Urgency,
    /// Parent-level price limit; a slice whose market price breaches it
    /// is skipped, not failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_limit: Option<Price>,
    /// Bound on the routing plan's average price; a plan that would
    /// exceed it is rejected and the slice skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_slippage: Option<Price>,
    /// Cap each slice at this fraction of estimated recent volume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_participation: Option<Decimal>,
    /// Restrict routing to these venues; all known venues if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venues: Option<Vec<VenueId>>,
    /// Seed for schedule jitter and routing randomization; a fresh
    /// entropy seed is drawn if unset. Set it for reproducible runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl OrderConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> OrderConfigBuilder {
        OrderConfigBuilder::default()
    }

    /// Resolves the effective slice count: the explicit count if set,
    /// otherwise `ceil(duration / 5min)` scaled by urgency, clamped to
    /// `[3, 100]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn resolved_slice_count(&self) -> u32 {
        let count = self.slice_count.unwrap_or_else(|| {
            let interval_ms = DEFAULT_SLICE_INTERVAL.as_millis() as u64;
            let base = (self.duration.as_millis() as u64).div_ceil(interval_ms) as u32;
            self.urgency.scale(base)
        });
        count.clamp(MIN_SLICES, MAX_SLICES)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for non-positive quantity or duration,
    /// infeasible min/max slice bounds, or an out-of-range
    /// participation fraction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_quantity.is_zero() {
            return Err(ConfigError::NonPositiveQuantity(
                self.total_quantity.as_decimal(),
            ));
        }
        if self.duration.is_zero() {
            return Err(ConfigError::NonPositiveDuration);
        }

        let count = self.resolved_slice_count();
        let total = self.total_quantity.as_decimal();

        if let (Some(min), Some(max)) = (self.min_slice_size, self.max_slice_size) {
            if min > max {
                return Err(ConfigError::MinExceedsMax {
                    min: min.as_decimal(),
                    max: max.as_decimal(),
                });
            }
        }
        if let Some(min) = self.min_slice_size {
            if min.as_decimal() * Decimal::from(count) > total {
                return Err(ConfigError::InfeasibleMinSliceSize {
                    min: min.as_decimal(),
                    count,
                    total,
                });
            }
        }
        if let Some(max) = self.max_slice_size {
            if max.as_decimal() * Decimal::from(count) < total {
                return Err(ConfigError::InfeasibleMaxSliceSize {
                    max: max.as_decimal(),
                    count,
                    total,
                });
            }
        }
        if let Some(rate) = self.volume_participation {
            if rate <= Decimal::ZERO || rate > Decimal::ONE {
                return Err(ConfigError::InvalidParticipation(rate));
            }
        }

        Ok(())
    }
}

/// Builder for [`OrderConfig`].
#[derive(Debug, Default)]
pub struct OrderConfigBuilder {
    symbol: Option<Symbol>,
    side: Option<OrderSide>,
    total_quantity: Option<Quantity>,
    duration: Option<Duration>,
    strategy: Option<ExecutionStrategy>,
    slice_count: Option<u32>,
    min_slice_size: Option<Quantity>,
    max_slice_size: Option<Quantity>,
    randomize_time: bool,
    randomize_size: bool,
    urgency: Urgency,
    price_limit: Option<Price>,
    max_slippage: Option<Price>,
    volume_participation: Option<Decimal>,
    venues: Option<Vec<VenueId>>,
    seed: Option<u64>,
}

impl OrderConfigBuilder {
    /// Sets the symbol.
    #[must_use]
    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = Some(symbol);
        self
    }

    /// Sets the order side.
    #[must_use]
    pub fn side(mut self, side: OrderSide) -> Self {
        self.side = Some(side);
        self
    }

    /// Sets the total quantity.
    #[must_use]
    pub fn total_quantity(mut self, quantity: Quantity) -> Self {
        self.total_quantity = Some(quantity);
        self
    }

    /// Sets the execution horizon.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Sets the execution strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Sets an explicit slice count.
    #[must_use]
    pub fn slice_count(mut self, count: u32) -> Self {
        self.slice_count = Some(count);
        self
    }

    /// Sets the minimum per-slice quantity.
    #[must_use]
    pub fn min_slice_size(mut self, min: Quantity) -> Self {
        self.min_slice_size = Some(min);
        self
    }

    /// Sets the maximum per-slice quantity.
    #[must_use]
    pub fn max_slice_size(mut self, max: Quantity) -> Self {
        self.max_slice_size = Some(max);
        self
    }

    /// Enables schedule-offset jitter.
    #[must_use]
    pub fn randomize_time(mut self, randomize: bool) -> Self {
        self.randomize_time = randomize;
        self
    }

    /// Enables slice-size jitter.
    #[must_use]
    pub fn randomize_size(mut self, randomize: bool) -> Self {
        self.randomize_size = randomize;
        self
    }

    /// Sets the urgency level.
    #[must_use]
    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Sets the parent-level price limit.
    #[must_use]
    pub fn price_limit(mut self, limit: Price) -> Self {
        self.price_limit = Some(limit);
        self
    }

    /// Sets the routing-plan slippage bound.
    #[must_use]
    pub fn max_slippage(mut self, bound: Price) -> Self {
        self.max_slippage = Some(bound);
        self
    }

    /// Sets the volume participation fraction.
    #[must_use]
    pub fn volume_participation(mut self, rate: Decimal) -> Self {
        self.volume_participation = Some(rate);
        self
    }

    /// Restricts routing to the given venues.
    #[must_use]
    pub fn venues(mut self, venues: Vec<VenueId>) -> Self {
        self.venues = Some(venues);
        self
    }

    /// Sets the randomization seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` if a required field is unset,
    /// or the relevant variant if any validation rule fails.
    pub fn build(self) -> Result<OrderConfig, ConfigError> {
        let config = OrderConfig {
            symbol: self
                .symbol
                .ok_or_else(|| ConfigError::MissingField("symbol".to_string()))?,
            side: self.side.unwrap_or(OrderSide::Buy),
            total_quantity: self
                .total_quantity
                .ok_or_else(|| ConfigError::MissingField("total_quantity".to_string()))?,
            duration: self
                .duration
                .ok_or_else(|| ConfigError::MissingField("duration".to_string()))?,
            strategy: self.strategy.unwrap_or(ExecutionStrategy::TimeSliced),
            slice_count: self.slice_count,
            min_slice_size: self.min_slice_size,
            max_slice_size: self.max_slice_size,
            randomize_time: self.randomize_time,
            randomize_size: self.randomize_size,
            urgency: self.urgency,
            price_limit: self.price_limit,
            max_slippage: self.max_slippage,
            volume_participation: self.volume_participation,
            venues: self.venues,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parent order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created but not started.
    Idle,
    /// Execution loop running.
    Active,
    /// Execution loop running but not executing slices.
    Paused,
    /// Every slice reached a terminal state.
    Completed,
    /// Cancelled by the caller.
    Cancelled,
    /// The execution loop aborted unexpectedly.
    Error,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Error)
    }

    /// Checks whether a transition to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Active | Self::Cancelled)
            | (Self::Active, Self::Paused | Self::Completed | Self::Cancelled | Self::Error)
            | (Self::Paused, Self::Active | Self::Cancelled | Self::Error) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Slice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceStatus {
    /// Waiting for its scheduled time.
    Pending,
    /// Picked up by the coordinator; routing/submission in flight.
    Executing,
    /// Submitted and filled (possibly partially).
    Completed,
    /// Routing or submission failed.
    Failed,
    /// Skipped without submission (price limit or cancellation).
    Skipped,
}

impl SliceStatus {
    /// Returns true if the slice is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

impl fmt::Display for SliceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Executing => write!(f, "executing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Reason a slice was skipped without submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The parent price limit or routing slippage bound was breached.
    PriceLimit,
    /// The caller cancelled the parent order.
    CancelledByUser,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriceLimit => write!(f, "price_limit"),
            Self::CancelledByUser => write!(f, "cancelled_by_user"),
        }
    }
}

/// Reason a slice failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailReason {
    /// No venue had usable liquidity.
    NoLiquidity,
    /// The execution adapter rejected or timed out.
    Adapter {
        /// Adapter error description.
        message: String,
    },
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLiquidity => write!(f, "no_liquidity"),
            Self::Adapter { message } => write!(f, "{message}"),
        }
    }
}

/// Invalid slice state transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid slice transition from {from} to {to}")]
pub struct SliceStateError {
    /// Current status.
    pub from: SliceStatus,
    /// Attempted status.
    pub to: SliceStatus,
}

/// A timed child order of a parent order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    /// Slice index (0-based, schedule order).
    pub index: u32,
    /// Scheduled execution time.
    pub scheduled_time: Timestamp,
    /// Target quantity for this slice.
    pub target_quantity: Quantity,
    /// Current status.
    pub status: SliceStatus,
    /// Executed quantity once resolved.
    pub executed_quantity: Quantity,
    /// Average executed price once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_price: Option<Price>,
    /// Primary venue the slice executed at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<VenueId>,
    /// Why the slice was skipped, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    /// Why the slice failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<FailReason>,
}

impl Slice {
    /// Creates a new pending slice.
    #[must_use]
    pub fn new(index: u32, target_quantity: Quantity, scheduled_time: Timestamp) -> Self {
        Self {
            index,
            scheduled_time,
            target_quantity,
            status: SliceStatus::Pending,
            executed_quantity: Quantity::ZERO,
            executed_price: None,
            venue: None,
            skip_reason: None,
            fail_reason: None,
        }
    }

    /// Returns true if the slice is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.status == SliceStatus::Pending && self.scheduled_time <= now
    }

    fn transition(&mut self, to: SliceStatus) -> Result<(), SliceStateError> {
        let allowed = matches!(
            (self.status, to),
            (SliceStatus::Pending, SliceStatus::Executing)
                | (
                    SliceStatus::Pending | SliceStatus::Executing,
                    SliceStatus::Completed | SliceStatus::Failed | SliceStatus::Skipped,
                )
        );
        if !allowed {
            return Err(SliceStateError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Marks the slice as picked up by the coordinator.
    ///
    /// # Errors
    ///
    /// Returns `SliceStateError` if the slice is not pending.
    pub fn mark_executing(&mut self) -> Result<(), SliceStateError> {
        self.transition(SliceStatus::Executing)
    }

    /// Marks the slice completed with its execution result.
    ///
    /// # Errors
    ///
    /// Returns `SliceStateError` on an invalid transition.
    pub fn mark_completed(
        &mut self,
        executed_quantity: Quantity,
        executed_price: Price,
        venue: VenueId,
    ) -> Result<(), SliceStateError> {
        self.transition(SliceStatus::Completed)?;
        self.executed_quantity = executed_quantity.min(self.target_quantity);
        self.executed_price = Some(executed_price);
        self.venue = Some(venue);
        Ok(())
    }

    /// Marks the slice failed.
    ///
    /// Any fills collected before the failure are still recorded.
    ///
    /// # Errors
    ///
    /// Returns `SliceStateError` on an invalid transition.
    pub fn mark_failed(
        &mut self,
        reason: FailReason,
        executed_quantity: Quantity,
        executed_price: Option<Price>,
    ) -> Result<(), SliceStateError> {
        self.transition(SliceStatus::Failed)?;
        self.executed_quantity = executed_quantity.min(self.target_quantity);
        self.executed_price = executed_price;
        self.fail_reason = Some(reason);
        Ok(())
    }

    /// Marks the slice skipped.
    ///
    /// # Errors
    ///
    /// Returns `SliceStateError` on an invalid transition.
    pub fn mark_skipped(&mut self, reason: SkipReason) -> Result<(), SliceStateError> {
        self.transition(SliceStatus::Skipped)?;
        self.skip_reason = Some(reason);
        Ok(())
    }
}

/// A parent order: the full quantity a caller wants executed, together
/// with its slice timetable and lifecycle status.
///
/// A parent order exclusively owns its slices; no other order may read
/// or mutate them. After construction only the execution coordinator
/// mutates the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentOrder {
    /// Order identity.
    pub id: OrderId,
    /// Immutable configuration.
    pub config: OrderConfig,
    /// Slice timetable, in schedule order.
    pub slices: Vec<Slice>,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// When execution started, once it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// When the order reached a terminal state, once it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
}

impl ParentOrder {
    /// Creates a new idle parent order with a prepared slice timetable.
    #[must_use]
    pub fn new(id: OrderId, config: OrderConfig, slices: Vec<Slice>, created_at: Timestamp) -> Self {
        Self {
            id,
            config,
            slices,
            status: OrderStatus::Idle,
            created_at,
            started_at: None,
            finished_at: None,
        }
    }

    /// Returns the total executed quantity over resolved slices.
    #[must_use]
    pub fn executed_quantity(&self) -> Quantity {
        self.slices.iter().map(|s| s.executed_quantity).sum()
    }

    /// Returns the earliest pending slice, if any.
    ///
    /// Slices are stored in schedule order, so this is also the FIFO
    /// head among due slices.
    #[must_use]
    pub fn first_pending(&self) -> Option<&Slice> {
        self.slices.iter().find(|s| s.status == SliceStatus::Pending)
    }

    /// Returns true if every slice is in a terminal state.
    #[must_use]
    pub fn all_slices_terminal(&self) -> bool {
        self.slices.iter().all(|s| s.status.is_terminal())
    }

    /// Transitions the order status.
    ///
    /// # Errors
    ///
    /// Returns the rejected `(from, to)` pair if the transition is not
    /// allowed by the lifecycle state machine.
    pub fn transition(&mut self, to: OrderStatus) -> Result<(), (OrderStatus, OrderStatus)> {
        if !self.status.can_transition_to(to) {
            return Err((self.status, to));
        }
        if self.status == OrderStatus::Idle && to == OrderStatus::Active {
            self.started_at = Some(Timestamp::now());
        }
        if to.is_terminal() {
            self.finished_at = Some(Timestamp::now());
        }
        self.status = to;
        Ok(())
    }
}
