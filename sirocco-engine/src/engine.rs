//! Engine facade.
//!
//! [`ExecutionEngine`] is the public entry point: it owns the order
//! registry, wires the coordinator to the caller-supplied market
//! traits, and exposes the order lifecycle operations. Construct one
//! through [`ExecutionEngine::builder`].

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use sirocco_core::error::ConfigError;
use sirocco_core::traits::{ExecutionAdapter, QuoteProvider, VolumeEstimator};
use sirocco_core::types::{OrderId, Timestamp};

use crate::coordinator::{ExecutionCoordinator, OrderHandle};
use crate::notifier::{EventBus, ExecutionEvent};
use crate::order::{OrderConfig, OrderStatus, ParentOrder};
use crate::progress::{ExecutionSummary, ProgressSnapshot};
use crate::scheduler;

/// Default coordinator tick interval.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Engine operation error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Order configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No order with the given id.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// The requested lifecycle transition is not allowed.
    #[error("invalid order transition from {from} to {to}")]
    InvalidTransition {
        /// Current order status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },

    /// The order has not finished; only terminal orders can be removed.
    #[error("order is still {status}; only terminal orders can be removed")]
    OrderStillRunning {
        /// Current order status.
        status: OrderStatus,
    },
}

/// Builder for [`ExecutionEngine`].
pub struct ExecutionEngineBuilder {
    quotes: Arc<dyn QuoteProvider>,
    adapter: Arc<dyn ExecutionAdapter>,
    volume: Option<Arc<dyn VolumeEstimator>>,
    tick_interval: Duration,
}

impl ExecutionEngineBuilder {
    /// Attaches a volume estimator, enabling volume-participation caps.
    #[must_use]
    pub fn volume_estimator(mut self, volume: Arc<dyn VolumeEstimator>) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Overrides the coordinator tick interval (default 1s). Tests use
    /// short intervals to drive schedules quickly.
    #[must_use]
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Builds the engine.
    #[must_use]
    pub fn build(self) -> ExecutionEngine {
        let events = Arc::new(EventBus::new());
        let coordinator = Arc::new(ExecutionCoordinator::new(
            self.quotes,
            self.adapter,
            self.volume,
            Arc::clone(&events),
            self.tick_interval,
        ));
        ExecutionEngine {
            coordinator,
            events,
            orders: DashMap::new(),
        }
    }
}

/// Order execution engine.
///
/// Thread-safe; all operations take `&self` and may be called from any
/// task. Each started order runs its own coordinator loop.
pub struct ExecutionEngine {
    coordinator: Arc<ExecutionCoordinator>,
    events: Arc<EventBus>,
    orders: DashMap<OrderId, Arc<OrderHandle>>,
}

impl ExecutionEngine {
    /// Creates a builder over the required market-access traits.
    #[must_use]
    pub fn builder(
        quotes: Arc<dyn QuoteProvider>,
        adapter: Arc<dyn ExecutionAdapter>,
    ) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder {
            quotes,
            adapter,
            volume: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Creates an idle order with a prepared slice timetable.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if the configuration is invalid.
    pub fn create_order(&self, config: OrderConfig) -> Result<OrderId, EngineError> {
        config.validate()?;
        let id = OrderId::generate();
        let created_at = Timestamp::now();
        let mut rng = scheduler::order_rng(&config);
        let slices = scheduler::build_schedule(&config, created_at, &mut rng);
        info!(
            order_id = %id,
            symbol = %config.symbol,
            side = %config.side,
            strategy = %config.strategy,
            total = %config.total_quantity,
            slices = slices.len(),
            "order created"
        );
        let order = ParentOrder::new(id.clone(), config, slices, created_at);
        self.orders
            .insert(id.clone(), Arc::new(OrderHandle::new(order, rng)));
        Ok(id)
    }

    /// Starts an idle order: activates it, re-anchors the schedule to
    /// now, and spawns its execution loop. The first due slice executes
    /// on the immediate first tick.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` or `InvalidTransition`.
    pub fn start(&self, id: &OrderId) -> Result<(), EngineError> {
        let handle = self.handle(id)?;
        self.coordinator.start(&handle)?;
        tokio::spawn(Arc::clone(&self.coordinator).run(handle));
        Ok(())
    }

    /// Pauses an active order.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` or `InvalidTransition`.
    pub fn pause(&self, id: &OrderId) -> Result<(), EngineError> {
        let handle = self.handle(id)?;
        self.coordinator.pause(&handle)
    }

    /// Resumes a paused order; slices due during the pause execute on
    /// the next tick.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` or `InvalidTransition`.
    pub fn resume(&self, id: &OrderId) -> Result<(), EngineError> {
        let handle = self.handle(id)?;
        self.coordinator.resume(&handle)
    }

    /// Cancels an order. Idempotent on terminal orders.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`.
    pub fn cancel(&self, id: &OrderId) -> Result<(), EngineError> {
        let handle = self.handle(id)?;
        self.coordinator.cancel(&handle)
    }

    /// Takes a progress snapshot of one order.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`.
    pub fn progress(&self, id: &OrderId) -> Result<ProgressSnapshot, EngineError> {
        let handle = self.handle(id)?;
        Ok(self.coordinator.progress(&handle))
    }

    /// Builds the execution summary for an order. Usually read after
    /// the order reaches a terminal state, but valid at any point.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`.
    pub fn summary(&self, id: &OrderId) -> Result<ExecutionSummary, EngineError> {
        let handle = self.handle(id)?;
        Ok(self.coordinator.summary(&handle))
    }

    /// Removes a terminal order from the registry, returning its final
    /// summary. Completed, cancelled, and errored orders stay queryable
    /// until removed; this is the explicit archive step.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`, or `OrderStillRunning` if the order has
    /// not reached a terminal status.
    pub fn remove_order(&self, id: &OrderId) -> Result<ExecutionSummary, EngineError> {
        let handle = self.handle(id)?;
        let summary = self.coordinator.summary(&handle);
        if !summary.status.is_terminal() {
            return Err(EngineError::OrderStillRunning {
                status: summary.status,
            });
        }
        self.orders.remove(id);
        info!(order_id = %id, status = %summary.status, "order archived");
        Ok(summary)
    }

    /// Progress snapshots for every known order.
    #[must_use]
    pub fn list_orders(&self) -> Vec<ProgressSnapshot> {
        self.orders
            .iter()
            .map(|entry| self.coordinator.progress(entry.value()))
            .collect()
    }

    /// Subscribes to execution events for all orders.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ExecutionEvent> {
        self.events.subscribe()
    }

    fn handle(&self, id: &OrderId) -> Result<Arc<OrderHandle>, EngineError> {
        self.orders
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::OrderNotFound(id.clone()))
    }
}
