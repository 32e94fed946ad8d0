//! Execution event notification.
//!
//! The engine publishes lifecycle and per-slice events to any number
//! of subscribers over unbounded channels. Publishing never blocks;
//! subscribers that dropped their receiver are pruned on the next
//! publish.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use sirocco_core::types::{OrderId, Price, Quantity, VenueId};

use crate::order::{FailReason, SkipReason};

/// An execution lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// The order's execution loop started.
    OrderStarted {
        /// Order the event belongs to.
        order_id: OrderId,
    },
    /// The order was paused.
    OrderPaused {
        /// Order the event belongs to.
        order_id: OrderId,
    },
    /// The order resumed from pause.
    OrderResumed {
        /// Order the event belongs to.
        order_id: OrderId,
    },
    /// The order was cancelled.
    OrderCancelled {
        /// Order the event belongs to.
        order_id: OrderId,
    },
    /// Every slice reached a terminal state.
    OrderCompleted {
        /// Order the event belongs to.
        order_id: OrderId,
    },
    /// A slice executed.
    SliceCompleted {
        /// Order the event belongs to.
        order_id: OrderId,
        /// Index of the slice.
        slice_index: u32,
        /// Quantity the slice executed.
        executed_quantity: Quantity,
        /// Average executed price.
        executed_price: Price,
        /// Venue that carried the largest allocation.
        venue: VenueId,
    },
    /// A slice failed.
    SliceFailed {
        /// Order the event belongs to.
        order_id: OrderId,
        /// Index of the slice.
        slice_index: u32,
        /// Failure reason.
        reason: FailReason,
    },
    /// A slice was skipped without submission.
    SliceSkipped {
        /// Order the event belongs to.
        order_id: OrderId,
        /// Index of the slice.
        slice_index: u32,
        /// Skip reason.
        reason: SkipReason,
    },
}

impl ExecutionEvent {
    /// Returns the order the event belongs to.
    #[must_use]
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::OrderStarted { order_id }
            | Self::OrderPaused { order_id }
            | Self::OrderResumed { order_id }
            | Self::OrderCancelled { order_id }
            | Self::OrderCompleted { order_id }
            | Self::SliceCompleted { order_id, .. }
            | Self::SliceFailed { order_id, .. }
            | Self::SliceSkipped { order_id, .. } => order_id,
        }
    }
}

/// Fan-out publisher for execution events.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ExecutionEvent>>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its receiver.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ExecutionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Publishes an event to all live subscribers, dropping any whose
    /// receiver has gone away.
    pub fn publish(&self, event: &ExecutionEvent) {
        trace!(order_id = %event.order_id(), ?event, "publishing event");
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> ExecutionEvent {
        ExecutionEvent::OrderStarted {
            order_id: OrderId::new("ord-1").unwrap(),
        }
    }

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish(&started());
        assert_eq!(a.try_recv().unwrap(), started());
        assert_eq!(b.try_recv().unwrap(), started());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        drop(rx);
        bus.publish(&started());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serde_tags() {
        let json = serde_json::to_string(&started()).unwrap();
        assert!(json.contains("\"event\":\"order_started\""));
    }
}
