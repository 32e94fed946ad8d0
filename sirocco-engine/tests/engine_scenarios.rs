//! End-to-end engine scenarios against mock venues.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use tokio::time::timeout;

use sirocco_core::data::{Fill, OrderSide, VenueQuote};
use sirocco_core::error::{ExecutionError, QuoteError};
use sirocco_core::traits::{ExecutionAdapter, QuoteProvider, VolumeEstimator};
use sirocco_core::types::{OrderId, Price, Quantity, Symbol, VenueId};

use sirocco_engine::{
    EngineError, ExecutionEngine, ExecutionEvent, ExecutionStrategy, OrderConfig, OrderStatus,
};

fn quote(venue: &str, price: Decimal, depth: Decimal, fee: Decimal, latency: u64) -> VenueQuote {
    VenueQuote::new(
        VenueId::new_unchecked(venue),
        Price::new_unchecked(price),
        Quantity::new_unchecked(depth),
        fee,
        latency,
    )
}

fn default_quotes() -> Vec<VenueQuote> {
    vec![
        quote("binance", dec!(100), dec!(50), dec!(0.001), 12),
        quote("kraken", dec!(100.5), dec!(50), dec!(0.0005), 40),
        quote("okx", dec!(101), dec!(50), dec!(0.001), 25),
    ]
}

/// Quote provider returning a fixed quote set.
struct StaticQuotes {
    quotes: Vec<VenueQuote>,
}

#[async_trait]
impl QuoteProvider for StaticQuotes {
    async fn venue_quotes(
        &self,
        _symbol: &Symbol,
        _side: OrderSide,
        _quantity: Quantity,
    ) -> Result<Vec<VenueQuote>, QuoteError> {
        Ok(self.quotes.clone())
    }
}

/// Adapter that fills every child order in full at the limit price
/// and records each submission.
#[derive(Default)]
struct FullFillAdapter {
    submissions: Mutex<Vec<(VenueId, Decimal)>>,
}

#[async_trait]
impl ExecutionAdapter for FullFillAdapter {
    async fn submit_order(
        &self,
        venue: &VenueId,
        _symbol: &Symbol,
        _side: OrderSide,
        quantity: Quantity,
        price: Price,
    ) -> Result<Fill, ExecutionError> {
        self.submissions
            .lock()
            .push((venue.clone(), quantity.as_decimal()));
        Ok(Fill::new(venue.clone(), quantity, price))
    }
}

/// Adapter that rejects everything.
struct RejectingAdapter;

#[async_trait]
impl ExecutionAdapter for RejectingAdapter {
    async fn submit_order(
        &self,
        venue: &VenueId,
        _symbol: &Symbol,
        _side: OrderSide,
        _quantity: Quantity,
        _price: Price,
    ) -> Result<Fill, ExecutionError> {
        Err(ExecutionError::Rejected {
            venue: venue.clone(),
            reason: "venue offline".to_string(),
        })
    }
}

/// Fixed recent-volume estimate.
struct StaticVolume {
    volume: Decimal,
}

#[async_trait]
impl VolumeEstimator for StaticVolume {
    async fn recent_volume(
        &self,
        _symbol: &Symbol,
        _window: Duration,
    ) -> Result<Quantity, QuoteError> {
        Ok(Quantity::new_unchecked(self.volume))
    }
}

fn engine(quotes: Vec<VenueQuote>, adapter: Arc<dyn ExecutionAdapter>) -> ExecutionEngine {
    ExecutionEngine::builder(Arc::new(StaticQuotes { quotes }), adapter)
        .tick_interval(Duration::from_millis(10))
        .build()
}

fn config(total: Decimal) -> OrderConfig {
    OrderConfig::builder()
        .symbol(Symbol::new("BTC-USDT").unwrap())
        .side(OrderSide::Buy)
        .total_quantity(Quantity::new(total).unwrap())
        .duration(Duration::from_millis(200))
        .strategy(ExecutionStrategy::BestPrice)
        .slice_count(4)
        .seed(42)
        .build()
        .unwrap()
}

/// Drains events until the order reaches a terminal event or the
/// timeout expires.
async fn run_until_terminal(
    rx: &mut mpsc::UnboundedReceiver<ExecutionEvent>,
    id: &OrderId,
) -> Vec<ExecutionEvent> {
    let mut events = Vec::new();
    let deadline = Duration::from_secs(5);
    loop {
        let event = timeout(deadline, rx.recv())
            .await
            .expect("timed out waiting for events")
            .expect("event channel closed");
        if event.order_id() != id {
            continue;
        }
        let terminal = matches!(
            event,
            ExecutionEvent::OrderCompleted { .. } | ExecutionEvent::OrderCancelled { .. }
        );
        events.push(event);
        if terminal {
            return events;
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn full_execution_conserves_quantity() {
    let adapter = Arc::new(FullFillAdapter::default());
    let engine = engine(default_quotes(), adapter.clone());
    let mut rx = engine.subscribe();

    let id = engine.create_order(config(dec!(20))).unwrap();
    engine.start(&id).unwrap();
    let events = run_until_terminal(&mut rx, &id).await;

    let snap = engine.progress(&id).unwrap();
    assert_eq!(snap.status, OrderStatus::Completed);
    assert_eq!(snap.executed_quantity.as_decimal(), dec!(20));
    assert_eq!(snap.remaining_quantity, Quantity::ZERO);
    assert_eq!(snap.completion_pct, dec!(100));
    assert_eq!(snap.slices_completed, 4);

    // Best-price routing against static quotes executes everything at
    // the cheapest venue.
    assert_eq!(snap.average_price.unwrap().as_decimal(), dec!(100));
    assert!(snap.estimated_savings > Decimal::ZERO);
    for (venue, _) in adapter.submissions.lock().iter() {
        assert_eq!(venue.as_str(), "binance");
    }

    let completed = events
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::SliceCompleted { .. }))
        .count();
    assert_eq!(completed, 4);
    assert!(matches!(events.last(), Some(ExecutionEvent::OrderCompleted { .. })));

    let summary = engine.summary(&id).unwrap();
    assert_eq!(summary.status, OrderStatus::Completed);
    assert_eq!(summary.executed_quantity.as_decimal(), dec!(20));
    // binance charges 10 bps on 20 @ 100.
    assert_eq!(summary.total_fees, dec!(2.0));
    assert!(summary.started_at.is_some());
    assert!(summary.finished_at.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn price_limit_skips_every_slice() {
    let engine = engine(default_quotes(), Arc::new(FullFillAdapter::default()));
    let mut rx = engine.subscribe();

    let mut cfg = config(dec!(20));
    // Market is at 100; a buy limited to 95 never executes.
    cfg.price_limit = Some(Price::new_unchecked(dec!(95)));
    let id = engine.create_order(cfg).unwrap();
    engine.start(&id).unwrap();
    let events = run_until_terminal(&mut rx, &id).await;

    let snap = engine.progress(&id).unwrap();
    assert_eq!(snap.status, OrderStatus::Completed);
    assert_eq!(snap.executed_quantity, Quantity::ZERO);
    assert_eq!(snap.slices_skipped, 4);
    assert!(events
        .iter()
        .all(|e| !matches!(e, ExecutionEvent::SliceCompleted { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn thin_market_yields_partial_fills() {
    // One venue with depth 2 against slice targets of 5.
    let quotes = vec![quote("binance", dec!(100), dec!(2), dec!(0.001), 12)];
    let engine = engine(quotes, Arc::new(FullFillAdapter::default()));
    let mut rx = engine.subscribe();

    let id = engine.create_order(config(dec!(20))).unwrap();
    engine.start(&id).unwrap();
    run_until_terminal(&mut rx, &id).await;

    let snap = engine.progress(&id).unwrap();
    assert_eq!(snap.status, OrderStatus::Completed);
    // 4 slices x depth cap 2.
    assert_eq!(snap.executed_quantity.as_decimal(), dec!(8));
    assert_eq!(snap.slices_completed, 4);
    assert!(snap.remaining_quantity.as_decimal() > Decimal::ZERO);
}

#[tokio::test(flavor = "multi_thread")]
async fn adapter_rejection_fails_slices_but_finishes_order() {
    let engine = engine(default_quotes(), Arc::new(RejectingAdapter));
    let mut rx = engine.subscribe();

    let id = engine.create_order(config(dec!(20))).unwrap();
    engine.start(&id).unwrap();
    let events = run_until_terminal(&mut rx, &id).await;

    let snap = engine.progress(&id).unwrap();
    assert_eq!(snap.status, OrderStatus::Completed);
    assert_eq!(snap.executed_quantity, Quantity::ZERO);
    assert_eq!(snap.slices_failed, 4);
    let failed = events
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::SliceFailed { .. }))
        .count();
    assert_eq!(failed, 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_skips_pending_and_is_idempotent() {
    let engine = engine(default_quotes(), Arc::new(FullFillAdapter::default()));
    let mut rx = engine.subscribe();

    // Long horizon so later slices are still pending when we cancel.
    let mut cfg = config(dec!(20));
    cfg.duration = Duration::from_secs(3600);
    let id = engine.create_order(cfg).unwrap();
    engine.start(&id).unwrap();

    // Wait for the first slice to complete, then cancel.
    loop {
        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        if matches!(event, ExecutionEvent::SliceCompleted { .. }) {
            break;
        }
    }
    engine.cancel(&id).unwrap();
    engine.cancel(&id).unwrap(); // idempotent

    let snap = engine.progress(&id).unwrap();
    assert_eq!(snap.status, OrderStatus::Cancelled);
    assert_eq!(snap.slices_completed, 1);
    assert_eq!(snap.slices_skipped, 3);
    // Fills survive cancellation.
    assert_eq!(snap.executed_quantity.as_decimal(), dec!(5));
}

#[tokio::test(flavor = "multi_thread")]
async fn pause_blocks_execution_and_resume_drains_backlog() {
    let engine = engine(default_quotes(), Arc::new(FullFillAdapter::default()));
    let mut rx = engine.subscribe();

    let id = engine.create_order(config(dec!(20))).unwrap();
    engine.start(&id).unwrap();
    engine.pause(&id).unwrap();

    // Let the whole schedule fall due while paused.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let snap = engine.progress(&id).unwrap();
    assert_eq!(snap.status, OrderStatus::Paused);
    // The first slice may have executed before the pause landed.
    assert!(snap.slices_completed <= 1);

    engine.resume(&id).unwrap();
    run_until_terminal(&mut rx, &id).await;
    let snap = engine.progress(&id).unwrap();
    assert_eq!(snap.status, OrderStatus::Completed);
    assert_eq!(snap.executed_quantity.as_decimal(), dec!(20));
}

#[tokio::test(flavor = "multi_thread")]
async fn volume_participation_caps_slice_size() {
    let adapter = Arc::new(FullFillAdapter::default());
    let engine = ExecutionEngine::builder(
        Arc::new(StaticQuotes {
            quotes: default_quotes(),
        }),
        adapter.clone(),
    )
    .volume_estimator(Arc::new(StaticVolume { volume: dec!(10) }))
    .tick_interval(Duration::from_millis(10))
    .build();
    let mut rx = engine.subscribe();

    let mut cfg = config(dec!(20));
    // 10% of volume 10 caps each slice at 1 instead of 5.
    cfg.volume_participation = Some(dec!(0.1));
    let id = engine.create_order(cfg).unwrap();
    engine.start(&id).unwrap();
    run_until_terminal(&mut rx, &id).await;

    let snap = engine.progress(&id).unwrap();
    assert_eq!(snap.executed_quantity.as_decimal(), dec!(4));
    for (_, qty) in adapter.submissions.lock().iter() {
        assert_eq!(*qty, dec!(1));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_transition_errors() {
    let engine = engine(default_quotes(), Arc::new(FullFillAdapter::default()));

    let missing = OrderId::generate();
    assert!(matches!(
        engine.progress(&missing),
        Err(EngineError::OrderNotFound(_))
    ));

    let mut cfg = config(dec!(20));
    cfg.duration = Duration::from_secs(3600);
    let id = engine.create_order(cfg).unwrap();

    // Pausing an idle order is rejected.
    assert!(matches!(
        engine.pause(&id),
        Err(EngineError::InvalidTransition { .. })
    ));

    engine.start(&id).unwrap();
    // Starting twice is rejected.
    assert!(matches!(
        engine.start(&id),
        Err(EngineError::InvalidTransition { .. })
    ));

    engine.cancel(&id).unwrap();
    // Resuming a cancelled order is rejected; cancelling again is not.
    assert!(matches!(
        engine.resume(&id),
        Err(EngineError::InvalidTransition { .. })
    ));
    assert!(engine.cancel(&id).is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn split_strategy_spreads_across_venues() {
    let adapter = Arc::new(FullFillAdapter::default());
    let engine = engine(default_quotes(), adapter.clone());
    let mut rx = engine.subscribe();

    let mut cfg = config(dec!(30));
    cfg.strategy = ExecutionStrategy::Split;
    let id = engine.create_order(cfg).unwrap();
    engine.start(&id).unwrap();
    run_until_terminal(&mut rx, &id).await;

    let snap = engine.progress(&id).unwrap();
    assert_eq!(snap.executed_quantity.as_decimal(), dec!(30));

    let submissions = adapter.submissions.lock();
    let mut venues: Vec<&str> = submissions.iter().map(|(v, _)| v.as_str()).collect();
    venues.sort_unstable();
    venues.dedup();
    assert_eq!(venues, ["binance", "kraken", "okx"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn completion_event_trails_final_slice_event() {
    // Subscribers must see every slice settle before the order-level
    // completion event, on the failure path too.
    let engine = engine(default_quotes(), Arc::new(RejectingAdapter));
    let mut rx = engine.subscribe();

    let id = engine.create_order(config(dec!(20))).unwrap();
    engine.start(&id).unwrap();
    let events = run_until_terminal(&mut rx, &id).await;

    assert!(matches!(events.last(), Some(ExecutionEvent::OrderCompleted { .. })));
    let slice_events_before_completion = events[..events.len() - 1]
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::SliceFailed { .. }))
        .count();
    assert_eq!(slice_events_before_completion, 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn remove_order_archives_only_terminal_orders() {
    let engine = engine(default_quotes(), Arc::new(FullFillAdapter::default()));

    let mut cfg = config(dec!(20));
    cfg.duration = Duration::from_secs(3600);
    let id = engine.create_order(cfg).unwrap();

    // A live order stays in the registry.
    assert!(matches!(
        engine.remove_order(&id),
        Err(EngineError::OrderStillRunning { .. })
    ));

    engine.cancel(&id).unwrap();
    let summary = engine.remove_order(&id).unwrap();
    assert_eq!(summary.status, OrderStatus::Cancelled);

    // Archived orders are gone from every lookup.
    assert!(matches!(
        engine.progress(&id),
        Err(EngineError::OrderNotFound(_))
    ));
    assert!(matches!(
        engine.remove_order(&id),
        Err(EngineError::OrderNotFound(_))
    ));
    assert!(engine.list_orders().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn list_orders_reports_every_order() {
    let engine = engine(default_quotes(), Arc::new(FullFillAdapter::default()));
    let a = engine.create_order(config(dec!(20))).unwrap();
    let b = engine.create_order(config(dec!(8))).unwrap();

    let snapshots = engine.list_orders();
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots.iter().any(|s| s.order_id == a));
    assert!(snapshots.iter().any(|s| s.order_id == b));
    assert!(snapshots.iter().all(|s| s.status == OrderStatus::Idle));
}
