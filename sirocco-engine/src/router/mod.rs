//! Smart order router.
//!
//! Produces a [`RoutingPlan`] for a slice: venues ranked by
//! fee-adjusted price (lowest effective cost first for buys, highest
//! effective proceeds first for sells), then quantity allocated per
//! the order's execution strategy with every allocation capped by the
//! venue's quoted depth.
//!
//! Quotes are fetched fresh per slice by the coordinator; the router
//! never caches market state.

mod plan;

pub use plan::{RouteSegment, RoutingPlan};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use tracing::debug;

use sirocco_core::data::{OrderSide, VenueQuote};
use sirocco_core::error::QuoteError;
use sirocco_core::types::{Price, Quantity, Symbol};

use crate::order::ExecutionStrategy;

/// Venues considered by `Split` and `Iceberg` allocation.
const TOP_VENUES: usize = 3;

/// Number of child chunks an `Iceberg` slice is fragmented into.
const ICEBERG_CHUNKS: u32 = 10;

/// Sub-ticks a time-sliced slice is spread over within its window.
const TIME_SLICE_SUBTICKS: u32 = 4;

/// Limit-price variance for time-sliced child orders in basis points.
const TIME_SLICE_VARIANCE_BP: i64 = 5;

/// Ranks venues and allocates slice quantity across them.
#[derive(Debug, Default)]
pub struct SmartRouter;

impl SmartRouter {
    /// Creates a new router.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds a routing plan for the given quantity.
    ///
    /// The plan routes at most the requested quantity; when aggregate
    /// depth falls short the plan is partial. Quotes without depth are
    /// dropped before ranking.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::NoLiquidity` when no quote has usable
    /// depth, or when the strategy allocates nothing.
    pub fn plan(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        quantity: Quantity,
        strategy: ExecutionStrategy,
        quotes: &[VenueQuote],
        rng: &mut ChaCha8Rng,
    ) -> Result<RoutingPlan, QuoteError> {
        let ranked = rank_quotes(side, quotes);
        if ranked.is_empty() {
            return Err(QuoteError::NoLiquidity {
                symbol: symbol.clone(),
            });
        }

        let worst = Price::new_unchecked(
            ranked
                .last()
                .map(|q| q.effective_price(side))
                .unwrap_or_default(),
        );

        let segments = match strategy {
            ExecutionStrategy::BestPrice => allocate_greedy(&ranked[..1], side, quantity),
            ExecutionStrategy::Split => {
                let top = &ranked[..ranked.len().min(TOP_VENUES)];
                allocate_even(top, side, quantity)
            }
            ExecutionStrategy::TimeSliced | ExecutionStrategy::VolumeSliced => {
                let mut segments = allocate_cycling(&ranked, side, quantity);
                jitter_limit_prices(&mut segments, rng);
                segments
            }
            ExecutionStrategy::Iceberg => {
                let top = &ranked[..ranked.len().min(TOP_VENUES)];
                allocate_iceberg(top, side, quantity, rng)
            }
            ExecutionStrategy::FastestVenue => {
                let fastest = fastest_venues(&ranked, 2);
                allocate_even(&fastest, side, quantity)
            }
        };

        let plan = RoutingPlan::from_segments(segments, worst);
        if plan.is_empty() {
            return Err(QuoteError::NoLiquidity {
                symbol: symbol.clone(),
            });
        }

        debug!(
            %symbol,
            strategy = %strategy,
            segments = plan.segments.len(),
            routed = %plan.total_quantity,
            avg_price = %plan.average_price,
            savings = %plan.estimated_savings,
            "routing plan built"
        );
        Ok(plan)
    }
}

/// Filters out empty quotes and ranks the rest by effective price:
/// ascending for buys, descending for sells.
fn rank_quotes(side: OrderSide, quotes: &[VenueQuote]) -> Vec<&VenueQuote> {
    let mut ranked: Vec<&VenueQuote> = quotes.iter().filter(|q| q.has_depth()).collect();
    ranked.sort_by(|a, b| {
        let (ea, eb) = (a.effective_price(side), b.effective_price(side));
        match side {
            OrderSide::Buy => ea.cmp(&eb),
            OrderSide::Sell => eb.cmp(&ea),
        }
    });
    ranked
}

fn segment(quote: &VenueQuote, side: OrderSide, quantity: Decimal) -> RouteSegment {
    RouteSegment {
        venue: quote.venue.clone(),
        quantity: Quantity::new_unchecked(quantity),
        price: quote.price,
        effective_price: Price::new_unchecked(quote.effective_price(side)),
    }
}

/// Walks the ranked venues in order, taking as much depth as each
/// offers until the quantity is covered.
fn allocate_greedy(ranked: &[&VenueQuote], side: OrderSide, quantity: Quantity) -> Vec<RouteSegment> {
    let mut remaining = quantity.as_decimal();
    let mut segments = Vec::new();
    for quote in ranked {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = remaining.min(quote.available_quantity.as_decimal());
        if take > Decimal::ZERO {
            segments.push(segment(quote, side, take));
            remaining -= take;
        }
    }
    segments
}

/// Splits the quantity evenly across the given venues, capped at each
/// venue's depth, then spills any leftover greedily by rank.
fn allocate_even(venues: &[&VenueQuote], side: OrderSide, quantity: Quantity) -> Vec<RouteSegment> {
    if venues.is_empty() {
        return Vec::new();
    }
    let even = quantity.as_decimal() / Decimal::from(venues.len() as u32);
    let mut taken: Vec<Decimal> = venues
        .iter()
        .map(|q| even.min(q.available_quantity.as_decimal()))
        .collect();
    let mut leftover = quantity.as_decimal() - taken.iter().copied().sum::<Decimal>();

    for (take, quote) in taken.iter_mut().zip(venues) {
        if leftover <= Decimal::ZERO {
            break;
        }
        let headroom = quote.available_quantity.as_decimal() - *take;
        let extra = leftover.min(headroom);
        *take += extra;
        leftover -= extra;
    }

    venues
        .iter()
        .zip(taken)
        .filter(|(_, take)| *take > Decimal::ZERO)
        .map(|(quote, take)| segment(quote, side, take))
        .collect()
}

/// Splits the quantity over sub-ticks, sending each sub-tick's chunk
/// to one venue and cycling through the ranking, capped at each
/// venue's depth. Leftover from dry venues spills greedily by rank.
fn allocate_cycling(ranked: &[&VenueQuote], side: OrderSide, quantity: Quantity) -> Vec<RouteSegment> {
    if ranked.is_empty() {
        return Vec::new();
    }
    let chunk = quantity.as_decimal() / Decimal::from(TIME_SLICE_SUBTICKS);
    let mut depth: Vec<Decimal> = ranked
        .iter()
        .map(|q| q.available_quantity.as_decimal())
        .collect();
    let mut segments = Vec::with_capacity(TIME_SLICE_SUBTICKS as usize);
    let mut remaining = quantity.as_decimal();

    for tick in 0..TIME_SLICE_SUBTICKS as usize {
        if remaining <= Decimal::ZERO {
            break;
        }
        let start = tick % ranked.len();
        let Some(idx) = (0..ranked.len())
            .map(|i| (start + i) % ranked.len())
            .find(|&i| depth[i] > Decimal::ZERO)
        else {
            break;
        };
        let take = chunk.min(remaining).min(depth[idx]);
        segments.push(segment(ranked[idx], side, take));
        depth[idx] -= take;
        remaining -= take;
    }

    // Division remainders and depth-capped sub-ticks leave a tail.
    for (i, quote) in ranked.iter().enumerate() {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = remaining.min(depth[i]);
        if take > Decimal::ZERO {
            segments.push(segment(quote, side, take));
            depth[i] -= take;
            remaining -= take;
        }
    }

    segments
}

/// Fragments the quantity into fixed-size chunks and scatters them
/// over the top venues. Each chunk becomes its own child order, so no
/// venue sees more than a chunk at a time and the parent size stays
/// hidden.
fn allocate_iceberg(
    top: &[&VenueQuote],
    side: OrderSide,
    quantity: Quantity,
    rng: &mut ChaCha8Rng,
) -> Vec<RouteSegment> {
    let chunk = quantity.as_decimal() / Decimal::from(ICEBERG_CHUNKS);
    let mut depth: Vec<Decimal> = top
        .iter()
        .map(|q| q.available_quantity.as_decimal())
        .collect();
    let mut segments = Vec::with_capacity(ICEBERG_CHUNKS as usize);
    let mut remaining = quantity.as_decimal();

    for _ in 0..ICEBERG_CHUNKS {
        if remaining <= Decimal::ZERO {
            break;
        }
        let pick = rng.gen_range(0..top.len());
        // Fall forward to the next venue with headroom if the pick is dry.
        let Some(idx) = (0..top.len())
            .map(|i| (pick + i) % top.len())
            .find(|&i| depth[i] > Decimal::ZERO)
        else {
            break;
        };
        let take = chunk.min(remaining).min(depth[idx]);
        segments.push(segment(top[idx], side, take));
        depth[idx] -= take;
        remaining -= take;
    }

    segments
}

/// Re-ranks a price-ranked set by latency and keeps the fastest `n`.
fn fastest_venues<'a>(ranked: &[&'a VenueQuote], n: usize) -> Vec<&'a VenueQuote> {
    let mut by_latency: Vec<&VenueQuote> = ranked.to_vec();
    by_latency.sort_by_key(|q| q.latency_ms);
    by_latency.truncate(n);
    by_latency
}

/// Applies a +/-5 bp variance to each segment's limit price so
/// time-sliced child orders do not print identical prices.
fn jitter_limit_prices(segments: &mut [RouteSegment], rng: &mut ChaCha8Rng) {
    for seg in segments {
        let bp = rng.gen_range(-TIME_SLICE_VARIANCE_BP..=TIME_SLICE_VARIANCE_BP);
        let adjusted = seg.price.as_decimal() * (Decimal::ONE + Decimal::new(bp, 4));
        seg.price = Price::new_unchecked(adjusted.max(Decimal::ZERO));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    use sirocco_core::types::VenueId;

    fn quote(venue: &str, price: Decimal, depth: Decimal, fee: Decimal, latency: u64) -> VenueQuote {
        VenueQuote::new(
            VenueId::new_unchecked(venue),
            Price::new_unchecked(price),
            Quantity::new_unchecked(depth),
            fee,
            latency,
        )
    }

    fn quotes() -> Vec<VenueQuote> {
        vec![
            quote("binance", dec!(100), dec!(5), dec!(0.001), 12),
            quote("kraken", dec!(100.5), dec!(8), dec!(0.0005), 40),
            quote("okx", dec!(101), dec!(20), dec!(0.001), 25),
            quote("bybit", dec!(102), dec!(50), dec!(0.0002), 8),
        ]
    }

    fn symbol() -> Symbol {
        Symbol::new_unchecked("BTC-USDT")
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn plan(strategy: ExecutionStrategy, quantity: Decimal, quotes: &[VenueQuote]) -> RoutingPlan {
        SmartRouter::new()
            .plan(
                &symbol(),
                OrderSide::Buy,
                Quantity::new_unchecked(quantity),
                strategy,
                quotes,
                &mut rng(),
            )
            .unwrap()
    }

    #[test]
    fn test_best_price_routes_to_cheapest_effective() {
        let p = plan(ExecutionStrategy::BestPrice, dec!(3), &quotes());
        assert_eq!(p.segments.len(), 1);
        assert_eq!(p.segments[0].venue.as_str(), "binance");
        assert_eq!(p.total_quantity.as_decimal(), dec!(3));
    }

    #[test]
    fn test_best_price_is_depth_capped() {
        let p = plan(ExecutionStrategy::BestPrice, dec!(30), &quotes());
        // binance only quotes 5; the plan is partial.
        assert_eq!(p.total_quantity.as_decimal(), dec!(5));
    }

    #[test]
    fn test_fee_changes_venue_ranking() {
        // Raw prices favour binance, but its fee makes kraken cheaper.
        let qs = vec![
            quote("binance", dec!(100), dec!(10), dec!(0.01), 12),
            quote("kraken", dec!(100.5), dec!(10), dec!(0), 40),
        ];
        let p = plan(ExecutionStrategy::BestPrice, dec!(3), &qs);
        assert_eq!(p.segments[0].venue.as_str(), "kraken");
    }

    #[test]
    fn test_sell_side_ranks_descending() {
        let p = SmartRouter::new()
            .plan(
                &symbol(),
                OrderSide::Sell,
                Quantity::new_unchecked(dec!(3)),
                ExecutionStrategy::BestPrice,
                &quotes(),
                &mut rng(),
            )
            .unwrap();
        // Highest effective proceeds: bybit at 102 with 2 bp fee.
        assert_eq!(p.segments[0].venue.as_str(), "bybit");
    }

    #[test]
    fn test_split_spreads_over_top_three() {
        let p = plan(ExecutionStrategy::Split, dec!(9), &quotes());
        assert_eq!(p.segments.len(), 3);
        let venues: Vec<&str> = p.segments.iter().map(|s| s.venue.as_str()).collect();
        assert!(venues.contains(&"binance"));
        assert!(venues.contains(&"kraken"));
        assert!(venues.contains(&"okx"));
        assert_eq!(p.total_quantity.as_decimal(), dec!(9));
    }

    #[test]
    fn test_split_spills_past_shallow_venue() {
        // Even share is 4, binance only has 2; leftover spills by rank.
        let qs = vec![
            quote("binance", dec!(100), dec!(2), dec!(0), 12),
            quote("kraken", dec!(100.5), dec!(20), dec!(0), 40),
            quote("okx", dec!(101), dec!(20), dec!(0), 25),
        ];
        let p = plan(ExecutionStrategy::Split, dec!(12), &qs);
        assert_eq!(p.total_quantity.as_decimal(), dec!(12));
        assert_eq!(p.segments[0].quantity.as_decimal(), dec!(2));
    }

    #[test]
    fn test_fastest_venue_picks_lowest_latency() {
        let p = plan(ExecutionStrategy::FastestVenue, dec!(10), &quotes());
        let venues: Vec<&str> = p.segments.iter().map(|s| s.venue.as_str()).collect();
        assert_eq!(venues.len(), 2);
        assert!(venues.contains(&"bybit")); // 8 ms
        assert!(venues.contains(&"binance")); // 12 ms
    }

    #[test]
    fn test_iceberg_scatters_and_conserves() {
        let p = plan(ExecutionStrategy::Iceberg, dec!(10), &quotes());
        assert_eq!(p.total_quantity.as_decimal(), dec!(10));
        let venues: std::collections::HashSet<&str> =
            p.segments.iter().map(|s| s.venue.as_str()).collect();
        assert!(venues.len() >= 2, "expected scatter, got {:?}", p.segments);
    }

    #[test]
    fn test_iceberg_emits_one_segment_per_chunk() {
        // Ample depth: every chunk becomes a child order of chunk size,
        // keeping the parent size hidden from every venue.
        let p = plan(ExecutionStrategy::Iceberg, dec!(10), &quotes());
        assert_eq!(p.segments.len(), 10);
        for seg in &p.segments {
            assert_eq!(seg.quantity.as_decimal(), dec!(1));
        }
    }

    #[test]
    fn test_time_sliced_cycles_ranked_venues() {
        // One sub-tick chunk per venue, walking the ranking in order.
        let p = plan(ExecutionStrategy::TimeSliced, dec!(20), &quotes());
        assert_eq!(p.total_quantity.as_decimal(), dec!(20));
        let venues: Vec<&str> = p.segments.iter().map(|s| s.venue.as_str()).collect();
        assert_eq!(venues, vec!["binance", "kraken", "okx", "bybit"]);
        for seg in &p.segments {
            assert_eq!(seg.quantity.as_decimal(), dec!(5));
        }
    }

    #[test]
    fn test_time_sliced_jitters_limit_prices() {
        let p = plan(ExecutionStrategy::TimeSliced, dec!(20), &quotes());
        assert_eq!(p.total_quantity.as_decimal(), dec!(20));
        for seg in &p.segments {
            let quoted = quotes()
                .iter()
                .find(|q| q.venue == seg.venue)
                .unwrap()
                .price
                .as_decimal();
            let deviation = ((seg.price.as_decimal() - quoted) / quoted).abs();
            assert!(deviation <= dec!(0.0005), "deviation {deviation}");
        }
    }

    #[test]
    fn test_no_depth_is_no_liquidity() {
        let qs = vec![quote("binance", dec!(100), dec!(0), dec!(0), 12)];
        let err = SmartRouter::new()
            .plan(
                &symbol(),
                OrderSide::Buy,
                Quantity::new_unchecked(dec!(1)),
                ExecutionStrategy::BestPrice,
                &qs,
                &mut rng(),
            )
            .unwrap_err();
        assert!(matches!(err, QuoteError::NoLiquidity { .. }));
    }

    #[test]
    fn test_empty_quote_set_is_no_liquidity() {
        let err = SmartRouter::new()
            .plan(
                &symbol(),
                OrderSide::Buy,
                Quantity::new_unchecked(dec!(1)),
                ExecutionStrategy::Split,
                &[],
                &mut rng(),
            )
            .unwrap_err();
        assert!(matches!(err, QuoteError::NoLiquidity { .. }));
    }

    #[test]
    fn test_best_price_never_beaten_by_other_strategies() {
        // The best-price plan's average is minimal among strategies for
        // the same quantity on the buy side.
        let qty = dec!(4);
        let best = plan(ExecutionStrategy::BestPrice, qty, &quotes());
        for strategy in [
            ExecutionStrategy::Split,
            ExecutionStrategy::Iceberg,
            ExecutionStrategy::FastestVenue,
        ] {
            let other = plan(strategy, qty, &quotes());
            assert!(
                best.average_price.as_decimal() <= other.average_price.as_decimal(),
                "{strategy} beat best-price"
            );
        }
    }

    #[test]
    fn test_savings_versus_worst_quote() {
        let p = plan(ExecutionStrategy::BestPrice, dec!(2), &quotes());
        // Worst effective buy price: bybit 102 * 1.0002 = 102.0204.
        assert_eq!(p.worst_quote_price.as_decimal(), dec!(102.0204));
        assert!(p.estimated_savings > Decimal::ZERO);
    }
}
