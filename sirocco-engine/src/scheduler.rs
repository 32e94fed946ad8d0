//! Slice schedule construction.
//!
//! Turns a validated [`OrderConfig`] into a slice timetable: evenly
//! spaced offsets over the execution horizon, optional +/-15% timing
//! jitter and +/-10% size jitter, per-slice min/max clamping, and a
//! final normalization pass that assigns the last slice the exact
//! remainder so slice quantities always sum to the order total.
//!
//! All randomness flows through the caller-supplied RNG. Orders seed
//! a [`ChaCha8Rng`](rand_chacha::ChaCha8Rng) from their configured
//! seed, so a seeded order always produces the same timetable.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;

use sirocco_core::types::{Quantity, Timestamp};

use crate::order::{OrderConfig, Slice};

/// Timing jitter bound in basis points (+/-15%).
const TIME_JITTER_BP: i64 = 1_500;

/// Size jitter bound in basis points (+/-10%).
const SIZE_JITTER_BP: i64 = 1_000;

/// Creates the deterministic RNG for an order.
///
/// Uses the configured seed when present, otherwise draws one from
/// thread-local entropy.
#[must_use]
pub fn order_rng(config: &OrderConfig) -> ChaCha8Rng {
    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    ChaCha8Rng::seed_from_u64(seed)
}

/// Builds the slice timetable for a validated configuration, anchored
/// at `anchor` (normally the order's creation time).
///
/// The returned slices are in schedule order with strictly ascending
/// indices, non-decreasing scheduled times, and quantities that sum
/// exactly to `config.total_quantity`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn build_schedule(config: &OrderConfig, anchor: Timestamp, rng: &mut ChaCha8Rng) -> Vec<Slice> {
    let count = config.resolved_slice_count();
    let duration_ms = config.duration.as_millis() as i64;
    let interval_ms = duration_ms / i64::from(count);

    let offsets = schedule_offsets(count, duration_ms, interval_ms, config.randomize_time, rng);
    let sizes = slice_sizes(config, count, rng);

    offsets
        .into_iter()
        .zip(sizes)
        .enumerate()
        .map(|(index, (offset_ms, size))| {
            Slice::new(index as u32, size, anchor.add_millis(offset_ms))
        })
        .collect()
}

/// Computes slice offsets in milliseconds from the anchor.
///
/// The base offset of slice `i` is the start of its interval, so the
/// first slice is due immediately. Jittered offsets are clamped to the
/// horizon and re-sorted, which keeps the schedule monotonic even when
/// adjacent jitters cross.
fn schedule_offsets(
    count: u32,
    duration_ms: i64,
    interval_ms: i64,
    randomize: bool,
    rng: &mut ChaCha8Rng,
) -> Vec<i64> {
    let mut offsets: Vec<i64> = (0..i64::from(count)).map(|i| i * interval_ms).collect();

    if randomize {
        for offset in &mut offsets {
            let jitter_bp = rng.gen_range(-TIME_JITTER_BP..=TIME_JITTER_BP);
            let jitter_ms = interval_ms * jitter_bp / 10_000;
            *offset = (*offset + jitter_ms).clamp(0, duration_ms);
        }
        offsets.sort_unstable();
    }

    offsets
}

/// Computes slice quantities: even split, optional jitter, min/max
/// clamping, then normalization with the exact remainder assigned to
/// the last slice.
fn slice_sizes(config: &OrderConfig, count: u32, rng: &mut ChaCha8Rng) -> Vec<Quantity> {
    let total = config.total_quantity.as_decimal();
    let base = total / Decimal::from(count);

    let mut sizes: Vec<Decimal> = (0..count).map(|_| base).collect();

    if config.randomize_size {
        // The last slice absorbs the remainder, so jitter skips it.
        for size in sizes.iter_mut().take(count as usize - 1) {
            let jitter_bp = rng.gen_range(-SIZE_JITTER_BP..=SIZE_JITTER_BP);
            *size *= Decimal::ONE + Decimal::new(jitter_bp, 4);
        }
    }

    for size in &mut sizes {
        if let Some(min) = config.min_slice_size {
            *size = (*size).max(min.as_decimal());
        }
        if let Some(max) = config.max_slice_size {
            *size = (*size).min(max.as_decimal());
        }
    }

    // Normalize so the quantities conserve the order total exactly.
    let sum: Decimal = sizes.iter().copied().sum();
    if sum != total && !sum.is_zero() {
        let scale = total / sum;
        for size in &mut sizes {
            *size *= scale;
        }
    }
    let head: Decimal = sizes.iter().take(count as usize - 1).copied().sum();
    sizes[count as usize - 1] = total - head;

    sizes
        .into_iter()
        .map(Quantity::new_unchecked)
        .collect()
}
