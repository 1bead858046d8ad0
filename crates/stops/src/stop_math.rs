//! Stop trigger arithmetic.
//!
//! Direction follows the position sign alone: a long position is protected
//! from below, a short from above. A declared stop on the wrong
//! (favorable) side of the entry is discarded in favor of the percentage
//! fallback, which keeps applied triggers monotonic under trailing.

use rust_decimal::Decimal;

use signal_trade_core::tick::round_to_tick;

/// The initial trigger for a fresh position: the analyst's declared stop
/// when it is on the protective side of the average entry, otherwise a
/// fixed percentage offset from the entry. Tick-rounded.
#[must_use]
pub fn initial_stop(
    long: bool,
    declared: Option<Decimal>,
    average_entry: Decimal,
    stop_pct: Decimal,
    tick: Decimal,
) -> Decimal {
    let protective = declared.filter(|d| {
        if long {
            *d < average_entry
        } else {
            *d > average_entry
        }
    });
    let raw = protective.unwrap_or_else(|| {
        if long {
            average_entry * (Decimal::ONE - stop_pct)
        } else {
            average_entry * (Decimal::ONE + stop_pct)
        }
    });
    round_to_tick(raw, tick)
}

/// The trailing candidate: a fixed percentage behind the current market
/// price. Tick-rounded.
#[must_use]
pub fn trail_candidate(long: bool, last_price: Decimal, trail_pct: Decimal, tick: Decimal) -> Decimal {
    let raw = if long {
        last_price * (Decimal::ONE - trail_pct)
    } else {
        last_price * (Decimal::ONE + trail_pct)
    };
    round_to_tick(raw, tick)
}

/// Strict improvement test: a stop is never loosened, and an equal trigger
/// is not worth a broker round trip.
#[must_use]
pub fn is_improvement(long: bool, candidate: Decimal, current: Decimal) -> bool {
    if long {
        candidate > current
    } else {
        candidate < current
    }
}

/// True when the trigger would fill the moment it rests: at or through the
/// current market price.
#[must_use]
pub fn is_breached(long: bool, trigger: Decimal, last_price: Decimal) -> bool {
    if long {
        trigger >= last_price
    } else {
        trigger <= last_price
    }
}
