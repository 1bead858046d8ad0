//! Tick-size rounding helpers.
//!
//! Every price or trigger submitted to the broker must be an exact multiple
//! of the instrument's tick size.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Rounds `price` to the nearest multiple of `tick`. A zero or negative
/// tick returns the price unchanged.
#[must_use]
pub fn round_to_tick(price: Decimal, tick: Decimal) -> Decimal {
    if tick <= Decimal::ZERO {
        return price;
    }
    let ticks = (price / tick).round();
    (ticks * tick).normalize()
}

/// Rounds `price` down to a tick multiple (used for buy-side triggers).
#[must_use]
pub fn floor_to_tick(price: Decimal, tick: Decimal) -> Decimal {
    if tick <= Decimal::ZERO {
        return price;
    }
    ((price / tick).floor() * tick).normalize()
}

/// True if `price` is an exact multiple of `tick`.
#[must_use]
pub fn is_tick_aligned(price: Decimal, tick: Decimal) -> bool {
    if tick <= Decimal::ZERO {
        return true;
    }
    (price % tick).is_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_to_nearest_tick() {
        assert_eq!(round_to_tick(dec!(101.23), dec!(0.05)), dec!(101.25));
        assert_eq!(round_to_tick(dec!(101.22), dec!(0.05)), dec!(101.2));
        assert_eq!(round_to_tick(dec!(7421), dec!(1)), dec!(7421));
    }

    #[test]
    fn floor_never_rounds_up() {
        assert_eq!(floor_to_tick(dec!(101.29), dec!(0.05)), dec!(101.25));
        assert_eq!(floor_to_tick(dec!(101.25), dec!(0.05)), dec!(101.25));
    }

    #[test]
    fn rounded_prices_are_aligned() {
        for raw in [dec!(99.97), dec!(0.03), dec!(1234.56)] {
            let rounded = round_to_tick(raw, dec!(0.05));
            assert!(is_tick_aligned(rounded, dec!(0.05)), "{raw} -> {rounded}");
        }
    }

    #[test]
    fn zero_tick_is_a_passthrough() {
        assert_eq!(round_to_tick(dec!(10.333), Decimal::ZERO), dec!(10.333));
        assert!(is_tick_aligned(dec!(10.333), Decimal::ZERO));
    }
}
