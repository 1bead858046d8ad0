//! Per-instrument stop state and the scan decision rule.
//!
//! `decide` is pure: the engine gathers the inputs (live position, declared
//! stop, tick size) and applies whatever action comes back. That keeps the
//! monotonicity and grace-period rules testable without a broker or store.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use signal_trade_broker::types::BrokerPosition;
use signal_trade_core::config::StopConfig;

use crate::stop_math;

/// Tracking record for one protected instrument.
#[derive(Debug, Clone)]
pub struct StopState {
    /// Row id of the STOP order in the store.
    pub order_row_id: i64,
    pub broker_order_id: String,
    /// Trigger currently resting at the broker.
    pub trigger: Decimal,
    /// When the initial stop was placed; anchors the grace period.
    pub placed_at: DateTime<Utc>,
    /// Set when the computed trigger was already behind the market. The
    /// engine stops touching the position and a human takes over.
    pub manual_exit: bool,
}

/// What the scan should do for one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopAction {
    /// No resting stop yet; place one at this trigger.
    PlaceInitial { trigger: Decimal },
    /// Tighten the resting stop to this trigger.
    Trail { trigger: Decimal },
    /// Leave the stop where it is.
    Hold,
    /// The would-be trigger is already through the market; do not submit.
    FlagManualExit,
}

/// Decides the action for one live position.
pub fn decide(
    state: Option<&StopState>,
    position: &BrokerPosition,
    declared_stop: Option<Decimal>,
    tick: Decimal,
    cfg: &StopConfig,
    now: DateTime<Utc>,
) -> StopAction {
    let long = position.is_long();
    let Some(state) = state else {
        let trigger = stop_math::initial_stop(
            long,
            declared_stop,
            position.average_price,
            cfg.initial_stop_pct,
            tick,
        );
        if stop_math::is_breached(long, trigger, position.last_price) {
            return StopAction::FlagManualExit;
        }
        return StopAction::PlaceInitial { trigger };
    };

    if state.manual_exit {
        return StopAction::Hold;
    }
    let grace_until = state.placed_at + Duration::seconds(cfg.grace_period_secs as i64);
    if now < grace_until {
        return StopAction::Hold;
    }

    let candidate = stop_math::trail_candidate(long, position.last_price, cfg.trail_pct, tick);
    if stop_math::is_improvement(long, candidate, state.trigger) {
        StopAction::Trail { trigger: candidate }
    } else {
        StopAction::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use signal_trade_core::types::Exchange;

    fn cfg() -> StopConfig {
        StopConfig {
            poll_interval_secs: 15,
            initial_stop_pct: dec!(0.10),
            trail_pct: dec!(0.05),
            grace_period_secs: 300,
        }
    }

    fn long_position(avg: Decimal, last: Decimal) -> BrokerPosition {
        BrokerPosition {
            instrument_id: "NIFTY26SEP24500CE".to_string(),
            exchange: Exchange::Nfo,
            quantity: 75,
            average_price: avg,
            last_price: last,
        }
    }

    fn placed(trigger: Decimal, placed_at: DateTime<Utc>) -> StopState {
        StopState {
            order_row_id: 1,
            broker_order_id: "PAPER-1".to_string(),
            trigger,
            placed_at,
            manual_exit: false,
        }
    }

    #[test]
    fn unprotected_position_gets_initial_stop() {
        let pos = long_position(dec!(10), dec!(10.2));
        let action = decide(None, &pos, Some(dec!(9)), dec!(0.05), &cfg(), Utc::now());
        assert_eq!(action, StopAction::PlaceInitial { trigger: dec!(9) });
    }

    #[test]
    fn breached_trigger_flags_manual_exit() {
        // Market already fell through the declared stop.
        let pos = long_position(dec!(10), dec!(8.5));
        let action = decide(None, &pos, Some(dec!(9)), dec!(0.05), &cfg(), Utc::now());
        assert_eq!(action, StopAction::FlagManualExit);
    }

    #[test]
    fn grace_period_suppresses_favorable_trailing() {
        let now = Utc::now();
        let state = placed(dec!(9), now - Duration::seconds(60));
        // Price up 20%: trailing would want 10.2 * 0.95 > 9.
        let pos = long_position(dec!(10), dec!(12));
        let action = decide(Some(&state), &pos, None, dec!(0.05), &cfg(), now);
        assert_eq!(action, StopAction::Hold);
    }

    #[test]
    fn trailing_resumes_after_grace() {
        let now = Utc::now();
        let state = placed(dec!(9), now - Duration::seconds(301));
        let pos = long_position(dec!(10), dec!(10.6));
        match decide(Some(&state), &pos, None, dec!(0.05), &cfg(), now) {
            StopAction::Trail { trigger } => assert_eq!(trigger, dec!(10.05)),
            other => panic!("expected trail, got {other:?}"),
        }
    }

    #[test]
    fn stop_is_never_loosened() {
        let now = Utc::now();
        let state = placed(dec!(10.05), now - Duration::seconds(600));
        // Price fell back; candidate 9.5 * 0.95 < 10.05.
        let pos = long_position(dec!(10), dec!(9.5));
        let action = decide(Some(&state), &pos, None, dec!(0.05), &cfg(), now);
        assert_eq!(action, StopAction::Hold);
    }

    #[test]
    fn applied_long_triggers_are_monotonic_over_a_price_path() {
        let now = Utc::now();
        let mut state = placed(dec!(9), now - Duration::seconds(600));
        let path = [
            dec!(10.2),
            dec!(10.8),
            dec!(10.4),
            dec!(11.5),
            dec!(11.1),
            dec!(12.3),
            dec!(9.8),
        ];
        let mut applied = vec![state.trigger];
        for last in path {
            let pos = long_position(dec!(10), last);
            if let StopAction::Trail { trigger } =
                decide(Some(&state), &pos, None, dec!(0.05), &cfg(), now)
            {
                state.trigger = trigger;
                applied.push(trigger);
            }
        }
        for pair in applied.windows(2) {
            assert!(pair[1] > pair[0], "loosened: {pair:?}");
        }
    }

    #[test]
    fn short_position_trails_downward() {
        let now = Utc::now();
        let mut state = placed(dec!(110), now - Duration::seconds(600));
        let mut pos = long_position(dec!(100), dec!(96));
        pos.quantity = -75;
        match decide(Some(&state), &pos, None, dec!(1), &cfg(), now) {
            StopAction::Trail { trigger } => {
                // 96 * 1.05 = 100.8 -> 101 on a 1-point tick.
                assert_eq!(trigger, dec!(101));
                state.trigger = trigger;
            }
            other => panic!("expected trail, got {other:?}"),
        }
        // Price rebounds; candidate above the resting trigger is ignored.
        pos.last_price = dec!(99);
        assert_eq!(
            decide(Some(&state), &pos, None, dec!(1), &cfg(), now),
            StopAction::Hold
        );
    }

    #[test]
    fn manual_exit_positions_are_left_alone() {
        let now = Utc::now();
        let mut state = placed(dec!(9), now - Duration::seconds(600));
        state.manual_exit = true;
        let pos = long_position(dec!(10), dec!(12));
        assert_eq!(
            decide(Some(&state), &pos, None, dec!(0.05), &cfg(), now),
            StopAction::Hold
        );
    }
}
