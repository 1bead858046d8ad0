//! Entry order planning.
//!
//! Turns an accepted intent plus its resolved instrument into a concrete
//! broker order request. Market orders go only to deep index books; single
//! names and the commodities exchange get limit orders, priced off the
//! declared entry (or the last traded price) with a bounded offset.

use rust_decimal::Decimal;

use signal_trade_core::config::ExecutorConfig;
use signal_trade_core::error::{PipelineError, PipelineResult};
use signal_trade_core::tick::round_to_tick;
use signal_trade_core::types::{Exchange, Instrument, ParsedIntent, TradeAction};
use signal_trade_refdata::lots::is_index;

use signal_trade_broker::types::{OrderKind, OrderRequest, OrderSide};

/// Builds the entry order for `intent` against `instrument`.
///
/// `last_price` is only consulted when the intent carries no entry price.
///
/// # Errors
/// `PlacementRejected` when a limit order is required but no reference
/// price exists to compute one from.
pub fn plan_entry(
    intent: &ParsedIntent,
    instrument: &Instrument,
    last_price: Option<Decimal>,
    cfg: &ExecutorConfig,
) -> PipelineResult<OrderRequest> {
    let side = match intent.action() {
        TradeAction::Buy => OrderSide::Buy,
        TradeAction::Sell => OrderSide::Sell,
    };
    let quantity = intent.lots() * instrument.lot_size;

    let kind = if market_eligible(instrument) {
        OrderKind::Market
    } else {
        let reference = intent
            .entry_price()
            .or(last_price)
            .ok_or_else(|| {
                PipelineError::PlacementRejected(format!(
                    "no reference price to build a limit order for {}",
                    instrument.instrument_id
                ))
            })?;
        OrderKind::Limit {
            price: limit_price(reference, side, instrument.tick_size, cfg),
        }
    };

    Ok(OrderRequest {
        instrument_id: instrument.instrument_id.clone(),
        exchange: instrument.exchange,
        side,
        quantity,
        kind,
    })
}

/// Market orders are allowed only for broad index derivatives off the
/// commodities exchange; MCX disallows them outright.
fn market_eligible(instrument: &Instrument) -> bool {
    instrument.exchange != Exchange::Mcx && is_index(&instrument.symbol)
}

/// Reference price nudged toward the fill by a bounded offset, then
/// rounded to the instrument's tick.
fn limit_price(reference: Decimal, side: OrderSide, tick: Decimal, cfg: &ExecutorConfig) -> Decimal {
    let offset = (reference * cfg.limit_offset_pct).min(cfg.max_limit_offset);
    let raw = match side {
        OrderSide::Buy => reference + offset,
        OrderSide::Sell => reference - offset,
    };
    round_to_tick(raw, tick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use signal_trade_core::types::{
        FutureIntent, InstrumentClass, OptionClass, OptionIntent,
    };

    fn cfg() -> ExecutorConfig {
        ExecutorConfig {
            poll_interval_secs: 10,
            limit_offset_pct: dec!(0.005),
            max_limit_offset: dec!(5),
            max_retries: 3,
            retry_backoff_ms: 2000,
        }
    }

    fn nifty_option_instrument() -> Instrument {
        Instrument {
            instrument_id: "NIFTY26SEP24500CE".to_string(),
            exchange: Exchange::Nfo,
            symbol: "NIFTY".to_string(),
            class: InstrumentClass::Option,
            strike: Some(24500),
            option_class: Some(OptionClass::Call),
            expiry: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            tick_size: dec!(0.05),
            lot_size: 75,
        }
    }

    fn crude_future_instrument() -> Instrument {
        Instrument {
            instrument_id: "CRUDEOIL26SEPFUT".to_string(),
            exchange: Exchange::Mcx,
            symbol: "CRUDEOIL".to_string(),
            class: InstrumentClass::Future,
            strike: None,
            option_class: None,
            expiry: NaiveDate::from_ymd_opt(2026, 9, 24).unwrap(),
            tick_size: dec!(1),
            lot_size: 100,
        }
    }

    fn option_intent(entry: Option<Decimal>) -> ParsedIntent {
        ParsedIntent::Option(OptionIntent {
            symbol: "NIFTY".to_string(),
            strike: 24500,
            option_class: OptionClass::Call,
            action: TradeAction::Buy,
            entry_price: entry,
            stop_price: Some(dec!(95)),
            targets: vec![],
            expiry_hint: None,
            lots: 2,
        })
    }

    fn crude_intent() -> ParsedIntent {
        ParsedIntent::Future(FutureIntent {
            symbol: "CRUDEOIL".to_string(),
            action: TradeAction::Sell,
            contract_month: Some(9),
            entry_price: Some(dec!(5800)),
            stop_price: Some(dec!(5850)),
            targets: vec![],
            lots: 1,
        })
    }

    #[test]
    fn index_option_gets_a_market_order() {
        let req = plan_entry(
            &option_intent(Some(dec!(105))),
            &nifty_option_instrument(),
            None,
            &cfg(),
        )
        .unwrap();
        assert_eq!(req.kind, OrderKind::Market);
        assert_eq!(req.quantity, 150);
        assert_eq!(req.side, OrderSide::Buy);
    }

    #[test]
    fn mcx_always_gets_a_limit_order() {
        let req = plan_entry(&crude_intent(), &crude_future_instrument(), None, &cfg()).unwrap();
        match req.kind {
            // 5800 * 0.005 = 29, capped at 5; sell subtracts.
            OrderKind::Limit { price } => assert_eq!(price, dec!(5795)),
            other => panic!("expected limit order, got {other:?}"),
        }
    }

    #[test]
    fn limit_price_is_tick_aligned() {
        let mut instrument = crude_future_instrument();
        instrument.tick_size = dec!(0.10);
        let mut intent = crude_intent();
        if let ParsedIntent::Future(f) = &mut intent {
            f.entry_price = Some(dec!(123.47));
        }
        let req = plan_entry(&intent, &instrument, None, &cfg()).unwrap();
        match req.kind {
            OrderKind::Limit { price } => {
                assert!((price % dec!(0.10)).is_zero(), "misaligned {price}");
            }
            other => panic!("expected limit order, got {other:?}"),
        }
    }

    #[test]
    fn missing_entry_falls_back_to_last_price() {
        let mut intent = crude_intent();
        if let ParsedIntent::Future(f) = &mut intent {
            f.entry_price = None;
        }
        let req = plan_entry(
            &intent,
            &crude_future_instrument(),
            Some(dec!(5900)),
            &cfg(),
        )
        .unwrap();
        match req.kind {
            OrderKind::Limit { price } => assert_eq!(price, dec!(5895)),
            other => panic!("expected limit order, got {other:?}"),
        }
    }

    #[test]
    fn no_reference_price_rejects() {
        let mut intent = crude_intent();
        if let ParsedIntent::Future(f) = &mut intent {
            f.entry_price = None;
        }
        let err = plan_entry(&intent, &crude_future_instrument(), None, &cfg()).unwrap_err();
        assert!(matches!(err, PipelineError::PlacementRejected(_)));
    }

    #[test]
    fn small_premium_uses_percentage_offset() {
        let instrument = Instrument {
            symbol: "RELIANCE".to_string(),
            instrument_id: "RELIANCE26SEP1500CE".to_string(),
            ..nifty_option_instrument()
        };
        let req = plan_entry(&option_intent(Some(dec!(100))), &instrument, None, &cfg()).unwrap();
        match req.kind {
            // 100 * 0.005 = 0.5, under the 5-point cap; buy adds.
            OrderKind::Limit { price } => assert_eq!(price, dec!(100.5)),
            other => panic!("expected limit order, got {other:?}"),
        }
    }
}
