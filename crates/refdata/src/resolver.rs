//! Instrument resolution.
//!
//! Maps a semantic instrument descriptor to a tradable identifier. Pure and
//! side-effect free apart from WARN logs when a fallback is taken.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::warn;

use signal_trade_core::{Instrument, InstrumentClass, OptionClass};

use crate::calendar;
use crate::lots;
use crate::snapshot::{ReferenceRow, ReferenceSnapshot};

/// What the caller knows about the instrument it wants.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub symbol: String,
    pub class: InstrumentClass,
    pub strike: Option<u32>,
    pub option_class: Option<OptionClass>,
    /// Contract month 1-12 from a futures month code.
    pub contract_month: Option<u32>,
    pub expiry_hint: Option<NaiveDate>,
}

impl ResolveRequest {
    pub fn option(symbol: impl Into<String>, strike: u32, option_class: OptionClass) -> Self {
        Self {
            symbol: symbol.into(),
            class: InstrumentClass::Option,
            strike: Some(strike),
            option_class: Some(option_class),
            contract_month: None,
            expiry_hint: None,
        }
    }

    pub fn future(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            class: InstrumentClass::Future,
            strike: None,
            option_class: None,
            contract_month: None,
            expiry_hint: None,
        }
    }

    #[must_use]
    pub fn with_expiry_hint(mut self, hint: Option<NaiveDate>) -> Self {
        self.expiry_hint = hint;
        self
    }

    #[must_use]
    pub fn with_contract_month(mut self, month: Option<u32>) -> Self {
        self.contract_month = month;
        self
    }
}

/// Resolution failure.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no instrument found for {symbol}")]
    NotFound { symbol: String },
}

/// A resolved instrument plus how it was arrived at.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub instrument: Instrument,
    /// True when the exact strike was absent and the nearest one was used.
    pub approximated_strike: bool,
    /// True when no reference row existed and the identifier was synthesized.
    pub synthesized: bool,
}

/// Resolves a descriptor against the snapshot, falling back to the nearest
/// strike and finally to a calendar-synthesized identifier.
pub fn resolve(
    snapshot: &ReferenceSnapshot,
    req: &ResolveRequest,
    today: NaiveDate,
) -> Result<Resolution, ResolveError> {
    match req.class {
        InstrumentClass::Option => resolve_option(snapshot, req, today),
        InstrumentClass::Future => resolve_future(snapshot, req, today),
    }
}

fn resolve_option(
    snapshot: &ReferenceSnapshot,
    req: &ResolveRequest,
    today: NaiveDate,
) -> Result<Resolution, ResolveError> {
    let (Some(strike), Some(option_class)) = (req.strike, req.option_class) else {
        return Err(ResolveError::NotFound {
            symbol: req.symbol.clone(),
        });
    };

    let hint_matches = |row: &&ReferenceRow| match req.expiry_hint {
        Some(hint) => row.expiry == hint,
        None => true,
    };

    // Primary: exact (symbol, strike, option_class). Ambiguity across
    // expiries resolves to the earliest remaining one.
    let exact = snapshot
        .options_for(&req.symbol, option_class, today)
        .filter(|r| r.strike == Some(strike))
        .filter(hint_matches)
        .min_by_key(|r| r.expiry);
    if let Some(row) = exact {
        return Ok(Resolution {
            instrument: instrument_from_row(row),
            approximated_strike: false,
            synthesized: false,
        });
    }

    // Fallback 1: nearest strike in the same (symbol, option_class).
    let nearest = snapshot
        .options_for(&req.symbol, option_class, today)
        .filter(hint_matches)
        .filter(|r| r.strike.is_some())
        .min_by_key(|r| {
            let s = r.strike.unwrap_or(0);
            (s.abs_diff(strike), r.expiry)
        });
    if let Some(row) = nearest {
        warn!(
            symbol = req.symbol,
            wanted = strike,
            matched = ?row.strike,
            instrument_id = row.instrument_id,
            "Exact strike absent, using nearest strike"
        );
        return Ok(Resolution {
            instrument: instrument_from_row(row),
            approximated_strike: true,
            synthesized: false,
        });
    }

    // Fallback 2: no reference row at all. Synthesize via the calendar rule.
    let expiry = req
        .expiry_hint
        .unwrap_or_else(|| calendar::next_expiry(&req.symbol, today));
    let instrument_id = format!(
        "{}{}{}{}",
        req.symbol,
        expiry_code(expiry),
        strike,
        option_class
    );
    warn!(
        symbol = req.symbol,
        instrument_id,
        %expiry,
        "No reference row, synthesized instrument via calendar rule"
    );
    Ok(Resolution {
        instrument: synthesized_instrument(
            instrument_id,
            req,
            Some(strike),
            Some(option_class),
            expiry,
        ),
        approximated_strike: false,
        synthesized: true,
    })
}

fn resolve_future(
    snapshot: &ReferenceSnapshot,
    req: &ResolveRequest,
    today: NaiveDate,
) -> Result<Resolution, ResolveError> {
    let month_matches = |row: &&ReferenceRow| match req.contract_month {
        Some(m) => row.expiry.month() == m,
        None => true,
    };

    let exact = snapshot
        .futures_for(&req.symbol, today)
        .filter(month_matches)
        .min_by_key(|r| r.expiry);
    if let Some(row) = exact {
        return Ok(Resolution {
            instrument: instrument_from_row(row),
            approximated_strike: false,
            synthesized: false,
        });
    }

    let expiry = match req.contract_month {
        Some(month) => {
            let year = if month < today.month() {
                today.year() + 1
            } else {
                today.year()
            };
            calendar::monthly_expiry(&req.symbol, year, month)
        }
        None => calendar::next_expiry(&req.symbol, today),
    };
    let instrument_id = format!("{}{}FUT", req.symbol, expiry_code(expiry));
    warn!(
        symbol = req.symbol,
        instrument_id,
        %expiry,
        "No reference row, synthesized futures contract via calendar rule"
    );
    Ok(Resolution {
        instrument: synthesized_instrument(instrument_id, req, None, None, expiry),
        approximated_strike: false,
        synthesized: true,
    })
}

fn instrument_from_row(row: &ReferenceRow) -> Instrument {
    Instrument {
        instrument_id: row.instrument_id.clone(),
        exchange: row.exchange,
        symbol: row.symbol.clone(),
        class: row.class,
        strike: row.strike,
        option_class: row.option_class,
        expiry: row.expiry,
        tick_size: row.tick_size,
        lot_size: row.lot_size,
    }
}

fn synthesized_instrument(
    instrument_id: String,
    req: &ResolveRequest,
    strike: Option<u32>,
    option_class: Option<OptionClass>,
    expiry: NaiveDate,
) -> Instrument {
    // Lot size resolution order: snapshot (absent here) -> symbol table -> default.
    let lot_size = lots::fallback_lot_size(&req.symbol).unwrap_or_else(|| {
        warn!(
            symbol = req.symbol,
            default = lots::DEFAULT_LOT_SIZE,
            "No lot-size fallback for symbol, using generic default"
        );
        lots::DEFAULT_LOT_SIZE
    });
    Instrument {
        instrument_id,
        exchange: lots::exchange_for_symbol(&req.symbol),
        symbol: req.symbol.clone(),
        class: req.class,
        strike,
        option_class,
        expiry,
        tick_size: lots::fallback_tick_size(&req.symbol),
        lot_size,
    }
}

/// `25SEP`-style year + month code used in synthesized identifiers.
fn expiry_code(expiry: NaiveDate) -> String {
    const MONTHS: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];
    format!(
        "{:02}{}",
        expiry.year() % 100,
        MONTHS[expiry.month0() as usize]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ReferenceRow;
    use rust_decimal_macros::dec;
    use signal_trade_core::Exchange;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(symbol: &str, strike: u32, oc: OptionClass, expiry: NaiveDate) -> ReferenceRow {
        ReferenceRow {
            instrument_id: format!("{symbol}X{strike}{oc}"),
            exchange: Exchange::Nfo,
            symbol: symbol.to_string(),
            class: InstrumentClass::Option,
            strike: Some(strike),
            option_class: Some(oc),
            expiry,
            tick_size: dec!(0.05),
            lot_size: 75,
        }
    }

    fn future_row(symbol: &str, expiry: NaiveDate) -> ReferenceRow {
        ReferenceRow {
            instrument_id: format!("{symbol}FUTX{expiry}"),
            exchange: Exchange::Mcx,
            symbol: symbol.to_string(),
            class: InstrumentClass::Future,
            strike: None,
            option_class: None,
            expiry,
            tick_size: dec!(1),
            lot_size: 100,
        }
    }

    const TODAY: fn() -> NaiveDate = || d(2026, 8, 26);

    #[test]
    fn exact_match_wins() {
        let snap = ReferenceSnapshot::from_rows(vec![
            row("NIFTY", 24500, OptionClass::Call, d(2026, 9, 1)),
            row("NIFTY", 24600, OptionClass::Call, d(2026, 9, 1)),
        ]);
        let req = ResolveRequest::option("NIFTY", 24500, OptionClass::Call);
        let res = resolve(&snap, &req, TODAY()).unwrap();
        assert_eq!(res.instrument.instrument_id, "NIFTYX24500CE");
        assert!(!res.approximated_strike);
        assert!(!res.synthesized);
    }

    #[test]
    fn ambiguous_expiries_pick_earliest() {
        let snap = ReferenceSnapshot::from_rows(vec![
            row("NIFTY", 24500, OptionClass::Call, d(2026, 9, 8)),
            row("NIFTY", 24500, OptionClass::Call, d(2026, 9, 1)),
        ]);
        let req = ResolveRequest::option("NIFTY", 24500, OptionClass::Call);
        let res = resolve(&snap, &req, TODAY()).unwrap();
        assert_eq!(res.instrument.expiry, d(2026, 9, 1));
    }

    #[test]
    fn expiry_hint_filters_candidates() {
        let snap = ReferenceSnapshot::from_rows(vec![
            row("NIFTY", 24500, OptionClass::Call, d(2026, 9, 1)),
            row("NIFTY", 24500, OptionClass::Call, d(2026, 9, 8)),
        ]);
        let req = ResolveRequest::option("NIFTY", 24500, OptionClass::Call)
            .with_expiry_hint(Some(d(2026, 9, 8)));
        let res = resolve(&snap, &req, TODAY()).unwrap();
        assert_eq!(res.instrument.expiry, d(2026, 9, 8));
    }

    #[test]
    fn nearest_strike_fallback_is_flagged() {
        let snap = ReferenceSnapshot::from_rows(vec![
            row("NIFTY", 24400, OptionClass::Call, d(2026, 9, 1)),
            row("NIFTY", 24700, OptionClass::Call, d(2026, 9, 1)),
        ]);
        let req = ResolveRequest::option("NIFTY", 24500, OptionClass::Call);
        let res = resolve(&snap, &req, TODAY()).unwrap();
        assert_eq!(res.instrument.strike, Some(24400));
        assert!(res.approximated_strike);
    }

    #[test]
    fn put_rows_never_match_call_requests() {
        let snap = ReferenceSnapshot::from_rows(vec![row(
            "NIFTY",
            24500,
            OptionClass::Put,
            d(2026, 9, 1),
        )]);
        let req = ResolveRequest::option("NIFTY", 24500, OptionClass::Call);
        let res = resolve(&snap, &req, TODAY()).unwrap();
        // No call rows at all, so the identifier is synthesized.
        assert!(res.synthesized);
    }

    #[test]
    fn empty_snapshot_synthesizes_from_calendar() {
        let snap = ReferenceSnapshot::empty();
        let req = ResolveRequest::option("NIFTY", 24500, OptionClass::Call);
        let res = resolve(&snap, &req, TODAY()).unwrap();
        // Next NIFTY Tuesday after Wed 2026-08-26 is 2026-09-01.
        assert_eq!(res.instrument.instrument_id, "NIFTY26SEP24500CE");
        assert_eq!(res.instrument.expiry, d(2026, 9, 1));
        assert_eq!(res.instrument.lot_size, 75);
        assert_eq!(res.instrument.exchange, Exchange::Nfo);
        assert!(res.synthesized);
    }

    #[test]
    fn option_without_strike_is_not_found() {
        let snap = ReferenceSnapshot::empty();
        let req = ResolveRequest {
            symbol: "NIFTY".to_string(),
            class: InstrumentClass::Option,
            strike: None,
            option_class: Some(OptionClass::Call),
            contract_month: None,
            expiry_hint: None,
        };
        assert!(resolve(&snap, &req, TODAY()).is_err());
    }

    #[test]
    fn future_exact_match_by_contract_month() {
        let snap = ReferenceSnapshot::from_rows(vec![
            future_row("CRUDEOIL", d(2026, 9, 24)),
            future_row("CRUDEOIL", d(2026, 10, 29)),
        ]);
        let req = ResolveRequest::future("CRUDEOIL").with_contract_month(Some(10));
        let res = resolve(&snap, &req, TODAY()).unwrap();
        assert_eq!(res.instrument.expiry, d(2026, 10, 29));
    }

    #[test]
    fn future_synthesis_rolls_past_months_to_next_year() {
        let snap = ReferenceSnapshot::empty();
        let req = ResolveRequest::future("CRUDEOIL").with_contract_month(Some(2));
        let res = resolve(&snap, &req, TODAY()).unwrap();
        assert_eq!(res.instrument.expiry.year(), 2027);
        assert_eq!(res.instrument.expiry.month(), 2);
        assert_eq!(res.instrument.exchange, Exchange::Mcx);
        assert!(res.instrument.instrument_id.ends_with("FUT"));
    }

    #[test]
    fn unknown_symbol_gets_generic_lot_default() {
        let snap = ReferenceSnapshot::empty();
        let req = ResolveRequest::option("OBSCURECO", 500, OptionClass::Put);
        let res = resolve(&snap, &req, TODAY()).unwrap();
        assert_eq!(res.instrument.lot_size, lots::DEFAULT_LOT_SIZE);
    }
}
