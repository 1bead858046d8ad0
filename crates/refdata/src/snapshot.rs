//! In-memory instrument reference snapshot.
//!
//! Loaded from a CSV dump of the broker's instrument file. Read-only to the
//! rest of the system; refresh is the publisher's job.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use signal_trade_core::{Exchange, InstrumentClass, OptionClass};

/// One row of the reference snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceRow {
    pub instrument_id: String,
    pub exchange: Exchange,
    pub symbol: String,
    pub class: InstrumentClass,
    pub strike: Option<u32>,
    pub option_class: Option<OptionClass>,
    pub expiry: NaiveDate,
    pub tick_size: Decimal,
    pub lot_size: u32,
}

/// The full reference snapshot.
#[derive(Debug, Clone)]
pub struct ReferenceSnapshot {
    rows: Vec<ReferenceRow>,
    pub loaded_at: DateTime<Utc>,
}

impl ReferenceSnapshot {
    pub fn from_rows(rows: Vec<ReferenceRow>) -> Self {
        Self {
            rows,
            loaded_at: Utc::now(),
        }
    }

    /// Empty snapshot; everything resolves through the calendar fallback.
    pub fn empty() -> Self {
        Self::from_rows(Vec::new())
    }

    /// Loads the snapshot from a CSV file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a row fails to parse.
    pub fn load_csv(path: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open reference snapshot {path}"))?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let row: ReferenceRow = record.context("malformed reference snapshot row")?;
            rows.push(row);
        }
        Ok(Self::from_rows(rows))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks up a row by its tradable identifier.
    pub fn by_instrument_id(&self, instrument_id: &str) -> Option<&ReferenceRow> {
        self.rows.iter().find(|r| r.instrument_id == instrument_id)
    }

    /// Unexpired option rows for (symbol, option_class) as of `today`.
    pub fn options_for<'a>(
        &'a self,
        symbol: &'a str,
        option_class: OptionClass,
        today: NaiveDate,
    ) -> impl Iterator<Item = &'a ReferenceRow> {
        self.rows.iter().filter(move |r| {
            r.class == InstrumentClass::Option
                && r.symbol == symbol
                && r.option_class == Some(option_class)
                && r.expiry >= today
        })
    }

    /// Unexpired future rows for `symbol` as of `today`.
    pub fn futures_for<'a>(
        &'a self,
        symbol: &'a str,
        today: NaiveDate,
    ) -> impl Iterator<Item = &'a ReferenceRow> {
        self.rows.iter().filter(move |r| {
            r.class == InstrumentClass::Future && r.symbol == symbol && r.expiry >= today
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn option_row(
        symbol: &str,
        strike: u32,
        oc: OptionClass,
        expiry: NaiveDate,
    ) -> ReferenceRow {
        ReferenceRow {
            instrument_id: format!("{symbol}-{strike}-{oc}-{expiry}"),
            exchange: Exchange::Nfo,
            symbol: symbol.to_string(),
            class: InstrumentClass::Option,
            strike: Some(strike),
            option_class: Some(oc),
            expiry,
            tick_size: Decimal::new(5, 2),
            lot_size: 75,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn options_filter_excludes_expired_and_wrong_class() {
        let snap = ReferenceSnapshot::from_rows(vec![
            option_row("NIFTY", 24500, OptionClass::Call, d(2026, 9, 1)),
            option_row("NIFTY", 24500, OptionClass::Put, d(2026, 9, 1)),
            option_row("NIFTY", 24500, OptionClass::Call, d(2026, 8, 4)),
        ]);
        let hits: Vec<_> = snap
            .options_for("NIFTY", OptionClass::Call, d(2026, 8, 26))
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].expiry, d(2026, 9, 1));
    }

    #[test]
    fn csv_round_trip() {
        let csv_text = "instrument_id,exchange,symbol,class,strike,option_class,expiry,tick_size,lot_size\n\
            NIFTY25SEP24500CE,NFO,NIFTY,OPTION,24500,CALL,2026-09-01,0.05,75\n\
            CRUDEOIL25SEPFUT,MCX,CRUDEOIL,FUTURE,,,2026-09-24,1,100\n";
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let rows: Vec<ReferenceRow> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].strike, Some(24500));
        assert_eq!(rows[1].strike, None);
        assert_eq!(rows[1].exchange, Exchange::Mcx);
    }
}
