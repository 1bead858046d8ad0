//! Per-symbol expiry calendar rules.
//!
//! Used only when the reference snapshot has no row for an instrument. Each
//! symbol has one designated expiry weekday, on a weekly or monthly cadence.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Expiry cadence for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCadence {
    /// Expires every week on the designated weekday.
    Weekly,
    /// Expires on the last designated weekday of the month.
    Monthly,
}

/// The calendar rule for one symbol.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryRule {
    pub weekday: Weekday,
    pub cadence: ExpiryCadence,
}

/// Calendar rule for a symbol. Index weeklies and everything-else monthlies.
#[must_use]
pub fn expiry_rule(symbol: &str) -> ExpiryRule {
    match symbol {
        "NIFTY" => ExpiryRule {
            weekday: Weekday::Tue,
            cadence: ExpiryCadence::Weekly,
        },
        "SENSEX" => ExpiryRule {
            weekday: Weekday::Thu,
            cadence: ExpiryCadence::Weekly,
        },
        "BANKNIFTY" | "FINNIFTY" | "MIDCPNIFTY" | "BANKEX" => ExpiryRule {
            weekday: Weekday::Tue,
            cadence: ExpiryCadence::Monthly,
        },
        _ => ExpiryRule {
            weekday: Weekday::Thu,
            cadence: ExpiryCadence::Monthly,
        },
    }
}

/// Next expiry for `symbol` on or after `today` per its calendar rule.
#[must_use]
pub fn next_expiry(symbol: &str, today: NaiveDate) -> NaiveDate {
    let rule = expiry_rule(symbol);
    match rule.cadence {
        ExpiryCadence::Weekly => next_weekday_on_or_after(today, rule.weekday),
        ExpiryCadence::Monthly => {
            let this_month = last_weekday_of_month(today.year(), today.month(), rule.weekday);
            if this_month >= today {
                this_month
            } else {
                let (y, m) = next_month(today.year(), today.month());
                last_weekday_of_month(y, m, rule.weekday)
            }
        }
    }
}

/// Monthly expiry for an explicit contract month (futures month codes).
#[must_use]
pub fn monthly_expiry(symbol: &str, year: i32, month: u32) -> NaiveDate {
    last_weekday_of_month(year, month, expiry_rule(symbol).weekday)
}

fn next_weekday_on_or_after(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let offset = (7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from + Days::new(u64::from(offset))
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    let (ny, nm) = next_month(year, month);
    let last_day = NaiveDate::from_ymd_opt(ny, nm, 1)
        .expect("valid first of month")
        .pred_opt()
        .expect("month has a last day");
    let offset =
        (7 + last_day.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    last_day - Days::new(u64::from(offset))
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekly_rule_picks_next_designated_weekday() {
        // 2026-08-26 is a Wednesday; next NIFTY Tuesday is 2026-09-01.
        assert_eq!(next_expiry("NIFTY", d(2026, 8, 26)), d(2026, 9, 1));
        // On the expiry day itself, that day is used.
        assert_eq!(next_expiry("NIFTY", d(2026, 9, 1)), d(2026, 9, 1));
    }

    #[test]
    fn monthly_rule_uses_last_weekday_of_month() {
        // Last Tuesday of August 2026 is the 25th.
        assert_eq!(next_expiry("BANKNIFTY", d(2026, 8, 10)), d(2026, 8, 25));
        // Past the last Tuesday, rolls to September's (the 29th).
        assert_eq!(next_expiry("BANKNIFTY", d(2026, 8, 26)), d(2026, 9, 29));
    }

    #[test]
    fn monthly_rollover_crosses_year_boundary() {
        // Last Thursday of December 2026 is the 31st.
        assert_eq!(next_expiry("CRUDEOIL", d(2026, 12, 31)), d(2026, 12, 31));
        assert_eq!(monthly_expiry("CRUDEOIL", 2027, 1), d(2027, 1, 28));
    }

    #[test]
    fn explicit_contract_month_expiry() {
        // Last Thursday of September 2026 is the 24th.
        assert_eq!(monthly_expiry("NATURALGAS", 2026, 9), d(2026, 9, 24));
    }
}
