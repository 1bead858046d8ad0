//! Tier-1 field extraction.
//!
//! Ordered regex lists per field, applied to the uppercased message. The
//! first pattern that matches wins, so more specific patterns come first.
//! Anything the patterns cannot pull out is left `None` for the optional
//! tier-2 extractor to fill in.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use signal_trade_core::types::{InstrumentClass, OptionClass, TradeAction};
use signal_trade_refdata::lots::is_commodity;

/// Fields pulled out of a message. All optional; completeness is judged
/// per instrument class by [`ExtractedFields::has_min_fields`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub action: Option<TradeAction>,
    pub symbol: Option<String>,
    pub strike: Option<u32>,
    pub option_class: Option<OptionClass>,
    /// Contract month (1-12) when the message names one, e.g. "SEP FUT".
    pub contract_month: Option<u32>,
    pub entry_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub targets: Vec<Decimal>,
    pub lots: Option<u32>,
}

impl ExtractedFields {
    /// Futures only when a contract month is named on a commodity symbol
    /// and nothing option-shaped appears. Everything else is an option.
    pub fn classify(&self) -> InstrumentClass {
        let commodity = self
            .symbol
            .as_deref()
            .map(is_commodity)
            .unwrap_or(false);
        if self.contract_month.is_some()
            && commodity
            && self.option_class.is_none()
            && self.strike.is_none()
        {
            InstrumentClass::Future
        } else {
            InstrumentClass::Option
        }
    }

    /// Minimum field set that makes a message worth validating.
    pub fn has_min_fields(&self, class: InstrumentClass) -> bool {
        match class {
            InstrumentClass::Option => {
                self.symbol.is_some() && self.strike.is_some() && self.option_class.is_some()
            }
            InstrumentClass::Future => self.symbol.is_some() && self.action.is_some(),
        }
    }

    /// Fills gaps from a second extraction pass. Fields already present
    /// keep their tier-1 value.
    pub fn merge_missing(&mut self, other: ExtractedFields) {
        if self.action.is_none() {
            self.action = other.action;
        }
        if self.symbol.is_none() {
            self.symbol = other.symbol;
        }
        if self.strike.is_none() {
            self.strike = other.strike;
        }
        if self.option_class.is_none() {
            self.option_class = other.option_class;
        }
        if self.contract_month.is_none() {
            self.contract_month = other.contract_month;
        }
        if self.entry_price.is_none() {
            self.entry_price = other.entry_price;
        }
        if self.stop_price.is_none() {
            self.stop_price = other.stop_price;
        }
        if self.targets.is_empty() {
            self.targets = other.targets;
        }
        if self.lots.is_none() {
            self.lots = other.lots;
        }
    }
}

/// Compiled pattern set. Build once, reuse across messages.
pub struct FieldPatterns {
    buy: Regex,
    sell: Regex,
    symbol: Regex,
    strike_class: Regex,
    class_alone: Regex,
    month: Regex,
    entry: Vec<Regex>,
    stop: Regex,
    targets: Regex,
    number_list: Regex,
    lots: Regex,
}

impl Default for FieldPatterns {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldPatterns {
    pub fn new() -> Self {
        let re = |p: &str| Regex::new(p).expect("static field pattern");
        Self {
            buy: re(r"\b(?:BUY(?:ING)?|BOUGHT|LONG)\b"),
            sell: re(r"\b(?:SELL(?:ING)?|SOLD|SHORT)\b"),
            // Longer names first so BANKNIFTY does not match as NIFTY.
            symbol: re(
                r"\b(BANKNIFTY|FINNIFTY|MIDCPNIFTY|NIFTY|SENSEX|BANKEX|CRUDEOIL|CRUDE\s*OIL|NATURALGAS|NATURAL\s*GAS|GOLD|SILVER|COPPER|ZINC|ALUMINIUM|LEAD)\b",
            ),
            strike_class: re(r"\b(\d{3,6})\s*(CE|PE|CALL|PUT)\b"),
            class_alone: re(r"\b(CE|PE|CALL|PUT)\b"),
            month: re(r"\b(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)[A-Z]*\.?\s+(?:FUT(?:URES?)?|EXPIRY|CONTRACT)\b"),
            entry: vec![
                re(r"(?:ENTRY|BUY\s+ABOVE|ABOVE|ENTER)\s*[:\-]?\s*(\d+(?:\.\d+)?)"),
                re(r"(?:@|\bAT\b|\bCMP\b)\s*[:\-]?\s*(\d+(?:\.\d+)?)"),
            ],
            stop: re(r"(?:SL|S\.L\.?|STOP\s*LOSS|STOPLOSS)\s*[:\-]?\s*(\d+(?:\.\d+)?)"),
            targets: re(r"(?:TARGETS?|TGTS?)\s*[:\-]?\s*((?:\d+(?:\.\d+)?[\s,/\-]*)+)"),
            number_list: re(r"\d+(?:\.\d+)?"),
            lots: re(r"(\d+)\s*LOTS?\b"),
        }
    }

    /// Runs every field pattern over the message. Each numeric field is
    /// masked out of the working text once claimed so the looser patterns
    /// further down (targets, then entry) cannot swallow it.
    pub fn extract(&self, text: &str) -> ExtractedFields {
        let mut masked = text.to_uppercase();
        let mut fields = ExtractedFields::default();

        // SELL checked first: "SELL ... buy back above X" style messages
        // lead with the real action.
        if self.sell.is_match(&masked) {
            fields.action = Some(TradeAction::Sell);
        } else if self.buy.is_match(&masked) {
            fields.action = Some(TradeAction::Buy);
        }

        if let Some(cap) = self.symbol.captures(&masked) {
            fields.symbol = Some(normalize_symbol(&cap[1]));
        }

        if let Some(cap) = self.month.captures(&masked) {
            fields.contract_month = month_number(&cap[1]);
        }

        if let Some(cap) = self.strike_class.captures(&masked) {
            fields.strike = cap[1].parse::<u32>().ok();
            fields.option_class = OptionClass::from_str(&cap[2]).ok();
            let range = cap.get(0).map_or(0..0, |m| m.range());
            mask(&mut masked, range);
        } else if let Some(cap) = self.class_alone.captures(&masked) {
            fields.option_class = OptionClass::from_str(&cap[1]).ok();
        }

        if let Some(cap) = self.lots.captures(&masked) {
            fields.lots = cap[1].parse::<u32>().ok();
            let range = cap.get(0).map_or(0..0, |m| m.range());
            mask(&mut masked, range);
        }

        if let Some(cap) = self.stop.captures(&masked) {
            fields.stop_price = Decimal::from_str(&cap[1]).ok();
            let range = cap.get(0).map_or(0..0, |m| m.range());
            mask(&mut masked, range);
        }

        if let Some(cap) = self.targets.captures(&masked) {
            fields.targets = self
                .number_list
                .find_iter(&cap[1])
                .filter_map(|n| Decimal::from_str(n.as_str()).ok())
                .collect();
            let range = cap.get(0).map_or(0..0, |m| m.range());
            mask(&mut masked, range);
        }

        for pattern in &self.entry {
            if let Some(cap) = pattern.captures(&masked) {
                fields.entry_price = Decimal::from_str(&cap[1]).ok();
                break;
            }
        }

        fields
    }
}

fn mask(text: &mut String, range: std::ops::Range<usize>) {
    let blank = " ".repeat(range.len());
    text.replace_range(range, &blank);
}

fn normalize_symbol(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

fn month_number(code: &str) -> Option<u32> {
    let n = match code {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn extracts_full_option_alert() {
        let patterns = FieldPatterns::new();
        let fields =
            patterns.extract("BUY NIFTY 24500 CE above 105, SL 95, targets 120/135/150, 2 lots");
        assert_eq!(fields.action, Some(TradeAction::Buy));
        assert_eq!(fields.symbol.as_deref(), Some("NIFTY"));
        assert_eq!(fields.strike, Some(24500));
        assert_eq!(fields.option_class, Some(OptionClass::Call));
        assert_eq!(fields.entry_price, Some(dec!(105)));
        assert_eq!(fields.stop_price, Some(dec!(95)));
        assert_eq!(fields.targets, vec![dec!(120), dec!(135), dec!(150)]);
        assert_eq!(fields.lots, Some(2));
        assert_eq!(fields.classify(), InstrumentClass::Option);
        assert!(fields.has_min_fields(InstrumentClass::Option));
    }

    #[test]
    fn banknifty_wins_over_nifty() {
        let patterns = FieldPatterns::new();
        let fields = patterns.extract("BANKNIFTY 52000 PE buy at 310 sl 280");
        assert_eq!(fields.symbol.as_deref(), Some("BANKNIFTY"));
        assert_eq!(fields.option_class, Some(OptionClass::Put));
    }

    #[test]
    fn commodity_future_with_month_code() {
        let patterns = FieldPatterns::new();
        let fields = patterns.extract("SELL CRUDEOIL SEP FUT at 5800 SL 5850 TGT 5700");
        assert_eq!(fields.action, Some(TradeAction::Sell));
        assert_eq!(fields.symbol.as_deref(), Some("CRUDEOIL"));
        assert_eq!(fields.contract_month, Some(9));
        assert_eq!(fields.entry_price, Some(dec!(5800)));
        assert_eq!(fields.classify(), InstrumentClass::Future);
        assert!(fields.has_min_fields(InstrumentClass::Future));
    }

    #[test]
    fn base_metal_future_classifies_as_future() {
        let patterns = FieldPatterns::new();
        let fields = patterns.extract("BUY ALUMINIUM SEP FUT at 228 SL 225");
        assert_eq!(fields.symbol.as_deref(), Some("ALUMINIUM"));
        assert_eq!(fields.contract_month, Some(9));
        assert_eq!(fields.classify(), InstrumentClass::Future);
        assert!(fields.has_min_fields(InstrumentClass::Future));

        let fields = patterns.extract("sell LEAD OCT FUT below 182");
        assert_eq!(fields.classify(), InstrumentClass::Future);
    }

    #[test]
    fn crude_oil_with_space_normalizes() {
        let patterns = FieldPatterns::new();
        let fields = patterns.extract("buy CRUDE OIL OCT fut @ 5900");
        assert_eq!(fields.symbol.as_deref(), Some("CRUDEOIL"));
        assert_eq!(fields.contract_month, Some(10));
    }

    #[test]
    fn month_code_on_option_stays_an_option() {
        let patterns = FieldPatterns::new();
        let fields = patterns.extract("GOLD 72000 CE for SEP expiry, buy at 450");
        assert_eq!(fields.contract_month, Some(9));
        assert_eq!(fields.classify(), InstrumentClass::Option);
    }

    #[test]
    fn sell_takes_precedence_over_trailing_buy() {
        let patterns = FieldPatterns::new();
        let fields = patterns.extract("SELL SILVER DEC FUT, buy back above 91000");
        assert_eq!(fields.action, Some(TradeAction::Sell));
    }

    #[test]
    fn call_and_put_words_accepted() {
        let patterns = FieldPatterns::new();
        let fields = patterns.extract("SENSEX 81000 PUT entry 220 stoploss 190");
        assert_eq!(fields.option_class, Some(OptionClass::Put));
        assert_eq!(fields.entry_price, Some(dec!(220)));
        assert_eq!(fields.stop_price, Some(dec!(190)));
    }

    #[test]
    fn entry_does_not_steal_the_strike() {
        let patterns = FieldPatterns::new();
        let fields = patterns.extract("NIFTY 24500 CE @ 105");
        assert_eq!(fields.strike, Some(24500));
        assert_eq!(fields.entry_price, Some(dec!(105)));
    }

    #[test]
    fn incomplete_message_reports_missing_fields() {
        let patterns = FieldPatterns::new();
        let fields = patterns.extract("NIFTY looking strong today above 24500 levels");
        assert!(!fields.has_min_fields(InstrumentClass::Option));
    }

    #[test]
    fn merge_fills_only_gaps() {
        let mut base = ExtractedFields {
            symbol: Some("NIFTY".to_string()),
            strike: Some(24500),
            ..Default::default()
        };
        let second = ExtractedFields {
            symbol: Some("BANKNIFTY".to_string()),
            option_class: Some(OptionClass::Call),
            entry_price: Some(dec!(100)),
            ..Default::default()
        };
        base.merge_missing(second);
        assert_eq!(base.symbol.as_deref(), Some("NIFTY"));
        assert_eq!(base.option_class, Some(OptionClass::Call));
        assert_eq!(base.entry_price, Some(dec!(100)));
    }
}
