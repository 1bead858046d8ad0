//! Shared domain types for the signal-to-position pipeline.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a trade instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Class of tradable instrument an alert refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstrumentClass {
    Option,
    Future,
}

/// Option contract class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionClass {
    Call,
    Put,
}

impl std::fmt::Display for OptionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CE"),
            Self::Put => write!(f, "PE"),
        }
    }
}

impl std::str::FromStr for OptionClass {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CE" | "CALL" | "C" => Ok(Self::Call),
            "PE" | "PUT" | "P" => Ok(Self::Put),
            _ => Err(()),
        }
    }
}

/// Exchange segment an instrument trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    /// NSE derivatives segment (index and stock options/futures).
    Nfo,
    /// BSE derivatives segment.
    Bfo,
    /// Commodities exchange. Market orders are disallowed here.
    Mcx,
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nfo => write!(f, "NFO"),
            Self::Bfo => write!(f, "BFO"),
            Self::Mcx => write!(f, "MCX"),
        }
    }
}

impl std::str::FromStr for Exchange {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NFO" => Ok(Self::Nfo),
            "BFO" => Ok(Self::Bfo),
            "MCX" => Ok(Self::Mcx),
            _ => Err(()),
        }
    }
}

/// A fully validated option trade instruction.
///
/// Only constructed after final validation passes; every required field is
/// guaranteed present and type-valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionIntent {
    pub symbol: String,
    pub strike: u32,
    pub option_class: OptionClass,
    pub action: TradeAction,
    pub entry_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub targets: Vec<Decimal>,
    pub expiry_hint: Option<NaiveDate>,
    /// Number of lots to trade.
    pub lots: u32,
}

/// A fully validated futures trade instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FutureIntent {
    pub symbol: String,
    pub action: TradeAction,
    /// Contract month (1-12) extracted from the month code, if present.
    pub contract_month: Option<u32>,
    pub entry_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub targets: Vec<Decimal>,
    pub lots: u32,
}

/// A validated trade intent, holding only the fields valid for its variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "UPPERCASE")]
pub enum ParsedIntent {
    Option(OptionIntent),
    Future(FutureIntent),
}

impl ParsedIntent {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Option(o) => &o.symbol,
            Self::Future(f) => &f.symbol,
        }
    }

    pub fn action(&self) -> TradeAction {
        match self {
            Self::Option(o) => o.action,
            Self::Future(f) => f.action,
        }
    }

    pub fn entry_price(&self) -> Option<Decimal> {
        match self {
            Self::Option(o) => o.entry_price,
            Self::Future(f) => f.entry_price,
        }
    }

    pub fn stop_price(&self) -> Option<Decimal> {
        match self {
            Self::Option(o) => o.stop_price,
            Self::Future(f) => f.stop_price,
        }
    }

    pub fn lots(&self) -> u32 {
        match self {
            Self::Option(o) => o.lots,
            Self::Future(f) => f.lots,
        }
    }

    pub fn class(&self) -> InstrumentClass {
        match self {
            Self::Option(_) => InstrumentClass::Option,
            Self::Future(_) => InstrumentClass::Future,
        }
    }

    pub fn option_class(&self) -> Option<OptionClass> {
        match self {
            Self::Option(o) => Some(o.option_class),
            Self::Future(_) => None,
        }
    }
}

/// A resolved tradable instrument from the reference snapshot (or
/// synthesized via the calendar rule).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    /// Broker-tradable identifier, e.g. `NIFTY25SEP24500CE`.
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
