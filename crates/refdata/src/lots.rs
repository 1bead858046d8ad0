//! Lot-size and tick-size fallback tables.
//!
//! The live reference snapshot is authoritative; these values are a last
//! resort and callers log a WARN whenever one is used.

use rust_decimal::Decimal;

use signal_trade_core::Exchange;

/// Generic lot size when neither the snapshot nor the table knows better.
pub const DEFAULT_LOT_SIZE: u32 = 50;

/// Default option tick size on the equity derivative segments.
pub fn default_tick_size() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

/// Per-symbol lot-size fallback.
#[must_use]
pub fn fallback_lot_size(symbol: &str) -> Option<u32> {
    match symbol {
        "NIFTY" => Some(75),
        "BANKNIFTY" => Some(35),
        "FINNIFTY" => Some(65),
        "MIDCPNIFTY" => Some(120),
        "SENSEX" => Some(20),
        "BANKEX" => Some(30),
        "CRUDEOIL" => Some(100),
        "NATURALGAS" => Some(1250),
        "GOLD" => Some(100),
        "SILVER" => Some(30),
        "COPPER" => Some(2500),
        "ZINC" => Some(5000),
        "ALUMINIUM" => Some(5000),
        "LEAD" => Some(5000),
        _ => None,
    }
}

/// Per-symbol tick-size fallback.
#[must_use]
pub fn fallback_tick_size(symbol: &str) -> Decimal {
    match symbol {
        "CRUDEOIL" | "GOLD" | "SILVER" => Decimal::ONE,
        "NATURALGAS" => Decimal::new(10, 2), // 0.10
        _ => default_tick_size(),
    }
}

/// Exchange segment for a symbol, by membership.
#[must_use]
pub fn exchange_for_symbol(symbol: &str) -> Exchange {
    if is_commodity(symbol) {
        Exchange::Mcx
    } else if matches!(symbol, "SENSEX" | "BANKEX") {
        Exchange::Bfo
    } else {
        Exchange::Nfo
    }
}

/// True for symbols trading on the commodities exchange.
#[must_use]
pub fn is_commodity(symbol: &str) -> bool {
    matches!(
        symbol,
        "CRUDEOIL"
            | "NATURALGAS"
            | "GOLD"
            | "GOLDM"
            | "SILVER"
            | "SILVERM"
            | "COPPER"
            | "ZINC"
            | "ALUMINIUM"
            | "LEAD"
    )
}

/// True for broad index symbols with deep, liquid derivative books.
#[must_use]
pub fn is_index(symbol: &str) -> bool {
    matches!(
        symbol,
        "NIFTY" | "BANKNIFTY" | "FINNIFTY" | "MIDCPNIFTY" | "SENSEX" | "BANKEX"
    )
}
