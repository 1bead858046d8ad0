//! Wire types for the broker execution seam.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use signal_trade_core::Exchange;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// How the order executes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Limit { price: Decimal },
    /// Stop-loss market order released at the trigger price.
    StopMarket { trigger: Decimal },
}

impl OrderKind {
    /// The price or trigger carried by the order, if any.
    #[must_use]
    pub fn price(&self) -> Option<Decimal> {
        match self {
            Self::Market => None,
            Self::Limit { price } => Some(*price),
            Self::StopMarket { trigger } => Some(*trigger),
        }
    }
}

/// An order to place with the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub instrument_id: String,
    pub exchange: Exchange,
    pub side: OrderSide,
    /// Quantity in units (lots x lot size).
    pub quantity: u32,
    pub kind: OrderKind,
}

/// Broker-side order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrokerOrderStatus {
    Open,
    Filled,
    Rejected,
    Cancelled,
}

/// A broker order as reported back by the execution service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerOrder {
    pub order_id: String,
    pub request: OrderRequest,
    pub status: BrokerOrderStatus,
    pub average_price: Option<Decimal>,
    pub placed_at: DateTime<Utc>,
}

/// A live position in the broker's view. Quantity is signed: negative
/// means short.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerPosition {
    pub instrument_id: String,
    pub exchange: Exchange,
    pub quantity: i64,
    pub average_price: Decimal,
    pub last_price: Decimal,
}

impl BrokerPosition {
    #[must_use]
    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.quantity != 0
    }
}
