//! Persisted record types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A raw alert message as ingested from the feed.
#[derive(Debug, Clone)]
pub struct SignalRecord {
    pub id: i64,
    pub channel_id: i64,
    pub message_id: i64,
    pub raw_text: String,
    pub received_at: DateTime<Utc>,
    pub processed: bool,
    pub outcome: Option<String>,
    pub parsed_json: Option<JsonValue>,
}

/// Role of an order row: the position entry or its protective stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderRole {
    Entry,
    Stop,
}

impl OrderRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "ENTRY",
            Self::Stop => "STOP",
        }
    }
}

impl std::str::FromStr for OrderRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTRY" => Ok(Self::Entry),
            "STOP" => Ok(Self::Stop),
            _ => Err(()),
        }
    }
}

/// Order lifecycle status. Transitions only move forward:
/// PENDING -> PLACED -> {FILLED, REJECTED, CANCELLED}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Placed,
    Filled,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Placed => "PLACED",
            Self::Filled => "FILLED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PLACED" => Ok(Self::Placed),
            "FILLED" => Ok(Self::Filled),
            "REJECTED" => Ok(Self::Rejected),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(()),
        }
    }
}

/// One broker order attempt. Never deleted; mutated only by status
/// transitions.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: i64,
    pub signal_id: Option<i64>,
    pub instrument_id: String,
    pub exchange: String,
    pub role: OrderRole,
    pub side: String,
    pub quantity: i64,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub broker_order_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Same-day re-entry block written on a detected stop-out.
#[derive(Debug, Clone)]
pub struct BlacklistRecord {
    pub instrument_id: String,
    pub blocked_on: NaiveDate,
    pub reason: Option<String>,
}
