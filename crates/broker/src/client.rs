//! The broker client seam.
//!
//! The real execution service lives behind this trait; the paper
//! implementation backs tests and dry runs.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::types::{BrokerOrder, BrokerPosition, OrderKind, OrderRequest};

/// Broker execution service: authoritative for fill state and live
/// position truth.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Places an order and returns the broker-assigned order id.
    async fn place_order(&self, request: &OrderRequest) -> Result<String>;

    /// Modifies the price/trigger of a resting order.
    async fn modify_order(&self, order_id: &str, kind: OrderKind) -> Result<()>;

    /// Cancels a resting order.
    async fn cancel_order(&self, order_id: &str) -> Result<()>;

    /// Queries a single order's current state.
    async fn order_status(&self, order_id: &str) -> Result<BrokerOrder>;

    /// All currently open positions in the broker's live view.
    async fn positions(&self) -> Result<Vec<BrokerPosition>>;

    /// Last traded price for an instrument.
    async fn last_price(&self, instrument_id: &str) -> Result<Decimal>;
}
