//! In-memory paper broker.
//!
//! Implements the full client seam without touching a real execution
//! service. Tests drive prices, positions, and failure injection directly.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use signal_trade_core::Exchange;

use crate::client::BrokerClient;
use crate::error::{BrokerError, Result};
use crate::types::{BrokerOrder, BrokerOrderStatus, BrokerPosition, OrderKind, OrderRequest};

#[derive(Default)]
struct PaperState {
    orders: HashMap<String, BrokerOrder>,
    positions: HashMap<String, BrokerPosition>,
    prices: HashMap<String, Decimal>,
    fail_next: VecDeque<BrokerError>,
}

/// Stateful paper broker for tests and dry runs.
#[derive(Default)]
pub struct PaperBroker {
    state: Mutex<PaperState>,
    next_id: AtomicU64,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the last traded price for an instrument.
    pub fn set_last_price(&self, instrument_id: &str, price: Decimal) {
        let mut state = self.state.lock().unwrap();
        state.prices.insert(instrument_id.to_string(), price);
        if let Some(pos) = state.positions.get_mut(instrument_id) {
            pos.last_price = price;
        }
    }

    /// Creates or replaces a live position.
    pub fn set_position(
        &self,
        instrument_id: &str,
        exchange: Exchange,
        quantity: i64,
        average_price: Decimal,
    ) {
        let mut state = self.state.lock().unwrap();
        let last_price = state
            .prices
            .get(instrument_id)
            .copied()
            .unwrap_or(average_price);
        state.positions.insert(
            instrument_id.to_string(),
            BrokerPosition {
                instrument_id: instrument_id.to_string(),
                exchange,
                quantity,
                average_price,
                last_price,
            },
        );
    }

    /// Removes a position from the live view (simulates a stop-out or exit).
    pub fn close_position(&self, instrument_id: &str) {
        self.state.lock().unwrap().positions.remove(instrument_id);
    }

    /// Queues an error to be returned by the next broker call.
    pub fn fail_next(&self, error: BrokerError) {
        self.state.lock().unwrap().fail_next.push_back(error);
    }

    /// Marks an order filled at the given price.
    pub fn fill_order(&self, order_id: &str, price: Decimal) {
        let mut state = self.state.lock().unwrap();
        if let Some(order) = state.orders.get_mut(order_id) {
            order.status = BrokerOrderStatus::Filled;
            order.average_price = Some(price);
        }
    }

    /// Snapshot of all orders seen so far.
    pub fn orders(&self) -> Vec<BrokerOrder> {
        self.state.lock().unwrap().orders.values().cloned().collect()
    }

    fn take_injected_failure(&self) -> Option<BrokerError> {
        self.state.lock().unwrap().fail_next.pop_front()
    }
}

#[async_trait]
impl BrokerClient for PaperBroker {
    async fn place_order(&self, request: &OrderRequest) -> Result<String> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        let order_id = format!("PAPER-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let order = BrokerOrder {
            order_id: order_id.clone(),
            request: request.clone(),
            status: BrokerOrderStatus::Open,
            average_price: None,
            placed_at: Utc::now(),
        };
        info!(
            order_id,
            instrument_id = request.instrument_id,
            side = %request.side,
            quantity = request.quantity,
            "Paper order placed"
        );
        self.state.lock().unwrap().orders.insert(order_id.clone(), order);
        Ok(order_id)
    }

    async fn modify_order(&self, order_id: &str, kind: OrderKind) -> Result<()> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| BrokerError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;
        order.request.kind = kind;
        Ok(())
    }

    async fn cancel_order(&self, order_id: &str) -> Result<()> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| BrokerError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;
        order.status = BrokerOrderStatus::Cancelled;
        Ok(())
    }

    async fn order_status(&self, order_id: &str) -> Result<BrokerOrder> {
        let state = self.state.lock().unwrap();
        state
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| BrokerError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    async fn positions(&self) -> Result<Vec<BrokerPosition>> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        Ok(self.state.lock().unwrap().positions.values().cloned().collect())
    }

    async fn last_price(&self, instrument_id: &str) -> Result<Decimal> {
        let state = self.state.lock().unwrap();
        state
            .prices
            .get(instrument_id)
            .copied()
            .ok_or_else(|| BrokerError::InstrumentNotFound(instrument_id.to_string()))
    }
}
