//! Protective stop engine loop.
//!
//! Scans the broker's live position view on an interval while a trading
//! session is open. Every open position gets a resting stop order; after
//! the grace period the stop trails the market, tightening only. A
//! position that vanishes from the live view is treated as a stop-out and
//! blacklisted for the rest of the trading day.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use signal_trade_broker::client::BrokerClient;
use signal_trade_broker::error::BrokerError;
use signal_trade_broker::types::{BrokerOrderStatus, BrokerPosition, OrderKind, OrderRequest, OrderSide};
use signal_trade_core::config::StopConfig;
use signal_trade_core::session::SessionSchedule;
use signal_trade_data::models::{OrderRole, OrderStatus};
use signal_trade_data::{blacklist_repo, order_repo, DatabaseClient};
use signal_trade_refdata::lots::fallback_tick_size;
use signal_trade_refdata::snapshot::ReferenceSnapshot;

use crate::state::{decide, StopAction, StopState};

/// The stop engine: one of the three polling loops. Holds per-instrument
/// tracking state; everything durable lives in the store.
pub struct StopEngine {
    db: DatabaseClient,
    broker: Arc<dyn BrokerClient>,
    snapshot: ReferenceSnapshot,
    cfg: StopConfig,
    schedule: SessionSchedule,
    states: HashMap<String, StopState>,
}

impl StopEngine {
    pub fn new(
        db: DatabaseClient,
        broker: Arc<dyn BrokerClient>,
        snapshot: ReferenceSnapshot,
        cfg: StopConfig,
        schedule: SessionSchedule,
    ) -> Self {
        Self {
            db,
            broker,
            snapshot,
            cfg,
            schedule,
            states: HashMap::new(),
        }
    }

    /// Runs forever. Scans are gated on the session schedule; outside all
    /// windows the loop sleeps without touching the broker.
    pub async fn run(&mut self) -> Result<()> {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.cfg.poll_interval_secs));
        info!(
            interval_secs = self.cfg.poll_interval_secs,
            "Stop engine started"
        );
        loop {
            ticker.tick().await;
            let local_now = Local::now();
            if !self.schedule.any_open(local_now.naive_local()) {
                debug!("All sessions closed, skipping scan");
                continue;
            }
            if let Err(e) = self.scan(Utc::now(), local_now.date_naive()).await {
                error!(error = %e, "Stop scan failed");
            }
        }
    }

    /// One scan over the live position view.
    ///
    /// # Errors
    /// Returns an error when the broker's position view or the store is
    /// unreachable. Per-position placement failures are logged and retried
    /// naturally on the next scan.
    pub async fn scan(&mut self, now: DateTime<Utc>, today: NaiveDate) -> Result<()> {
        let live: HashMap<String, BrokerPosition> = self
            .broker
            .positions()
            .await?
            .into_iter()
            .filter(BrokerPosition::is_open)
            .map(|p| (p.instrument_id.clone(), p))
            .collect();

        self.detect_exits(&live, today).await?;

        for (instrument_id, position) in &live {
            self.adopt_resting_stop(instrument_id).await?;
            let declared = if self.states.contains_key(instrument_id) {
                None
            } else {
                order_repo::declared_stop(self.db.pool(), instrument_id).await?
            };
            let tick = self.tick_for(instrument_id);
            let action = decide(
                self.states.get(instrument_id),
                position,
                declared,
                tick,
                &self.cfg,
                now,
            );
            match action {
                StopAction::PlaceInitial { trigger } => {
                    if let Err(e) = self.place_initial(position, trigger, now).await {
                        warn!(instrument_id = %instrument_id, error = %e, "Initial stop placement failed");
                    }
                }
                StopAction::Trail { trigger } => {
                    if let Err(e) = self.apply_trail(instrument_id, trigger).await {
                        warn!(instrument_id = %instrument_id, error = %e, "Stop trail failed");
                    }
                }
                StopAction::Hold => {}
                StopAction::FlagManualExit => {
                    warn!(
                        instrument_id = %instrument_id,
                        last_price = %position.last_price,
                        "Computed stop already through the market, manual exit required"
                    );
                    self.states.insert(
                        instrument_id.clone(),
                        StopState {
                            order_row_id: 0,
                            broker_order_id: String::new(),
                            trigger: position.last_price,
                            placed_at: now,
                            manual_exit: true,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    /// Tracked instruments missing from the live view stopped out (or were
    /// closed by hand); blacklist them for the day and settle the resting
    /// stop row.
    async fn detect_exits(
        &mut self,
        live: &HashMap<String, BrokerPosition>,
        today: NaiveDate,
    ) -> Result<()> {
        let (stop_outs, manual) = vanished_exits(&self.states, live);
        for instrument_id in manual {
            self.states.remove(&instrument_id);
            info!(instrument_id = %instrument_id, "Manually-flagged position closed");
        }
        for instrument_id in stop_outs {
            let Some(state) = self.states.remove(&instrument_id) else {
                continue;
            };
            warn!(instrument_id = %instrument_id, "Protected position left the live view, treating as stop-out");
            blacklist_repo::add(self.db.pool(), &instrument_id, today, Some("stop_out")).await?;
            self.settle_stop_row(&state).await;
        }
        Ok(())
    }

    /// Brings the stop order row to a terminal status after an exit.
    async fn settle_stop_row(&self, state: &StopState) {
        match self.broker.order_status(&state.broker_order_id).await {
            Ok(order) if order.status == BrokerOrderStatus::Filled => {
                if let Err(e) =
                    order_repo::mark_status(self.db.pool(), state.order_row_id, OrderStatus::Filled)
                        .await
                {
                    warn!(error = %e, "Failed to mark stop row filled");
                }
            }
            Ok(order) => {
                if order.status == BrokerOrderStatus::Open {
                    if let Err(e) = self.broker.cancel_order(&state.broker_order_id).await {
                        warn!(error = %e, "Failed to cancel orphaned stop order");
                    }
                }
                if let Err(e) = order_repo::mark_status(
                    self.db.pool(),
                    state.order_row_id,
                    OrderStatus::Cancelled,
                )
                .await
                {
                    warn!(error = %e, "Failed to mark stop row cancelled");
                }
            }
            Err(e) => {
                warn!(
                    broker_order_id = %state.broker_order_id,
                    error = %e,
                    "Stop order status query failed during exit settlement"
                );
            }
        }
    }

    /// On restart, pick up a stop that is already resting at the broker so
    /// a second one is never placed.
    async fn adopt_resting_stop(&mut self, instrument_id: &str) -> Result<()> {
        if self.states.contains_key(instrument_id) {
            return Ok(());
        }
        if let Some(row) = order_repo::active_stop(self.db.pool(), instrument_id).await? {
            if let (Some(broker_order_id), Some(trigger)) =
                (row.broker_order_id.clone(), row.trigger_price)
            {
                debug!(instrument_id = %instrument_id, trigger = %trigger, "Adopted resting stop");
                self.states.insert(
                    instrument_id.to_string(),
                    StopState {
                        order_row_id: row.id,
                        broker_order_id,
                        trigger,
                        placed_at: row.created_at,
                        manual_exit: false,
                    },
                );
            }
        }
        Ok(())
    }

    async fn place_initial(
        &mut self,
        position: &BrokerPosition,
        trigger: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let side = if position.is_long() {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        };
        let Some(quantity) = order_quantity(position.quantity) else {
            warn!(
                instrument_id = %position.instrument_id,
                quantity = position.quantity,
                "Position size out of order quantity range, skipping stop"
            );
            return Ok(());
        };
        let request = OrderRequest {
            instrument_id: position.instrument_id.clone(),
            exchange: position.exchange,
            side,
            quantity,
            kind: OrderKind::StopMarket { trigger },
        };
        let row_id = order_repo::insert_pending(
            self.db.pool(),
            None,
            &position.instrument_id,
            &position.exchange.to_string(),
            OrderRole::Stop,
            &side.to_string(),
            i64::from(quantity),
            None,
            Some(trigger),
        )
        .await?;

        match self.broker.place_order(&request).await {
            Ok(broker_order_id) => {
                order_repo::mark_placed(self.db.pool(), row_id, &broker_order_id).await?;
                info!(
                    instrument_id = %position.instrument_id,
                    trigger = %trigger,
                    broker_order_id = %broker_order_id,
                    "Initial stop placed"
                );
                self.states.insert(
                    position.instrument_id.clone(),
                    StopState {
                        order_row_id: row_id,
                        broker_order_id,
                        trigger,
                        placed_at: now,
                        manual_exit: false,
                    },
                );
                Ok(())
            }
            Err(e) => {
                order_repo::mark_status(self.db.pool(), row_id, OrderStatus::Rejected).await?;
                Err(e.into())
            }
        }
    }

    async fn apply_trail(&mut self, instrument_id: &str, trigger: Decimal) -> Result<()> {
        let Some(state) = self.states.get_mut(instrument_id) else {
            return Ok(());
        };
        match self
            .broker
            .modify_order(&state.broker_order_id, OrderKind::StopMarket { trigger })
            .await
        {
            Ok(()) => {
                order_repo::update_trigger(self.db.pool(), state.order_row_id, trigger).await?;
                info!(
                    instrument_id = %instrument_id,
                    from = %state.trigger,
                    to = %trigger,
                    "Stop trailed"
                );
                state.trigger = trigger;
                Ok(())
            }
            Err(BrokerError::OrderNotFound { .. }) => {
                // The stop likely just triggered; the next scan's exit
                // detection settles it.
                warn!(instrument_id = %instrument_id, "Resting stop gone at the broker, dropping tracking");
                self.states.remove(instrument_id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn tick_for(&self, instrument_id: &str) -> Decimal {
        self.snapshot
            .by_instrument_id(instrument_id)
            .map(|row| row.tick_size)
            .unwrap_or_else(|| fallback_tick_size(symbol_prefix(instrument_id)))
    }
}

/// Tracked instruments that have left the live view, split into stop-outs
/// (blacklist and settle the resting row) and manually-flagged closes.
fn vanished_exits(
    states: &HashMap<String, StopState>,
    live: &HashMap<String, BrokerPosition>,
) -> (Vec<String>, Vec<String>) {
    let mut stop_outs = Vec::new();
    let mut manual = Vec::new();
    for (instrument_id, state) in states {
        if live.contains_key(instrument_id) {
            continue;
        }
        if state.manual_exit {
            manual.push(instrument_id.clone());
        } else {
            stop_outs.push(instrument_id.clone());
        }
    }
    (stop_outs, manual)
}

/// Order quantity from a signed position size. `None` when the size does
/// not fit the broker's quantity field.
fn order_quantity(position_quantity: i64) -> Option<u32> {
    u32::try_from(position_quantity.unsigned_abs()).ok()
}

/// Leading alphabetic run of a tradable identifier, e.g.
/// `NIFTY26SEP24500CE` -> `NIFTY`.
fn symbol_prefix(instrument_id: &str) -> &str {
    let end = instrument_id
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(instrument_id.len());
    &instrument_id[..end]
}
