//! Order lifecycle controller loop.
//!
//! Polls unprocessed signals oldest-first, interprets each one, runs the
//! pre-placement guards, and places the entry order. Every signal reaches
//! exactly one terminal outcome; the crash window between "order placed"
//! and "signal marked processed" is covered by the open-entry guard, so
//! re-processing after a crash cannot double-enter an instrument.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{Local, Utc};
use tracing::{debug, error, info, warn};

use signal_trade_broker::client::BrokerClient;
use signal_trade_broker::error::BrokerError;
use signal_trade_broker::types::{BrokerOrderStatus, OrderRequest};
use signal_trade_core::config::ExecutorConfig;
use signal_trade_core::error::{PipelineError, PipelineResult};
use signal_trade_core::retry::{retry, RetryPolicy};
use signal_trade_data::models::{OrderRole, OrderStatus, SignalRecord};
use signal_trade_data::{blacklist_repo, order_repo, signal_repo, DatabaseClient};
use signal_trade_interpreter::InterpreterEngine;
use signal_trade_refdata::snapshot::ReferenceSnapshot;

use crate::guards::{self, GuardChecks};
use crate::plan;

/// Signals drained per pass. Oldest-first, so a contested instrument goes
/// to the first-arriving signal.
const SIGNAL_BATCH: i64 = 25;

/// PENDING entry rows older than this with no broker order id are aged
/// out, so a crash mid-placement cannot block the instrument forever.
const STALE_PENDING_SECS: i64 = 300;

/// Places `request`, retrying transient broker failures per config.
///
/// # Errors
/// `PlacementTransient` when retries are exhausted on a network/timeout
/// failure, `PlacementRejected` on a terminal broker rejection.
pub async fn place_with_retry(
    broker: &dyn BrokerClient,
    cfg: &ExecutorConfig,
    request: &OrderRequest,
) -> PipelineResult<String> {
    let policy = RetryPolicy::new(cfg.max_retries, Duration::from_millis(cfg.retry_backoff_ms));
    retry(policy, BrokerError::is_transient, || {
        broker.place_order(request)
    })
    .await
    .map_err(|e| {
        if e.is_transient() {
            PipelineError::PlacementTransient(e.to_string())
        } else {
            PipelineError::PlacementRejected(e.to_string())
        }
    })
}

/// The lifecycle controller: one of the three polling loops.
pub struct LifecycleController {
    db: DatabaseClient,
    broker: Arc<dyn BrokerClient>,
    interpreter: InterpreterEngine,
    snapshot: ReferenceSnapshot,
    cfg: ExecutorConfig,
}

impl LifecycleController {
    pub fn new(
        db: DatabaseClient,
        broker: Arc<dyn BrokerClient>,
        interpreter: InterpreterEngine,
        snapshot: ReferenceSnapshot,
        cfg: ExecutorConfig,
    ) -> Self {
        Self {
            db,
            broker,
            interpreter,
            snapshot,
            cfg,
        }
    }

    /// Runs forever. Each tick drains a batch of unprocessed signals and
    /// syncs broker fill state; a failed pass is logged and the next tick
    /// tries again.
    pub async fn run(&self) -> Result<()> {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.cfg.poll_interval_secs));
        info!(
            interval_secs = self.cfg.poll_interval_secs,
            "Lifecycle controller started"
        );
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                error!(error = %e, "Signal pass failed");
            }
            if let Err(e) = self.sync_fills().await {
                error!(error = %e, "Fill sync failed");
            }
        }
    }

    /// One pass over unprocessed signals, strictly sequential.
    ///
    /// # Errors
    /// Returns an error on a store fault; the affected signal stays
    /// unprocessed and is picked up again next pass.
    pub async fn run_once(&self) -> Result<()> {
        let cutoff = Utc::now() - chrono::Duration::seconds(STALE_PENDING_SECS);
        let aged_out = order_repo::expire_stale_pending(self.db.pool(), cutoff).await?;
        if aged_out > 0 {
            warn!(aged_out, "Cancelled stale pending order rows");
        }
        let signals = signal_repo::fetch_unprocessed(self.db.pool(), SIGNAL_BATCH).await?;
        for signal in signals {
            self.handle_signal(&signal).await?;
        }
        Ok(())
    }

    async fn handle_signal(&self, signal: &SignalRecord) -> Result<()> {
        let today = Local::now().date_naive();
        let resolved = match self
            .interpreter
            .interpret(&signal.raw_text, &self.snapshot, today)
            .await
        {
            Ok(resolved) => resolved,
            Err(e) => return self.record_failure(signal, &e).await,
        };
        let instrument_id = resolved.instrument.instrument_id.clone();

        let open_position = self
            .broker
            .positions()
            .await?
            .iter()
            .any(|p| p.instrument_id == instrument_id && p.is_open());
        let checks = GuardChecks {
            blacklisted: blacklist_repo::is_blacklisted(self.db.pool(), &instrument_id, today)
                .await?,
            open_position,
            open_entry_order: order_repo::has_open_entry(self.db.pool(), &instrument_id).await?,
        };
        if let Err(e) = guards::admit(&instrument_id, checks) {
            return self.record_failure(signal, &e).await;
        }

        let last_price = match resolved.intent.entry_price() {
            Some(_) => None,
            None => self.broker.last_price(&instrument_id).await.ok(),
        };
        let request =
            match plan::plan_entry(&resolved.intent, &resolved.instrument, last_price, &self.cfg)
            {
                Ok(request) => request,
                Err(e) => return self.record_failure(signal, &e).await,
            };

        let order_id = order_repo::insert_pending(
            self.db.pool(),
            Some(signal.id),
            &instrument_id,
            &request.exchange.to_string(),
            OrderRole::Entry,
            &request.side.to_string(),
            i64::from(request.quantity),
            request.kind.price(),
            None,
        )
        .await?;

        match place_with_retry(self.broker.as_ref(), &self.cfg, &request).await {
            Ok(broker_order_id) => {
                order_repo::mark_placed(self.db.pool(), order_id, &broker_order_id).await?;
                let intent_json = serde_json::to_value(&resolved.intent)?;
                signal_repo::mark_processed(self.db.pool(), signal.id, "placed", Some(&intent_json))
                    .await?;
                info!(
                    signal_id = signal.id,
                    instrument_id = %instrument_id,
                    broker_order_id = %broker_order_id,
                    "Entry order placed"
                );
                Ok(())
            }
            Err(e) => {
                order_repo::mark_status(self.db.pool(), order_id, OrderStatus::Rejected).await?;
                self.record_failure(signal, &e).await
            }
        }
    }

    async fn record_failure(&self, signal: &SignalRecord, error: &PipelineError) -> Result<()> {
        match error {
            PipelineError::IgnoredInput(_) | PipelineError::ExtractionIncomplete(_) => {
                debug!(signal_id = signal.id, error = %error, "Signal skipped");
            }
            e if e.is_policy() => {
                info!(signal_id = signal.id, error = %error, "Signal blocked by policy");
            }
            _ => {
                warn!(signal_id = signal.id, error = %error, "Signal failed");
            }
        }
        signal_repo::mark_processed(self.db.pool(), signal.id, error.outcome(), None).await?;
        Ok(())
    }

    /// Walks PLACED entry rows and pulls terminal state from the broker.
    ///
    /// # Errors
    /// Returns an error on a store fault.
    pub async fn sync_fills(&self) -> Result<()> {
        for order in order_repo::placed_orders(self.db.pool(), OrderRole::Entry).await? {
            let Some(broker_order_id) = order.broker_order_id.as_deref() else {
                continue;
            };
            let broker_order = match self.broker.order_status(broker_order_id).await {
                Ok(b) => b,
                Err(e) => {
                    warn!(broker_order_id = %broker_order_id, error = %e, "Order status query failed");
                    continue;
                }
            };
            let next = match broker_order.status {
                BrokerOrderStatus::Open => continue,
                BrokerOrderStatus::Filled => OrderStatus::Filled,
                BrokerOrderStatus::Rejected => OrderStatus::Rejected,
                BrokerOrderStatus::Cancelled => OrderStatus::Cancelled,
            };
            order_repo::mark_status(self.db.pool(), order.id, next).await?;
            info!(
                order_id = order.id,
                broker_order_id = %broker_order_id,
                status = next.as_str(),
                "Entry order reached terminal state"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use signal_trade_broker::paper::PaperBroker;
    use signal_trade_broker::types::{OrderKind, OrderSide};
    use signal_trade_core::types::Exchange;

    fn cfg() -> ExecutorConfig {
        ExecutorConfig {
            poll_interval_secs: 1,
            limit_offset_pct: dec!(0.005),
            max_limit_offset: dec!(5),
            max_retries: 3,
            retry_backoff_ms: 1,
        }
    }

    fn market_buy() -> OrderRequest {
        OrderRequest {
            instrument_id: "NIFTY26SEP24500CE".to_string(),
            exchange: Exchange::Nfo,
            side: OrderSide::Buy,
            quantity: 75,
            kind: OrderKind::Market,
        }
    }

    #[tokio::test]
    async fn transient_failure_is_retried_to_success() {
        let broker = PaperBroker::new();
        broker.fail_next(BrokerError::Timeout("flaky".into()));
        let order_id = place_with_retry(&broker, &cfg(), &market_buy()).await.unwrap();
        assert!(order_id.starts_with("PAPER-"));
        assert_eq!(broker.orders().len(), 1);
    }

    #[tokio::test]
    async fn rejection_is_terminal_without_retry() {
        let broker = PaperBroker::new();
        broker.fail_next(BrokerError::Rejected("insufficient margin".into()));
        let err = place_with_retry(&broker, &cfg(), &market_buy()).await.unwrap_err();
        assert!(matches!(err, PipelineError::PlacementRejected(_)));
        assert!(broker.orders().is_empty());
    }

    #[tokio::test]
    async fn exhausted_retries_report_transient() {
        let broker = PaperBroker::new();
        for _ in 0..3 {
            broker.fail_next(BrokerError::Network("down".into()));
        }
        let err = place_with_retry(&broker, &cfg(), &market_buy()).await.unwrap_err();
        assert!(matches!(err, PipelineError::PlacementTransient(_)));
    }
}
