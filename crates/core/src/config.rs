use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::session::SessionSchedule;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub reference: ReferenceConfig,
    pub extraction: ExtractionConfig,
    pub executor: ExecutorConfig,
    pub stops: StopConfig,
    pub sessions: SessionSchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Path to the instrument reference snapshot CSV.
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Tier-2 extraction service endpoint. Empty disables tier 2.
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    /// Hard cap on each extraction call.
    pub timeout_secs: u64,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub poll_interval_secs: u64,
    /// Limit-order offset from the reference price, as a fraction (0.01 = 1%).
    pub limit_offset_pct: Decimal,
    /// Absolute cap on the limit offset in price units.
    pub max_limit_offset: Decimal,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopConfig {
    pub poll_interval_secs: u64,
    /// Default initial stop distance from average entry, as a fraction.
    pub initial_stop_pct: Decimal,
    /// Trailing distance behind current market price, as a fraction.
    pub trail_pct: Decimal,
    /// Seconds after initial placement during which trailing is suppressed.
    pub grace_period_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/signal_trade".to_string(),
                max_connections: 10,
            },
            reference: ReferenceConfig {
                snapshot_path: "config/instruments.csv".to_string(),
            },
            extraction: ExtractionConfig {
                api_url: String::new(),
                api_key: String::new(),
                model: "alert-extractor-v1".to_string(),
                timeout_secs: 20,
                enabled: false,
            },
            executor: ExecutorConfig {
                poll_interval_secs: 10,
                limit_offset_pct: Decimal::new(5, 3), // 0.5%
                max_limit_offset: Decimal::new(5, 0), // 5 price units
                max_retries: 3,
                retry_backoff_ms: 2000,
            },
            stops: StopConfig {
                poll_interval_secs: 15,
                initial_stop_pct: Decimal::new(10, 2), // 10%
                trail_pct: Decimal::new(5, 2),         // 5%
                grace_period_secs: 300,
            },
            sessions: SessionSchedule::india_default(),
        }
    }
}
