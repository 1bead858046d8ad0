//! Durable shared store: the only channel between the polling loops.

pub mod database;
pub mod models;
pub mod repositories;

pub use database::DatabaseClient;
pub use models::{BlacklistRecord, OrderRecord, OrderRole, OrderStatus, SignalRecord};
pub use repositories::{blacklist_repo, order_repo, signal_repo};
