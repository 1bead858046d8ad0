//! Order lifecycle controller: turns accepted intents into placed,
//! idempotently-tracked broker orders.

pub mod controller;
pub mod guards;
pub mod plan;

pub use controller::{place_with_retry, LifecycleController};
pub use guards::GuardChecks;
pub use plan::plan_entry;
