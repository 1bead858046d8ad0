//! Protective stop engine: guarantees every open position carries a stop
//! order and tightens it over time, never loosening it.

pub mod engine;
pub mod state;
pub mod stop_math;

pub use engine::StopEngine;
pub use state::{decide, StopAction, StopState};
