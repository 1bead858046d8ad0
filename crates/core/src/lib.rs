pub mod config;
pub mod config_loader;
pub mod error;
pub mod retry;
pub mod session;
pub mod tick;
pub mod types;

pub use config::{
    AppConfig, DatabaseConfig, ExecutorConfig, ExtractionConfig, ReferenceConfig, StopConfig,
};
pub use config_loader::ConfigLoader;
pub use error::{PipelineError, PipelineResult};
pub use retry::{retry, RetryPolicy};
pub use session::{SessionSchedule, SessionWindow};
pub use tick::{floor_to_tick, is_tick_aligned, round_to_tick};
pub use types::{
    Exchange, FutureIntent, Instrument, InstrumentClass, OptionClass, OptionIntent, ParsedIntent,
    TradeAction,
};
