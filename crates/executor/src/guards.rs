//! Pre-placement guards.
//!
//! Checked in order: re-entry blacklist, then duplicates. The decision is
//! pure; the controller gathers the inputs from the store and the broker's
//! live position view.

use signal_trade_core::error::{PipelineError, PipelineResult};

/// Facts gathered before placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardChecks {
    /// Instrument stopped out earlier today.
    pub blacklisted: bool,
    /// Broker reports an open position in the instrument.
    pub open_position: bool,
    /// An ENTRY order row is still PENDING or PLACED. Catches the crash
    /// window between order placement and signal mark-processed.
    pub open_entry_order: bool,
}

/// Admits or rejects a new entry for `instrument_id`.
///
/// # Errors
/// `ReentryBlocked` when blacklisted today, `DuplicatePosition` when any
/// open exposure already exists. Both are policy outcomes, not faults.
pub fn admit(instrument_id: &str, checks: GuardChecks) -> PipelineResult<()> {
    if checks.blacklisted {
        return Err(PipelineError::ReentryBlocked {
            instrument_id: instrument_id.to_string(),
        });
    }
    if checks.open_position || checks.open_entry_order {
        return Err(PipelineError::DuplicatePosition {
            instrument_id: instrument_id.to_string(),
        });
    }
    Ok(())
}
