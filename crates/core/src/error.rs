//! Pipeline error taxonomy.
//!
//! Every stage of the signal-to-position pipeline reports failures through
//! this type so that terminal, transient, and intentional-policy outcomes
//! stay distinguishable all the way up to the loop level.

use thiserror::Error;

/// Errors produced while turning an alert into a protected position.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Message is noise, not an error. Terminal for the message.
    #[error("ignored input: {0}")]
    IgnoredInput(String),

    /// Neither extraction tier produced the required field set.
    #[error("extraction incomplete: {0}")]
    ExtractionIncomplete(String),

    /// Instrument unresolvable even after all fallbacks.
    #[error("instrument not found: {symbol}")]
    ResolutionNotFound { symbol: String },

    /// A required field failed type or range validation.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Broker rejected the order terminally (bad params, margin).
    #[error("placement rejected: {0}")]
    PlacementRejected(String),

    /// Network/timeout failure while placing; retryable.
    #[error("placement transient failure: {0}")]
    PlacementTransient(String),

    /// An open position already exists for this instrument. Policy, not fault.
    #[error("duplicate position: {instrument_id}")]
    DuplicatePosition { instrument_id: String },

    /// Instrument stopped out earlier today; re-entry blocked. Policy.
    #[error("re-entry blocked today: {instrument_id}")]
    ReentryBlocked { instrument_id: String },

    /// Computed stop trigger is already behind the market price.
    #[error("stop already breached: {instrument_id}")]
    StopAlreadyBreached { instrument_id: String },
}

impl PipelineError {
    /// Returns true if the failure should be retried with backoff.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::PlacementTransient(_))
    }

    /// Returns true for intentional policy outcomes (not faults).
    #[must_use]
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            Self::DuplicatePosition { .. } | Self::ReentryBlocked { .. }
        )
    }

    /// Short machine-readable outcome marker persisted with the signal.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::IgnoredInput(_) => "ignored",
            Self::ExtractionIncomplete(_) => "extraction_incomplete",
            Self::ResolutionNotFound { .. } => "resolution_not_found",
            Self::ValidationFailed(_) => "validation_failed",
            Self::PlacementRejected(_) => "placement_rejected",
            Self::PlacementTransient(_) => "placement_transient",
            Self::DuplicatePosition { .. } => "duplicate_position",
            Self::ReentryBlocked { .. } => "reentry_blocked",
            Self::StopAlreadyBreached { .. } => "stop_breached",
        }
    }
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_placement_is_transient() {
        assert!(PipelineError::PlacementTransient("timeout".into()).is_transient());
        assert!(!PipelineError::PlacementRejected("margin".into()).is_transient());
        assert!(!PipelineError::ValidationFailed("strike".into()).is_transient());
        assert!(!PipelineError::IgnoredInput("noise".into()).is_transient());
    }

    #[test]
    fn policy_violations_are_not_faults() {
        assert!(PipelineError::DuplicatePosition {
            instrument_id: "X".into()
        }
        .is_policy());
        assert!(PipelineError::ReentryBlocked {
            instrument_id: "X".into()
        }
        .is_policy());
        assert!(!PipelineError::PlacementRejected("bad".into()).is_policy());
    }

    #[test]
    fn outcome_markers_are_stable() {
        assert_eq!(PipelineError::IgnoredInput("x".into()).outcome(), "ignored");
        assert_eq!(
            PipelineError::StopAlreadyBreached {
                instrument_id: "Y".into()
            }
            .outcome(),
            "stop_breached"
        );
    }
}
