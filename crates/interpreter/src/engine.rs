//! Interpretation engine: noise gate, tier-1 regex pass, optional tier-2
//! extraction, then validation and instrument resolution.
//!
//! One message in, one terminal outcome out. The engine never retries a
//! message; whatever it returns is recorded against the signal and the
//! signal is done.

use chrono::NaiveDate;
use tracing::{debug, warn};

use signal_trade_core::error::{PipelineError, PipelineResult};
use signal_trade_refdata::snapshot::ReferenceSnapshot;

use crate::extraction::ExtractionClient;
use crate::ignore::IgnoreRules;
use crate::patterns::FieldPatterns;
use crate::validate::{self, ResolvedIntent};

/// Stateless (per message) interpretation pipeline.
pub struct InterpreterEngine {
    ignore: IgnoreRules,
    patterns: FieldPatterns,
    extraction: Option<ExtractionClient>,
}

impl InterpreterEngine {
    pub fn new(extraction: Option<ExtractionClient>) -> Self {
        Self {
            ignore: IgnoreRules::new(),
            patterns: FieldPatterns::new(),
            extraction,
        }
    }

    /// Interprets one raw message against the reference snapshot.
    ///
    /// # Errors
    /// `IgnoredInput` for noise, `ExtractionIncomplete` when no tier fills
    /// the minimum field set, plus everything validation can return.
    pub async fn interpret(
        &self,
        text: &str,
        snapshot: &ReferenceSnapshot,
        today: NaiveDate,
    ) -> PipelineResult<ResolvedIntent> {
        if let Some(rule) = self.ignore.is_noise(text) {
            return Err(PipelineError::IgnoredInput(rule.to_string()));
        }

        let mut fields = self.patterns.extract(text);
        debug!(?fields, "tier-1 extraction");

        if !fields.has_min_fields(fields.classify()) {
            if let Some(client) = &self.extraction {
                if ExtractionClient::should_attempt(text) {
                    match client.extract(text).await {
                        Ok(Some(second_pass)) => fields.merge_missing(second_pass),
                        Ok(None) => debug!("tier-2 extraction declined the message"),
                        // Tier 2 is best-effort: a transport failure must
                        // not turn a parseable message into a fault.
                        Err(e) => warn!(error = %e, "tier-2 extraction failed"),
                    }
                }
            }
        }

        validate::default_action(&mut fields);

        let class = fields.classify();
        if !fields.has_min_fields(class) {
            return Err(PipelineError::ExtractionIncomplete(format!(
                "minimum field set unmet for {class:?}"
            )));
        }

        validate::enrich_and_validate(&fields, snapshot, today)
    }
}
