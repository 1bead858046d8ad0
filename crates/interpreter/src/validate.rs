//! Final validation and enrichment.
//!
//! Turns an extracted field set into a [`ParsedIntent`] bound to a concrete
//! tradable [`Instrument`]. Anything that fails here is terminal for the
//! message: a rejected signal is never re-processed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use signal_trade_core::error::{PipelineError, PipelineResult};
use signal_trade_core::types::{
    FutureIntent, Instrument, InstrumentClass, OptionIntent, ParsedIntent, TradeAction,
};
use signal_trade_refdata::resolver::{self, ResolveError, ResolveRequest};
use signal_trade_refdata::snapshot::ReferenceSnapshot;

use crate::patterns::ExtractedFields;

/// A validated intent bound to the instrument it will trade.
#[derive(Debug, Clone)]
pub struct ResolvedIntent {
    pub intent: ParsedIntent,
    pub instrument: Instrument,
}

/// Validates the extracted fields and resolves the instrument.
///
/// # Errors
/// `ValidationFailed` when a required field is absent or out of range,
/// `ResolutionNotFound` when no instrument can be resolved or synthesized.
pub fn enrich_and_validate(
    fields: &ExtractedFields,
    snapshot: &ReferenceSnapshot,
    today: NaiveDate,
) -> PipelineResult<ResolvedIntent> {
    validate_prices(fields)?;
    let lots = match fields.lots {
        Some(0) => {
            return Err(PipelineError::ValidationFailed(
                "lot count must be positive".to_string(),
            ))
        }
        Some(n) => n,
        None => 1,
    };

    match fields.classify() {
        InstrumentClass::Option => {
            let symbol = require(fields.symbol.clone(), "symbol")?;
            let strike = require(fields.strike, "strike")?;
            if strike == 0 {
                return Err(PipelineError::ValidationFailed(
                    "strike must be positive".to_string(),
                ));
            }
            let option_class = require(fields.option_class, "option class")?;
            let action = require(fields.action, "action")?;

            let request = ResolveRequest::option(symbol.clone(), strike, option_class)
                .with_contract_month(fields.contract_month);
            let resolution = resolver::resolve(snapshot, &request, today)
                .map_err(|ResolveError::NotFound { symbol }| {
                    PipelineError::ResolutionNotFound { symbol }
                })?;
            if resolution.approximated_strike {
                warn!(
                    symbol = %symbol,
                    requested = strike,
                    resolved = ?resolution.instrument.strike,
                    "exact strike unavailable, nearest used"
                );
            }

            let intent = ParsedIntent::Option(OptionIntent {
                symbol,
                strike,
                option_class,
                action,
                entry_price: fields.entry_price,
                stop_price: fields.stop_price,
                targets: fields.targets.clone(),
                expiry_hint: None,
                lots,
            });
            Ok(ResolvedIntent {
                intent,
                instrument: resolution.instrument,
            })
        }
        InstrumentClass::Future => {
            let symbol = require(fields.symbol.clone(), "symbol")?;
            let action = require(fields.action, "action")?;

            let request = ResolveRequest::future(symbol.clone())
                .with_contract_month(fields.contract_month);
            let resolution = resolver::resolve(snapshot, &request, today)
                .map_err(|ResolveError::NotFound { symbol }| {
                    PipelineError::ResolutionNotFound { symbol }
                })?;

            let intent = ParsedIntent::Future(FutureIntent {
                symbol,
                action,
                contract_month: fields.contract_month,
                entry_price: fields.entry_price,
                stop_price: fields.stop_price,
                targets: fields.targets.clone(),
                lots,
            });
            Ok(ResolvedIntent {
                intent,
                instrument: resolution.instrument,
            })
        }
    }
}

fn validate_prices(fields: &ExtractedFields) -> PipelineResult<()> {
    for (name, value) in [
        ("entry price", fields.entry_price),
        ("stop price", fields.stop_price),
    ] {
        if let Some(p) = value {
            if p <= Decimal::ZERO {
                return Err(PipelineError::ValidationFailed(format!(
                    "{name} must be positive, got {p}"
                )));
            }
        }
    }
    if fields.targets.iter().any(|t| *t <= Decimal::ZERO) {
        return Err(PipelineError::ValidationFailed(
            "targets must be positive".to_string(),
        ));
    }
    Ok(())
}

fn require<T>(value: Option<T>, name: &str) -> PipelineResult<T> {
    value.ok_or_else(|| PipelineError::ValidationFailed(format!("missing {name}")))
}

/// Buy-side default for option alerts that never state an action. Channel
/// alerts quote option premiums to buy unless they say otherwise.
pub fn default_action(fields: &mut ExtractedFields) {
    if fields.action.is_none() && fields.classify() == InstrumentClass::Option {
        fields.action = Some(TradeAction::Buy);
    }
}
