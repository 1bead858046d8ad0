//! Tier-2 extraction via an external language-model endpoint.
//!
//! Only consulted when the regex tier leaves the minimum field set
//! incomplete, and only for messages that look like they might carry a
//! trade at all. Every call is bounded by a hard timeout so a slow
//! endpoint cannot stall the signal loop.

use anyhow::{Context, Result};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

use signal_trade_core::config::ExtractionConfig;
use signal_trade_core::types::{OptionClass, TradeAction};

use crate::patterns::ExtractedFields;

/// Client for the structured-extraction endpoint.
pub struct ExtractionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ExtractionRequest<'a> {
    model: &'a str,
    text: &'a str,
    /// Field names the endpoint is asked to fill.
    fields: &'a [&'a str],
}

const REQUESTED_FIELDS: &[&str] = &[
    "action",
    "symbol",
    "strike",
    "option_class",
    "contract_month",
    "entry_price",
    "stop_price",
    "targets",
    "lots",
];

#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    /// "ok" when fields were extracted, "cannot_parse" otherwise.
    status: String,
    #[serde(default)]
    fields: Option<FieldsDto>,
}

/// Everything arrives as strings; coercion failures downgrade the field
/// to absent rather than failing the whole extraction.
#[derive(Debug, Deserialize)]
struct FieldsDto {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    strike: Option<String>,
    #[serde(default)]
    option_class: Option<String>,
    #[serde(default)]
    contract_month: Option<String>,
    #[serde(default)]
    entry_price: Option<String>,
    #[serde(default)]
    stop_price: Option<String>,
    #[serde(default)]
    targets: Option<Vec<String>>,
    #[serde(default)]
    lots: Option<String>,
}

impl ExtractionClient {
    /// Builds a client from config. Returns `None` when tier 2 is disabled
    /// or no endpoint is configured.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(cfg: &ExtractionConfig) -> Result<Option<Self>> {
        if !cfg.enabled || cfg.api_url.is_empty() {
            return Ok(None);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building extraction http client")?;
        Ok(Some(Self {
            http,
            base_url: cfg.api_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        }))
    }

    /// Points the client at a different endpoint. Test hook.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Cheap prefilter: a message with no digits and no trade vocabulary
    /// cannot yield a tradable intent, so skip the network round trip.
    pub fn should_attempt(text: &str) -> bool {
        static VOCAB: OnceLock<Regex> = OnceLock::new();
        let vocab = VOCAB.get_or_init(|| {
            Regex::new(r"\b(BUY|SELL|CE|PE|CALL|PUT|FUT|SL|TARGET|TGT)\b")
                .expect("static vocab pattern")
        });
        let upper = text.to_uppercase();
        upper.chars().any(|c| c.is_ascii_digit()) || vocab.is_match(&upper)
    }

    /// Asks the endpoint to extract fields. `Ok(None)` means the model
    /// judged the message unparseable, which is not an error.
    ///
    /// # Errors
    /// Returns an error on transport failure, timeout, or a malformed
    /// response body.
    pub async fn extract(&self, text: &str) -> Result<Option<ExtractedFields>> {
        let request = ExtractionRequest {
            model: &self.model,
            text,
            fields: REQUESTED_FIELDS,
        };
        let response = self
            .http
            .post(format!("{}/v1/extract", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("extraction request failed")?
            .error_for_status()
            .context("extraction endpoint returned error status")?
            .json::<ExtractionResponse>()
            .await
            .context("malformed extraction response")?;

        if response.status != "ok" {
            debug!(status = %response.status, "extraction declined the message");
            return Ok(None);
        }
        Ok(response.fields.map(coerce_fields))
    }
}

fn coerce_fields(dto: FieldsDto) -> ExtractedFields {
    ExtractedFields {
        action: dto.action.as_deref().and_then(parse_action),
        symbol: dto
            .symbol
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty()),
        strike: dto.strike.and_then(|s| s.trim().parse::<u32>().ok()),
        option_class: dto
            .option_class
            .and_then(|s| OptionClass::from_str(s.trim()).ok()),
        contract_month: dto
            .contract_month
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|m| (1..=12).contains(m)),
        entry_price: dto.entry_price.and_then(|s| Decimal::from_str(s.trim()).ok()),
        stop_price: dto.stop_price.and_then(|s| Decimal::from_str(s.trim()).ok()),
        targets: dto
            .targets
            .unwrap_or_default()
            .iter()
            .filter_map(|s| Decimal::from_str(s.trim()).ok())
            .collect(),
        lots: dto.lots.and_then(|s| s.trim().parse::<u32>().ok()),
    }
}

fn parse_action(raw: &str) -> Option<TradeAction> {
    match raw.trim().to_uppercase().as_str() {
        "BUY" => Some(TradeAction::Buy),
        "SELL" => Some(TradeAction::Sell),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn prefilter_skips_pure_prose() {
        assert!(!ExtractionClient::should_attempt(
            "market looking choppy, stay cautious"
        ));
        assert!(ExtractionClient::should_attempt("NIFTY 24500 looking strong"));
        assert!(ExtractionClient::should_attempt("buy on dips"));
    }

    #[test]
    fn coercion_drops_malformed_fields() {
        let dto = FieldsDto {
            action: Some("BUY".to_string()),
            symbol: Some(" nifty ".to_string()),
            strike: Some("24500".to_string()),
            option_class: Some("CE".to_string()),
            contract_month: Some("13".to_string()),
            entry_price: Some("abc".to_string()),
            stop_price: Some("95.5".to_string()),
            targets: Some(vec!["120".to_string(), "x".to_string()]),
            lots: None,
        };
        let fields = coerce_fields(dto);
        assert_eq!(fields.action, Some(TradeAction::Buy));
        assert_eq!(fields.symbol.as_deref(), Some("NIFTY"));
        assert_eq!(fields.strike, Some(24500));
        assert_eq!(fields.contract_month, None);
        assert_eq!(fields.entry_price, None);
        assert_eq!(fields.stop_price, Some(dec!(95.5)));
        assert_eq!(fields.targets, vec![dec!(120)]);
    }
}
