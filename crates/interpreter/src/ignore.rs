//! Noise gate.
//!
//! Runs before any extraction cost. Alert channels are mostly chatter:
//! greetings, performance brags, target-hit updates. Anything matched here
//! is IgnoredInput, not an error.

use regex::Regex;

/// Configured rule set for rejecting pure noise.
pub struct IgnoreRules {
    min_len: usize,
    exact_phrases: Vec<String>,
    keywords: Vec<String>,
    patterns: Vec<Regex>,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::new()
    }
}

impl IgnoreRules {
    pub fn new() -> Self {
        let patterns = [
            // Bare running-profit updates like "160++" or "225.5 ++".
            r"^\s*\d+(?:\.\d+)?\s*\++\s*$",
            // Link-only promo messages.
            r"^\s*https?://\S+\s*$",
            // Rocket/checkmark spam with no content once symbols are gone.
            r"^[\W\d\s]*$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static ignore pattern"))
        .collect();

        Self {
            min_len: 6,
            exact_phrases: vec![
                "GOOD MORNING".to_string(),
                "GOOD EVENING".to_string(),
                "WAIT FOR NEXT CALL".to_string(),
            ],
            keywords: vec![
                "TARGET HIT".to_string(),
                "TGT HIT".to_string(),
                "SL HIT".to_string(),
                "STOPLOSS HIT".to_string(),
                "BOOK PROFIT".to_string(),
                "BOOKED".to_string(),
                "JACKPOT CALL COMING".to_string(),
                "JOIN PREMIUM".to_string(),
                "FREE TRIAL".to_string(),
            ],
            patterns,
        }
    }

    /// Checks the message against all noise rules. Returns the rule name
    /// that matched, or `None` if the message deserves extraction.
    ///
    /// Shape patterns run before the length floor so a short update like
    /// "160++" reports which chatter shape it matched.
    pub fn is_noise(&self, text: &str) -> Option<&'static str> {
        let trimmed = text.trim();
        let upper = trimmed.to_uppercase();
        if self.patterns.iter().any(|p| p.is_match(&upper)) {
            return Some("pattern");
        }
        if trimmed.len() < self.min_len {
            return Some("min_length");
        }
        if self.exact_phrases.iter().any(|p| upper == *p) {
            return Some("exact_phrase");
        }
        if self.keywords.iter().any(|k| upper.contains(k.as_str())) {
            return Some("keyword");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_profit_updates_are_noise() {
        let rules = IgnoreRules::new();
        assert_eq!(rules.is_noise("160++"), Some("pattern"));
        assert_eq!(rules.is_noise("  225.5 ++ "), Some("pattern"));
    }

    #[test]
    fn short_messages_are_noise() {
        let rules = IgnoreRules::new();
        assert_eq!(rules.is_noise("hi"), Some("min_length"));
    }

    #[test]
    fn outcome_chatter_is_noise() {
        let rules = IgnoreRules::new();
        assert!(rules.is_noise("NIFTY target hit, congrats all").is_some());
        assert!(rules.is_noise("SL hit, next call soon").is_some());
        assert!(rules.is_noise("good morning").is_some());
    }

    #[test]
    fn real_alerts_pass_the_gate() {
        let rules = IgnoreRules::new();
        assert!(rules
            .is_noise("BUY NIFTY 24500 CE above 105, SL 95, TGT 120/135")
            .is_none());
        assert!(rules.is_noise("SELL CRUDEOIL SEP FUT at 5800 SL 5850").is_none());
    }
}
