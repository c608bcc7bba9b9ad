//! Orchestrates analyzers and fallbacks, then dedupes and ranks.

use super::{rule_based, Suggestion, ANALYZERS};
use crate::config::SuggestionsConfig;
use crate::telemetry::TelemetrySample;
use std::collections::HashMap;

/// Collapse candidates sharing a dedupe key, keeping the higher savings.
/// Ties keep the earlier candidate; first-seen order is preserved.
pub fn dedupe(candidates: Vec<Suggestion>) -> Vec<Suggestion> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<Suggestion> = Vec::with_capacity(candidates.len());
    for s in candidates {
        match index.get(&s.dedupe_key) {
            Some(&i) => {
                if s.estimated_savings_kwh > kept[i].estimated_savings_kwh {
                    kept[i] = s;
                }
            }
            None => {
                index.insert(s.dedupe_key.clone(), kept.len());
                kept.push(s);
            }
        }
    }
    kept
}

/// Sort by savings descending (stable) and keep the first `top_n`.
pub fn rank(mut suggestions: Vec<Suggestion>, top_n: usize) -> Vec<Suggestion> {
    suggestions.sort_by(|a, b| b.estimated_savings_kwh.total_cmp(&a.estimated_savings_kwh));
    suggestions.truncate(top_n);
    suggestions
}

pub struct SuggestionGenerator {
    config: SuggestionsConfig,
}

impl SuggestionGenerator {
    pub fn new(config: SuggestionsConfig) -> Self {
        Self { config }
    }

    /// Every candidate before dedupe: analyzer output (if any data) then rule fallbacks.
    pub fn candidates(&self, building_id: &str, recent: &[TelemetrySample]) -> Vec<Suggestion> {
        let version = self.config.hash_version;
        let mut drafts = Vec::new();

        if recent.is_empty() {
            tracing::debug!(building_id, "no recent telemetry; rule-based suggestions only");
        } else {
            for (name, analyze) in ANALYZERS {
                match analyze(recent, &self.config) {
                    Ok(Some(draft)) => drafts.push(draft),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(building_id, analyzer = name, error = %e, "analyzer skipped"),
                }
            }
        }
        drafts.extend(rule_based());

        drafts
            .into_iter()
            .map(|d| d.into_suggestion(building_id, version))
            .collect()
    }

    /// Top suggestions by estimated savings after dedupe. Rule fallbacks make this
    /// non-empty for any non-zero `top_n`.
    pub fn generate(&self, building_id: &str, recent: &[TelemetrySample]) -> Vec<Suggestion> {
        let candidates = self.candidates(building_id, recent);
        let total = candidates.len();
        let ranked = rank(dedupe(candidates), self.config.top_n);
        tracing::debug!(building_id, candidates = total, returned = ranked.len(), "suggestions generated");
        ranked
    }
}
