//! Suggestion generation: analyzers + rule fallbacks → identified, deduplicated, ranked suggestions.

mod identity;
mod analyzers;
mod rules;
mod generator;

pub use identity::{content_hash, round_step, Identity, SuggestionContext, Draft};
pub use analyzers::{analyze_energy, analyze_occupancy, analyze_temperature, AnalyzerFn, ANALYZERS};
pub use rules::rule_based;
pub use generator::{dedupe, rank, SuggestionGenerator};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Actionable content of a suggestion, keyed for deterministic hashing.
pub type Params = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    HvacSchedule,
    SetpointChange,
    Ventilation,
}

impl SuggestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionType::HvacSchedule => "hvac_schedule",
            SuggestionType::SetpointChange => "setpoint_change",
            SuggestionType::Ventilation => "ventilation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hvac_schedule" => Some(SuggestionType::HvacSchedule),
            "setpoint_change" => Some(SuggestionType::SetpointChange),
            "ventilation" => Some(SuggestionType::Ventilation),
            _ => None,
        }
    }
}

impl fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComfortRisk {
    #[default]
    Low,
    Medium,
    High,
}

/// Candidate recommendation with content-derived identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// `{type}:{building_id}:{signature}`
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub description: String,
    pub estimated_savings_kwh: f64,
    pub comfort_risk: ComfortRisk,
    pub params: Params,
    /// Hash over type, params and the full context
    pub signature: String,
    /// Hash over type, params and only the bucketed/banded context
    pub dedupe_key: String,
}
