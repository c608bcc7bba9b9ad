//! Action state: which suggestions a building has applied or dismissed.

mod infer;
mod registry;

pub use infer::infer_params;
pub use registry::ActionRegistry;

use crate::suggestions::{ComfortRisk, Params, Suggestion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suggestion as handed back by a caller. Only `id` is required; everything
/// else is recomputed or inferred when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_savings_kwh: f64,
    #[serde(default)]
    pub comfort_risk: Option<ComfortRisk>,
    #[serde(default)]
    pub params: Option<Params>,
    #[serde(default)]
    pub dedupe_key: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl From<&Suggestion> for SuggestionPayload {
    fn from(s: &Suggestion) -> Self {
        Self {
            id: s.id.clone(),
            kind: s.kind.as_str().to_string(),
            description: s.description.clone(),
            estimated_savings_kwh: s.estimated_savings_kwh,
            comfort_risk: Some(s.comfort_risk),
            params: Some(s.params.clone()),
            dedupe_key: Some(s.dedupe_key.clone()),
            signature: Some(s.signature.clone()),
        }
    }
}

/// Record of an applied suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedAction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub estimated_savings_kwh: f64,
    pub comfort_risk: ComfortRisk,
    pub applied_at: DateTime<Utc>,
    pub params: Params,
    pub dedupe_key: String,
    pub signature: String,
}
