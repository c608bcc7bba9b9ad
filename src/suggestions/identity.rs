//! Content-addressed identity: exact signature and fuzzy dedupe key.

use super::{ComfortRisk, Params, Suggestion, SuggestionType};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

const HASH_HEX_LEN: usize = 12;

/// Round to the nearest multiple of `step`; non-positive steps leave the value as is.
pub fn round_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

/// Canonical hash input. Fields serialize in declaration order and every map is a
/// `BTreeMap`, so the encoding is independent of insertion order.
#[derive(Serialize)]
struct HashPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    desc: Option<&'a str>,
    params: &'a Params,
    #[serde(rename = "type")]
    kind: &'a str,
    v: u32,
}

/// Short hex digest of the canonical JSON of a suggestion's content.
pub fn content_hash(
    version: u32,
    kind: &str,
    params: &Params,
    context: Option<&BTreeMap<String, Value>>,
    desc: Option<&str>,
) -> String {
    let payload = HashPayload {
        context,
        desc,
        params,
        kind,
        v: version,
    };
    // String keys only, so serialization cannot fail.
    let encoded = serde_json::to_vec(&payload).unwrap_or_default();
    let mut hex = format!("{:x}", Sha256::digest(&encoded));
    hex.truncate(HASH_HEX_LEN);
    hex
}

/// Context behind a suggestion. Exact fields only affect the signature;
/// banded fields (values already rounded to a bucket) also drive the dedupe key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionContext {
    exact: BTreeMap<String, Value>,
    banded: BTreeMap<String, Value>,
}

impl SuggestionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exact(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.exact.insert(key.to_string(), value.into());
        self
    }

    pub fn banded(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.banded.insert(key.to_string(), value.into());
        self
    }

    pub fn full(&self) -> BTreeMap<String, Value> {
        let mut all = self.exact.clone();
        all.extend(self.banded.iter().map(|(k, v)| (k.clone(), v.clone())));
        all
    }

    pub fn banded_fields(&self) -> &BTreeMap<String, Value> {
        &self.banded
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub signature: String,
    pub dedupe_key: String,
}

impl Identity {
    pub fn derive(version: u32, kind: SuggestionType, params: &Params, context: &SuggestionContext) -> Self {
        let full = context.full();
        Self {
            signature: content_hash(version, kind.as_str(), params, Some(&full), None),
            dedupe_key: content_hash(version, kind.as_str(), params, Some(context.banded_fields()), None),
        }
    }
}

/// A suggestion before identity is assigned.
#[derive(Debug, Clone)]
pub struct Draft {
    pub kind: SuggestionType,
    pub description: String,
    pub estimated_savings_kwh: f64,
    pub comfort_risk: ComfortRisk,
    pub params: Params,
    pub context: SuggestionContext,
}

impl Draft {
    pub fn into_suggestion(self, building_id: &str, version: u32) -> Suggestion {
        let identity = Identity::derive(version, self.kind, &self.params, &self.context);
        let savings = if self.estimated_savings_kwh.is_finite() {
            self.estimated_savings_kwh.max(0.0)
        } else {
            0.0
        };
        Suggestion {
            id: format!("{}:{}:{}", self.kind, building_id, identity.signature),
            kind: self.kind,
            description: self.description,
            estimated_savings_kwh: savings,
            comfort_risk: self.comfort_risk,
            params: self.params,
            signature: identity.signature,
            dedupe_key: identity.dedupe_key,
        }
    }
}
