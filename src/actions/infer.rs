//! Fallback params for payloads that arrive without them.

use crate::suggestions::{Params, SuggestionType};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const DEFAULT_SETPOINT_C: f64 = 23.0;
const DEFAULT_CO2_PPM: u64 = 900;

fn setpoint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*°?C").expect("literal pattern"))
}

fn ppm_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+)\s*ppm").expect("literal pattern"))
}

fn first_capture<T: std::str::FromStr>(re: &Regex, text: &str) -> Option<T> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Per-type params derived from the free-text description. Unknown types get none.
pub fn infer_params(kind: &str, description: &str) -> Params {
    let mut params = Params::new();
    match SuggestionType::parse(kind) {
        Some(SuggestionType::SetpointChange) => {
            let target = first_capture(setpoint_re(), description).unwrap_or(DEFAULT_SETPOINT_C);
            params.insert("setpoint_c_target".into(), Value::from(target));
        }
        Some(SuggestionType::HvacSchedule) => {
            params.insert("schedule".into(), Value::from("optimized"));
        }
        Some(SuggestionType::Ventilation) => {
            let ppm = first_capture(ppm_re(), description).unwrap_or(DEFAULT_CO2_PPM);
            params.insert("co2_threshold_ppm".into(), Value::from(ppm));
        }
        None => {}
    }
    params
}
