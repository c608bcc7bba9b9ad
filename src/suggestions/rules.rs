//! Fixed fallbacks appended to every generation run.

use super::{ComfortRisk, Draft, Params, SuggestionContext, SuggestionType};
use serde_json::Value;

fn pre_cool() -> Draft {
    let mut params = Params::new();
    params.insert("schedule".into(), Value::from("pre_cool"));
    params.insert("delta_c".into(), Value::from(1.0));
    params.insert("window".into(), Value::from("07:00-08:00"));
    Draft {
        kind: SuggestionType::HvacSchedule,
        description: "Pre-cool office zones by 1°C between 7:00–8:00 to reduce peak load.".to_string(),
        estimated_savings_kwh: 12.5,
        comfort_risk: ComfortRisk::Low,
        params,
        context: SuggestionContext::new().banded("rule_band", "precool"),
    }
}

fn co2_threshold() -> Draft {
    let mut params = Params::new();
    params.insert("co2_threshold_ppm".into(), Value::from(900));
    Draft {
        kind: SuggestionType::Ventilation,
        description:
            "Increase CO₂-based fresh air intake threshold from 800 ppm to 900 ppm in low-occupancy periods."
                .to_string(),
        estimated_savings_kwh: 5.2,
        comfort_risk: ComfortRisk::Medium,
        params,
        context: SuggestionContext::new().banded("rule_band", "co2_900"),
    }
}

pub fn rule_based() -> Vec<Draft> {
    vec![pre_cool(), co2_threshold()]
}
