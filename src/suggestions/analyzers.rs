//! Independent pattern analyzers. Each yields at most one draft, or an error
//! that the generator treats as "contributes nothing".

use super::{round_step, ComfortRisk, Draft, Params, SuggestionContext, SuggestionType};
use crate::config::SuggestionsConfig;
use crate::error::AnalyzerError;
use crate::telemetry::{series, Metric, TelemetrySample};
use serde_json::Value;

pub type AnalyzerFn = fn(&[TelemetrySample], &SuggestionsConfig) -> Result<Option<Draft>, AnalyzerError>;

/// Analyzers run by the generator, by name
pub const ANALYZERS: [(&str, AnalyzerFn); 3] = [
    ("energy", analyze_energy),
    ("temperature", analyze_temperature),
    ("occupancy", analyze_occupancy),
];

fn required(samples: &[TelemetrySample], metric: Metric) -> Result<Vec<f64>, AnalyzerError> {
    let values = series(samples, metric);
    if values.is_empty() {
        return Err(AnalyzerError::MissingMetric(metric.as_str()));
    }
    Ok(values)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn params(entries: &[(&str, Value)]) -> Params {
    entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// High base load: mean energy well above the minimum proposes a night setback.
pub fn analyze_energy(samples: &[TelemetrySample], config: &SuggestionsConfig) -> Result<Option<Draft>, AnalyzerError> {
    let energy = required(samples, Metric::Energy)?;
    let avg = mean(&energy);
    let min = energy.iter().copied().fold(f64::INFINITY, f64::min);
    if avg <= min * config.base_load_factor {
        return Ok(None);
    }

    let ratio = avg / min.max(1e-6);
    let b = &config.buckets;
    let context = SuggestionContext::new()
        .exact("avg_energy_kwh", round_step(avg, b.energy_kwh))
        .exact("min_energy_kwh", round_step(min, b.energy_kwh))
        .exact("base_load_ratio", round_step(ratio, b.base_load_ratio))
        .banded("base_load_ratio_bucket", round_step(ratio, b.base_load_ratio_bucket));

    Ok(Some(Draft {
        kind: SuggestionType::HvacSchedule,
        description: format!(
            "High base load detected ({avg:.1} kWh avg vs {min:.1} kWh min). Consider night setback or improved controls."
        ),
        estimated_savings_kwh: (avg - min) * config.base_load_hours,
        comfort_risk: ComfortRisk::Low,
        params: params(&[("schedule", Value::from("night_setback"))]),
        context,
    }))
}

/// Overcooling: average temperature under the comfort floor proposes a higher setpoint.
pub fn analyze_temperature(
    samples: &[TelemetrySample],
    config: &SuggestionsConfig,
) -> Result<Option<Draft>, AnalyzerError> {
    let temps = required(samples, Metric::Temperature)?;
    let avg = mean(&temps);
    if avg >= config.comfort_floor_c {
        return Ok(None);
    }

    let target = round_step(
        // Config bounds may be inverted or NaN; clamp would panic
        (avg + config.setpoint_raise_c)
            .max(config.setpoint_min_c)
            .min(config.setpoint_max_c),
        config.setpoint_step_c,
    );
    let b = &config.buckets;
    let context = SuggestionContext::new()
        .banded("avg_temp_bucket", round_step(avg, b.avg_temp_bucket))
        .banded("target_setpoint_band", format!("{:.1}", round_step(target, b.setpoint_band)));

    Ok(Some(Draft {
        kind: SuggestionType::SetpointChange,
        description: format!(
            "Average temperature is {avg:.1}°C. Raising setpoint to {target:.1}°C could save energy while maintaining comfort."
        ),
        estimated_savings_kwh: ((target - avg) * config.kwh_per_degree_hour * 24.0).max(0.0),
        comfort_risk: ComfortRisk::Low,
        params: params(&[("setpoint_c_target", Value::from(target))]),
        context,
    }))
}

/// Many low-occupancy samples propose occupancy-based HVAC scheduling.
pub fn analyze_occupancy(
    samples: &[TelemetrySample],
    config: &SuggestionsConfig,
) -> Result<Option<Draft>, AnalyzerError> {
    let occupancy = required(samples, Metric::Occupancy)?;
    let low = occupancy
        .iter()
        .filter(|v| **v < config.low_occupancy_threshold)
        .count();
    if (low as f64) <= occupancy.len() as f64 * config.low_occupancy_fraction {
        return Ok(None);
    }

    let ratio = low as f64 / occupancy.len() as f64;
    let b = &config.buckets;
    let context = SuggestionContext::new()
        .exact("low_occ_ratio", round_step(ratio, b.low_occ_ratio))
        .banded("low_occ_ratio_bucket", round_step(ratio, b.low_occ_ratio_bucket));

    Ok(Some(Draft {
        kind: SuggestionType::HvacSchedule,
        description: "Significant low-occupancy periods detected. Consider reducing HVAC intensity during these times."
            .to_string(),
        estimated_savings_kwh: config.occupancy_savings_kwh,
        comfort_risk: ComfortRisk::Medium,
        params: params(&[("schedule", Value::from("occupancy_based"))]),
        context,
    }))
}
