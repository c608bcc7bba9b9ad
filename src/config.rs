//! Advisor configuration. Every section has defaults so a partial file is enough.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Building the binary reports on
    pub building_id: String,
    /// JSON telemetry file read each cycle
    pub telemetry_path: PathBuf,
    /// Seconds between dashboard refreshes; 0 runs a single cycle
    pub refresh_interval_secs: u64,
    /// Detector artifacts
    pub models: ModelsConfig,
    /// Feature frame parameters
    pub features: FeaturesConfig,
    /// Anomaly threshold policy for direct scoring
    pub anomaly: AnomalyConfig,
    /// Suggestion analyzers, bucket widths and ranking
    pub suggestions: SuggestionsConfig,
    /// Dashboard aggregation
    pub dashboard: DashboardConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Autoencoder exported to ONNX; output is the reconstructed input
    pub reconstruction_path: PathBuf,
    /// Isolation forest exported to ONNX; output holds per-row normality scores
    pub outlier_path: PathBuf,
    /// Index of the outlier model output carrying the scores (skl2onnx emits labels first)
    pub outlier_output: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Number of numerical features expected by the models
    pub feature_dim: usize,
}

/// How the combined ensemble score is turned into an anomaly flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Threshold is this quantile of the batch's combined scores
    Adaptive { quantile: f64 },
    /// Absolute threshold
    Fixed { threshold: f64 },
}

impl ThresholdPolicy {
    pub const fn adaptive() -> Self {
        ThresholdPolicy::Adaptive { quantile: 0.9 }
    }

    pub const fn fixed() -> Self {
        ThresholdPolicy::Fixed { threshold: 0.85 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub policy: ThresholdPolicy,
}

/// Rounding steps for context fields. Exact steps feed the signature only,
/// bucket/band steps feed the dedupe key as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    pub energy_kwh: f64,
    pub base_load_ratio: f64,
    pub base_load_ratio_bucket: f64,
    pub avg_temp_bucket: f64,
    pub setpoint_band: f64,
    pub low_occ_ratio: f64,
    pub low_occ_ratio_bucket: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionsConfig {
    /// Suggestions returned after dedupe
    pub top_n: usize,
    /// Identity hash scheme version mixed into signature and dedupe key
    pub hash_version: u32,
    /// Energy mean must exceed min by this factor to flag base load
    pub base_load_factor: f64,
    /// Hours the energy gap is assumed to persist per day
    pub base_load_hours: f64,
    /// Average temperature below this (°C) proposes a setpoint increase
    pub comfort_floor_c: f64,
    /// Proposed raise over the observed average before clamping and rounding
    pub setpoint_raise_c: f64,
    pub setpoint_min_c: f64,
    pub setpoint_max_c: f64,
    pub setpoint_step_c: f64,
    /// kWh saved per °C of setpoint raise per hour
    pub kwh_per_degree_hour: f64,
    /// Occupancy below this counts as a low-occupancy sample
    pub low_occupancy_threshold: f64,
    /// Fraction of low-occupancy samples that triggers occupancy scheduling
    pub low_occupancy_fraction: f64,
    pub occupancy_savings_kwh: f64,
    pub buckets: BucketConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub anomaly_policy: ThresholdPolicy,
    pub anomaly_window_hours: i64,
    pub suggestion_window_hours: i64,
    /// Samples used when nothing falls inside the anomaly window
    pub fallback_samples: usize,
    pub max_anomalies: usize,
    pub max_alerts: usize,
    pub chart_points: usize,
    /// Alert is critical at or above this score, warning below
    pub critical_score: f64,
    pub emission_factor_t_per_kwh: f64,
    /// Day-over-day carbon rise (%) that raises an alert
    pub carbon_alert_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            building_id: "default".to_string(),
            telemetry_path: PathBuf::from("telemetry.json"),
            refresh_interval_secs: 0,
            models: ModelsConfig::default(),
            features: FeaturesConfig::default(),
            anomaly: AnomalyConfig::default(),
            suggestions: SuggestionsConfig::default(),
            dashboard: DashboardConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            reconstruction_path: PathBuf::from("models/anomaly/autoencoder.onnx"),
            outlier_path: PathBuf::from("models/anomaly/isolation_forest.onnx"),
            outlier_output: 1,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self { feature_dim: 7 }
    }
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            policy: ThresholdPolicy::adaptive(),
        }
    }
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            energy_kwh: 1.0,
            base_load_ratio: 0.05,
            base_load_ratio_bucket: 0.2,
            avg_temp_bucket: 0.5,
            setpoint_band: 0.5,
            low_occ_ratio: 0.02,
            low_occ_ratio_bucket: 0.1,
        }
    }
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            hash_version: 2,
            base_load_factor: 1.5,
            base_load_hours: 8.0,
            comfort_floor_c: 22.0,
            setpoint_raise_c: 1.5,
            setpoint_min_c: 22.5,
            setpoint_max_c: 24.0,
            setpoint_step_c: 0.5,
            kwh_per_degree_hour: 0.6,
            low_occupancy_threshold: 0.2,
            low_occupancy_fraction: 0.3,
            occupancy_savings_kwh: 15.0,
            buckets: BucketConfig::default(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            anomaly_policy: ThresholdPolicy::fixed(),
            anomaly_window_hours: 24,
            suggestion_window_hours: 48,
            fallback_samples: 96,
            max_anomalies: 50,
            max_alerts: 5,
            chart_points: 288,
            critical_score: 0.9,
            emission_factor_t_per_kwh: 0.000707,
            carbon_alert_pct: 5.0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl AdvisorConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|data| serde_json::from_str::<AdvisorConfig>(&data).map_err(|e| e.to_string()));
        match parsed {
            Ok(c) => c,
            Err(error) => {
                // Logging is not installed yet when the config is read.
                eprintln!("invalid config {}: {error}; using defaults", path.display());
                Self::default()
            }
        }
    }
}
