//! Dashboard aggregation: KPIs, carbon, anomaly alerts and suggestions filtered
//! through the action registry, plus the registry version for staleness checks.

use crate::actions::{ActionRegistry, AppliedAction, SuggestionPayload};
use crate::anomaly::{AnomalyScore, EnsembleScorer, Severity};
use crate::config::DashboardConfig;
use crate::features::build_frame;
use crate::suggestions::{Suggestion, SuggestionGenerator};
use crate::telemetry::{series, sort_by_time, window, Metric, TelemetrySample};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_energy_kwh: f64,
    pub avg_temperature_c: f64,
    pub peak_occupancy: f64,
    pub anomaly_rate_pct: f64,
    pub potential_savings_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub energy: Option<f64>,
    pub temperature: Option<f64>,
    pub occupancy: Option<f64>,
    pub carbon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonSummary {
    pub today_tonnes: f64,
    pub previous_tonnes: f64,
    pub delta_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub is_anomaly: bool,
    pub energy: Option<f64>,
    pub temperature: Option<f64>,
    pub occupancy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub building_id: String,
    pub generated_at: DateTime<Utc>,
    pub kpis: Kpis,
    pub charts: Vec<ChartPoint>,
    pub carbon: CarbonSummary,
    pub alerts: Vec<Alert>,
    pub anomalies: Vec<AnomalyPoint>,
    pub suggestions: Vec<Suggestion>,
    pub applied_actions: Vec<AppliedAction>,
    pub actions_version: u64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let p = 10f64.powi(decimals);
    (value * p).round() / p
}

fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub struct Dashboard {
    config: DashboardConfig,
    scorer: Arc<EnsembleScorer>,
    generator: Arc<SuggestionGenerator>,
    actions: Arc<ActionRegistry>,
}

impl Dashboard {
    pub fn new(
        config: DashboardConfig,
        scorer: Arc<EnsembleScorer>,
        generator: Arc<SuggestionGenerator>,
        actions: Arc<ActionRegistry>,
    ) -> Self {
        Self {
            config,
            scorer,
            generator,
            actions,
        }
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// Generated suggestions minus those applied or dismissed (directly or by dedupe key).
    pub fn suggestions(&self, building_id: &str, recent: &[TelemetrySample]) -> Vec<Suggestion> {
        self.generator
            .generate(building_id, recent)
            .into_iter()
            .filter(|s| !self.actions.should_suppress(building_id, &SuggestionPayload::from(s)))
            .collect()
    }

    pub fn build(&self, building_id: &str, telemetry: &[TelemetrySample]) -> DashboardOverview {
        self.build_at(building_id, telemetry, Utc::now())
    }

    /// Overview as of `now`. Empty telemetry yields zeroed KPIs and rule-based suggestions.
    pub fn build_at(&self, building_id: &str, telemetry: &[TelemetrySample], now: DateTime<Utc>) -> DashboardOverview {
        let cfg = &self.config;
        let all = sort_by_time(telemetry.to_vec());

        let mut recent = window(&all, now, cfg.anomaly_window_hours);
        if recent.is_empty() {
            recent = &all[all.len().saturating_sub(cfg.fallback_samples)..];
        }

        let frame = build_frame(recent);
        let scores = self.scorer.score(&frame, cfg.anomaly_policy);
        let flagged = scores.iter().filter(|s| s.is_anomaly).count();
        let anomalies = self.anomaly_points(recent, &scores);

        let suggestions = self.suggestions(building_id, window(&all, now, cfg.suggestion_window_hours));
        let applied_actions = self.actions.get_applied(building_id);
        let actions_version = self.actions.get_version(building_id);

        let total_energy = sum(&series(recent, Metric::Energy));
        let temps = series(recent, Metric::Temperature);
        let avg_temp = if temps.is_empty() { 0.0 } else { sum(&temps) / temps.len() as f64 };
        let peak_occ = series(recent, Metric::Occupancy).into_iter().fold(0.0, f64::max);
        let anomaly_rate = if scores.is_empty() {
            0.0
        } else {
            flagged as f64 / scores.len() as f64 * 100.0
        };
        let potential_savings: f64 = suggestions.iter().map(|s| s.estimated_savings_kwh).sum();

        let carbon = self.carbon(&all, now, total_energy);
        let alerts = self.alerts(&anomalies, &carbon, now);

        let charts = recent[recent.len().saturating_sub(cfg.chart_points)..]
            .iter()
            .map(|s| ChartPoint {
                timestamp: s.timestamp,
                energy: s.energy,
                temperature: s.temperature,
                occupancy: s.occupancy,
                carbon: s.energy.map(|e| e * cfg.emission_factor_t_per_kwh),
            })
            .collect();

        info!(
            building_id,
            rows = scores.len(),
            flagged,
            suggestions = suggestions.len(),
            actions_version,
            "dashboard built"
        );

        DashboardOverview {
            building_id: building_id.to_string(),
            generated_at: now,
            kpis: Kpis {
                total_energy_kwh: round_to(total_energy, 2),
                avg_temperature_c: round_to(avg_temp, 1),
                peak_occupancy: round_to(peak_occ, 2),
                anomaly_rate_pct: round_to(anomaly_rate, 1),
                potential_savings_kwh: round_to(potential_savings, 1),
            },
            charts,
            carbon,
            alerts,
            anomalies,
            suggestions,
            applied_actions,
            actions_version,
        }
    }

    /// Scored rows joined back to their samples, highest score first.
    fn anomaly_points(&self, recent: &[TelemetrySample], scores: &[AnomalyScore]) -> Vec<AnomalyPoint> {
        let mut points: Vec<AnomalyPoint> = recent
            .iter()
            .zip(scores)
            .map(|(s, a)| AnomalyPoint {
                timestamp: a.timestamp,
                score: a.score,
                is_anomaly: a.is_anomaly,
                energy: s.energy,
                temperature: s.temperature,
                occupancy: s.occupancy,
            })
            .collect();
        points.sort_by(|a, b| b.score.total_cmp(&a.score));
        points.truncate(self.config.max_anomalies);
        points
    }

    /// Emissions of the recent window against the 24 hours before it.
    fn carbon(&self, all: &[TelemetrySample], now: DateTime<Utc>, total_energy: f64) -> CarbonSummary {
        let factor = self.config.emission_factor_t_per_kwh;
        let boundary = now - Duration::hours(self.config.anomaly_window_hours);
        let start = boundary - Duration::hours(self.config.anomaly_window_hours);
        let previous: Vec<TelemetrySample> = all
            .iter()
            .filter(|s| s.timestamp >= start && s.timestamp < boundary)
            .cloned()
            .collect();

        let today = total_energy * factor;
        let prev = sum(&series(&previous, Metric::Energy)) * factor;
        let delta = if prev != 0.0 { (today - prev) / prev * 100.0 } else { 0.0 };
        CarbonSummary {
            today_tonnes: round_to(today, 3),
            previous_tonnes: round_to(prev, 3),
            delta_percent: round_to(delta, 1),
        }
    }

    /// One alert per top-scored point, flagged or not, then the carbon alert.
    fn alerts(&self, anomalies: &[AnomalyPoint], carbon: &CarbonSummary, now: DateTime<Utc>) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = anomalies
            .iter()
            .take(self.config.max_alerts)
            .map(|a| Alert {
                id: format!("anomaly-{}", a.timestamp.to_rfc3339()),
                severity: Severity::from_score(a.score, self.config.critical_score),
                title: "Anomaly detected".to_string(),
                message: format!(
                    "Energy spike to {:.1} kWh (score {:.0}%).",
                    a.energy.unwrap_or(0.0),
                    a.score * 100.0
                ),
                timestamp: a.timestamp,
            })
            .collect();

        if carbon.delta_percent > self.config.carbon_alert_pct {
            alerts.push(Alert {
                id: "carbon-alert".to_string(),
                severity: Severity::Warning,
                title: "Carbon footprint rise".to_string(),
                message: format!(
                    "Carbon emissions increased by {:.1}% vs. previous day.",
                    carbon.delta_percent
                ),
                timestamp: now,
            });
        }
        alerts
    }
}
