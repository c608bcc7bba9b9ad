//! Twin Advisor entrypoint: composition root for detectors, generator and action registry.
//! Runs a single dashboard cycle, or refreshes on a fixed interval until Ctrl+C.

use twin_advisor::{
    config::AdvisorConfig,
    actions::ActionRegistry,
    anomaly::EnsembleScorer,
    dashboard::Dashboard,
    features::build_frame,
    logging::StructuredLogger,
    model::{LazyDetector, OnnxOutput},
    suggestions::SuggestionGenerator,
    telemetry::JsonFileSource,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn run_one_cycle(
    config: &AdvisorConfig,
    source: &JsonFileSource,
    scorer: &EnsembleScorer,
    dashboard: &Dashboard,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let samples = source.load_all()?;
    info!(count = samples.len(), path = %config.telemetry_path.display(), "telemetry loaded");

    let scores = scorer.score(&build_frame(&samples), config.anomaly.policy);
    let detection = serde_json::json!({
        "building_id": config.building_id,
        "policy": config.anomaly.policy,
        "anomalies": scores,
    });
    let overview = dashboard.build(&config.building_id, &samples);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    StructuredLogger::emit_json(&detection, &mut out)?;
    StructuredLogger::emit_json(&overview, &mut out)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("TWIN_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = AdvisorConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(building_id = %config.building_id, "twin advisor starting");

    let dim = config.features.feature_dim;
    let reconstruction = Arc::new(LazyDetector::onnx(
        "autoencoder",
        config.models.reconstruction_path.clone(),
        OnnxOutput::Reconstruction,
        dim,
    ));
    let outlier = Arc::new(LazyDetector::onnx(
        "isolation_forest",
        config.models.outlier_path.clone(),
        OnnxOutput::Outlier {
            index: config.models.outlier_output,
        },
        dim,
    ));
    let scorer = Arc::new(EnsembleScorer::new(reconstruction, outlier));
    let generator = Arc::new(SuggestionGenerator::new(config.suggestions.clone()));
    let actions = Arc::new(ActionRegistry::new());
    let dashboard = Dashboard::new(config.dashboard.clone(), scorer.clone(), generator, actions);
    let source = JsonFileSource::new(&config.telemetry_path);

    let interval_secs = config.refresh_interval_secs;
    if interval_secs == 0 {
        run_one_cycle(&config, &source, &scorer, &dashboard)?;
        info!("twin advisor cycle complete");
        return Ok(());
    }

    info!(interval_secs, "refresh mode (Ctrl+C to stop)");
    static STOP: AtomicBool = AtomicBool::new(false);
    let _ = ctrlc::set_handler(|| {
        STOP.store(true, Ordering::Relaxed);
    });
    let mut cycle: u64 = 0;
    while !STOP.load(Ordering::Relaxed) {
        cycle += 1;
        if let Err(e) = run_one_cycle(&config, &source, &scorer, &dashboard) {
            tracing::warn!(cycle, error = %e, "cycle failed");
        }
        for _ in 0..interval_secs {
            if STOP.load(Ordering::Relaxed) {
                break;
            }
            std::thread::sleep(Duration::from_secs(1));
        }
    }
    info!("twin advisor stopping");
    Ok(())
}
