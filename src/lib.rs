//! Twin Advisor: building telemetry anomaly scoring and tracked optimization suggestions.
//!
//! Modular structure:
//! - [`telemetry`]: Telemetry rows and the source interface
//! - [`features`]: Feature frame with cyclical time encodings
//! - [`model`]: Lazily loaded detector handles (ONNX or in-process)
//! - [`anomaly`]: Two-detector ensemble scorer with threshold policies
//! - [`suggestions`]: Analyzers, rule fallbacks, content identity and ranking
//! - [`actions`]: Per-building applied/dismissed registry with version clock
//! - [`dashboard`]: Aggregated overview for the dashboard
//! - [`logging`]: Structured JSON logging

pub mod config;
pub mod error;
pub mod telemetry;
pub mod features;
pub mod model;
pub mod anomaly;
pub mod suggestions;
pub mod actions;
pub mod dashboard;
pub mod logging;

pub use config::AdvisorConfig;
pub use error::{AnalyzerError, DetectorError, TelemetryError, ValidationError};
pub use telemetry::{TelemetrySample, TelemetrySource, JsonFileSource};
pub use features::{build_frame, FeatureVector, FeatureFrameBuilder};
pub use model::{Detector, DetectorHandle, LazyDetector, OnnxDetector};
pub use anomaly::{AnomalyScore, EnsembleScorer, ThresholdPolicy};
pub use suggestions::{Suggestion, SuggestionGenerator, SuggestionType};
pub use actions::{ActionRegistry, AppliedAction, SuggestionPayload};
pub use dashboard::{Dashboard, DashboardOverview};
pub use logging::StructuredLogger;
