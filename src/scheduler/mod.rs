//! Scheduling core - memory model, SM-2 baseline, predictor gate
//!
//! Contains:
//! - Baseline scheduler (the single authoritative state transition)
//! - Feature extraction and normalisation for learned predictors
//! - Prediction gate (validated predictor output with baseline fallback)
//! - Review session counters
//! - Versioned in-memory item store

pub mod baseline;
pub mod clock;
pub mod config;
pub mod error;
pub mod features;
pub mod gate;
pub mod metrics;
pub mod predictor;
pub mod session;
pub mod store;
pub mod types;

pub use baseline::{BaselineScheduler, IntervalPreview};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BaselineParams, FeatureConfig, FeatureLayout, GateConfig, SchedulerConfig};
pub use error::{
    FeatureExtractionError, InvalidInputError, PredictorError, SchedulerError, StoreError,
};
pub use features::{FeatureExtractor, NormalizationStats};
pub use gate::PredictionGate;
pub use metrics::{PredictionMetrics, PredictionMetricsSnapshot};
pub use predictor::{IntervalPredictor, NormalizedPredictor, RawPrediction};
pub use session::{ReviewSession, SessionStats};
pub use store::{ItemStore, ReviewOutcome, VersionedModel};
pub use types::*;
