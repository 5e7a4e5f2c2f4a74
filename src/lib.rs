pub mod config;
pub mod logging;
pub mod replay;
pub mod scheduler;

pub use scheduler::{
    BaselineScheduler, FeatureExtractor, IntervalPredictor, MemoryModel, PredictionGate,
    PredictionResult, ReviewEvent, ReviewSession, SchedulerConfig,
};
