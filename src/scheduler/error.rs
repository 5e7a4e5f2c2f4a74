#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInputError {
    #[error("quality out of range: {quality} (expected 0..=5)")]
    QualityOutOfRange { quality: i32 },
    #[error("negative response time: {0}ms")]
    NegativeResponseTime(f64),
    #[error("response time is not finite")]
    NonFiniteResponseTime,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureExtractionError {
    #[error("invalid memory model field {field}: {value}")]
    InvalidField { field: &'static str, value: f64 },
    #[error("inconsistent review counters: {0}")]
    InconsistentCounters(String),
    #[error("feature width mismatch: expected {expected}, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PredictorError {
    #[error("predictor not ready")]
    NotReady,
    #[error("prediction failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
    #[error(transparent)]
    FeatureExtraction(#[from] FeatureExtractionError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown item: {0}")]
    UnknownItem(String),
    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
