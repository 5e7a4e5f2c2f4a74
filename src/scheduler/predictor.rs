use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::PredictorError;
use super::features::NormalizationStats;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    pub value: f64,
    pub confidence: Option<f64>,
}

impl From<f64> for RawPrediction {
    fn from(value: f64) -> Self {
        Self {
            value,
            confidence: None,
        }
    }
}

/// Learned interval estimator. Model loading, backend selection and
/// inference live behind this trait.
#[async_trait]
pub trait IntervalPredictor: Send + Sync {
    fn is_ready(&self) -> bool;

    async fn predict(&self, features: &[f64]) -> Result<Option<RawPrediction>, PredictorError>;
}

/// Applies stored normalisation statistics before delegating.
pub struct NormalizedPredictor<P> {
    inner: P,
    stats: NormalizationStats,
}

impl<P: IntervalPredictor> NormalizedPredictor<P> {
    pub fn new(inner: P, stats: NormalizationStats) -> Self {
        Self { inner, stats }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: IntervalPredictor> IntervalPredictor for NormalizedPredictor<P> {
    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    async fn predict(&self, features: &[f64]) -> Result<Option<RawPrediction>, PredictorError> {
        let normalized = self
            .stats
            .normalize(features)
            .map_err(|e| PredictorError::Failed(e.to_string()))?;
        self.inner.predict(&normalized).await
    }
}
