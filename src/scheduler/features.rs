//! Feature extraction for the interval predictor
//!
//! Feature order is part of the predictor contract and must not change:
//!
//! | idx | feature                               |
//! |-----|---------------------------------------|
//! | 0   | memory strength (days)                |
//! | 1   | difficulty rating                     |
//! | 2   | days since last review                |
//! | 3   | success rate                          |
//! | 4   | average response time (seconds)       |
//! | 5   | total reviews                         |
//! | 6   | consecutive correct                   |
//! | 7   | time of day (hour / 24)               |
//! | 8   | recent accuracy (extended only)       |
//! | 9   | mean quality / 5 (extended only)      |
//! | 10  | response time std dev, s (extended)   |
//! | 11  | history length (extended only)        |

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use super::config::{FeatureConfig, FeatureLayout};
use super::error::FeatureExtractionError;
use super::types::{MemoryModel, ReviewEvent, MAX_QUALITY};

pub const BASE_FEATURE_DIM: usize = 8;
pub const EXTENDED_FEATURE_DIM: usize = 12;

pub const BASE_FEATURE_LABELS: [&str; BASE_FEATURE_DIM] = [
    "memoryStrength",
    "difficultyRating",
    "timeSinceLastReview",
    "successRate",
    "averageResponseTime",
    "totalReviews",
    "consecutiveCorrect",
    "timeOfDay",
];

pub const HISTORY_FEATURE_LABELS: [&str; EXTENDED_FEATURE_DIM - BASE_FEATURE_DIM] = [
    "recentAccuracy",
    "meanQuality",
    "responseTimeStdDev",
    "historyLength",
];

impl FeatureLayout {
    pub fn dim(&self) -> usize {
        match self {
            Self::Base => BASE_FEATURE_DIM,
            Self::Extended => EXTENDED_FEATURE_DIM,
        }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = BASE_FEATURE_LABELS.to_vec();
        if *self == Self::Extended {
            labels.extend_from_slice(&HISTORY_FEATURE_LABELS);
        }
        labels
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn layout(&self) -> FeatureLayout {
        self.config.layout
    }

    pub fn dim(&self) -> usize {
        self.config.layout.dim()
    }

    pub fn extract(
        &self,
        model: &MemoryModel,
        event: &ReviewEvent,
        history: Option<&[ReviewEvent]>,
    ) -> Result<Vec<f64>, FeatureExtractionError> {
        model.validate()?;

        let mut features = Vec::with_capacity(self.dim());
        features.push(model.memory_strength);
        features.push(model.difficulty_rating);
        features.push(model.days_since_last_review(event.timestamp));
        features.push(model.success_rate());
        features.push(model.average_response_time / 1000.0);
        features.push(model.total_reviews as f64);
        features.push(model.consecutive_correct as f64);
        features.push(event.timestamp.hour() as f64 / 24.0);

        if self.config.layout == FeatureLayout::Extended {
            self.push_history_features(&mut features, model, history.unwrap_or(&[]));
        }

        Ok(features)
    }

    fn push_history_features(
        &self,
        features: &mut Vec<f64>,
        model: &MemoryModel,
        history: &[ReviewEvent],
    ) {
        let start = history.len().saturating_sub(self.config.history_window);
        let window = &history[start..];

        if window.is_empty() {
            features.extend_from_slice(&[model.success_rate(), 0.5, 0.0, 0.0]);
            return;
        }

        let n = window.len() as f64;
        let accuracy = window.iter().filter(|e| e.correct).count() as f64 / n;
        let mean_quality = window
            .iter()
            .map(|e| e.quality.clamp(0, MAX_QUALITY) as f64)
            .sum::<f64>()
            / n
            / MAX_QUALITY as f64;

        let rt_secs: Vec<f64> = window
            .iter()
            .map(|e| e.response_time_ms.max(0.0) / 1000.0)
            .collect();
        let rt_mean = rt_secs.iter().sum::<f64>() / n;
        let rt_var = rt_secs.iter().map(|x| (x - rt_mean).powi(2)).sum::<f64>() / n;

        features.push(accuracy);
        features.push(mean_quality);
        features.push(rt_var.sqrt());
        features.push(n);
    }
}

/// Per-feature z-score statistics shipped alongside a trained predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl NormalizationStats {
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> Result<Self, FeatureExtractionError> {
        if mean.len() != std.len() {
            return Err(FeatureExtractionError::WidthMismatch {
                expected: mean.len(),
                actual: std.len(),
            });
        }
        Ok(Self { mean, std })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// `(x - mean) / std`; a degenerate std only centres the feature.
    pub fn normalize(&self, features: &[f64]) -> Result<Vec<f64>, FeatureExtractionError> {
        if features.len() != self.mean.len() || features.len() != self.std.len() {
            return Err(FeatureExtractionError::WidthMismatch {
                expected: self.mean.len(),
                actual: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(&x, (&mean, &std))| {
                if std.is_finite() && std.abs() > f64::EPSILON {
                    (x - mean) / std
                } else {
                    x - mean
                }
            })
            .collect())
    }
}
